//! Organization-scoped risk level thresholds
//!
//! Threshold sets are supplied by the organization and validated for
//! monotonicity at load time. Resolution walks specificity downward:
//! locale overrides role overrides org default overrides the built-in
//! system default. An invalid set is rejected, never silently reordered.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result, RiskLevel, RoleCategory};

/// Built-in system default thresholds, the least specific resolution tier
pub static SYSTEM_DEFAULT_THRESHOLDS: Lazy<ThresholdSet> = Lazy::new(|| ThresholdSet {
    scope: ThresholdScope::system(),
    low: 0.0,
    medium: 0.25,
    high: 0.55,
    critical: 0.8,
});

/// Scope a threshold set applies to
///
/// `None` fields are wildcards; specificity counts the populated fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdScope {
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub role: Option<RoleCategory>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl ThresholdScope {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn org(org: impl Into<String>) -> Self {
        Self {
            org: Some(org.into()),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: RoleCategory) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Number of populated fields; higher wins resolution
    pub fn specificity(&self) -> u8 {
        [
            self.org.is_some(),
            self.role.is_some(),
            self.locale.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count() as u8
    }

    /// Whether this scope covers the queried subject scope
    ///
    /// A populated field must match the query exactly; wildcards cover
    /// everything.
    pub fn covers(&self, query: &ThresholdScope) -> bool {
        let org_ok = self.org.is_none() || self.org == query.org;
        let role_ok = self.role.is_none() || self.role == query.role;
        let locale_ok = self.locale.is_none() || self.locale == query.locale;
        org_ok && role_ok && locale_ok
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(org) = &self.org {
            parts.push(format!("org={org}"));
        }
        if let Some(role) = &self.role {
            parts.push(format!("role={role:?}"));
        }
        if let Some(locale) = &self.locale {
            parts.push(format!("locale={locale}"));
        }
        if parts.is_empty() {
            "system-default".to_string()
        } else {
            parts.join(",")
        }
    }
}

/// Per-level score floors for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    #[serde(default)]
    pub scope: ThresholdScope,

    /// Floor of the Low band; conventionally 0.0
    #[serde(default)]
    pub low: f64,

    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl ThresholdSet {
    /// Reject non-monotonic boundaries
    pub fn validate(&self) -> Result<()> {
        let boundaries = [self.low, self.medium, self.high, self.critical];
        if boundaries.iter().any(|b| !(0.0..=1.0).contains(b)) {
            return Err(EngineError::NonMonotonicThresholds {
                scope: self.scope.describe(),
                message: "threshold boundaries must lie in [0, 1]".to_string(),
            });
        }
        if !(self.low < self.medium && self.medium < self.high && self.high < self.critical) {
            return Err(EngineError::NonMonotonicThresholds {
                scope: self.scope.describe(),
                message: format!(
                    "expected low < medium < high < critical, got {} / {} / {} / {}",
                    self.low, self.medium, self.high, self.critical
                ),
            });
        }
        Ok(())
    }

    /// Map a final score onto the discrete risk level for this scope
    pub fn classify(&self, score: f64) -> RiskLevel {
        match score {
            s if s >= self.critical => RiskLevel::Critical,
            s if s >= self.high => RiskLevel::High,
            s if s >= self.medium => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    /// Every configured boundary the score meets or exceeds, most severe
    /// first
    pub fn breaches(&self, score: f64) -> Vec<ThresholdBreach> {
        let mut breaches = Vec::new();
        for (level, boundary) in [
            (RiskLevel::Critical, self.critical),
            (RiskLevel::High, self.high),
            (RiskLevel::Medium, self.medium),
        ] {
            if score >= boundary {
                breaches.push(ThresholdBreach {
                    level,
                    boundary,
                    score,
                    scope: self.scope.describe(),
                });
            }
        }
        breaches
    }
}

/// A configured threshold boundary met or exceeded by an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub level: RiskLevel,
    pub boundary: f64,
    pub score: f64,
    /// Scope whose configuration triggered the breach
    pub scope: String,
}

/// Validated collection of threshold sets with inheritance resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdTable {
    sets: Vec<ThresholdSet>,
}

impl ThresholdTable {
    /// Build a table, rejecting any non-monotonic member set
    pub fn new(sets: Vec<ThresholdSet>) -> Result<Self> {
        for set in &sets {
            set.validate()?;
        }
        Ok(Self { sets })
    }

    pub fn sets(&self) -> &[ThresholdSet] {
        &self.sets
    }

    /// Resolve the most specific covering set, falling back to the system
    /// default
    pub fn resolve(&self, query: &ThresholdScope) -> &ThresholdSet {
        self.sets
            .iter()
            .filter(|set| set.scope.covers(query))
            .max_by_key(|set| set.scope.specificity())
            .unwrap_or(&SYSTEM_DEFAULT_THRESHOLDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(scope: ThresholdScope, medium: f64, high: f64, critical: f64) -> ThresholdSet {
        ThresholdSet {
            scope,
            low: 0.0,
            medium,
            high,
            critical,
        }
    }

    #[test]
    fn system_defaults_are_monotonic() {
        assert!(SYSTEM_DEFAULT_THRESHOLDS.validate().is_ok());
    }

    #[test]
    fn non_monotonic_set_rejected() {
        let bad = set(ThresholdScope::org("acme"), 0.6, 0.4, 0.8);
        assert!(bad.validate().is_err());
        assert!(ThresholdTable::new(vec![bad]).is_err());
    }

    #[test]
    fn out_of_range_boundary_rejected() {
        let bad = set(ThresholdScope::org("acme"), 0.3, 0.6, 1.2);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn classification_uses_boundaries() {
        let t = set(ThresholdScope::system(), 0.25, 0.55, 0.8);
        assert_eq!(t.classify(0.1), RiskLevel::Low);
        assert_eq!(t.classify(0.25), RiskLevel::Medium);
        assert_eq!(t.classify(0.6), RiskLevel::High);
        assert_eq!(t.classify(0.95), RiskLevel::Critical);
    }

    #[test]
    fn resolution_prefers_most_specific_scope() {
        let table = ThresholdTable::new(vec![
            set(ThresholdScope::org("acme"), 0.3, 0.6, 0.85),
            set(
                ThresholdScope::org("acme").with_role(RoleCategory::Finance),
                0.2,
                0.5,
                0.75,
            ),
            set(
                ThresholdScope::org("acme")
                    .with_role(RoleCategory::Finance)
                    .with_locale("de"),
                0.15,
                0.45,
                0.7,
            ),
        ])
        .unwrap();

        let query = ThresholdScope::org("acme")
            .with_role(RoleCategory::Finance)
            .with_locale("de");
        assert_eq!(table.resolve(&query).medium, 0.15);

        let query = ThresholdScope::org("acme")
            .with_role(RoleCategory::Finance)
            .with_locale("us");
        assert_eq!(table.resolve(&query).medium, 0.2);

        let query = ThresholdScope::org("acme").with_role(RoleCategory::Engineering);
        assert_eq!(table.resolve(&query).medium, 0.3);
    }

    #[test]
    fn unmatched_query_falls_back_to_system_default() {
        let table = ThresholdTable::new(vec![set(ThresholdScope::org("acme"), 0.3, 0.6, 0.85)])
            .unwrap();
        let query = ThresholdScope::org("globex");
        assert_eq!(table.resolve(&query), &*SYSTEM_DEFAULT_THRESHOLDS);
    }

    #[test]
    fn breaches_report_triggering_scope() {
        let t = set(ThresholdScope::org("acme"), 0.25, 0.55, 0.8);
        let breaches = t.breaches(0.6);
        assert_eq!(breaches.len(), 2);
        assert_eq!(breaches[0].level, RiskLevel::High);
        assert!(breaches.iter().all(|b| b.scope == "org=acme"));
    }
}
