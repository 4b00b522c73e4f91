//! Finding classification
//!
//! Maps each finding onto a category/subcategory and a role-relevance
//! weight. Findings arrive pre-extracted; classification only refines
//! placement and never fails — anything unrecognizable degrades to
//! `Unclassified`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{Finding, FindingCategory, RoleCategory};
use crate::severity::{SeverityCalculator, SeverityContext, SeverityDecision};

/// Keyword rules that place an unclassified finding by its subcategory text
static SUBCATEGORY_RULES: Lazy<Vec<(Regex, FindingCategory)>> = Lazy::new(|| {
    [
        (r"(?i)fraud|theft|assault|conviction|felony", FindingCategory::Criminal),
        (r"(?i)bankrupt|lien|default|debt|credit", FindingCategory::Financial),
        (r"(?i)employ|tenure|dismissal|termination", FindingCategory::Employment),
        (r"(?i)degree|diploma|certif|credential", FindingCategory::Education),
        (r"(?i)lawsuit|litigation|judgment|injunction", FindingCategory::Legal),
        (r"(?i)sanction|watchlist|embargo|pep", FindingCategory::Sanctions),
        (r"(?i)alias|identity|passport|ssn", FindingCategory::Identity),
        (r"(?i)defam|press|media|reputation", FindingCategory::Reputation),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("static rule pattern"), category))
    .collect()
});

/// A finding with classification and severity scoring applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFinding {
    pub finding: Finding,
    pub category: FindingCategory,
    /// How relevant this category is for the subject's role, in [0, 1]
    pub relevance: f64,
    pub severity: SeverityDecision,
}

impl ClassifiedFinding {
    /// Severity contribution scaled by the finding's own confidence
    pub fn weighted_severity(&self) -> f64 {
        self.severity.severity.weight() * self.finding.confidence
    }
}

/// Rule-based classifier; stateless apart from the static rule table
#[derive(Debug, Clone, Default)]
pub struct FindingClassifier {
    severity: SeverityCalculator,
}

impl FindingClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and severity-score a batch of findings for a role. The
    /// caller supplies the evaluation instant so repeated runs over the
    /// same input produce identical output.
    pub fn classify_all(
        &self,
        findings: &[Finding],
        role: RoleCategory,
        evaluated_at: chrono::DateTime<chrono::Utc>,
    ) -> Vec<ClassifiedFinding> {
        findings
            .iter()
            .map(|finding| self.classify(finding, role, evaluated_at))
            .collect()
    }

    /// Classify one finding as of the given instant
    pub fn classify(
        &self,
        finding: &Finding,
        role: RoleCategory,
        evaluated_at: chrono::DateTime<chrono::Utc>,
    ) -> ClassifiedFinding {
        let category = resolve_category(finding);
        let relevance = role_relevance(category, role);
        let context = SeverityContext {
            role,
            relevance,
            evaluated_at,
        };
        let severity = self.severity.score(finding, category, &context);
        ClassifiedFinding {
            finding: finding.clone(),
            category,
            relevance,
            severity,
        }
    }
}

/// Keep the supplied category unless it is `Unclassified`, then try the
/// keyword rules over the subcategory text
fn resolve_category(finding: &Finding) -> FindingCategory {
    if finding.category != FindingCategory::Unclassified {
        return finding.category;
    }
    SUBCATEGORY_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&finding.subcategory))
        .map(|(_, category)| *category)
        .unwrap_or(FindingCategory::Unclassified)
}

/// Relevance weight of a finding category for a given role, in [0, 1]
pub fn role_relevance(category: FindingCategory, role: RoleCategory) -> f64 {
    use FindingCategory::*;
    use RoleCategory::*;
    match (category, role) {
        (Sanctions, _) | (Criminal, _) => 1.0,
        (Financial, Finance) | (Financial, Executive) => 1.0,
        (Financial, _) => 0.7,
        (Legal, Executive) => 0.9,
        (Legal, _) => 0.7,
        (Employment, _) => 0.6,
        (Education, Engineering) | (Education, Finance) => 0.7,
        (Education, _) => 0.5,
        (Identity, _) => 0.9,
        (Reputation, Executive) => 0.8,
        (Reputation, _) => 0.4,
        (Unclassified, _) => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use chrono::Utc;

    fn finding(category: FindingCategory, subcategory: &str) -> Finding {
        Finding::new("f1", category, Severity::Medium, 0.9, Utc::now())
            .with_subcategory(subcategory)
    }

    #[test]
    fn explicit_category_is_kept() {
        let f = finding(FindingCategory::Criminal, "credit default");
        assert_eq!(resolve_category(&f), FindingCategory::Criminal);
    }

    #[test]
    fn unclassified_resolves_by_keyword() {
        let f = finding(FindingCategory::Unclassified, "chapter 7 bankruptcy filing");
        assert_eq!(resolve_category(&f), FindingCategory::Financial);

        let f = finding(FindingCategory::Unclassified, "OFAC sanction list match");
        assert_eq!(resolve_category(&f), FindingCategory::Sanctions);
    }

    #[test]
    fn unrecognizable_subcategory_stays_unclassified() {
        let f = finding(FindingCategory::Unclassified, "miscellaneous note");
        assert_eq!(resolve_category(&f), FindingCategory::Unclassified);
    }

    #[test]
    fn sanctions_always_fully_relevant() {
        for role in [
            RoleCategory::Executive,
            RoleCategory::Finance,
            RoleCategory::Engineering,
            RoleCategory::Operations,
            RoleCategory::General,
        ] {
            assert_eq!(role_relevance(FindingCategory::Sanctions, role), 1.0);
        }
    }

    #[test]
    fn financial_relevance_tracks_role() {
        assert!(
            role_relevance(FindingCategory::Financial, RoleCategory::Finance)
                > role_relevance(FindingCategory::Financial, RoleCategory::Engineering)
        );
    }

    #[test]
    fn classification_produces_severity_decision() {
        let classifier = FindingClassifier::new();
        let f = finding(FindingCategory::Criminal, "fraud conviction");
        let classified = classifier.classify(&f, RoleCategory::Finance, Utc::now());
        assert_eq!(classified.category, FindingCategory::Criminal);
        assert!(!classified.severity.rationale.is_empty());
    }

    #[test]
    fn evaluation_instant_drives_staleness() {
        use chrono::TimeZone;

        let classifier = FindingClassifier::new();
        let discovered = Utc.with_ymd_and_hms(2018, 6, 1, 0, 0, 0).unwrap();
        let f = Finding::new("f1", FindingCategory::Legal, Severity::High, 0.9, discovered)
            .with_subcategory("civil judgment");

        let fresh = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        let aged = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let before = classifier.classify(&f, RoleCategory::General, fresh);
        let after = classifier.classify(&f, RoleCategory::General, aged);
        assert_eq!(before.severity.severity, Severity::High);
        assert_eq!(after.severity.severity, Severity::Medium);

        // Same instant, same answer, batch included
        let replay = classifier.classify_all(std::slice::from_ref(&f), RoleCategory::General, aged);
        assert_eq!(replay, vec![after]);
    }
}
