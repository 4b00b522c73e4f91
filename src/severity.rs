//! Rule-based severity assignment
//!
//! Base severity comes from a rule table keyed by category/subcategory;
//! context (role relevance, recency) may move it by one discrete step,
//! never beyond the enum ends. Every adjustment records its rule id so the
//! decision stays auditable. Unknown categories fail closed to `Medium`.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{Finding, FindingCategory, RoleCategory, Severity};

/// Findings older than this are considered stale and stepped down once
const STALENESS_YEARS: i64 = 7;

/// Role relevance at or above which severity is stepped up once
const RELEVANCE_STEP_UP: f64 = 0.9;

/// Base severity rules: (rule id, category, subcategory pattern, severity)
///
/// The first matching rule wins; a category-wide rule uses an empty
/// pattern. Findings with no matching rule keep their source-assigned
/// severity.
static BASE_RULES: Lazy<Vec<BaseRule>> = Lazy::new(|| {
    [
        ("sev-sanctions", FindingCategory::Sanctions, "", Severity::Critical),
        ("sev-criminal-felony", FindingCategory::Criminal, r"(?i)felony|violent|fraud", Severity::Critical),
        ("sev-criminal", FindingCategory::Criminal, "", Severity::High),
        ("sev-identity-mismatch", FindingCategory::Identity, r"(?i)mismatch|alias|forged", Severity::High),
        ("sev-financial-bankruptcy", FindingCategory::Financial, r"(?i)bankrupt|insolven", Severity::High),
        ("sev-financial", FindingCategory::Financial, "", Severity::Medium),
        ("sev-legal-judgment", FindingCategory::Legal, r"(?i)judgment|injunction", Severity::High),
        ("sev-legal", FindingCategory::Legal, "", Severity::Medium),
        ("sev-education-fabricated", FindingCategory::Education, r"(?i)fabricat|unverifi|diploma mill", Severity::High),
        ("sev-employment-gap", FindingCategory::Employment, r"(?i)gap|discrepan", Severity::Medium),
        ("sev-reputation", FindingCategory::Reputation, "", Severity::Low),
    ]
    .into_iter()
    .map(|(id, category, pattern, severity)| BaseRule {
        id,
        category,
        pattern: (!pattern.is_empty())
            .then(|| Regex::new(pattern).expect("static rule pattern")),
        severity,
    })
    .collect()
});

struct BaseRule {
    id: &'static str,
    category: FindingCategory,
    pattern: Option<Regex>,
    severity: Severity,
}

impl BaseRule {
    fn matches(&self, category: FindingCategory, subcategory: &str) -> bool {
        self.category == category
            && self
                .pattern
                .as_ref()
                .map(|p| p.is_match(subcategory))
                .unwrap_or(true)
    }
}

/// Context the calculator adjusts against
#[derive(Debug, Clone)]
pub struct SeverityContext {
    pub role: RoleCategory,
    /// Role relevance of the finding's category, in [0, 1]
    pub relevance: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// One applied adjustment, kept for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub rule_id: String,
    pub direction: AdjustmentDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentDirection {
    Raised,
    Lowered,
}

/// Outcome of severity scoring for one finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityDecision {
    pub severity: Severity,
    pub rationale: String,
    pub adjustments: Vec<AppliedAdjustment>,
}

/// Rule-based severity calculator; pure over (finding, context)
#[derive(Debug, Clone, Default)]
pub struct SeverityCalculator;

impl SeverityCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Score one finding. Total over its input domain: unknown categories
    /// degrade to `Medium` with an "unclassified" rationale.
    pub fn score(
        &self,
        finding: &Finding,
        category: FindingCategory,
        context: &SeverityContext,
    ) -> SeverityDecision {
        let (base, rationale) = self.base_severity(finding, category);
        let mut severity = base;
        let mut adjustments = Vec::new();

        if context.relevance >= RELEVANCE_STEP_UP && severity.step_up() != severity {
            severity = severity.step_up();
            adjustments.push(AppliedAdjustment {
                rule_id: "adj-role-relevance".to_string(),
                direction: AdjustmentDirection::Raised,
            });
        }

        if self.is_stale(finding, context.evaluated_at) && severity.step_down() != severity {
            severity = severity.step_down();
            adjustments.push(AppliedAdjustment {
                rule_id: "adj-stale-finding".to_string(),
                direction: AdjustmentDirection::Lowered,
            });
        }

        SeverityDecision {
            severity,
            rationale,
            adjustments,
        }
    }

    fn base_severity(&self, finding: &Finding, category: FindingCategory) -> (Severity, String) {
        if category == FindingCategory::Unclassified {
            return (
                Severity::Medium,
                "unclassified: no severity rule applies, defaulting to medium".to_string(),
            );
        }
        match BASE_RULES
            .iter()
            .find(|rule| rule.matches(category, &finding.subcategory))
        {
            Some(rule) => (
                rule.severity,
                format!("base severity from rule {}", rule.id),
            ),
            None => (
                finding.severity,
                "no matching rule, keeping source-assigned severity".to_string(),
            ),
        }
    }

    fn is_stale(&self, finding: &Finding, evaluated_at: DateTime<Utc>) -> bool {
        evaluated_at - finding.discovered_at > Duration::days(365 * STALENESS_YEARS)
    }
}
