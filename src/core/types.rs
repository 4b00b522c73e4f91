//! Common type definitions used across the engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Severity levels for individual findings
///
/// Total order: `Low < Medium < High < Critical`. Contextual adjustment
/// moves severity by at most one step and saturates at the ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Raise by one step, saturating at `Critical`
    pub fn step_up(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High => Severity::Critical,
            Severity::Critical => Severity::Critical,
        }
    }

    /// Lower by one step, saturating at `Low`
    pub fn step_down(self) -> Self {
        match self {
            Severity::Low => Severity::Low,
            Severity::Medium => Severity::Low,
            Severity::High => Severity::Medium,
            Severity::Critical => Severity::High,
        }
    }

    /// Normalized contribution weight of this severity in [0, 1]
    pub fn weight(self) -> f64 {
        match self {
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.85,
            Severity::Critical => 1.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Discrete overall risk classification
///
/// Total order: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn display_name(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Recommended action derived from the aggregated assessment
///
/// Total order so safety-floor overrides can take a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    NoAction,
    Monitor,
    ManualReview,
    Escalate,
}

impl Recommendation {
    pub fn display_name(self) -> &'static str {
        match self {
            Recommendation::NoAction => "no action",
            Recommendation::Monitor => "monitor",
            Recommendation::ManualReview => "manual review",
            Recommendation::Escalate => "escalate",
        }
    }
}

/// Categories of findings about a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingCategory {
    Criminal,
    Financial,
    Employment,
    Education,
    Legal,
    Reputation,
    Identity,
    Sanctions,
    /// Fallback for findings the classifier could not place
    Unclassified,
}

impl FindingCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            FindingCategory::Criminal => "criminal",
            FindingCategory::Financial => "financial",
            FindingCategory::Employment => "employment",
            FindingCategory::Education => "education",
            FindingCategory::Legal => "legal",
            FindingCategory::Reputation => "reputation",
            FindingCategory::Identity => "identity",
            FindingCategory::Sanctions => "sanctions",
            FindingCategory::Unclassified => "unclassified",
        }
    }

    pub fn all() -> &'static [FindingCategory] {
        &[
            FindingCategory::Criminal,
            FindingCategory::Financial,
            FindingCategory::Employment,
            FindingCategory::Education,
            FindingCategory::Legal,
            FindingCategory::Reputation,
            FindingCategory::Identity,
            FindingCategory::Sanctions,
            FindingCategory::Unclassified,
        ]
    }
}

/// Role category of the subject under assessment
///
/// Supplied by the caller; compliance/jurisdiction enforcement happens
/// upstream. The engine only uses this to weight relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleCategory {
    Executive,
    Finance,
    Engineering,
    Operations,
    General,
}

/// Closed date range attached to a finding (e.g. an employment period)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    /// `None` means ongoing
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether two ranges overlap, treating open ends as extending forever
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let self_end = self.end.unwrap_or(NaiveDate::MAX);
        let other_end = other.end.unwrap_or(NaiveDate::MAX);
        self.start <= other_end && other.start <= self_end
    }
}

/// A discrete, sourced fact about the subject
///
/// Produced externally by the acquisition layer; consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub category: FindingCategory,
    pub subcategory: String,
    pub severity: Severity,
    /// Confidence that the finding is accurate, in [0, 1]
    pub confidence: f64,
    pub sources: Vec<String>,
    pub discovered_at: DateTime<Utc>,
    /// Period the finding covers, when the source provides one
    pub date_range: Option<DateRange>,
}

impl Finding {
    pub fn new(
        id: impl Into<String>,
        category: FindingCategory,
        severity: Severity,
        confidence: f64,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            subcategory: String::new(),
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            sources: Vec::new(),
            discovered_at,
            date_range: None,
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}

/// Kinds of entities discovered around the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Individual,
    Organization,
    Address,
}

/// Intrinsic risk indicators attached to a discovered entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskFlag {
    Sanctioned,
    PoliticallyExposed,
    ShellCompany,
    CriminalAssociation,
}

impl RiskFlag {
    /// Intrinsic risk contributed by this flag, in [0, 1]
    pub fn intrinsic_risk(self) -> f64 {
        match self {
            RiskFlag::Sanctioned => 1.0,
            RiskFlag::PoliticallyExposed => 0.7,
            RiskFlag::ShellCompany => 0.8,
            RiskFlag::CriminalAssociation => 0.9,
        }
    }
}

/// A node in the discovered entity graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub risk_flags: Vec<RiskFlag>,
}

impl DiscoveredEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            risk_flags: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: Vec<RiskFlag>) -> Self {
        self.risk_flags = flags;
        self
    }

    /// The strongest intrinsic risk across all flags, 0.0 when unflagged
    pub fn intrinsic_risk(&self) -> f64 {
        self.risk_flags
            .iter()
            .map(|f| f.intrinsic_risk())
            .fold(0.0, f64::max)
    }
}

/// Typed relationship between two discovered entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Employer,
    CoDirector,
    SharedAddress,
    FamilyMember,
    BusinessPartner,
}

impl RelationKind {
    /// Risk transmitted across this relation type relative to a direct tie
    pub fn risk_multiplier(self) -> f64 {
        match self {
            RelationKind::CoDirector => 1.0,
            RelationKind::Employer => 0.9,
            RelationKind::BusinessPartner => 0.85,
            RelationKind::FamilyMember => 0.7,
            RelationKind::SharedAddress => 0.5,
        }
    }

    /// Whether risk flows both ways across this relation
    ///
    /// Employment transmits risk from employer to employee but only weakly
    /// the other way; the graph models it as directed and lets the builder
    /// decide edge direction. All other relations are symmetric.
    pub fn is_symmetric(self) -> bool {
        !matches!(self, RelationKind::Employer)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RelationKind::Employer => "employer",
            RelationKind::CoDirector => "co-director",
            RelationKind::SharedAddress => "shared address",
            RelationKind::FamilyMember => "family member",
            RelationKind::BusinessPartner => "business partner",
        }
    }
}

/// Strength of an observed relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl RelationStrength {
    pub fn multiplier(self) -> f64 {
        match self {
            RelationStrength::Weak => 0.5,
            RelationStrength::Moderate => 0.75,
            RelationStrength::Strong => 1.0,
        }
    }
}

/// Typed, weighted edge in the discovered entity graph
///
/// For `Employer` relations, `source` is the employer and `target` the
/// employee. Cycles and disconnected components are both legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelation {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub strength: RelationStrength,
}

impl EntityRelation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        strength: RelationStrength,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            strength,
        }
    }
}
