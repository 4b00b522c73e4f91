pub mod errors;
pub mod types;

pub use errors::{EngineError, Result, ResultExt};
pub use types::{
    DateRange, DiscoveredEntity, EntityKind, EntityRelation, Finding, FindingCategory,
    Recommendation, RelationKind, RelationStrength, RiskFlag, RiskLevel, RoleCategory, Severity,
};
