//! Configuration loading
//!
//! Parses the engine configuration and any organization threshold tables
//! from TOML, validating everything before use.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::thresholds::{ThresholdSet, ThresholdTable};
use super::EngineConfig;
use crate::core::{Result, ResultExt};

/// On-disk configuration layout: engine tunables plus threshold sets
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    engine: EngineConfig,

    #[serde(default)]
    thresholds: Vec<ThresholdSet>,
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<(EngineConfig, ThresholdTable)> {
    let file: ConfigFile = toml::from_str(contents)?;
    file.engine.validate()?;
    let table = ThresholdTable::new(file.thresholds)?;
    Ok((file.engine, table))
}

/// Load and validate configuration from a TOML file
pub fn load_config_file(path: &Path) -> Result<(EngineConfig, ThresholdTable)> {
    let contents = fs::read_to_string(path)
        .map_err(crate::core::EngineError::from)
        .context(format!("reading config file {}", path.display()))?;
    log::debug!("loaded engine config from {}", path.display());
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_config_yields_defaults() {
        let (engine, table) = parse_config("").unwrap();
        assert_eq!(engine.propagation.max_hops, 5);
        assert!(table.sets().is_empty());
    }

    #[test]
    fn full_config_round_trip() {
        let contents = indoc! {r#"
            [weights]
            anomaly = 0.3
            pattern = 0.15
            connection = 0.2

            [propagation]
            hop_decay = 0.5
            max_hops = 4

            [[thresholds]]
            medium = 0.3
            high = 0.6
            critical = 0.85

            [thresholds.scope]
            org = "acme"
        "#};

        let (engine, table) = parse_config(contents).unwrap();
        assert_eq!(engine.weights.anomaly, 0.3);
        assert_eq!(engine.propagation.hop_decay, 0.5);
        assert_eq!(table.sets().len(), 1);
        assert_eq!(table.sets()[0].medium, 0.3);
    }

    #[test]
    fn invalid_thresholds_rejected_at_load() {
        let contents = indoc! {r#"
            [[thresholds]]
            medium = 0.7
            high = 0.5
            critical = 0.9
        "#};
        assert!(parse_config(contents).is_err());
    }

    #[test]
    fn invalid_weight_rejected_at_load() {
        let contents = indoc! {r#"
            [weights]
            anomaly = 2.0
        "#};
        assert!(parse_config(contents).is_err());
    }
}
