use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::LayoutConfig;
use crate::status::StatusThresholds;
use crate::viewport::ViewportConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for the map engine. Every field falls back to its default when
/// omitted from the JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spacing constants used by the grid generator.
    pub layout: LayoutConfig,
    /// Zoom bounds and the transform restored on dataset changes.
    pub viewport: ViewportConfig,
    /// Classifier cut-offs applied to backend aggregates.
    pub thresholds: StatusThresholds,
}

impl EngineConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = fs::read_to_string(path)?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if !(layout.unit_size > 0.0) {
            return Err(invalid("layout.unit_size", "must be positive"));
        }
        if layout.unit_gap < 0.0 || layout.pair_gap < 0.0 || layout.aisle_gap < 0.0 {
            return Err(invalid("layout", "gaps must not be negative"));
        }

        self.viewport.validate()?;

        let thresholds = &self.thresholds;
        if thresholds.partial_items > thresholds.full_items
            || thresholds.partial_quantity > thresholds.full_quantity
        {
            return Err(invalid("thresholds", "partial bounds exceed full bounds"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewportState;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.layout.pitch(), 46.0);
        assert_eq!(config.viewport.initial, ViewportState::new(0.6, 50.0, 50.0));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"layout": {"aisle_gap": 120}, "viewport": {"max_zoom": 4}}"#)
                .unwrap();
        assert_eq!(config.layout.aisle_gap, 120.0);
        assert_eq!(config.layout.unit_size, 40.0);
        assert_eq!(config.viewport.max_zoom, 4.0);
        assert_eq!(config.viewport.min_zoom, 0.2);
    }

    #[test]
    fn rejects_inverted_zoom_bounds() {
        let err = EngineConfig::from_json_str(r#"{"viewport": {"min_zoom": 2, "max_zoom": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "viewport", .. }));
    }

    #[test]
    fn rejects_initial_scale_out_of_bounds() {
        let err = EngineConfig::from_json_str(
            r#"{"viewport": {"initial": {"scale": 9, "pan_x": 0, "pan_y": 0}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "viewport.initial.scale",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_unit_size() {
        let err = EngineConfig::from_json_str(r#"{"layout": {"unit_size": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = EngineConfig::from_json_str("{layout").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
