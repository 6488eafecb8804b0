use thiserror::Error;

use crate::config::ConfigError;
use crate::model::{BinId, LevelId, UnitId};
use crate::selection::SelectionError;

/// Unified result type for the warehouse map crate.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors surfaced by the map controller.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("storage unit `{0}` is not on the map")]
    UnknownUnit(UnitId),
    #[error("level `{level}` does not belong to unit `{unit}`")]
    UnknownLevel { unit: UnitId, level: LevelId },
    #[error("bin `{bin}` does not belong to unit `{unit}`")]
    UnknownBin { unit: UnitId, bin: BinId },
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("location payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
