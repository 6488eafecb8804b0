//! Error module orchestrator.
//!
//! Each concern keeps its own error enum next to the code that raises it;
//! [`MapError`] folds them together for the controller surface.

mod types;

pub use types::{MapError, Result};
