//! Layout module orchestrator.
//!
//! Callers import the generator and its inputs from here while the
//! placement arithmetic lives in the private `core` module.

mod core;

pub use core::{LayoutConfig, RowSpec, UnitSpec, generate};
