//! Positioned warehouse entities produced by the layout generator.
//!
//! Everything here is rebuilt wholesale on each dataset load; nothing is
//! patched in place or persisted.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Backend identifier of a storage unit (rack or stand-alone bin).
pub type UnitId = u64;
/// Backend identifier of a shelf level.
pub type LevelId = u64;
/// Backend identifier of a bin.
pub type BinId = u64;
/// Backend identifier of the row an aisle column was built from.
pub type ColumnId = u64;

/// Qualitative stock-fullness of a unit or bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Empty,
    Partial,
    Full,
    Critical,
    Reserved,
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Partial => "partial",
            Self::Full => "full",
            Self::Critical => "critical",
            Self::Reserved => "reserved",
        }
    }
}

/// Stock signal reported by the backend for a location subtree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OccupancyAggregate {
    #[serde(default)]
    pub item_count: u32,
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub has_stock: bool,
}

impl OccupancyAggregate {
    pub const fn new(item_count: u32, total_quantity: f64, has_stock: bool) -> Self {
        Self {
            item_count,
            total_quantity,
            has_stock,
        }
    }

    pub const fn empty() -> Self {
        Self::new(0, 0.0, false)
    }
}

impl Add for OccupancyAggregate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            item_count: self.item_count.saturating_add(rhs.item_count),
            total_quantity: self.total_quantity + rhs.total_quantity,
            has_stock: self.has_stock || rhs.has_stock,
        }
    }
}

impl AddAssign for OccupancyAggregate {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Optional environmental readings attached to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSlot {
    pub id: BinId,
    pub label: String,
    pub status: OccupancyStatus,
    pub occupancy: OccupancyAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfLevel {
    pub id: LevelId,
    pub label: String,
    pub bins: Vec<BinSlot>,
}

/// One stock line inside a bin, as delivered by the host's item lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinItem {
    pub product: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
}

impl BinItem {
    pub fn new(product: impl Into<String>, quantity: f64) -> Self {
        Self {
            product: product.into(),
            quantity,
            lot: None,
            uom: None,
        }
    }
}

/// A placed rack (or stand-alone bin) on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: UnitId,
    pub label: String,
    pub column_id: ColumnId,
    pub aisle: String,
    pub status: OccupancyStatus,
    pub occupancy: OccupancyAggregate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Telemetry>,
    pub levels: Vec<ShelfLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    pub rect: Rect,
}

impl StorageUnit {
    pub fn level(&self, level_id: LevelId) -> Option<&ShelfLevel> {
        self.levels.iter().find(|level| level.id == level_id)
    }

    pub fn bin(&self, bin_id: BinId) -> Option<&BinSlot> {
        self.levels
            .iter()
            .flat_map(|level| level.bins.iter())
            .find(|bin| bin.id == bin_id)
    }

    pub fn bin_count(&self) -> usize {
        self.levels.iter().map(|level| level.bins.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Units stack top to bottom; rows advance left to right.
    Vertical,
    /// Units run left to right; rows advance top to bottom.
    Horizontal,
}

/// A line of storage units sharing one orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AisleColumn {
    pub id: ColumnId,
    pub label: String,
    pub orientation: Orientation,
    pub origin: Point,
    pub units: Vec<StorageUnit>,
}

impl AisleColumn {
    /// World-space rectangle covering every unit, `None` for an empty column.
    pub fn bounds(&self) -> Option<Rect> {
        let mut units = self.units.iter();
        let first = units.next()?.rect;
        Some(units.fold(first, |acc, unit| acc.union(&unit.rect)))
    }
}
