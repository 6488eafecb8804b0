use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::{
    AisleColumn, ColumnId, OccupancyAggregate, OccupancyStatus, Orientation, ShelfLevel,
    StorageUnit, Telemetry, UnitId,
};

/// Spacing constants for the grid generator, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Top-left corner of the first unit of the first row.
    pub origin: Point,
    pub orientation: Orientation,
    /// Edge length of a (square) unit.
    pub unit_size: f64,
    /// Gap between neighbouring units of one row.
    pub unit_gap: f64,
    /// Gap between the two rows of a back-to-back pair.
    pub pair_gap: f64,
    /// Walkway between one pair and the next.
    pub aisle_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin: Point::new(100.0, 100.0),
            orientation: Orientation::Vertical,
            unit_size: 40.0,
            unit_gap: 6.0,
            pair_gap: 4.0,
            aisle_gap: 80.0,
        }
    }
}

impl LayoutConfig {
    /// Distance between the leading edges of consecutive units in a row.
    pub fn pitch(&self) -> f64 {
        self.unit_size + self.unit_gap
    }
}

/// An unplaced unit; the generator assigns its rectangle and parent row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub id: UnitId,
    pub label: String,
    pub status: OccupancyStatus,
    pub occupancy: OccupancyAggregate,
    pub telemetry: Option<Telemetry>,
    pub levels: Vec<ShelfLevel>,
    pub issue: Option<String>,
}

impl UnitSpec {
    pub fn new(id: UnitId, label: impl Into<String>, status: OccupancyStatus) -> Self {
        Self {
            id,
            label: label.into(),
            status,
            occupancy: OccupancyAggregate::empty(),
            telemetry: None,
            levels: Vec::new(),
            issue: None,
        }
    }
}

/// An ordered row of units, in the order the backend listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub id: ColumnId,
    pub label: String,
    pub units: Vec<UnitSpec>,
}

impl RowSpec {
    pub fn new(id: ColumnId, label: impl Into<String>, units: Vec<UnitSpec>) -> Self {
        Self {
            id,
            label: label.into(),
            units,
        }
    }
}

/// Place rows as back-to-back pairs separated by aisles.
///
/// Rows without units are dropped before pairing, so they never leave a
/// hole in the pattern. The output is a pure function of the input order.
pub fn generate(rows: Vec<RowSpec>, config: &LayoutConfig) -> Vec<AisleColumn> {
    let pitch = config.pitch();
    let (mut cross, axis_start) = match config.orientation {
        Orientation::Vertical => (config.origin.x, config.origin.y),
        Orientation::Horizontal => (config.origin.y, config.origin.x),
    };

    let mut columns = Vec::with_capacity(rows.len());
    for (slot, row) in rows.into_iter().filter(|row| !row.units.is_empty()).enumerate() {
        let origin = axis_point(config.orientation, cross, axis_start);
        let units = row
            .units
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| {
                let along = axis_start + pitch * idx as f64;
                let corner = axis_point(config.orientation, cross, along);
                StorageUnit {
                    id: spec.id,
                    label: spec.label,
                    column_id: row.id,
                    aisle: row.label.clone(),
                    status: spec.status,
                    occupancy: spec.occupancy,
                    telemetry: spec.telemetry,
                    levels: spec.levels,
                    issue: spec.issue,
                    rect: Rect::new(corner.x, corner.y, config.unit_size, config.unit_size),
                }
            })
            .collect();

        columns.push(AisleColumn {
            id: row.id,
            label: row.label,
            orientation: config.orientation,
            origin,
            units,
        });

        cross += if slot % 2 == 0 {
            config.unit_size + config.pair_gap
        } else {
            config.unit_size + config.aisle_gap
        };
    }
    columns
}

fn axis_point(orientation: Orientation, cross: f64, along: f64) -> Point {
    match orientation {
        Orientation::Vertical => Point::new(cross, along),
        Orientation::Horizontal => Point::new(along, cross),
    }
}
