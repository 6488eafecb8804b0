//! Seeded synthetic warehouse used for demos, benches and tests.
//!
//! Statuses, telemetry and stock come from a `blake3` digest of the seed and
//! the entity id, so a given [`DemoSpec`] always yields the same warehouse.

use serde::{Deserialize, Serialize};

use crate::layout::{self, LayoutConfig, RowSpec, UnitSpec};
use crate::model::{
    AisleColumn, BinSlot, OccupancyAggregate, OccupancyStatus, ShelfLevel, Telemetry,
};

const ISSUES: [&str; 4] = [
    "Damaged upright, inspection pending",
    "Temperature excursion reported",
    "Overloaded beam",
    "Blocked access",
];

/// Shape of the generated warehouse.
///
/// Ids are nested decimally (`aisle * 1000 + unit`, `unit * 100 + level`,
/// `level * 100 + bin`). A stride widens by powers of ten once a count
/// reaches it, so ids stay unique for any shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSpec {
    pub seed: u64,
    pub aisles: usize,
    pub units_per_aisle: usize,
    pub levels_per_unit: usize,
    pub bins_per_level: usize,
}

impl Default for DemoSpec {
    fn default() -> Self {
        Self {
            seed: 7,
            aisles: 6,
            units_per_aisle: 12,
            levels_per_unit: 4,
            bins_per_level: 3,
        }
    }
}

pub fn generate(spec: &DemoSpec, config: &LayoutConfig) -> Vec<AisleColumn> {
    layout::generate(rows(spec), config)
}

/// Unplaced rows, one per aisle.
pub fn rows(spec: &DemoSpec) -> Vec<RowSpec> {
    let strides = Strides::for_spec(spec);
    (0..spec.aisles)
        .map(|aisle| {
            let row_id = aisle as u64 + 1;
            let name = aisle_name(aisle);
            let units = (0..spec.units_per_aisle)
                .map(|slot| {
                    let id = row_id * strides.unit + slot as u64 + 1;
                    demo_unit(spec, &strides, id, &name, slot)
                })
                .collect();
            RowSpec::new(row_id, name, units)
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Strides {
    unit: u64,
    level: u64,
    bin: u64,
}

impl Strides {
    fn for_spec(spec: &DemoSpec) -> Self {
        Self {
            unit: stride(spec.units_per_aisle, 1_000),
            level: stride(spec.levels_per_unit, 100),
            bin: stride(spec.bins_per_level, 100),
        }
    }
}

/// Smallest power of ten, starting at `floor`, that exceeds `count`.
fn stride(count: usize, floor: u64) -> u64 {
    let count = count as u64;
    let mut stride = floor;
    while stride <= count {
        stride = stride.saturating_mul(10);
    }
    stride
}

fn demo_unit(
    spec: &DemoSpec,
    strides: &Strides,
    id: u64,
    aisle: &str,
    slot: usize,
) -> UnitSpec {
    let hash = digest(spec.seed, b"unit", id);
    let status = pick_status(hash[0]);

    let levels: Vec<ShelfLevel> = (0..spec.levels_per_unit)
        .map(|level| {
            let level_id = id * strides.level + level as u64 + 1;
            let bins = (0..spec.bins_per_level)
                .map(|bin| demo_bin(spec, level_id * strides.bin + bin as u64 + 1, status))
                .collect();
            ShelfLevel {
                id: level_id,
                label: format!("L{}", level + 1),
                bins,
            }
        })
        .collect();
    let occupancy = levels
        .iter()
        .flat_map(|level| level.bins.iter())
        .fold(OccupancyAggregate::empty(), |acc, bin| acc + bin.occupancy);

    let telemetry = (hash[1] % 3 == 0).then(|| Telemetry {
        temperature_c: 2.0 + f64::from(hash[2]) / 255.0 * 6.0,
        humidity_pct: 30.0 + f64::from(hash[3]) / 255.0 * 40.0,
    });
    let issue = (status == OccupancyStatus::Critical)
        .then(|| ISSUES[usize::from(hash[4]) % ISSUES.len()].to_string());

    UnitSpec {
        occupancy,
        telemetry,
        levels,
        issue,
        ..UnitSpec::new(id, format!("{aisle}-{:02}", slot + 1), status)
    }
}

fn demo_bin(spec: &DemoSpec, id: u64, unit_status: OccupancyStatus) -> BinSlot {
    let hash = digest(spec.seed, b"bin", id);
    let status = match unit_status {
        OccupancyStatus::Empty => OccupancyStatus::Empty,
        OccupancyStatus::Reserved => OccupancyStatus::Reserved,
        _ => pick_status(hash[0]),
    };
    let occupancy = match status {
        OccupancyStatus::Empty => OccupancyAggregate::empty(),
        _ => {
            let items = u32::from(hash[1] % 8) + 1;
            let quantity = f64::from(u16::from_le_bytes([hash[2], hash[3]]) % 500);
            OccupancyAggregate::new(items, quantity, true)
        }
    };
    BinSlot {
        id,
        label: format!("B{id}"),
        status,
        occupancy,
    }
}

fn pick_status(byte: u8) -> OccupancyStatus {
    match byte % 100 {
        0..20 => OccupancyStatus::Empty,
        20..55 => OccupancyStatus::Partial,
        55..80 => OccupancyStatus::Full,
        80..90 => OccupancyStatus::Reserved,
        _ => OccupancyStatus::Critical,
    }
}

fn digest(seed: u64, tag: &[u8], id: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(tag);
    hasher.update(&id.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// Spreadsheet-style aisle names: A..Z, AA, AB, ...
fn aisle_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
