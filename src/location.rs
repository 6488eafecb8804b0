//! Backend location hierarchy and its projection into layout rows.
//!
//! The tree arrives as JSON (warehouse → row → bay → level → bin). Nodes are
//! read-only here; the projection tolerates missing tags, missing children
//! and missing aggregates by defaulting rather than failing.

use serde::{Deserialize, Serialize};

use crate::layout::{RowSpec, UnitSpec};
use crate::model::{BinSlot, OccupancyAggregate, ShelfLevel};
use crate::status::{StatusThresholds, classify};

/// Granularity tag carried by a location node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Warehouse,
    Row,
    Bay,
    Level,
    Bin,
    #[serde(other)]
    Unknown,
}

impl LocationKind {
    /// Kind implied by the distance from the warehouse root.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Warehouse,
            1 => Self::Row,
            2 => Self::Bay,
            3 => Self::Level,
            _ => Self::Bin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LocationKind>,
    #[serde(default)]
    pub children: Vec<LocationNode>,
    #[serde(default)]
    pub item_count: u32,
    #[serde(default)]
    pub total_quantity: f64,
    /// Backend stock flag. When absent it follows the counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_stock: Option<bool>,
}

impl LocationNode {
    pub fn new(id: u64, name: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind: Some(kind),
            children: Vec::new(),
            item_count: 0,
            total_quantity: 0.0,
            has_stock: None,
        }
    }

    pub fn with_children(mut self, children: Vec<LocationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_stock(mut self, item_count: u32, total_quantity: f64) -> Self {
        self.item_count = item_count;
        self.total_quantity = total_quantity;
        self.has_stock = None;
        self
    }

    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    pub fn occupancy(&self) -> OccupancyAggregate {
        let has_stock = self
            .has_stock
            .unwrap_or(self.item_count > 0 || self.total_quantity > 0.0);
        OccupancyAggregate::new(self.item_count, self.total_quantity, has_stock)
    }

    /// Childless node that is tagged as a bin or carries no usable tag.
    /// Tagged levels and bays without children stay what they claim to be.
    fn is_bin_leaf(&self) -> bool {
        self.children.is_empty()
            && matches!(
                self.kind,
                None | Some(LocationKind::Bin) | Some(LocationKind::Unknown)
            )
    }

    /// Explicit tag when it is recognised, otherwise the depth-implied kind.
    pub fn kind_at(&self, depth: usize) -> LocationKind {
        match self.kind {
            Some(kind) if kind != LocationKind::Unknown => kind,
            _ => LocationKind::from_depth(depth),
        }
    }
}

/// Flatten the tree into rows of placeable units, in document order.
pub fn project(root: &LocationNode, thresholds: &StatusThresholds) -> Vec<RowSpec> {
    let mut rows = Vec::new();
    collect_rows(root, 0, thresholds, &mut rows);
    rows
}

fn collect_rows(
    node: &LocationNode,
    depth: usize,
    thresholds: &StatusThresholds,
    rows: &mut Vec<RowSpec>,
) {
    match node.kind_at(depth) {
        LocationKind::Row => rows.push(project_row(node, thresholds)),
        LocationKind::Warehouse => {
            for child in &node.children {
                collect_rows(child, depth + 1, thresholds, rows);
            }
        }
        // Bays or bins hanging off the warehouse have no row to live in.
        _ => {}
    }
}

fn project_row(row: &LocationNode, thresholds: &StatusThresholds) -> RowSpec {
    let units = row
        .children
        .iter()
        .map(|child| project_unit(child, thresholds))
        .collect();
    RowSpec::new(row.id, row.name.clone(), units)
}

fn project_unit(node: &LocationNode, thresholds: &StatusThresholds) -> UnitSpec {
    let mut levels = Vec::new();
    let mut loose_bins = Vec::new();

    if node.is_bin_leaf() {
        loose_bins.push(bin_slot(node, thresholds));
    }
    for child in &node.children {
        if child.kind == Some(LocationKind::Bin) || child.is_bin_leaf() {
            loose_bins.push(bin_slot(child, thresholds));
        } else {
            let mut bins = Vec::new();
            collect_bins(child, thresholds, &mut bins);
            levels.push(ShelfLevel {
                id: child.id,
                label: child.name.clone(),
                bins,
            });
        }
    }
    if !loose_bins.is_empty() {
        levels.push(ShelfLevel {
            id: node.id,
            label: node.name.clone(),
            bins: loose_bins,
        });
    }

    let occupancy = levels
        .iter()
        .flat_map(|level| level.bins.iter())
        .fold(OccupancyAggregate::empty(), |acc, bin| acc + bin.occupancy);

    UnitSpec {
        levels,
        occupancy,
        ..UnitSpec::new(node.id, node.name.clone(), classify(&occupancy, thresholds))
    }
}

/// Leaves under a level are its bins; intermediate nodes are looked through.
fn collect_bins(node: &LocationNode, thresholds: &StatusThresholds, bins: &mut Vec<BinSlot>) {
    if node.children.is_empty() {
        if node.is_bin_leaf() {
            bins.push(bin_slot(node, thresholds));
        }
        return;
    }
    for child in &node.children {
        collect_bins(child, thresholds, bins);
    }
}

fn bin_slot(node: &LocationNode, thresholds: &StatusThresholds) -> BinSlot {
    let occupancy = node.occupancy();
    BinSlot {
        id: node.id,
        label: node.name.clone(),
        status: classify(&occupancy, thresholds),
        occupancy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OccupancyStatus;

    fn bin(id: u64, items: u32, qty: f64) -> LocationNode {
        LocationNode::new(id, format!("BIN-{id}"), LocationKind::Bin).with_stock(items, qty)
    }

    fn sample() -> LocationNode {
        let bay = LocationNode::new(20, "A-01", LocationKind::Bay).with_children(vec![
            LocationNode::new(30, "A-01-1", LocationKind::Level)
                .with_children(vec![bin(40, 3, 60.0), bin(41, 0, 0.0)]),
            LocationNode::new(31, "A-01-2", LocationKind::Level)
                .with_children(vec![bin(42, 4, 50.0)]),
        ]);
        LocationNode::new(1, "WH", LocationKind::Warehouse).with_children(vec![
            LocationNode::new(10, "A", LocationKind::Row).with_children(vec![bay]),
            LocationNode::new(11, "B", LocationKind::Row),
        ])
    }

    #[test]
    fn bays_become_units_with_levels_and_bins() {
        let rows = project(&sample(), &StatusThresholds::default());
        assert_eq!(rows.len(), 2);
        assert!(rows[1].units.is_empty());

        let unit = &rows[0].units[0];
        assert_eq!(unit.id, 20);
        assert_eq!(unit.levels.len(), 2);
        assert_eq!(unit.levels[0].bins.len(), 2);
        assert_eq!(unit.occupancy, OccupancyAggregate::new(7, 110.0, true));
        assert_eq!(unit.status, OccupancyStatus::Full);
        assert_eq!(unit.levels[0].bins[1].status, OccupancyStatus::Empty);
    }

    #[test]
    fn bins_directly_under_a_row_become_units() {
        let root = LocationNode::new(1, "WH", LocationKind::Warehouse).with_children(vec![
            LocationNode::new(10, "A", LocationKind::Row)
                .with_children(vec![bin(40, 1, 1.0), bin(41, 0, 0.0)]),
        ]);
        let rows = project(&root, &StatusThresholds::default());
        let units = &rows[0].units;
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].levels[0].bins[0].id, 40);
        assert_eq!(units[0].status, OccupancyStatus::Partial);
        assert_eq!(units[1].status, OccupancyStatus::Empty);
    }

    #[test]
    fn untagged_nodes_infer_kind_from_depth() {
        let payload = r#"{
            "id": 1, "name": "WH",
            "children": [
                {"id": 10, "name": "A", "children": [
                    {"id": 20, "name": "A-01", "type": "shelf", "children": [
                        {"id": 30, "name": "L1", "children": [
                            {"id": 40, "name": "B1", "item_count": 2, "total_quantity": 8, "has_stock": true}
                        ]}
                    ]}
                ]}
            ]
        }"#;
        let root = LocationNode::from_json(payload).unwrap();
        assert_eq!(root.children[0].children[0].kind, Some(LocationKind::Unknown));
        assert_eq!(root.children[0].kind_at(1), LocationKind::Row);

        let rows = project(&root, &StatusThresholds::default());
        assert_eq!(rows[0].units[0].levels[0].bins[0].id, 40);
        assert_eq!(rows[0].units[0].status, OccupancyStatus::Partial);
    }

    #[test]
    fn childless_levels_stay_empty_levels() {
        let bay = LocationNode::new(20, "A-01", LocationKind::Bay).with_children(vec![
            LocationNode::new(30, "A-01-1", LocationKind::Level)
                .with_children(vec![bin(40, 1, 1.0)]),
            LocationNode::new(31, "A-01-2", LocationKind::Level),
        ]);
        let root = LocationNode::new(1, "WH", LocationKind::Warehouse).with_children(vec![
            LocationNode::new(10, "A", LocationKind::Row)
                .with_children(vec![bay, LocationNode::new(21, "A-02", LocationKind::Bay)]),
        ]);
        let rows = project(&root, &StatusThresholds::default());
        let units = &rows[0].units;

        let levels: Vec<(u64, Vec<u64>)> = units[0]
            .levels
            .iter()
            .map(|level| (level.id, level.bins.iter().map(|bin| bin.id).collect()))
            .collect();
        assert_eq!(levels, vec![(30, vec![40]), (31, vec![])]);

        assert_eq!(units[1].id, 21);
        assert!(units[1].levels.is_empty());
        assert_eq!(units[1].status, OccupancyStatus::Empty);
    }

    #[test]
    fn missing_stock_flag_follows_counts() {
        let payload = r#"{"id": 40, "name": "B1", "type": "bin", "item_count": 6, "total_quantity": 12}"#;
        let node = LocationNode::from_json(payload).unwrap();
        assert_eq!(node.has_stock, None);
        assert_eq!(node.occupancy(), OccupancyAggregate::new(6, 12.0, true));

        let flagged = r#"{"id": 41, "item_count": 0, "total_quantity": 0, "has_stock": true}"#;
        assert!(LocationNode::from_json(flagged).unwrap().occupancy().has_stock);
        assert!(!LocationNode::from_json(r#"{"id": 42}"#).unwrap().occupancy().has_stock);
    }

    #[test]
    fn stray_nodes_under_warehouse_are_skipped() {
        let root = LocationNode::new(1, "WH", LocationKind::Warehouse)
            .with_children(vec![bin(5, 1, 1.0)]);
        assert!(project(&root, &StatusThresholds::default()).is_empty());
    }
}
