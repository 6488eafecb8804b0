//! Occupancy classification for aggregated stock signals.

use serde::{Deserialize, Serialize};

use crate::model::{OccupancyAggregate, OccupancyStatus};

/// Cut-offs separating `Partial` from `Full`.
///
/// A unit is `Full` when either the item count or the quantity reaches the
/// `full_*` bound. The `partial_*` bounds are kept so hosts can tune the
/// lower band, but anything stocked below `Full` lands in `Partial` anyway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub full_items: u32,
    pub full_quantity: f64,
    pub partial_items: u32,
    pub partial_quantity: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            full_items: 5,
            full_quantity: 100.0,
            partial_items: 2,
            partial_quantity: 20.0,
        }
    }
}

/// Map an aggregate to a status. Never yields `Critical` or `Reserved`;
/// those only come from fixture data.
pub fn classify(aggregate: &OccupancyAggregate, thresholds: &StatusThresholds) -> OccupancyStatus {
    if !aggregate.has_stock {
        return OccupancyStatus::Empty;
    }
    if aggregate.item_count >= thresholds.full_items
        || aggregate.total_quantity >= thresholds.full_quantity
    {
        return OccupancyStatus::Full;
    }
    // Both the partial band and the remainder resolve to Partial.
    OccupancyStatus::Partial
}
