//! Drill-down selection state: rack → levels → bin → items.
//!
//! Each bin lookup is issued as a [`BinFetchRequest`] tagged with a request
//! generation. Only the newest request may land; anything older is reported
//! as stale and leaves the state alone.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{BinId, BinItem, LevelId, UnitId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no storage unit is selected")]
    NoUnitSelected,
    #[error("no bin is selected")]
    NoBinSelected,
}

/// Failure reported by the host when a bin item lookup does not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bin item fetch failed: {reason}")]
pub struct FetchError {
    pub reason: String,
}

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Ticket handed to the host for one bin item lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinFetchRequest {
    pub generation: u64,
    pub unit_id: UnitId,
    pub bin_id: BinId,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { item_count: usize },
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrillDown {
    Idle,
    UnitSelected {
        unit_id: UnitId,
    },
    BinSelected {
        unit_id: UnitId,
        bin_id: BinId,
    },
    ItemsLoaded {
        unit_id: UnitId,
        bin_id: BinId,
        items: Vec<BinItem>,
        error: Option<FetchError>,
    },
}

#[derive(Debug, Clone)]
pub struct SelectionModel {
    state: DrillDown,
    expanded_levels: BTreeSet<LevelId>,
    hovered: Option<UnitId>,
    generation: u64,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    pub fn new() -> Self {
        Self {
            state: DrillDown::Idle,
            expanded_levels: BTreeSet::new(),
            hovered: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &DrillDown {
        &self.state
    }

    pub fn selected_unit(&self) -> Option<UnitId> {
        match &self.state {
            DrillDown::Idle => None,
            DrillDown::UnitSelected { unit_id }
            | DrillDown::BinSelected { unit_id, .. }
            | DrillDown::ItemsLoaded { unit_id, .. } => Some(*unit_id),
        }
    }

    pub fn selected_bin(&self) -> Option<BinId> {
        match &self.state {
            DrillDown::BinSelected { bin_id, .. } | DrillDown::ItemsLoaded { bin_id, .. } => {
                Some(*bin_id)
            }
            _ => None,
        }
    }

    /// True while a bin lookup is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, DrillDown::BinSelected { .. })
    }

    pub fn items(&self) -> &[BinItem] {
        match &self.state {
            DrillDown::ItemsLoaded { items, .. } => items,
            _ => &[],
        }
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        match &self.state {
            DrillDown::ItemsLoaded { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    pub fn expanded_levels(&self) -> &BTreeSet<LevelId> {
        &self.expanded_levels
    }

    pub fn is_expanded(&self, level_id: LevelId) -> bool {
        self.expanded_levels.contains(&level_id)
    }

    pub fn hovered(&self) -> Option<UnitId> {
        self.hovered
    }

    pub fn hover(&mut self, unit_id: Option<UnitId>) {
        self.hovered = unit_id;
    }

    /// Open the detail panel for a unit, dropping expansion and items.
    pub fn select_unit(&mut self, unit_id: UnitId) {
        self.generation += 1;
        self.expanded_levels.clear();
        self.state = DrillDown::UnitSelected { unit_id };
    }

    /// Flip a level's membership in the expanded set. Returns the new membership.
    pub fn toggle_level(&mut self, level_id: LevelId) -> Result<bool, SelectionError> {
        if self.selected_unit().is_none() {
            return Err(SelectionError::NoUnitSelected);
        }
        if self.expanded_levels.remove(&level_id) {
            Ok(false)
        } else {
            self.expanded_levels.insert(level_id);
            Ok(true)
        }
    }

    /// Start loading a bin's contents. Reselecting a bin is the retry path.
    pub fn select_bin(&mut self, bin_id: BinId) -> Result<BinFetchRequest, SelectionError> {
        let unit_id = self.selected_unit().ok_or(SelectionError::NoUnitSelected)?;
        self.generation += 1;
        self.state = DrillDown::BinSelected { unit_id, bin_id };
        Ok(BinFetchRequest {
            generation: self.generation,
            unit_id,
            bin_id,
        })
    }

    pub fn complete_fetch(
        &mut self,
        request: BinFetchRequest,
        result: Result<Vec<BinItem>, FetchError>,
    ) -> FetchOutcome {
        let current = matches!(
            self.state,
            DrillDown::BinSelected { unit_id, bin_id }
                if unit_id == request.unit_id && bin_id == request.bin_id
        );
        if !current || request.generation != self.generation {
            return FetchOutcome::Stale;
        }

        let (items, error, outcome) = match result {
            Ok(items) => {
                let outcome = FetchOutcome::Applied {
                    item_count: items.len(),
                };
                (items, None, outcome)
            }
            Err(err) => (Vec::new(), Some(err), FetchOutcome::Failed),
        };
        self.state = DrillDown::ItemsLoaded {
            unit_id: request.unit_id,
            bin_id: request.bin_id,
            items,
            error,
        };
        outcome
    }

    /// Leave the bin view and return to the unit's level list.
    pub fn back(&mut self) -> Result<(), SelectionError> {
        match self.state {
            DrillDown::BinSelected { unit_id, .. } | DrillDown::ItemsLoaded { unit_id, .. } => {
                self.generation += 1;
                self.state = DrillDown::UnitSelected { unit_id };
                Ok(())
            }
            DrillDown::UnitSelected { .. } => Err(SelectionError::NoBinSelected),
            DrillDown::Idle => Err(SelectionError::NoUnitSelected),
        }
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.expanded_levels.clear();
        self.state = DrillDown::Idle;
    }

    /// Drop everything, hover included. Used when the dataset is replaced.
    pub fn clear(&mut self) {
        self.close();
        self.hovered = None;
    }
}
