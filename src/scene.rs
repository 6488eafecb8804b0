//! Screen-space draw list handed to the rendering layer.

use serde::Serialize;

use crate::geometry::{Point, Rect, Size};
use crate::model::{AisleColumn, ColumnId, OccupancyStatus, UnitId};
use crate::selection::SelectionModel;
use crate::viewport::{Viewport, ViewportState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSprite {
    pub unit_id: UnitId,
    pub label: String,
    pub status: OccupancyStatus,
    pub screen: Rect,
    pub selected: bool,
    pub hovered: bool,
    pub has_issue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLabel {
    pub column_id: ColumnId,
    pub label: String,
    /// Screen position of the column's first unit corner.
    pub anchor: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub viewport: ViewportState,
    pub sprites: Vec<UnitSprite>,
    pub labels: Vec<ColumnLabel>,
}

/// Cull to the visible world rect and project what remains to screen space.
///
/// `column_bounds` runs parallel to `columns`; a `None` entry marks an empty
/// column and is skipped.
pub fn build(
    columns: &[AisleColumn],
    column_bounds: &[Option<Rect>],
    viewport: &Viewport,
    selection: &SelectionModel,
    screen: Size,
) -> Scene {
    let visible = viewport.visible_world(screen);
    let selected = selection.selected_unit();
    let hovered = selection.hovered();

    let mut sprites = Vec::new();
    let mut labels = Vec::new();
    for (column, bounds) in columns.iter().zip(column_bounds) {
        let Some(bounds) = bounds else { continue };
        if !bounds.intersects(&visible) {
            continue;
        }
        labels.push(ColumnLabel {
            column_id: column.id,
            label: column.label.clone(),
            anchor: viewport.world_to_screen(column.origin),
        });
        sprites.extend(
            column
                .units
                .iter()
                .filter(|unit| unit.rect.intersects(&visible))
                .map(|unit| UnitSprite {
                    unit_id: unit.id,
                    label: unit.label.clone(),
                    status: unit.status,
                    screen: viewport.rect_to_screen(&unit.rect),
                    selected: selected == Some(unit.id),
                    hovered: hovered == Some(unit.id),
                    has_issue: unit.issue.is_some(),
                }),
        );
    }

    Scene {
        viewport: viewport.state(),
        sprites,
        labels,
    }
}
