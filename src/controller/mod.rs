//! The map controller: single owner of layout, viewport and selection state.
//!
//! Hosts hand it backend data and raw pointer gestures; it hands back
//! positioned units, the current transform, and bin lookup tickets. Nothing
//! here blocks or talks to the network.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde_json::{Value, json};

use crate::config::EngineConfig;
use crate::demo::{self, DemoSpec};
use crate::error::{MapError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::layout::{self, RowSpec};
use crate::location::{self, LocationNode};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::MapMetrics;
use crate::model::{AisleColumn, BinId, BinItem, BinSlot, LevelId, StorageUnit, UnitId};
use crate::scene::{self, Scene};
use crate::selection::{
    BinFetchRequest, FetchError, FetchOutcome, SelectionError, SelectionModel,
};
use crate::viewport::{Viewport, ViewportState};

const TARGET: &str = "warehouse_map::controller";

/// Item lookup for one bin, implemented by the host over its backend client.
pub trait BinContentSource {
    fn fetch_items(
        &self,
        unit: &StorageUnit,
        bin: &BinSlot,
    ) -> std::result::Result<Vec<BinItem>, FetchError>;
}

#[derive(Debug)]
pub struct WarehouseMap {
    config: EngineConfig,
    columns: Vec<AisleColumn>,
    column_bounds: Vec<Option<Rect>>,
    index: HashMap<UnitId, (usize, usize)>,
    viewport: Viewport,
    selection: SelectionModel,
    logger: Option<Logger>,
    metrics: MapMetrics,
    drag_moved: bool,
}

impl WarehouseMap {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            columns: Vec::new(),
            column_bounds: Vec::new(),
            index: HashMap::new(),
            viewport: Viewport::new(config.viewport)?,
            selection: SelectionModel::new(),
            logger: None,
            metrics: MapMetrics::new(),
            drag_moved: false,
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn columns(&self) -> &[AisleColumn] {
        &self.columns
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn metrics(&self) -> &MapMetrics {
        &self.metrics
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&StorageUnit> {
        let (column, slot) = *self.index.get(&unit_id)?;
        self.columns.get(column)?.units.get(slot)
    }

    pub fn selected_unit(&self) -> Option<&StorageUnit> {
        self.selection.selected_unit().and_then(|id| self.unit(id))
    }

    /// World rectangle covering every placed unit.
    pub fn bounds(&self) -> Option<Rect> {
        self.column_bounds
            .iter()
            .flatten()
            .copied()
            .reduce(|acc, rect| acc.union(&rect))
    }

    pub fn unit_count(&self) -> usize {
        self.index.len()
    }

    // --- Dataset loading ---

    /// Project a backend location tree and make it the displayed dataset.
    pub fn load_locations(&mut self, root: &LocationNode) -> usize {
        let rows = location::project(root, &self.config.thresholds);
        self.load_rows(rows)
    }

    pub fn load_locations_json(&mut self, payload: &str) -> Result<usize> {
        let root = LocationNode::from_json(payload)?;
        Ok(self.load_locations(&root))
    }

    pub fn load_demo(&mut self, spec: &DemoSpec) -> usize {
        self.load_rows(demo::rows(spec))
    }

    pub fn load_rows(&mut self, rows: Vec<RowSpec>) -> usize {
        let columns = layout::generate(rows, &self.config.layout);
        self.load_columns(columns)
    }

    /// Replace the dataset with already-positioned columns.
    ///
    /// The viewport returns to its initial transform and the selection is
    /// dropped, since ids from the previous dataset may no longer exist.
    pub fn load_columns(&mut self, columns: Vec<AisleColumn>) -> usize {
        self.column_bounds = columns.iter().map(AisleColumn::bounds).collect();
        let mut index = HashMap::new();
        let mut duplicates = Vec::new();
        for (col, column) in columns.iter().enumerate() {
            for (slot, unit) in column.units.iter().enumerate() {
                // First placement wins; later ones stay drawn but unaddressable.
                match index.entry(unit.id) {
                    Entry::Vacant(entry) => {
                        entry.insert((col, slot));
                    }
                    Entry::Occupied(_) => duplicates.push(unit.id),
                }
            }
        }
        self.index = index;
        self.columns = columns;

        self.viewport.reset();
        self.drag_moved = false;
        self.selection.clear();

        let units = self.unit_count();
        self.metrics.record_dataset(units);
        if !duplicates.is_empty() {
            self.metrics.record_duplicates(duplicates.len());
            self.log(
                LogLevel::Warn,
                "duplicate_unit_ids",
                [
                    json_kv("count", duplicates.len()),
                    json_kv("unit_ids", duplicates),
                ],
            );
        }
        self.log(
            LogLevel::Info,
            "dataset_loaded",
            [
                json_kv("columns", self.columns.len()),
                json_kv("units", units),
            ],
        );
        self.log(
            LogLevel::Debug,
            "viewport_reset",
            [json_kv("viewport", viewport_json(self.viewport.state()))],
        );
        units
    }

    // --- Viewport gestures ---

    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, delta_scale: f64) -> ViewportState {
        let before = self.viewport.state();
        self.viewport.zoom_at(screen_x, screen_y, delta_scale);
        let after = self.viewport.state();
        if after != before {
            self.metrics.record_zoom();
        }
        after
    }

    pub fn begin_drag(&mut self, screen: Point) {
        self.viewport.begin_drag(screen);
        self.drag_moved = false;
    }

    /// Follow a held drag. A drag counts as one pan once it first moves.
    pub fn drag_to(&mut self, screen: Point) -> bool {
        let before = self.viewport.state();
        let panned = self.viewport.drag_to(screen);
        if panned && !self.drag_moved && self.viewport.state() != before {
            self.drag_moved = true;
            self.metrics.record_pan();
        }
        panned
    }

    pub fn end_drag(&mut self) {
        self.viewport.end_drag();
    }

    /// Zoom and centre so the whole dataset fits on screen.
    pub fn fit_to_screen(&mut self, screen: Size, padding: f64) {
        if let Some(bounds) = self.bounds() {
            self.viewport.fit_to(&bounds, screen, padding);
        }
    }

    // --- Hit testing ---

    pub fn hit_test(&self, screen: Point) -> Option<&StorageUnit> {
        let world = self.viewport.screen_to_world(screen);
        self.columns
            .iter()
            .zip(&self.column_bounds)
            .filter(|(_, bounds)| bounds.is_some_and(|rect| rect.contains(world)))
            .find_map(|(column, _)| column.units.iter().find(|unit| unit.rect.contains(world)))
    }

    /// Select whatever unit sits under the cursor. Empty canvas is a no-op.
    pub fn click(&mut self, screen: Point) -> Option<UnitId> {
        let unit_id = self.hit_test(screen)?.id;
        self.select_known_unit(unit_id);
        Some(unit_id)
    }

    pub fn hover_at(&mut self, screen: Point) -> Option<UnitId> {
        let unit_id = self.hit_test(screen).map(|unit| unit.id);
        self.selection.hover(unit_id);
        unit_id
    }

    // --- Drill-down ---

    pub fn select_unit(&mut self, unit_id: UnitId) -> Result<()> {
        if !self.index.contains_key(&unit_id) {
            return Err(MapError::UnknownUnit(unit_id));
        }
        self.select_known_unit(unit_id);
        Ok(())
    }

    fn select_known_unit(&mut self, unit_id: UnitId) {
        self.selection.select_unit(unit_id);
        self.metrics.record_selection();
        self.log(LogLevel::Debug, "unit_selected", [json_kv("unit_id", unit_id)]);
    }

    pub fn toggle_level(&mut self, level_id: LevelId) -> Result<bool> {
        let unit = self.require_selected()?;
        if unit.level(level_id).is_none() {
            return Err(MapError::UnknownLevel {
                unit: unit.id,
                level: level_id,
            });
        }
        Ok(self.selection.toggle_level(level_id)?)
    }

    /// Mark a bin as loading and hand out the ticket for its item lookup.
    pub fn select_bin(&mut self, bin_id: BinId) -> Result<BinFetchRequest> {
        let unit = self.require_selected()?;
        if unit.bin(bin_id).is_none() {
            return Err(MapError::UnknownBin {
                unit: unit.id,
                bin: bin_id,
            });
        }
        let request = self.selection.select_bin(bin_id)?;
        self.metrics.record_fetch_started();
        self.log(
            LogLevel::Debug,
            "bin_fetch_started",
            [
                json_kv("unit_id", request.unit_id),
                json_kv("bin_id", request.bin_id),
                json_kv("generation", request.generation),
            ],
        );
        Ok(request)
    }

    pub fn complete_bin_fetch(
        &mut self,
        request: BinFetchRequest,
        result: std::result::Result<Vec<BinItem>, FetchError>,
    ) -> FetchOutcome {
        let reason = result.as_ref().err().map(|err| err.reason.clone());
        let outcome = self.selection.complete_fetch(request, result);
        let ids = [
            json_kv("unit_id", request.unit_id),
            json_kv("bin_id", request.bin_id),
        ];
        match outcome {
            FetchOutcome::Applied { item_count } => {
                self.log(
                    LogLevel::Debug,
                    "bin_items_loaded",
                    ids.into_iter().chain([json_kv("items", item_count)]),
                );
            }
            FetchOutcome::Failed => {
                self.metrics.record_fetch_failed();
                self.log(
                    LogLevel::Warn,
                    "bin_fetch_failed",
                    ids.into_iter()
                        .chain([json_kv("reason", reason.unwrap_or_default())]),
                );
            }
            FetchOutcome::Stale => {
                self.metrics.record_stale();
                self.log(
                    LogLevel::Debug,
                    "stale_response_dropped",
                    ids.into_iter()
                        .chain([json_kv("generation", request.generation)]),
                );
            }
        }
        outcome
    }

    /// Select a bin and resolve its items synchronously through `source`.
    pub fn fetch_bin_items(
        &mut self,
        source: &dyn BinContentSource,
        bin_id: BinId,
    ) -> Result<FetchOutcome> {
        let request = self.select_bin(bin_id)?;
        let result = {
            let unit = self.require_selected()?;
            match unit.bin(bin_id) {
                Some(bin) => source.fetch_items(unit, bin),
                None => Err(FetchError::new("bin vanished from the selected unit")),
            }
        };
        Ok(self.complete_bin_fetch(request, result))
    }

    pub fn back(&mut self) -> Result<()> {
        Ok(self.selection.back()?)
    }

    pub fn close(&mut self) {
        self.selection.close();
    }

    // --- Output ---

    pub fn scene(&self, screen: Size) -> Scene {
        scene::build(
            &self.columns,
            &self.column_bounds,
            &self.viewport,
            &self.selection,
            screen,
        )
    }

    pub fn emit_metrics(&self) {
        if let Some(logger) = self.logger.as_ref() {
            let event = self.metrics.snapshot().to_log_event("warehouse_map::metrics");
            let _ = logger.log_event(event);
        }
    }

    fn require_selected(&self) -> Result<&StorageUnit> {
        let unit_id = self
            .selection
            .selected_unit()
            .ok_or(SelectionError::NoUnitSelected)?;
        self.unit(unit_id).ok_or(MapError::UnknownUnit(unit_id))
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

fn viewport_json(state: ViewportState) -> Value {
    json!({ "scale": state.scale, "x": state.pan_x, "y": state.pan_y })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::layout::UnitSpec;
    use crate::location::LocationKind;
    use crate::logging::MemorySink;
    use crate::model::{OccupancyStatus, Orientation};
    use crate::selection::DrillDown;

    struct StubSource {
        fail: bool,
    }

    impl BinContentSource for StubSource {
        fn fetch_items(
            &self,
            _unit: &StorageUnit,
            bin: &BinSlot,
        ) -> std::result::Result<Vec<BinItem>, FetchError> {
            if self.fail {
                return Err(FetchError::new("backend returned 502"));
            }
            Ok(vec![BinItem::new(format!("SKU-{}", bin.id), 12.0)])
        }
    }

    fn bin(id: u64, items: u32) -> LocationNode {
        LocationNode::new(id, format!("BIN-{id}"), LocationKind::Bin).with_stock(items, items as f64)
    }

    fn rack(id: u64) -> LocationNode {
        LocationNode::new(id, format!("RACK-{id}"), LocationKind::Bay).with_children(vec![
            LocationNode::new(id * 10, "L1", LocationKind::Level)
                .with_children(vec![bin(id * 100, 1), bin(id * 100 + 1, 6)]),
            LocationNode::new(id * 10 + 1, "L2", LocationKind::Level)
                .with_children(vec![bin(id * 100 + 2, 0)]),
        ])
    }

    fn warehouse() -> LocationNode {
        LocationNode::new(1, "WH1", LocationKind::Warehouse).with_children(vec![
            LocationNode::new(2, "A", LocationKind::Row).with_children(vec![rack(3), rack(4)]),
            LocationNode::new(5, "B", LocationKind::Row),
            LocationNode::new(6, "C", LocationKind::Row).with_children(vec![rack(7)]),
        ])
    }

    fn loaded_map() -> WarehouseMap {
        let mut map = WarehouseMap::new(EngineConfig::default()).unwrap();
        map.load_locations(&warehouse());
        map
    }

    fn centre_on_screen(map: &WarehouseMap, unit_id: UnitId) -> Point {
        let unit = map.unit(unit_id).unwrap();
        map.viewport().world_to_screen(unit.rect.center())
    }

    #[test]
    fn load_projects_rows_and_skips_empty_ones() {
        let map = loaded_map();
        assert_eq!(map.columns().len(), 2);
        assert_eq!(map.unit_count(), 3);
        assert_eq!(map.columns()[1].label, "C");
        assert_eq!(map.columns()[1].origin.x, 144.0);
        assert_eq!(map.columns()[0].orientation, Orientation::Vertical);
        assert_eq!(map.unit(3).unwrap().status, OccupancyStatus::Full);
    }

    #[test]
    fn dataset_switch_resets_viewport_and_selection() {
        let mut map = loaded_map();
        map.zoom_at(200.0, 200.0, 0.9);
        map.begin_drag(Point::new(0.0, 0.0));
        map.drag_to(Point::new(-300.0, 120.0));
        map.select_unit(3).unwrap();

        map.load_locations(&warehouse());

        assert_eq!(map.viewport().state(), ViewportState::new(0.6, 50.0, 50.0));
        assert!(!map.viewport().is_dragging());
        assert_eq!(map.selection().state(), &DrillDown::Idle);
    }

    #[test]
    fn hit_test_finds_unit_under_cursor_at_any_zoom() {
        let mut map = loaded_map();
        for delta in [0.0, 0.8, -0.3, 1.5] {
            map.zoom_at(310.0, 95.0, delta);
            for unit_id in [3, 4, 7] {
                let screen = centre_on_screen(&map, unit_id);
                assert_eq!(map.hit_test(screen).map(|u| u.id), Some(unit_id));
            }
        }
    }

    #[test]
    fn click_on_empty_canvas_changes_nothing() {
        let mut map = loaded_map();
        assert_eq!(map.click(Point::new(1.0, 1.0)), None);
        assert_eq!(map.selection().state(), &DrillDown::Idle);

        let screen = centre_on_screen(&map, 4);
        assert_eq!(map.click(screen), Some(4));
        assert_eq!(map.selected_unit().map(|u| u.id), Some(4));
    }

    #[test]
    fn hover_tracks_unit_under_cursor() {
        let mut map = loaded_map();
        let screen = centre_on_screen(&map, 7);
        assert_eq!(map.hover_at(screen), Some(7));
        assert_eq!(map.hover_at(Point::new(-500.0, -500.0)), None);
        assert_eq!(map.selection().hovered(), None);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut map = loaded_map();
        assert!(matches!(map.select_unit(999), Err(MapError::UnknownUnit(999))));
        assert!(matches!(
            map.select_bin(300),
            Err(MapError::Selection(SelectionError::NoUnitSelected))
        ));

        map.select_unit(3).unwrap();
        assert!(matches!(
            map.toggle_level(40),
            Err(MapError::UnknownLevel { unit: 3, level: 40 })
        ));
        assert!(matches!(
            map.select_bin(400),
            Err(MapError::UnknownBin { unit: 3, bin: 400 })
        ));
        assert!(map.toggle_level(30).unwrap());
    }

    #[test]
    fn fetch_through_source_loads_items() {
        let mut map = loaded_map();
        map.select_unit(3).unwrap();
        let outcome = map.fetch_bin_items(&StubSource { fail: false }, 301).unwrap();

        assert_eq!(outcome, FetchOutcome::Applied { item_count: 1 });
        assert_eq!(map.selection().items()[0].product, "SKU-301");
        map.back().unwrap();
        assert_eq!(map.selection().state(), &DrillDown::UnitSelected { unit_id: 3 });
    }

    #[test]
    fn failed_fetch_is_logged_and_counted() {
        let sink = Arc::new(MemorySink::new());
        let mut map = WarehouseMap::new(EngineConfig::default())
            .unwrap()
            .with_logger(Logger::from_arc(sink.clone()));
        map.load_locations(&warehouse());
        map.select_unit(7).unwrap();

        let outcome = map.fetch_bin_items(&StubSource { fail: true }, 700).unwrap();
        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(!map.selection().is_loading());
        assert!(map.selection().items().is_empty());

        let snapshot = map.metrics().snapshot();
        assert_eq!(snapshot.fetches_started, 1);
        assert_eq!(snapshot.fetches_failed, 1);

        let messages = sink.messages();
        assert!(messages.contains(&"dataset_loaded".to_string()));
        assert!(messages.contains(&"bin_fetch_failed".to_string()));
        let failure = sink
            .events()
            .into_iter()
            .find(|event| event.message == "bin_fetch_failed")
            .unwrap();
        assert_eq!(failure.level, LogLevel::Warn);
        assert_eq!(failure.fields["reason"], json!("backend returned 502"));
    }

    #[test]
    fn late_response_after_navigation_is_dropped() {
        let mut map = loaded_map();
        map.select_unit(3).unwrap();
        let request = map.select_bin(300).unwrap();
        map.select_unit(4).unwrap();

        let outcome = map.complete_bin_fetch(request, Ok(vec![BinItem::new("late", 1.0)]));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(map.selection().state(), &DrillDown::UnitSelected { unit_id: 4 });
        assert_eq!(map.metrics().snapshot().stale_responses, 1);
    }

    #[test]
    fn scene_culls_offscreen_units_and_flags_selection() {
        let mut map = loaded_map();
        map.select_unit(4).unwrap();

        let scene = map.scene(Size::new(1024.0, 768.0));
        assert_eq!(scene.sprites.len(), 3);
        assert_eq!(scene.labels.len(), 2);
        let selected: Vec<UnitId> = scene
            .sprites
            .iter()
            .filter(|sprite| sprite.selected)
            .map(|sprite| sprite.unit_id)
            .collect();
        assert_eq!(selected, vec![4]);

        // Unit 3 sits at world (100, 100); a 70px-tall screen only reaches world y ~33.
        let tiny = map.scene(Size::new(1024.0, 70.0));
        assert!(tiny.sprites.is_empty());
    }

    #[test]
    fn fit_to_screen_brings_everything_into_view() {
        let mut map = WarehouseMap::new(EngineConfig::default()).unwrap();
        map.load_demo(&DemoSpec::default());
        let screen = Size::new(800.0, 600.0);
        map.fit_to_screen(screen, 20.0);

        let visible = map.viewport().visible_world(screen);
        let bounds = map.bounds().unwrap();
        assert!(visible.x <= bounds.x && visible.y <= bounds.y);
        assert!(visible.right() >= bounds.right() && visible.bottom() >= bounds.bottom());
        assert_eq!(map.scene(screen).sprites.len(), map.unit_count());
    }

    #[test]
    fn json_payload_loads_and_reports_parse_errors() {
        let mut map = WarehouseMap::new(EngineConfig::default()).unwrap();
        let payload = serde_json::to_string(&warehouse()).unwrap();
        assert_eq!(map.load_locations_json(&payload).unwrap(), 3);
        assert!(matches!(
            map.load_locations_json("{\"name\": 1"),
            Err(MapError::Payload(_))
        ));
    }

    #[test]
    fn duplicate_unit_ids_are_reported_not_merged() {
        let sink = Arc::new(MemorySink::new());
        let mut map = WarehouseMap::new(EngineConfig::default())
            .unwrap()
            .with_logger(Logger::from_arc(sink.clone()));
        let rows = vec![
            RowSpec::new(1, "A", vec![UnitSpec::new(10, "A-01", OccupancyStatus::Empty)]),
            RowSpec::new(2, "B", vec![UnitSpec::new(10, "B-01", OccupancyStatus::Full)]),
        ];
        assert_eq!(map.load_rows(rows), 1);
        assert_eq!(map.unit(10).map(|u| u.label.as_str()), Some("A-01"));
        assert_eq!(map.metrics().snapshot().duplicate_units, 1);

        let warning = sink
            .events()
            .into_iter()
            .find(|event| event.message == "duplicate_unit_ids")
            .unwrap();
        assert_eq!(warning.level, LogLevel::Warn);
        assert_eq!(warning.fields["unit_ids"], json!([10]));
    }

    #[test]
    fn oversized_demo_keeps_every_unit_clickable() {
        let mut map = WarehouseMap::new(EngineConfig::default()).unwrap();
        let spec = DemoSpec {
            aisles: 2,
            units_per_aisle: 1_001,
            levels_per_unit: 1,
            bins_per_level: 1,
            ..DemoSpec::default()
        };
        assert_eq!(map.load_demo(&spec), 2_002);
        assert_eq!(map.metrics().snapshot().duplicate_units, 0);

        let last = map.columns()[0].units[1_000].id;
        let screen = centre_on_screen(&map, last);
        assert_eq!(map.click(screen), Some(last));
        assert_eq!(map.selected_unit().map(|u| u.id), Some(last));
    }

    #[test]
    fn gesture_counters_ignore_no_op_gestures() {
        let mut map = loaded_map();
        map.zoom_at(100.0, 100.0, 100.0);
        map.zoom_at(100.0, 100.0, 1.0);
        map.zoom_at(100.0, 100.0, 0.0);
        assert_eq!(map.metrics().snapshot().zoom_gestures, 1);

        map.begin_drag(Point::new(10.0, 10.0));
        map.drag_to(Point::new(10.0, 10.0));
        map.end_drag();
        assert!(!map.drag_to(Point::new(40.0, 40.0)));
        assert_eq!(map.metrics().snapshot().pan_gestures, 0);

        map.begin_drag(Point::new(10.0, 10.0));
        map.drag_to(Point::new(20.0, 15.0));
        map.drag_to(Point::new(35.0, 15.0));
        map.end_drag();
        assert_eq!(map.metrics().snapshot().pan_gestures, 1);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = EngineConfig::default();
        config.viewport.min_zoom = 5.0;
        assert!(matches!(WarehouseMap::new(config), Err(MapError::Config(_))));
    }
}
