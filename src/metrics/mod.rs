use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::Value;

/// Running counters for one map session.
#[derive(Debug, Default, Clone)]
pub struct MapMetrics {
    datasets: u64,
    units_placed: u64,
    duplicate_units: u64,
    zoom_gestures: u64,
    pan_gestures: u64,
    selections: u64,
    fetches_started: u64,
    fetches_failed: u64,
    stale_responses: u64,
}

impl MapMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dataset(&mut self, units: usize) {
        self.datasets = self.datasets.saturating_add(1);
        self.units_placed = self.units_placed.saturating_add(units as u64);
    }

    pub fn record_duplicates(&mut self, count: usize) {
        self.duplicate_units = self.duplicate_units.saturating_add(count as u64);
    }

    pub fn record_zoom(&mut self) {
        self.zoom_gestures = self.zoom_gestures.saturating_add(1);
    }

    pub fn record_pan(&mut self) {
        self.pan_gestures = self.pan_gestures.saturating_add(1);
    }

    pub fn record_selection(&mut self) {
        self.selections = self.selections.saturating_add(1);
    }

    pub fn record_fetch_started(&mut self) {
        self.fetches_started = self.fetches_started.saturating_add(1);
    }

    pub fn record_fetch_failed(&mut self) {
        self.fetches_failed = self.fetches_failed.saturating_add(1);
    }

    pub fn record_stale(&mut self) {
        self.stale_responses = self.stale_responses.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            datasets: self.datasets,
            units_placed: self.units_placed,
            duplicate_units: self.duplicate_units,
            zoom_gestures: self.zoom_gestures,
            pan_gestures: self.pan_gestures,
            selections: self.selections,
            fetches_started: self.fetches_started,
            fetches_failed: self.fetches_failed,
            stale_responses: self.stale_responses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub datasets: u64,
    pub units_placed: u64,
    pub duplicate_units: u64,
    pub zoom_gestures: u64,
    pub pan_gestures: u64,
    pub selections: u64,
    pub fetches_started: u64,
    pub fetches_failed: u64,
    pub stale_responses: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => LogFields::new(),
        }
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "map_metrics", self.as_fields())
    }
}
