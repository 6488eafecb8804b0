//! Warehouse map engine: positions storage units on a 2D canvas and tracks
//! the pan/zoom transform and rack → level → bin drill-down over them.
//!
//! Input is the location hierarchy served by the ERP backend (or a seeded
//! demo warehouse); output is positioned aisle columns, a screen-space
//! [`Scene`], and the current viewport and selection state. Rendering and
//! HTTP stay with the host.

pub mod config;
pub mod controller;
pub mod demo;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod location;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod scene;
pub mod selection;
pub mod status;
pub mod viewport;

pub use config::{ConfigError, EngineConfig};
pub use controller::{BinContentSource, WarehouseMap};
pub use demo::DemoSpec;
pub use error::{MapError, Result};
pub use geometry::{Point, Rect, Size};
pub use layout::{LayoutConfig, RowSpec, UnitSpec};
pub use location::{LocationKind, LocationNode};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MapMetrics, MetricSnapshot};
pub use model::{
    AisleColumn, BinId, BinItem, BinSlot, ColumnId, LevelId, OccupancyAggregate, OccupancyStatus,
    Orientation, ShelfLevel, StorageUnit, Telemetry, UnitId,
};
pub use scene::{ColumnLabel, Scene, UnitSprite};
pub use selection::{
    BinFetchRequest, DrillDown, FetchError, FetchOutcome, SelectionError, SelectionModel,
};
pub use status::{StatusThresholds, classify};
pub use viewport::{Viewport, ViewportConfig, ViewportState};
