//! Pan/zoom transform between screen pixels and warehouse world units.
//!
//! `screen = world * scale + pan`. The state is ephemeral per view session
//! and is only mutated by gestures or an explicit reset.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::geometry::{Point, Rect, Size};

/// Snapshot of the affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewportState {
    pub const fn new(scale: f64, pan_x: f64, pan_y: f64) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(0.6, 50.0, 50.0)
    }
}

/// Zoom bounds and the state restored on dataset changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial: ViewportState,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.2,
            max_zoom: 3.0,
            initial: ViewportState::default(),
        }
    }
}

impl ViewportConfig {
    /// Zoom bounds must form an ascending positive range that holds the
    /// initial scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0) || !(self.max_zoom >= self.min_zoom) {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: format!(
                    "zoom bounds [{}, {}] are not an ascending positive range",
                    self.min_zoom, self.max_zoom
                ),
            });
        }
        let scale = self.initial.scale;
        if !(scale >= self.min_zoom && scale <= self.max_zoom) {
            return Err(ConfigError::Invalid {
                field: "viewport.initial.scale",
                reason: format!("{scale} lies outside the zoom bounds"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    state: ViewportState,
    drag_anchor: Option<Point>,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_checked(config))
    }

    fn with_checked(config: ViewportConfig) -> Self {
        Self {
            config,
            state: config.initial,
            drag_anchor: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    /// Change the scale by `delta_scale`, keeping the world point under the
    /// cursor pinned to the same screen position.
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, delta_scale: f64) {
        let current = self.state.scale;
        let next = self.clamp_scale(current + delta_scale);
        if next == current {
            return;
        }
        let world = self.screen_to_world(Point::new(screen_x, screen_y));
        self.state = ViewportState::new(
            next,
            screen_x - world.x * next,
            screen_y - world.y * next,
        );
    }

    pub fn begin_drag(&mut self, screen: Point) {
        self.drag_anchor = Some(screen);
    }

    /// Translate the pan offset. Only honoured while a drag is held.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if self.drag_anchor.is_none() {
            return false;
        }
        self.state.pan_x += dx;
        self.state.pan_y += dy;
        true
    }

    /// Pan by the cursor movement since the previous drag position.
    pub fn drag_to(&mut self, screen: Point) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        self.drag_anchor = Some(screen);
        self.pan(screen.x - anchor.x, screen.y - anchor.y)
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Return to the configured initial transform and drop any held drag.
    pub fn reset(&mut self) {
        self.state = self.config.initial;
        self.drag_anchor = None;
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        let ViewportState {
            scale,
            pan_x,
            pan_y,
        } = self.state;
        Point::new((screen.x - pan_x) / scale, (screen.y - pan_y) / scale)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        let ViewportState {
            scale,
            pan_x,
            pan_y,
        } = self.state;
        Point::new(world.x * scale + pan_x, world.y * scale + pan_y)
    }

    pub fn rect_to_screen(&self, world: &Rect) -> Rect {
        let corner = self.world_to_screen(Point::new(world.x, world.y));
        Rect::new(
            corner.x,
            corner.y,
            world.width * self.state.scale,
            world.height * self.state.scale,
        )
    }

    /// World area currently visible on a screen of the given size.
    pub fn visible_world(&self, screen: Size) -> Rect {
        let corner = self.screen_to_world(Point::new(0.0, 0.0));
        Rect::new(
            corner.x,
            corner.y,
            screen.width / self.state.scale,
            screen.height / self.state.scale,
        )
    }

    /// Scale and centre `bounds` inside the screen with `padding` pixels on
    /// every side. The scale still respects the zoom bounds.
    pub fn fit_to(&mut self, bounds: &Rect, screen: Size, padding: f64) {
        let usable_w = (screen.width - padding * 2.0).max(1.0);
        let usable_h = (screen.height - padding * 2.0).max(1.0);
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }
        let scale = self.clamp_scale((usable_w / bounds.width).min(usable_h / bounds.height));
        let center = bounds.center();
        self.state = ViewportState::new(
            scale,
            screen.width / 2.0 - center.x * scale,
            screen.height / 2.0 - center.y * scale,
        );
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.config.min_zoom, self.config.max_zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_checked(ViewportConfig::default())
    }
}
