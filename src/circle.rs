use std::fmt;

use crate::{
    config::CircleConfig,
    foundation::core::{Canvas, Point, Rgba8, Vec2},
};

/// Stable identity of a circle for the lifetime of a scene.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CircleId(pub String);

impl CircleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CircleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CircleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Angle and angular velocity of a circle, as read by followers and the connection line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngularState {
    /// Current angle in radians.
    pub angle: f64,
    /// Signed angular velocity in units per tick (scaled by the tick scale when advancing).
    pub speed: f64,
}

/// A rotating ring with a curved text label.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    id: CircleId,
    text: String,
    speed: f64,
    color: Rgba8,
    radius: f64,
    offset: Vec2,
    angle: f64,
    sync_target: Option<CircleId>,
}

impl Circle {
    pub fn new(id: impl Into<CircleId>, text: impl Into<String>, speed: f64, radius: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            speed,
            color: Rgba8::BLACK,
            radius,
            offset: Vec2::ZERO,
            angle: 0.0,
            sync_target: None,
        }
    }

    pub fn from_config(cfg: &CircleConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            text: cfg.text.clone(),
            speed: cfg.speed,
            color: cfg.color,
            radius: cfg.radius,
            offset: Vec2::new(cfg.x, cfg.y),
            angle: 0.0,
            sync_target: cfg.sync_target.clone(),
        }
    }

    /// Restore every attribute from `cfg` and rewind the angle, keeping the identity.
    pub(crate) fn reset_to(&mut self, cfg: &CircleConfig) {
        let id = self.id.clone();
        *self = Self::from_config(cfg);
        self.id = id;
        self.sync_target = None;
    }

    pub fn id(&self) -> &CircleId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn color(&self) -> Rgba8 {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.color = color;
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset_x(&mut self, x: f64) {
        self.offset.x = x;
    }

    pub fn set_offset_y(&mut self, y: f64) {
        self.offset.y = y;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub fn sync_target(&self) -> Option<&CircleId> {
        self.sync_target.as_ref()
    }

    /// Set the sync link without any cycle check. [`crate::Scene::apply`] is the checked path.
    pub fn set_sync_target(&mut self, target: Option<CircleId>) {
        self.sync_target = target;
    }

    /// The circle's own stored state, ignoring any sync link.
    pub fn own_state(&self) -> AngularState {
        AngularState {
            angle: self.angle,
            speed: self.speed,
        }
    }

    pub(crate) fn store_state(&mut self, state: AngularState) {
        self.angle = state.angle;
        self.speed = state.speed;
    }

    /// Center of the circle on `canvas`.
    pub fn center(&self, canvas: Canvas) -> Point {
        canvas.center() + self.offset
    }
}
