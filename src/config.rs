use std::{collections::BTreeSet, path::Path};

use crate::{
    circle::CircleId,
    foundation::{
        core::{Canvas, Rgba8},
        error::{RingError, RingResult},
    },
};

/// Viewport width at or below which the compact (mobile) profile applies.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

const PURPLE: Rgba8 = Rgba8::opaque(0x8e, 0x44, 0xad);

const DEFAULT_LABELS: [&str; 4] = ["SYNTAX", "INTERNATIONAL", "COMPARATIVE", "NP VP AP NP  COMP  "];
const DEFAULT_SPEEDS: [f64; 4] = [1.0, -0.8, 1.5, -2.0];
const DESKTOP_RADII: [f64; 4] = [250.0, 200.0, 150.0, 100.0];
const MOBILE_RADII: [f64; 4] = [180.0, 140.0, 100.0, 70.0];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleConfig {
    pub id: CircleId,
    #[serde(default)]
    pub text: String,
    pub speed: f64,
    #[serde(default = "default_circle_color")]
    pub color: Rgba8,
    pub radius: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_target: Option<CircleId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub from: Option<CircleId>,
    #[serde(default)]
    pub to: Option<CircleId>,
    #[serde(default = "default_connection_color")]
    pub color: Rgba8,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            active: false,
            from: None,
            to: None,
            color: PURPLE,
        }
    }
}

/// Full description of a scene: the canvas, the fixed set of circles and the connection line.
///
/// This is also what `Reset` restores a running scene to.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneConfig {
    pub canvas: Canvas,
    pub circles: Vec<CircleConfig>,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default = "default_running")]
    pub running: bool,
}

fn default_circle_color() -> Rgba8 {
    Rgba8::BLACK
}

fn default_connection_color() -> Rgba8 {
    PURPLE
}

fn default_running() -> bool {
    true
}

/// Which default circle sizing applies to a viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutProfile {
    Desktop,
    Mobile,
}

impl LayoutProfile {
    /// Pick a profile and canvas for a host viewport of `width` x `height` pixels.
    pub fn for_viewport(width: u32, height: u32) -> (Self, Canvas) {
        if width <= MOBILE_BREAKPOINT_PX {
            let available_w = f64::from(width) - 40.0;
            let available_h = (f64::from(height) * 0.55).max(250.0);
            let side = available_w.min(available_h).max(280.0) as u32;
            (
                Self::Mobile,
                Canvas {
                    width: side,
                    height: side,
                },
            )
        } else {
            (
                Self::Desktop,
                Canvas {
                    width: width.saturating_sub(350).max(1),
                    height: height.max(1),
                },
            )
        }
    }

    pub fn scene(self, canvas: Canvas) -> SceneConfig {
        match self {
            Self::Desktop => SceneConfig::desktop(canvas),
            Self::Mobile => SceneConfig::mobile(canvas),
        }
    }
}

impl SceneConfig {
    /// Four concentric rings at full size.
    pub fn desktop(canvas: Canvas) -> Self {
        Self::with_sizing(canvas, DESKTOP_RADII, 15.0)
    }

    /// Four concentric rings scaled down to fit a small square canvas.
    pub fn mobile(canvas: Canvas) -> Self {
        let scale = mobile_scale(canvas.width);
        Self::with_sizing(
            canvas,
            MOBILE_RADII.map(|r| (r * scale).floor()),
            (12.0 * scale).floor(),
        )
    }

    fn with_sizing(canvas: Canvas, radii: [f64; 4], last_offset_x: f64) -> Self {
        let circles = (0..4)
            .map(|i| CircleConfig {
                id: CircleId::new(format!("circle{}", i + 1)),
                text: DEFAULT_LABELS[i].to_string(),
                speed: DEFAULT_SPEEDS[i],
                color: if i == 3 { PURPLE } else { Rgba8::BLACK },
                radius: radii[i],
                x: if i == 3 { last_offset_x } else { 0.0 },
                y: 0.0,
                sync_target: None,
            })
            .collect();

        Self {
            canvas,
            circles,
            connection: ConnectionConfig {
                active: true,
                from: Some(CircleId::new("circle3")),
                to: Some(CircleId::new("circle4")),
                color: PURPLE,
            },
            running: true,
        }
    }

    pub fn from_json_str(s: &str) -> RingResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> RingResult<Self> {
        use anyhow::Context as _;
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read scene config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> RingResult<()> {
        self.canvas.validate()?;
        if self.circles.is_empty() {
            return Err(RingError::validation("scene must contain at least one circle"));
        }

        let mut seen = BTreeSet::new();
        for c in &self.circles {
            if !seen.insert(&c.id) {
                return Err(RingError::validation(format!(
                    "duplicate circle id '{}'",
                    c.id
                )));
            }
            for (name, v) in [("speed", c.speed), ("radius", c.radius), ("x", c.x), ("y", c.y)] {
                if !v.is_finite() {
                    return Err(RingError::validation(format!(
                        "circle '{}' {name} must be finite",
                        c.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Radius scale for the compact profile, never below 40%.
pub fn mobile_scale(canvas_width: u32) -> f64 {
    (f64::from(canvas_width) / 600.0).max(0.4)
}
