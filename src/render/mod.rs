//! Drawing a [`Scene`] onto a [`RenderSurface`].

pub mod cpu;
pub mod glyphs;

use crate::{
    circle::Circle,
    foundation::{
        core::{Affine, Canvas, Line, Point, Rgba8},
        error::RingResult,
    },
    scene::Scene,
    text_layout::{FONT_SIZE, layout_label},
};

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as stored (premultiplied when `premultiplied` is set).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Copy of the pixel data with straight (non-premultiplied) alpha.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Drawing primitives the scene renderer needs from a target.
///
/// A frame is drawn as `clear`, any number of draw calls, then `finish`. Only after `finish`
/// returns is the frame complete and safe to read back.
pub trait RenderSurface {
    fn canvas(&self) -> Canvas;

    /// Start a new frame filled with `color`.
    fn clear(&mut self, color: Rgba8) -> RingResult<()>;

    /// Stroked and filled circle.
    fn draw_ring(
        &mut self,
        center: Point,
        radius: f64,
        stroke: Rgba8,
        stroke_width: f64,
        fill: Rgba8,
    ) -> RingResult<()>;

    fn draw_line(&mut self, line: Line, color: Rgba8, width: f64) -> RingResult<()>;

    /// Draw one character. `transform` maps the glyph's local space, whose origin is the
    /// horizontal center of the character on its baseline, into canvas space.
    fn draw_glyph(
        &mut self,
        ch: char,
        transform: Affine,
        font_size: f64,
        color: Rgba8,
    ) -> RingResult<()>;

    fn finish(&mut self) -> RingResult<()>;
}

/// Visual constants used for every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    pub background: Rgba8,
    pub ring_stroke_width: f64,
    pub ring_fill: Rgba8,
    pub connection_width: f64,
    pub font_size: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            ring_stroke_width: 4.0,
            ring_fill: Rgba8::WHITE.with_alpha(0.1),
            connection_width: 3.0,
            font_size: FONT_SIZE,
        }
    }
}

/// Draw the current scene state: every ring with its label in creation order, then the
/// connection line on top.
pub fn render_scene(
    scene: &Scene,
    surface: &mut dyn RenderSurface,
    style: &RenderStyle,
) -> RingResult<()> {
    let canvas = surface.canvas();
    surface.clear(style.background)?;

    for circle in scene.circles() {
        draw_circle(circle, circle.center(canvas), surface, style)?;
    }

    if let Some(line) = scene.connection_line_on(canvas) {
        surface.draw_line(line, scene.connection().color, style.connection_width)?;
    }

    surface.finish()
}

fn draw_circle(
    circle: &Circle,
    center: Point,
    surface: &mut dyn RenderSurface,
    style: &RenderStyle,
) -> RingResult<()> {
    let radius = circle.radius();
    if !radius.is_finite() || radius <= 0.0 {
        return Ok(());
    }

    surface.draw_ring(
        center,
        radius,
        circle.color(),
        style.ring_stroke_width,
        style.ring_fill,
    )?;

    for g in layout_label(circle.text(), circle.angle(), radius) {
        let transform =
            Affine::translate(center.to_vec2() + g.position.to_vec2()) * Affine::rotate(g.rotation);
        surface.draw_glyph(g.ch, transform, style.font_size, circle.color())?;
    }
    Ok(())
}
