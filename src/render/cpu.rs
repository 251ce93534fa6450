use std::path::Path;

use vello_cpu::kurbo::Shape as _;

use crate::{
    foundation::{
        core::{Affine, Canvas, Line, Point, Rgba8},
        error::{RingError, RingResult},
    },
    render::{FrameRGBA, RenderSurface, glyphs::GlyphShaper},
};

/// Tolerance used when flattening rings into paths.
const CURVE_TOLERANCE: f64 = 0.1;

/// CPU raster surface powered by `vello_cpu`.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    shaper: Option<GlyphShaper>,
    warned_no_font: bool,
}

impl CpuSurface {
    /// Surface without a label font; rings and connections still render.
    pub fn new(canvas: Canvas) -> RingResult<Self> {
        canvas.validate()?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| RingError::render("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| RingError::render("surface height exceeds u16"))?;

        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            shaper: None,
            warned_no_font: false,
        })
    }

    pub fn with_font(canvas: Canvas, font_bytes: Vec<u8>) -> RingResult<Self> {
        let mut surface = Self::new(canvas)?;
        surface.shaper = Some(GlyphShaper::new(font_bytes)?);
        Ok(surface)
    }

    pub fn with_font_file(canvas: Canvas, font_path: &Path) -> RingResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(font_path)
            .with_context(|| format!("read font '{}'", font_path.display()))?;
        Self::with_font(canvas, bytes)
    }

    /// Reallocate the pixmap for `canvas`, keeping the label font.
    pub fn resize(&mut self, canvas: Canvas) -> RingResult<()> {
        let mut next = Self::new(canvas)?;
        next.shaper = self.shaper.take();
        next.warned_no_font = self.warned_no_font;
        *self = next;
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.shaper.is_some()
    }

    /// Copy out the last finished frame (premultiplied RGBA8).
    pub fn read_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

impl RenderSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    fn clear(&mut self, color: Rgba8) -> RingResult<()> {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    fn draw_ring(
        &mut self,
        center: Point,
        radius: f64,
        stroke: Rgba8,
        stroke_width: f64,
        fill: Rgba8,
    ) -> RingResult<()> {
        let path = vello_cpu::kurbo::Circle::new(point_to_cpu(center), radius)
            .to_path(CURVE_TOLERANCE);

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint(fill));
        self.ctx.fill_path(&path);

        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(stroke_width));
        self.ctx.set_paint(paint(stroke));
        self.ctx.stroke_path(&path);
        Ok(())
    }

    fn draw_line(&mut self, line: Line, color: Rgba8, width: f64) -> RingResult<()> {
        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(line.p0));
        path.line_to(point_to_cpu(line.p1));

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.set_paint(paint(color));
        self.ctx.stroke_path(&path);
        Ok(())
    }

    fn draw_glyph(
        &mut self,
        ch: char,
        transform: Affine,
        font_size: f64,
        color: Rgba8,
    ) -> RingResult<()> {
        let Some(shaper) = self.shaper.as_mut() else {
            if !self.warned_no_font {
                tracing::warn!("no label font configured; circle labels are not drawn");
                self.warned_no_font = true;
            }
            return Ok(());
        };
        if ch.is_whitespace() {
            return Ok(());
        }

        let size = font_size as f32;
        let shaped = shaper.shape(ch, size)?;
        let centered =
            transform * Affine::translate((-f64::from(shaped.advance) / 2.0, 0.0));
        let glyphs: Vec<vello_cpu::Glyph> = shaped
            .glyphs
            .iter()
            .map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            })
            .collect();

        self.ctx.set_transform(affine_to_cpu(centered));
        self.ctx.set_paint(paint(color));
        self.ctx
            .glyph_run(shaper.font())
            .font_size(size)
            .fill_glyphs(glyphs.into_iter());
        Ok(())
    }

    fn finish(&mut self) -> RingResult<()> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("shaper", &self.shaper)
            .finish()
    }
}

fn paint(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas {
            width: w,
            height: h,
        }
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        assert!(CpuSurface::new(canvas(70_000, 10)).is_err());
        assert!(CpuSurface::new(canvas(0, 10)).is_err());
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut s = CpuSurface::new(canvas(8, 8)).unwrap();
        s.clear(Rgba8::opaque(10, 20, 30)).unwrap();
        s.finish().unwrap();
        let f = s.read_frame();
        assert!(f.data.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn glyphs_without_font_are_skipped() {
        let mut s = CpuSurface::new(canvas(8, 8)).unwrap();
        s.clear(Rgba8::WHITE).unwrap();
        s.draw_glyph('A', Affine::IDENTITY, 28.0, Rgba8::BLACK)
            .unwrap();
        s.finish().unwrap();
        assert!(!s.has_font());
        assert!(s.read_frame().data.chunks_exact(4).all(|p| p == [255; 4]));
    }

    #[test]
    fn line_marks_pixels_along_its_path() {
        let mut s = CpuSurface::new(canvas(32, 32)).unwrap();
        s.clear(Rgba8::WHITE).unwrap();
        s.draw_line(
            Line::new(Point::new(0.0, 16.0), Point::new(32.0, 16.0)),
            Rgba8::BLACK,
            3.0,
        )
        .unwrap();
        s.finish().unwrap();
        let f = s.read_frame();
        let on = f.pixel(16, 16).unwrap();
        assert!(on[0] < 40 && on[3] == 255, "{on:?}");
        assert_eq!(f.pixel(16, 2), Some([255, 255, 255, 255]));
    }
}
