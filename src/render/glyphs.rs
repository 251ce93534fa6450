use std::collections::HashMap;

use crate::foundation::{
    core::Rgba8,
    error::{RingError, RingResult},
};

/// A shaped glyph positioned relative to the character's baseline origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ShapedGlyph {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// Shaping result for a single character.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ShapedChar {
    pub(crate) glyphs: Vec<ShapedGlyph>,
    /// Horizontal advance of the whole character.
    pub(crate) advance: f32,
}

/// Shapes single characters with one registered font and caches the results.
pub struct GlyphShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    cache: HashMap<(char, u32), ShapedChar>,
}

impl GlyphShaper {
    /// Register `font_bytes` (TTF/OTF) as the only font used for labels.
    pub fn new(font_bytes: Vec<u8>) -> RingResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            RingError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RingError::validation("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family_name, "label font registered");

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
            cache: HashMap::new(),
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    pub(crate) fn shape(&mut self, ch: char, size_px: f32) -> RingResult<&ShapedChar> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RingError::validation(
                "glyph size_px must be finite and > 0",
            ));
        }

        let key = (ch, size_px.to_bits());
        if !self.cache.contains_key(&key) {
            let shaped = self.shape_uncached(ch, size_px);
            self.cache.insert(key, shaped);
        }
        self.cache
            .get(&key)
            .ok_or_else(|| RingError::render("glyph cache entry missing after insert"))
    }

    fn shape_uncached(&mut self, ch: char, size_px: f32) -> ShapedChar {
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let baseline = run.baseline();
                for g in run.positioned_glyphs() {
                    glyphs.push(ShapedGlyph {
                        id: g.id,
                        x: g.x,
                        y: g.y - baseline,
                    });
                }
            }
        }

        ShapedChar {
            glyphs,
            advance: layout.width(),
        }
    }
}

impl std::fmt::Debug for GlyphShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphShaper")
            .field("family_name", &self.family_name)
            .field("cached", &self.cache.len())
            .finish()
    }
}
