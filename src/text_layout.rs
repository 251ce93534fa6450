//! Placement of label characters along a circle's circumference.
//!
//! Spacing is fixed in arc length rather than in angle: a label occupies the same number of
//! pixels along the edge of every circle, so letters on a large ring are not spread further
//! apart than on a small one.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::foundation::core::{Point, Vec2};

/// Font size shared by every label, in pixels.
pub const FONT_SIZE: f64 = 28.0;

/// Radius whose circumference defines the reference spacing.
pub const REFERENCE_RADIUS: f64 = 150.0;

/// Fraction of the reference circumference a label spans.
pub const REFERENCE_COVERAGE: f64 = 0.5;

/// Distance between the ring and the text baseline, toward the center.
pub const TEXT_INSET: f64 = FONT_SIZE * 1.2;

/// One character positioned on a ring, relative to the ring's center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPlacement {
    pub ch: char,
    /// Polar angle of the character on the ring.
    pub angle: f64,
    /// Baseline anchor (horizontally centered) relative to the ring center.
    pub position: Point,
    /// Rotation of the glyph so that its baseline is tangent to the ring.
    pub rotation: f64,
}

/// Pixel distance between consecutive characters for a label of `char_count` characters.
pub fn reference_arc_length(char_count: usize) -> f64 {
    if char_count == 0 {
        return 0.0;
    }
    TAU * REFERENCE_RADIUS * REFERENCE_COVERAGE / char_count as f64
}

/// Angle between consecutive characters on a ring of `radius`.
///
/// Returns `None` for an empty label or a radius that cannot host text.
pub fn angle_step(char_count: usize, radius: f64) -> Option<f64> {
    if char_count == 0 || !radius.is_finite() || radius <= 0.0 {
        return None;
    }
    Some(reference_arc_length(char_count) / radius)
}

/// Lay out `label` on a ring of `radius` whose rotation is `angle`.
///
/// Pure: the same inputs always yield the same placements. Empty labels and degenerate radii
/// produce no glyphs.
pub fn layout_label(label: &str, angle: f64, radius: f64) -> Vec<GlyphPlacement> {
    let count = label.chars().count();
    let Some(step) = angle_step(count, radius) else {
        return Vec::new();
    };
    if !angle.is_finite() {
        return Vec::new();
    }

    let text_radius = radius - TEXT_INSET;
    label
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let a = angle + i as f64 * step;
            GlyphPlacement {
                ch,
                angle: a,
                position: Point::ORIGIN + Vec2::from_angle(a) * text_radius,
                rotation: a + FRAC_PI_2,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_and_bad_radius_produce_nothing() {
        assert!(layout_label("", 0.0, 100.0).is_empty());
        assert!(layout_label("ABC", 0.0, 0.0).is_empty());
        assert!(layout_label("ABC", 0.0, -5.0).is_empty());
        assert!(layout_label("ABC", 0.0, f64::NAN).is_empty());
        assert!(layout_label("ABC", f64::INFINITY, 100.0).is_empty());
        assert_eq!(reference_arc_length(0), 0.0);
    }

    #[test]
    fn arc_distance_is_radius_independent() {
        let label = "SYNTAX";
        let small = layout_label(label, 0.3, 100.0);
        let large = layout_label(label, 0.3, 250.0);
        assert_eq!(small.len(), 6);
        assert_eq!(large.len(), 6);

        let arc = |g: &[GlyphPlacement], r: f64| (g[1].angle - g[0].angle) * r;
        assert!((arc(&small, 100.0) - arc(&large, 250.0)).abs() < 1e-9);
        assert!((arc(&small, 100.0) - reference_arc_length(6)).abs() < 1e-9);

        let step_small = small[1].angle - small[0].angle;
        let step_large = large[1].angle - large[0].angle;
        assert!((step_small / step_large - 2.5).abs() < 1e-9);
    }

    #[test]
    fn label_on_reference_ring_spans_half_the_circle() {
        let label = "ABCD";
        let g = layout_label(label, 0.0, REFERENCE_RADIUS);
        let step = g[1].angle - g[0].angle;
        assert!((step * 4.0 - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn glyphs_sit_inside_the_ring_tangent_to_it() {
        let g = layout_label("AB", 1.0, 100.0);
        assert_eq!(g[0].ch, 'A');
        assert_eq!(g[0].angle, 1.0);
        let dist = (g[0].position - Point::ORIGIN).hypot();
        assert!((dist - (100.0 - TEXT_INSET)).abs() < 1e-9);
        assert!((g[0].rotation - (1.0 + FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn layout_is_repeatable_and_counts_chars_not_bytes() {
        let a = layout_label("語法 AB", 0.7, 120.0);
        let b = layout_label("語法 AB", 0.7, 120.0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }
}
