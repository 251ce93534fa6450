use std::f64::consts::PI;

use crate::{
    circle::{Circle, CircleId},
    config::ConnectionConfig,
    foundation::core::{Line, Point, Rgba8, Vec2},
};

/// Endpoints sit this fraction of the radius away from their circle's center.
pub const ENDPOINT_RADIUS_FRACTION: f64 = 0.8;

/// The line linking two circles.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub active: bool,
    pub from: Option<CircleId>,
    pub to: Option<CircleId>,
    pub color: Rgba8,
}

impl Connection {
    pub fn from_config(cfg: &ConnectionConfig) -> Self {
        Self {
            active: cfg.active,
            from: cfg.from.clone(),
            to: cfg.to.clone(),
            color: cfg.color,
        }
    }

    /// Store both ends and activate when they are set and distinct, otherwise deactivate.
    pub fn select_endpoints(&mut self, from: Option<CircleId>, to: Option<CircleId>) {
        match (from, to) {
            (Some(from), Some(to)) if from != to => {
                self.from = Some(from);
                self.to = Some(to);
                self.active = true;
            }
            _ => self.active = false,
        }
    }

    /// The ids to draw between, or `None` when nothing should be drawn.
    pub fn drawable_ends(&self) -> Option<(&CircleId, &CircleId)> {
        if !self.active {
            return None;
        }
        match (self.from.as_ref(), self.to.as_ref()) {
            (Some(from), Some(to)) if from != to => Some((from, to)),
            _ => None,
        }
    }
}

/// Endpoints of a connection between two rotating circles.
///
/// Each end is placed at `0.8 * radius` from its own center, along the inter-center direction
/// rotated by that circle's current angle. The `to` end faces back toward `from` (base + π), so
/// both attachment points orbit with their owners.
pub fn connection_endpoints(
    from: &Circle,
    from_center: Point,
    to: &Circle,
    to_center: Point,
) -> Line {
    let d = to_center - from_center;
    let base = d.y.atan2(d.x);

    let p0 = from_center
        + Vec2::from_angle(from.angle() + base) * (from.radius() * ENDPOINT_RADIUS_FRACTION);
    let p1 = to_center
        + Vec2::from_angle(to.angle() + base + PI) * (to.radius() * ENDPOINT_RADIUS_FRACTION);
    Line::new(p0, p1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn from_endpoint_faces_target_at_zero_angle() {
        let a = Circle::new("a", "", 0.0, 100.0);
        let b = Circle::new("b", "", 0.0, 50.0);
        let line = connection_endpoints(&a, Point::ORIGIN, &b, Point::new(300.0, 0.0));

        assert_near(line.p0, Point::new(80.0, 0.0));
        assert!(((line.p0 - Point::ORIGIN).hypot() - 80.0).abs() < 1e-9);
        // `to` end faces back toward `a`.
        assert_near(line.p1, Point::new(260.0, 0.0));
    }

    #[test]
    fn rotating_by_pi_moves_endpoint_to_opposite_side() {
        let mut a = Circle::new("a", "", 0.0, 100.0);
        let b = Circle::new("b", "", 0.0, 50.0);
        a.set_angle(PI);
        let line = connection_endpoints(&a, Point::ORIGIN, &b, Point::new(300.0, 0.0));
        assert_near(line.p0, Point::new(-80.0, 0.0));
    }

    #[test]
    fn base_angle_follows_center_direction() {
        let a = Circle::new("a", "", 0.0, 10.0);
        let b = Circle::new("b", "", 0.0, 10.0);
        let line = connection_endpoints(&a, Point::ORIGIN, &b, Point::new(0.0, 100.0));
        assert_near(line.p0, Point::new(0.0, 8.0));
        assert_near(line.p1, Point::new(0.0, 92.0));
    }

    #[test]
    fn endpoint_selection_rules() {
        let mut c = Connection::from_config(&ConnectionConfig::default());
        assert!(c.drawable_ends().is_none());

        c.select_endpoints(Some("a".into()), Some("b".into()));
        assert!(c.active);
        assert_eq!(
            c.drawable_ends().map(|(f, t)| (f.as_str(), t.as_str())),
            Some(("a", "b"))
        );

        c.select_endpoints(Some("a".into()), Some("a".into()));
        assert!(!c.active);
        // Previous ends are kept for a later toggle.
        assert_eq!(c.from, Some(CircleId::new("a")));
        assert_eq!(c.to, Some(CircleId::new("b")));

        c.select_endpoints(None, Some("b".into()));
        assert!(!c.active);
    }
}
