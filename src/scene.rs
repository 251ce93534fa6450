use std::collections::HashMap;

use crate::{
    circle::{AngularState, Circle, CircleId},
    command::Command,
    config::{LayoutProfile, SceneConfig},
    connection::{Connection, connection_endpoints},
    foundation::{
        core::{Canvas, Line, wrap_angle},
        error::{RingError, RingResult},
    },
};

/// Angle advanced per tick per unit of speed.
pub const TICK_SCALE: f64 = 0.02;

/// Simulation state for one session: the circles, the connection and the animation clock.
///
/// A `Scene` is owned by a single controller. Commands are applied between ticks with
/// [`Scene::apply`]; rendering only reads it.
#[derive(Clone, Debug)]
pub struct Scene {
    canvas: Canvas,
    circles: Vec<Circle>,
    index: HashMap<CircleId, usize>,
    connection: Connection,
    running: bool,
    ticks: u64,
    defaults: SceneConfig,
}

impl Scene {
    pub fn new(cfg: SceneConfig) -> RingResult<Self> {
        cfg.validate()?;

        let circles: Vec<Circle> = cfg.circles.iter().map(Circle::from_config).collect();
        let index = circles
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id().clone(), i))
            .collect();

        let scene = Self {
            canvas: cfg.canvas,
            circles,
            index,
            connection: Connection::from_config(&cfg.connection),
            running: cfg.running,
            ticks: 0,
            defaults: cfg,
        };

        for c in &scene.circles {
            if let Some(target) = c.sync_target()
                && scene.sync_creates_cycle(c.id(), target)
            {
                return Err(RingError::validation(format!(
                    "sync link '{}' -> '{}' forms a cycle",
                    c.id(),
                    target
                )));
            }
        }
        Ok(scene)
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Adapt the scene to a new host viewport.
    ///
    /// The canvas and profile come from [`LayoutProfile::for_viewport`]. Radii and x offsets of
    /// the circles are replaced by the profile's sizing, matched by position, both on the live
    /// circles and on the defaults used by [`Scene::reset`]. Angles, speeds, labels and sync links
    /// are kept.
    pub fn resize_viewport(&mut self, width: u32, height: u32) -> LayoutProfile {
        let (profile, canvas) = LayoutProfile::for_viewport(width, height);
        let sized = profile.scene(canvas);

        for (c, cfg) in self.circles.iter_mut().zip(&sized.circles) {
            c.set_radius(cfg.radius);
            c.set_offset_x(cfg.x);
        }
        for (d, cfg) in self.defaults.circles.iter_mut().zip(&sized.circles) {
            d.radius = cfg.radius;
            d.x = cfg.x;
        }
        self.defaults.canvas = canvas;
        self.canvas = canvas;

        tracing::debug!(?profile, width = canvas.width, height = canvas.height, "viewport resized");
        profile
    }

    /// Circles in creation order.
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn circle(&self, id: &CircleId) -> Option<&Circle> {
        self.index.get(id).map(|&i| &self.circles[i])
    }

    /// Direct mutable access to a circle. Sync links set through this are not cycle-checked.
    pub fn circle_mut(&mut self, id: &CircleId) -> Option<&mut Circle> {
        self.index.get(id).map(|&i| &mut self.circles[i])
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Number of ticks advanced since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Angular state of `id` through at most one sync hop.
    ///
    /// A linked circle reports its target's stored angle and speed verbatim. A target that does
    /// not resolve is treated as no link at all.
    pub fn angular_state(&self, id: &CircleId) -> Option<AngularState> {
        let circle = self.circle(id)?;
        let resolved = circle
            .sync_target()
            .and_then(|t| self.circle(t))
            .unwrap_or(circle);
        Some(resolved.own_state())
    }

    /// Advance the simulation by one tick.
    ///
    /// Leaders (circles without a resolvable sync target) accumulate first, then every follower
    /// copies the state at the root of its chain, so declaration order never matters.
    pub fn tick(&mut self) {
        if self.running {
            for i in 0..self.circles.len() {
                if self.leader_index(i).is_none() {
                    let c = &mut self.circles[i];
                    let angle = wrap_angle(c.angle() + c.speed() * TICK_SCALE);
                    c.set_angle(angle);
                }
            }
        }

        for i in 0..self.circles.len() {
            if self.leader_index(i).is_some() {
                let state = self.resolve_chain(i);
                self.circles[i].store_state(state);
            }
        }

        self.ticks += 1;
    }

    /// Index of the circle `i` directly follows, if its link resolves.
    fn leader_index(&self, i: usize) -> Option<usize> {
        self.circles[i]
            .sync_target()
            .and_then(|t| self.index.get(t).copied())
    }

    /// Walk the sync chain starting at `start` to its root.
    ///
    /// A circle seen twice ends the walk with that circle's own last-known state.
    fn resolve_chain(&self, start: usize) -> AngularState {
        let mut visited = vec![false; self.circles.len()];
        let mut cur = start;
        loop {
            if visited[cur] {
                tracing::debug!(circle = %self.circles[cur].id(), "sync cycle broken");
                return self.circles[cur].own_state();
            }
            visited[cur] = true;
            match self.leader_index(cur) {
                Some(next) => cur = next,
                None => return self.circles[cur].own_state(),
            }
        }
    }

    /// `true` when linking `circle -> target` would close a loop through existing links.
    pub fn sync_creates_cycle(&self, circle: &CircleId, target: &CircleId) -> bool {
        let mut cur = target;
        for _ in 0..=self.circles.len() {
            if cur == circle {
                return true;
            }
            match self.circle(cur).and_then(Circle::sync_target) {
                Some(next) => cur = next,
                None => return false,
            }
        }
        // Longer than the circle count: an existing cycle the new link would feed into.
        true
    }

    /// Line segment of the connection on the scene canvas, if it should be drawn.
    pub fn connection_line(&self) -> Option<Line> {
        self.connection_line_on(self.canvas)
    }

    /// Same as [`Scene::connection_line`] with centers measured on `canvas`.
    pub fn connection_line_on(&self, canvas: Canvas) -> Option<Line> {
        let (from_id, to_id) = self.connection.drawable_ends()?;
        let from = self.circle(from_id)?;
        let to = self.circle(to_id)?;
        Some(connection_endpoints(
            from,
            from.center(canvas),
            to,
            to.center(canvas),
        ))
    }

    /// Apply one configuration change.
    ///
    /// Commands naming an unknown circle are ignored. The only rejected command is a sync link
    /// that would form a cycle; the scene is left unchanged in that case.
    pub fn apply(&mut self, cmd: Command) -> RingResult<()> {
        if let Command::SetSyncTarget {
            circle,
            target: Some(target),
        } = &cmd
            && self.circle(circle).is_some()
            && self.sync_creates_cycle(circle, target)
        {
            return Err(RingError::validation(format!(
                "sync link '{circle}' -> '{target}' would form a cycle"
            )));
        }

        if let Some(id) = cmd.circle()
            && self.circle(id).is_none()
        {
            tracing::warn!(circle = %id, "command names an unknown circle; ignored");
            return Ok(());
        }

        match cmd {
            Command::SetText { circle, text } => self.with_circle(&circle, |c| c.set_text(text)),
            Command::SetSpeed { circle, speed } => {
                self.with_circle(&circle, |c| c.set_speed(speed))
            }
            Command::SetColor { circle, color } => {
                self.with_circle(&circle, |c| c.set_color(color))
            }
            Command::SetRadius { circle, radius } => {
                self.with_circle(&circle, |c| c.set_radius(radius))
            }
            Command::SetOffsetX { circle, x } => self.with_circle(&circle, |c| c.set_offset_x(x)),
            Command::SetOffsetY { circle, y } => self.with_circle(&circle, |c| c.set_offset_y(y)),
            Command::SetSyncTarget { circle, target } => {
                if let Some(t) = &target
                    && self.circle(t).is_none()
                {
                    tracing::debug!(circle = %circle, target = %t, "sync target does not resolve");
                }
                self.with_circle(&circle, |c| c.set_sync_target(target))
            }
            Command::SetRunning { running } => self.running = running,
            Command::TogglePlay => self.running = !self.running,
            Command::Reset => self.reset(),
            Command::SetConnectionEndpoints { from, to } => {
                self.connection.select_endpoints(from, to)
            }
            Command::SetConnectionColor { color } => self.connection.color = color,
            Command::ToggleConnection => self.connection.active = !self.connection.active,
        }
        Ok(())
    }

    fn with_circle(&mut self, id: &CircleId, f: impl FnOnce(&mut Circle)) {
        if let Some(c) = self.circle_mut(id) {
            f(c);
        }
    }

    /// Restore circles to the scene defaults (matched by position), clear every sync link and
    /// deactivate the connection. The running flag is left alone.
    pub fn reset(&mut self) {
        for (c, cfg) in self.circles.iter_mut().zip(&self.defaults.circles) {
            c.reset_to(cfg);
        }
        self.connection.active = false;
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;
    use crate::config::{CircleConfig, ConnectionConfig};

    fn circle_cfg(id: &str, speed: f64, radius: f64) -> CircleConfig {
        CircleConfig {
            id: CircleId::new(id),
            text: id.to_uppercase(),
            speed,
            color: crate::Rgba8::BLACK,
            radius,
            x: 0.0,
            y: 0.0,
            sync_target: None,
        }
    }

    fn scene(circles: Vec<CircleConfig>) -> Scene {
        Scene::new(SceneConfig {
            canvas: Canvas {
                width: 400,
                height: 400,
            },
            circles,
            connection: ConnectionConfig::default(),
            running: true,
        })
        .unwrap()
    }

    fn id(s: &str) -> CircleId {
        CircleId::new(s)
    }

    #[test]
    fn leader_advances_by_speed_times_tick_scale() {
        let mut s = scene(vec![circle_cfg("a", 1.5, 100.0)]);
        s.tick();
        s.tick();
        assert!((s.circle(&id("a")).unwrap().angle() - 0.06).abs() < 1e-12);
        assert_eq!(s.ticks(), 2);
    }

    #[test]
    fn follower_reads_updated_leader_regardless_of_order() {
        let mut cfgs = vec![
            circle_cfg("a", 0.0, 100.0),
            circle_cfg("b", 0.0, 80.0),
            circle_cfg("c", 2.0, 60.0),
        ];
        // a -> b -> c, declared before their leaders.
        cfgs[0].sync_target = Some(id("b"));
        cfgs[1].sync_target = Some(id("c"));
        let mut s = scene(cfgs);

        for _ in 0..5 {
            s.tick();
            let c = s.circle(&id("c")).unwrap().own_state();
            assert_eq!(s.circle(&id("b")).unwrap().own_state(), c);
            assert_eq!(s.circle(&id("a")).unwrap().own_state(), c);
        }
        assert!((s.circle(&id("a")).unwrap().speed() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unresolvable_target_degrades_to_independent() {
        let mut cfgs = vec![circle_cfg("a", 1.0, 100.0)];
        cfgs[0].sync_target = Some(id("ghost"));
        let mut s = scene(cfgs);
        s.tick();
        assert!((s.circle(&id("a")).unwrap().angle() - 0.02).abs() < 1e-12);
        assert_eq!(
            s.angular_state(&id("a")).unwrap(),
            s.circle(&id("a")).unwrap().own_state()
        );
    }

    #[test]
    fn angular_state_is_one_hop_and_verbatim() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 3.0, 50.0)]);
        s.circle_mut(&id("a")).unwrap().set_angle(1.25);
        s.circle_mut(&id("b"))
            .unwrap()
            .set_sync_target(Some(id("a")));
        let st = s.angular_state(&id("b")).unwrap();
        assert_eq!(st.angle, 1.25);
        assert_eq!(st.speed, 1.0);
        assert!(s.angular_state(&id("nope")).is_none());
    }

    #[test]
    fn cycles_from_direct_setters_terminate_deterministically() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 2.0, 50.0)]);
        s.circle_mut(&id("a")).unwrap().set_angle(0.5);
        s.circle_mut(&id("b")).unwrap().set_angle(1.5);
        s.circle_mut(&id("a"))
            .unwrap()
            .set_sync_target(Some(id("b")));
        s.circle_mut(&id("b"))
            .unwrap()
            .set_sync_target(Some(id("a")));

        s.tick();
        let first = (
            s.circle(&id("a")).unwrap().own_state(),
            s.circle(&id("b")).unwrap().own_state(),
        );
        // Each circle closes its own loop and keeps its last-known state.
        assert_eq!(first.0.angle, 0.5);
        assert_eq!(first.1.angle, 1.5);

        s.tick();
        assert_eq!(s.circle(&id("a")).unwrap().own_state(), first.0);
        assert_eq!(s.circle(&id("b")).unwrap().own_state(), first.1);
    }

    #[test]
    fn apply_rejects_cycles_and_self_links() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 2.0, 50.0)]);
        s.apply(Command::SetSyncTarget {
            circle: id("a"),
            target: Some(id("b")),
        })
        .unwrap();

        let err = s
            .apply(Command::SetSyncTarget {
                circle: id("b"),
                target: Some(id("a")),
            })
            .unwrap_err();
        assert!(matches!(err, RingError::Validation(_)));
        assert!(s.circle(&id("b")).unwrap().sync_target().is_none());

        assert!(
            s.apply(Command::SetSyncTarget {
                circle: id("a"),
                target: Some(id("a")),
            })
            .is_err()
        );
    }

    #[test]
    fn scene_config_with_cycle_is_rejected() {
        let mut cfgs = vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 2.0, 50.0)];
        cfgs[0].sync_target = Some(id("b"));
        cfgs[1].sync_target = Some(id("a"));
        let cfg = SceneConfig {
            canvas: Canvas {
                width: 10,
                height: 10,
            },
            circles: cfgs,
            connection: ConnectionConfig::default(),
            running: true,
        };
        assert!(Scene::new(cfg).is_err());
    }

    #[test]
    fn unknown_circle_commands_are_ignored() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0)]);
        let before = s.circles().to_vec();
        s.apply(Command::SetSpeed {
            circle: id("zzz"),
            speed: 9.0,
        })
        .unwrap();
        assert_eq!(s.circles(), before.as_slice());
    }

    #[test]
    fn reset_restores_defaults_and_keeps_running_flag() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 2.0, 50.0)]);
        s.apply(Command::SetConnectionEndpoints {
            from: Some(id("a")),
            to: Some(id("b")),
        })
        .unwrap();
        s.apply(Command::SetRadius {
            circle: id("a"),
            radius: 5.0,
        })
        .unwrap();
        s.apply(Command::SetSyncTarget {
            circle: id("b"),
            target: Some(id("a")),
        })
        .unwrap();
        s.apply(Command::SetRunning { running: false }).unwrap();
        s.tick();

        s.apply(Command::Reset).unwrap();
        let a = s.circle(&id("a")).unwrap();
        assert_eq!(a.radius(), 100.0);
        assert_eq!(a.angle(), 0.0);
        assert!(s.circle(&id("b")).unwrap().sync_target().is_none());
        assert!(!s.connection().active);
        assert!(!s.is_running());
    }

    #[test]
    fn long_runs_stay_wrapped() {
        let mut s = scene(vec![circle_cfg("a", 7.0, 100.0)]);
        for _ in 0..100_000 {
            s.tick();
        }
        let a = s.circle(&id("a")).unwrap().angle();
        assert!((0.0..TAU).contains(&a));
    }

    #[test]
    fn connection_line_requires_resolvable_distinct_ends() {
        let mut s = scene(vec![circle_cfg("a", 1.0, 100.0), circle_cfg("b", 2.0, 50.0)]);
        assert!(s.connection_line().is_none());

        s.apply(Command::SetConnectionEndpoints {
            from: Some(id("a")),
            to: Some(id("b")),
        })
        .unwrap();
        // Concentric circles: base angle is atan2(0, 0) = 0.
        let line = s.connection_line().unwrap();
        assert!((line.p0.x - 280.0).abs() < 1e-9);
        assert!((line.p1.x - 160.0).abs() < 1e-9);

        s.connection_mut().to = Some(id("ghost"));
        assert!(s.connection_line().is_none());

        s.connection_mut().to = Some(id("b"));
        s.apply(Command::ToggleConnection).unwrap();
        assert!(s.connection_line().is_none());
    }

    #[test]
    fn viewport_resize_reapplies_profile_sizing() {
        let desktop = crate::LayoutProfile::Desktop.scene(Canvas {
            width: 1000,
            height: 900,
        });
        let mut s = Scene::new(desktop).unwrap();
        for _ in 0..10 {
            s.tick();
        }
        let angle = s.circles()[0].angle();

        assert_eq!(s.resize_viewport(600, 800), crate::LayoutProfile::Mobile);
        assert_eq!(
            s.canvas(),
            Canvas {
                width: 440,
                height: 440
            }
        );
        let radii: Vec<f64> = s.circles().iter().map(Circle::radius).collect();
        let scale: f64 = 440.0 / 600.0;
        let expected: Vec<f64> = [180.0, 140.0, 100.0, 70.0]
            .iter()
            .map(|r: &f64| (r * scale).floor())
            .collect();
        assert_eq!(radii, expected);
        assert_eq!(s.circles()[3].offset().x, (12.0 * scale).floor());
        assert_eq!(s.circles()[0].angle(), angle);

        s.reset();
        assert_eq!(s.circles()[0].radius(), expected[0]);

        assert_eq!(s.resize_viewport(1350, 900), crate::LayoutProfile::Desktop);
        assert_eq!(s.circles()[0].radius(), 250.0);
        assert_eq!(s.circles()[3].offset().x, 15.0);
        assert_eq!(s.canvas().width, 1000);
    }
}
