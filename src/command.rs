use crate::{circle::CircleId, foundation::core::Rgba8};

/// One discrete configuration change, as produced by a UI or a script.
///
/// Commands are applied between ticks with [`crate::Scene::apply`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetText { circle: CircleId, text: String },
    SetSpeed { circle: CircleId, speed: f64 },
    SetColor { circle: CircleId, color: Rgba8 },
    SetRadius { circle: CircleId, radius: f64 },
    SetOffsetX { circle: CircleId, x: f64 },
    SetOffsetY { circle: CircleId, y: f64 },
    /// `target: None` unlinks the circle.
    SetSyncTarget {
        circle: CircleId,
        #[serde(default)]
        target: Option<CircleId>,
    },
    SetRunning { running: bool },
    TogglePlay,
    /// Restore every circle to the scene defaults and deactivate the connection.
    Reset,
    /// Activates the connection when both ends are set and distinct, deactivates it otherwise.
    SetConnectionEndpoints {
        #[serde(default)]
        from: Option<CircleId>,
        #[serde(default)]
        to: Option<CircleId>,
    },
    SetConnectionColor { color: Rgba8 },
    ToggleConnection,
}

impl Command {
    /// The circle this command mutates, if it is a per-circle command.
    pub fn circle(&self) -> Option<&CircleId> {
        match self {
            Self::SetText { circle, .. }
            | Self::SetSpeed { circle, .. }
            | Self::SetColor { circle, .. }
            | Self::SetRadius { circle, .. }
            | Self::SetOffsetX { circle, .. }
            | Self::SetOffsetY { circle, .. }
            | Self::SetSyncTarget { circle, .. } => Some(circle),
            Self::SetRunning { .. }
            | Self::TogglePlay
            | Self::Reset
            | Self::SetConnectionEndpoints { .. }
            | Self::SetConnectionColor { .. }
            | Self::ToggleConnection => None,
        }
    }
}

/// A command scheduled to be applied right before the given tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimedCommand {
    pub tick: u64,
    pub command: Command,
}

/// Parse a JSON array of [`TimedCommand`] and sort it by tick (stable for equal ticks).
pub fn parse_script(s: &str) -> crate::RingResult<Vec<TimedCommand>> {
    let mut script: Vec<TimedCommand> = serde_json::from_str(s)?;
    script.sort_by_key(|c| c.tick);
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_tagged_json() {
        let c: Command =
            serde_json::from_str(r#"{ "type": "set_speed", "circle": "circle1", "speed": -2.5 }"#)
                .unwrap();
        assert_eq!(
            c,
            Command::SetSpeed {
                circle: CircleId::new("circle1"),
                speed: -2.5
            }
        );
        assert_eq!(c.circle().map(CircleId::as_str), Some("circle1"));

        let c: Command =
            serde_json::from_str(r#"{ "type": "set_sync_target", "circle": "circle2" }"#).unwrap();
        assert!(matches!(c, Command::SetSyncTarget { target: None, .. }));

        let c: Command = serde_json::from_str(r#"{ "type": "toggle_play" }"#).unwrap();
        assert!(c.circle().is_none());
    }

    #[test]
    fn script_is_sorted_by_tick() {
        let s = r##"[
            { "tick": 10, "command": { "type": "reset" } },
            { "tick": 2, "command": { "type": "set_color", "circle": "a", "color": "#00ff00" } },
            { "tick": 10, "command": { "type": "toggle_connection" } }
        ]"##;
        let script = parse_script(s).unwrap();
        let ticks: Vec<u64> = script.iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![2, 10, 10]);
        assert_eq!(script[1].command, Command::Reset);
        assert_eq!(script[2].command, Command::ToggleConnection);
    }
}
