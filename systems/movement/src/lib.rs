#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent path following driven by the canonical path.
//!
//! [`AgentPathState`] binds one agent to its copy of the canonical [`Path`]
//! and its progress `t` along the smoothed curve. Agents move through the
//! states `Spawning -> Moving <-> Stuck -> Despawned`. When the canonical path
//! changes the agent's current world position is located on the new curve so
//! motion continues from the nearest point instead of jumping. Re-delivering
//! an unchanged path leaves the agent exactly where it was.

use std::time::Duration;

use glam::Vec3;
use tile_defense_core::{AgentState, Path, TileCoord};
use tile_defense_system_spline::SplineCurve;

const MIN_PATH_LENGTH: f32 = 1e-4;

/// Outcome of advancing an agent by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The agent is not moving (spawning, stuck or despawned).
    Idle,
    /// The agent moved along its curve.
    Moved,
    /// The agent reached the end of its path and despawned.
    Arrived,
}

/// Navigation record binding an agent to its current path.
#[derive(Clone, Debug)]
pub struct AgentPathState {
    path: Path,
    points: Vec<Vec3>,
    length: f32,
    t: f32,
    speed: f32,
    state: AgentState,
    position: Vec3,
}

impl AgentPathState {
    /// Creates an agent waiting at its spawn position for a first path.
    #[must_use]
    pub fn new(speed: f32, spawn_position: Vec3) -> Self {
        Self {
            path: Path::empty(),
            points: Vec::new(),
            length: 0.0,
            t: 0.0,
            speed: speed.max(0.0),
            state: AgentState::Spawning,
            position: spawn_position,
        }
    }

    /// Binds the agent to a freshly computed canonical path.
    ///
    /// An empty path parks the agent in [`AgentState::Stuck`] at its current
    /// position. Receiving the path the agent already follows keeps `t` and
    /// the position untouched. Any other path is located from the current
    /// position and movement resumes from the nearest point of the new curve.
    /// Returns the new state when the call changed it.
    pub fn assign(&mut self, path: &Path) -> Option<AgentState> {
        let previous = self.state;
        match previous {
            AgentState::Despawned => return None,
            _ if path.is_empty() => {
                self.state = AgentState::Stuck;
            }
            _ if *path == self.path => {
                self.state = AgentState::Moving;
            }
            _ => {
                let points = path.positions();
                let Some(curve) = SplineCurve::new(&points) else {
                    return None;
                };
                let t = if previous == AgentState::Spawning {
                    0.0
                } else {
                    curve.locate(self.position).t
                };
                self.position = curve.position(t);
                self.length = curve.polyline_length();
                self.t = t;
                self.path = path.clone();
                self.points = points;
                self.state = AgentState::Moving;
            }
        }

        (self.state != previous).then_some(self.state)
    }

    /// Advances the agent along its curve by `speed * dt / length`.
    pub fn advance(&mut self, dt: Duration) -> Advance {
        if self.state != AgentState::Moving {
            return Advance::Idle;
        }
        let Some(curve) = SplineCurve::new(&self.points) else {
            return Advance::Idle;
        };

        if self.length <= MIN_PATH_LENGTH {
            self.t = 1.0;
        } else {
            let step = self.speed * dt.as_secs_f32() / self.length;
            self.t = (self.t + step).min(1.0);
        }
        self.position = curve.position(self.t);

        if self.t >= 1.0 {
            self.state = AgentState::Despawned;
            Advance::Arrived
        } else {
            Advance::Moved
        }
    }

    /// Marks the agent as destroyed. Further updates are ignored.
    pub fn despawn(&mut self) {
        self.state = AgentState::Despawned;
    }

    /// Current navigation state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Current world position on the curve, or the last known position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalised progress along the current path.
    #[must_use]
    pub const fn t(&self) -> f32 {
        self.t
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Path the agent currently follows. Empty until a first path arrives.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the control polyline of the current path.
    #[must_use]
    pub const fn path_length(&self) -> f32 {
        self.length
    }

    /// Tile of the waypoint the agent most recently passed.
    #[must_use]
    pub fn tile(&self) -> Option<TileCoord> {
        let waypoints = self.path.waypoints();
        let last = waypoints.len().checked_sub(1)?;
        let index = ((last as f32 * self.t).floor() as usize).min(last);
        waypoints.get(index).map(|waypoint| waypoint.tile)
    }
}
