#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use std::time::Duration;

use tile_defense_core::{Command, Event, PlayMode};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    base_speed: f32,
    speed_jitter: f32,
    wave_size: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// Each enemy travels at `base_speed` plus a deterministic offset in
    /// `[-speed_jitter, speed_jitter]`. A `wave_size` of zero spawns without limit.
    #[must_use]
    pub const fn new(
        spawn_interval: Duration,
        base_speed: f32,
        speed_jitter: f32,
        wave_size: u32,
        rng_seed: u64,
    ) -> Self {
        Self {
            spawn_interval,
            base_speed,
            speed_jitter,
            wave_size,
            rng_seed,
        }
    }
}

/// Pure system that deterministically emits spawn commands in attack mode.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    accumulator: Duration,
    rng_state: u64,
    spawned: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            accumulator: Duration::ZERO,
            rng_state: config.rng_seed,
            spawned: 0,
        }
    }

    /// Number of enemies requested during the current level.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Consumes world events to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], play_mode: PlayMode, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                Event::LevelReset { .. } => {
                    self.accumulator = Duration::ZERO;
                    self.spawned = 0;
                    accumulated = Duration::ZERO;
                }
                _ => {}
            }
        }

        if play_mode != PlayMode::Attack {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.config.spawn_interval.is_zero() || accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        for _ in 0..self.resolve_spawn_attempts() {
            if self.wave_complete() {
                break;
            }
            let speed = self.next_speed();
            self.spawned = self.spawned.saturating_add(1);
            out.push(Command::SpawnEnemy { speed });
        }
    }

    fn wave_complete(&self) -> bool {
        self.config.wave_size != 0 && self.spawned >= self.config.wave_size
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.config.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.config.spawn_interval {
            self.accumulator -= self.config.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn next_speed(&mut self) -> f32 {
        let jitter = self.config.speed_jitter.abs();
        if jitter == 0.0 {
            return self.config.base_speed.max(0.0);
        }
        let value = self.advance_rng();
        let unit = (value >> 40) as f32 / (1u64 << 24) as f32;
        let offset = (unit * 2.0 - 1.0) * jitter;
        (self.config.base_speed + offset).max(0.0)
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spawn_attempts_without_interval() {
        let mut spawning = Spawning::new(Config::new(Duration::ZERO, 1.0, 0.0, 0, 1));
        spawning.accumulator = Duration::from_secs(10);
        assert_eq!(spawning.resolve_spawn_attempts(), 0);
    }

    #[test]
    fn jittered_speed_stays_within_bounds() {
        let mut spawning =
            Spawning::new(Config::new(Duration::from_secs(1), 2.0, 0.5, 0, 0xdead_beef));
        for _ in 0..64 {
            let speed = spawning.next_speed();
            assert!((1.5..=2.5).contains(&speed), "speed {speed} out of range");
        }
    }
}
