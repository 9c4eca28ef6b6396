use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use tile_defense_core::{Command, Event, PlayMode};
use tile_defense_system_spawning::{Config, Spawning};
use tile_defense_world::{self as world, query, World};

fn tick_events(dt: Duration) -> Vec<Event> {
    vec![Event::TimeAdvanced { dt }]
}

#[test]
fn emits_multiple_spawn_commands_for_large_dt() {
    let mut spawning = Spawning::new(Config::new(Duration::from_millis(500), 1.0, 0.0, 0, 7));
    let mut commands = Vec::new();

    spawning.handle(
        &tick_events(Duration::from_secs(2)),
        PlayMode::Attack,
        &mut commands,
    );

    assert_eq!(commands.len(), 4, "expected one spawn per interval");
    assert!(commands
        .iter()
        .all(|command| *command == Command::SpawnEnemy { speed: 1.0 }));
    assert_eq!(spawning.spawned(), 4);
}

#[test]
fn builder_mode_resets_accumulator() {
    let mut spawning = Spawning::new(Config::new(Duration::from_secs(1), 1.0, 0.0, 0, 11));
    let mut commands = Vec::new();

    spawning.handle(
        &tick_events(Duration::from_millis(900)),
        PlayMode::Attack,
        &mut commands,
    );
    assert!(commands.is_empty());

    spawning.handle(&[], PlayMode::Builder, &mut commands);
    spawning.handle(
        &tick_events(Duration::from_millis(200)),
        PlayMode::Attack,
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "builder mode should discard the partial interval"
    );
}

#[test]
fn wave_size_caps_spawns_until_level_reset() {
    let mut spawning = Spawning::new(Config::new(Duration::from_millis(100), 1.0, 0.0, 3, 5));
    let mut commands = Vec::new();

    spawning.handle(
        &tick_events(Duration::from_secs(1)),
        PlayMode::Attack,
        &mut commands,
    );
    assert_eq!(commands.len(), 3);

    commands.clear();
    spawning.handle(
        &tick_events(Duration::from_secs(1)),
        PlayMode::Attack,
        &mut commands,
    );
    assert!(commands.is_empty(), "wave already complete");

    spawning.handle(
        &[
            Event::LevelReset { level: 2 },
            Event::TimeAdvanced {
                dt: Duration::from_millis(250),
            },
        ],
        PlayMode::Attack,
        &mut commands,
    );
    assert_eq!(commands.len(), 2);
    assert_eq!(spawning.spawned(), 2);
}

#[test]
fn spawned_speeds_are_reproducible() {
    fn fingerprint(seed: u64) -> u64 {
        let mut spawning =
            Spawning::new(Config::new(Duration::from_millis(250), 2.0, 0.75, 0, seed));
        let mut commands = Vec::new();
        for _ in 0..16 {
            spawning.handle(
                &tick_events(Duration::from_millis(250)),
                PlayMode::Attack,
                &mut commands,
            );
        }

        let mut hasher = DefaultHasher::new();
        for command in &commands {
            match command {
                Command::SpawnEnemy { speed } => {
                    assert!((1.25..=2.75).contains(speed));
                    speed.to_bits().hash(&mut hasher);
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
        hasher.finish()
    }

    assert_eq!(fingerprint(0x4d59_5df4_d0f3_3173), fingerprint(0x4d59_5df4_d0f3_3173));
    assert_ne!(fingerprint(1), fingerprint(2));
}

#[test]
fn spawn_commands_populate_the_world() {
    let mut world = World::default();
    let mut spawning = Spawning::new(Config::new(Duration::from_millis(500), 1.0, 0.0, 0, 3));
    let mut events = Vec::new();
    let mut commands = Vec::new();

    for _ in 0..4 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        spawning.handle(&events, query::play_mode(&world), &mut commands);
        events.clear();
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(query::object_count(&world), 2);
    assert_eq!(query::enemy_positions(&world).len(), 2);
}
