//! Ownership and per-frame driving of every live simulation object.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use tile_defense_core::{AgentState, Event, ObjectId, ObjectKind, Path, TileCoord, TowerKind};
use tile_defense_system_movement::{Advance, AgentPathState};
use tracing::debug;

/// Mobile agent following the canonical path.
#[derive(Clone, Debug)]
pub struct Enemy {
    agent: AgentPathState,
}

impl Enemy {
    pub(crate) fn new(agent: AgentPathState) -> Self {
        Self { agent }
    }

    /// Navigation record of the enemy.
    #[must_use]
    pub const fn agent(&self) -> &AgentPathState {
        &self.agent
    }

    /// Receives a freshly computed canonical path.
    pub(crate) fn set_path(&mut self, path: &Path) -> Option<AgentState> {
        self.agent.assign(path)
    }
}

/// Obstacle blocking a single tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tower {
    kind: TowerKind,
    tile: TileCoord,
    position: Vec3,
}

impl Tower {
    pub(crate) const fn new(kind: TowerKind, tile: TileCoord, position: Vec3) -> Self {
        Self {
            kind,
            tile,
            position,
        }
    }

    /// Kind of tower that was built.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Tile blocked by the tower.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }
}

/// Static scenery placed on a tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    tile: TileCoord,
    position: Vec3,
}

impl Decoration {
    pub(crate) const fn new(tile: TileCoord, position: Vec3) -> Self {
        Self { tile, position }
    }

    /// Tile the decoration sits on.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }
}

/// Live simulation object owned by the registry.
#[derive(Clone, Debug)]
pub enum GameObject {
    /// Mobile agent.
    Enemy(Enemy),
    /// Tile-blocking obstacle.
    Tower(Tower),
    /// Scenery without navigation impact.
    Decoration(Decoration),
}

impl GameObject {
    /// Variant tag of the object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Enemy(_) => ObjectKind::Enemy,
            Self::Tower(_) => ObjectKind::Tower,
            Self::Decoration(_) => ObjectKind::Decoration,
        }
    }

    /// Current world position of the object.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        match self {
            Self::Enemy(enemy) => enemy.agent.position(),
            Self::Tower(tower) => tower.position,
            Self::Decoration(decoration) => decoration.position,
        }
    }

    /// Enemy payload, if the object is an enemy.
    #[must_use]
    pub const fn as_enemy(&self) -> Option<&Enemy> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            Self::Tower(_) | Self::Decoration(_) => None,
        }
    }

    /// Tower payload, if the object is a tower.
    #[must_use]
    pub const fn as_tower(&self) -> Option<&Tower> {
        match self {
            Self::Tower(tower) => Some(tower),
            Self::Enemy(_) | Self::Decoration(_) => None,
        }
    }

    /// Per-frame update. Towers and decorations have no motion.
    fn update(&mut self, dt: Duration) -> Advance {
        match self {
            Self::Enemy(enemy) => enemy.agent.advance(dt),
            Self::Tower(_) | Self::Decoration(_) => Advance::Idle,
        }
    }
}

/// Registry that stores live objects and manages identifier allocation.
#[derive(Debug)]
pub struct ObjectRegistry {
    entries: BTreeMap<ObjectId, GameObject>,
    next_object_id: ObjectId,
    selected: Option<ObjectId>,
}

impl ObjectRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_object_id: ObjectId::new(0),
            selected: None,
        }
    }

    /// Stores an object and returns its identifier.
    ///
    /// Every object already present is reported through
    /// [`Event::ResourcesInvalidated`] so renderers refresh their materials.
    pub(crate) fn add(&mut self, object: GameObject, out_events: &mut Vec<Event>) -> ObjectId {
        let existing: Vec<ObjectId> = self.entries.keys().copied().collect();
        if !existing.is_empty() {
            out_events.push(Event::ResourcesInvalidated { objects: existing });
        }

        let id = self.next_object_id;
        self.next_object_id = ObjectId::new(id.get().saturating_add(1));
        let kind = object.kind();
        let _ = self.entries.insert(id, object);
        out_events.push(Event::ObjectAdded { object: id, kind });
        id
    }

    /// Removes an object. Removing an unknown identifier is a no-op.
    pub(crate) fn remove(
        &mut self,
        id: ObjectId,
        out_events: &mut Vec<Event>,
    ) -> Option<GameObject> {
        let mut object = self.entries.remove(&id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        if let GameObject::Enemy(enemy) = &mut object {
            if enemy.agent.state() != AgentState::Despawned {
                enemy.agent.despawn();
                out_events.push(Event::AgentStateChanged {
                    object: id,
                    state: AgentState::Despawned,
                });
            }
        }
        out_events.push(Event::ObjectRemoved { object: id });
        Some(object)
    }

    /// Updates every live object and returns the enemies that reached the end.
    ///
    /// The identifier list is captured before iterating; enemies that arrive
    /// are removed only after every object has been updated.
    pub(crate) fn update(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> Vec<ObjectId> {
        let ids: Vec<ObjectId> = self.entries.keys().copied().collect();
        let mut arrived = Vec::new();

        for id in ids {
            let Some(object) = self.entries.get_mut(&id) else {
                continue;
            };
            if object.update(dt) == Advance::Arrived {
                out_events.push(Event::AgentStateChanged {
                    object: id,
                    state: AgentState::Despawned,
                });
                arrived.push(id);
            }
        }

        for id in &arrived {
            out_events.push(Event::EnemyEscaped { enemy: *id });
            let _ = self.remove(*id, out_events);
        }
        arrived
    }

    /// Delivers a new canonical path to every enemy.
    pub(crate) fn broadcast_path(&mut self, path: &Path, out_events: &mut Vec<Event>) {
        for (id, object) in &mut self.entries {
            let GameObject::Enemy(enemy) = object else {
                continue;
            };
            if let Some(state) = enemy.set_path(path) {
                debug!(object = id.get(), ?state, "enemy changed navigation state");
                out_events.push(Event::AgentStateChanged { object: *id, state });
            }
        }
    }

    /// Selects the object, replacing any previous selection.
    pub(crate) fn select(&mut self, id: ObjectId) -> bool {
        if self.entries.contains_key(&id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub(crate) fn deselect_all(&mut self) {
        self.selected = None;
    }

    /// Currently selected object, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Object stored under the identifier.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.entries.get(&id)
    }

    /// Iterator over live objects in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.entries.iter().map(|(id, object)| (*id, object))
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the registry holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every object, reporting each removal.
    pub(crate) fn clear(&mut self, out_events: &mut Vec<Event>) {
        let ids: Vec<ObjectId> = self.entries.keys().copied().collect();
        for id in ids {
            let _ = self.remove(id, out_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_defense_core::Waypoint;

    fn tower_at(column: u32, row: u32) -> GameObject {
        GameObject::Tower(Tower::new(
            TowerKind::Basic,
            TileCoord::new(column, row),
            Vec3::new(column as f32, 0.0, row as f32),
        ))
    }

    fn enemy_on_path(path: &Path) -> GameObject {
        let mut agent = AgentPathState::new(1.0, Vec3::ZERO);
        let _ = agent.assign(path);
        GameObject::Enemy(Enemy::new(agent))
    }

    fn two_step_path() -> Path {
        Path::new(vec![
            Waypoint::new(TileCoord::new(0, 0), Vec3::ZERO),
            Waypoint::new(TileCoord::new(1, 0), Vec3::X),
        ])
    }

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = ObjectRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.next_object_id.get(), 0);
        assert_eq!(registry.selected(), None);
    }

    #[test]
    fn add_allocates_sequential_ids_and_invalidates_existing() {
        let mut registry = ObjectRegistry::new();
        let mut events = Vec::new();

        let first = registry.add(tower_at(1, 1), &mut events);
        assert_eq!(
            events,
            vec![Event::ObjectAdded {
                object: first,
                kind: ObjectKind::Tower
            }]
        );

        events.clear();
        let second = registry.add(tower_at(2, 1), &mut events);
        assert_eq!(second.get(), first.get() + 1);
        assert_eq!(
            events.first(),
            Some(&Event::ResourcesInvalidated {
                objects: vec![first]
            })
        );
    }

    #[test]
    fn remove_twice_is_a_no_op() {
        let mut registry = ObjectRegistry::new();
        let mut events = Vec::new();
        let id = registry.add(tower_at(1, 1), &mut events);
        events.clear();

        assert!(registry.remove(id, &mut events).is_some());
        assert_eq!(events, vec![Event::ObjectRemoved { object: id }]);

        events.clear();
        assert!(registry.remove(id, &mut events).is_none());
        assert!(events.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn arrived_enemies_are_removed_after_the_update_loop() {
        let mut registry = ObjectRegistry::new();
        let mut events = Vec::new();
        let path = two_step_path();
        let fast = registry.add(enemy_on_path(&path), &mut events);
        let tower = registry.add(tower_at(3, 3), &mut events);
        events.clear();

        let arrived = registry.update(Duration::from_secs(5), &mut events);

        assert_eq!(arrived, vec![fast]);
        assert!(registry.get(fast).is_none());
        assert!(registry.get(tower).is_some());
        assert!(events.contains(&Event::EnemyEscaped { enemy: fast }));
        assert!(events.contains(&Event::ObjectRemoved { object: fast }));
    }

    #[test]
    fn removing_selected_object_clears_selection() {
        let mut registry = ObjectRegistry::new();
        let mut events = Vec::new();
        let id = registry.add(tower_at(0, 1), &mut events);

        assert!(registry.select(id));
        assert_eq!(registry.selected(), Some(id));
        let _ = registry.remove(id, &mut events);
        assert_eq!(registry.selected(), None);
        assert!(!registry.select(id));
    }

    #[test]
    fn broadcast_only_reports_changed_states() {
        let mut registry = ObjectRegistry::new();
        let mut events = Vec::new();
        let path = two_step_path();
        let enemy = registry.add(enemy_on_path(&path), &mut events);
        let _ = registry.add(tower_at(2, 2), &mut events);
        events.clear();

        registry.broadcast_path(&path, &mut events);
        assert!(events.is_empty(), "moving enemy stays moving");

        registry.broadcast_path(&Path::empty(), &mut events);
        assert_eq!(
            events,
            vec![Event::AgentStateChanged {
                object: enemy,
                state: AgentState::Stuck
            }]
        );
    }
}
