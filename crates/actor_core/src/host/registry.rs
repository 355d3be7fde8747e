//! Actor registry: read-only снапшот живых акторов на текущий тик
//!
//! Пересобирается в начале каждого тика (ActorSet::Refresh), дальше
//! скрипты только читают. Мутации (спавн, урон) идут через события и
//! применяются в фиксированных точках тика.

use bevy::prelude::*;

use super::components::{ActorFlags, ActorKind, ActorStatus, Dead, Health};
use crate::movement::ActorMotion;

/// Снимок одного актора
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub entity: Entity,
    pub kind: ActorKind,
    pub position: Vec3,
    pub health: u32,
    pub alive: bool,
    pub radius: f32,
    /// Копия `ActorStatus::flags` (VISIBLE без status)
    pub flags: ActorFlags,
}

impl ActorSnapshot {
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ActorFlags::VISIBLE)
    }

    pub fn on_radar(&self) -> bool {
        self.flags.contains(ActorFlags::ON_RADAR)
    }
}

/// Все акторы, отсортированные по Entity (детерминизм)
#[derive(Resource, Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: Vec<ActorSnapshot>,
}

impl ActorRegistry {
    pub fn from_snapshots(mut actors: Vec<ActorSnapshot>) -> Self {
        actors.sort_by_key(|snapshot| snapshot.entity);
        Self { actors }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter()
    }

    pub fn get(&self, entity: Entity) -> Option<&ActorSnapshot> {
        self.actors
            .binary_search_by_key(&entity, |snapshot| snapshot.entity)
            .ok()
            .map(|index| &self.actors[index])
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Ближайший живой актор, прошедший фильтр (ничья → меньший Entity)
    pub fn nearest(
        &self,
        from: Vec3,
        exclude: Option<Entity>,
        filter: impl Fn(&ActorSnapshot) -> bool,
    ) -> Option<&ActorSnapshot> {
        self.actors
            .iter()
            .filter(|snapshot| snapshot.alive && Some(snapshot.entity) != exclude && filter(snapshot))
            .fold(None, |best: Option<(&ActorSnapshot, f32)>, snapshot| {
                let distance = snapshot.position.distance_squared(from);
                match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((snapshot, distance)),
                }
            })
            .map(|(snapshot, _)| snapshot)
    }

    /// Количество живых акторов данного типа
    pub fn count_alive(&self, kind: ActorKind) -> usize {
        self.actors
            .iter()
            .filter(|snapshot| snapshot.alive && snapshot.kind == kind)
            .count()
    }

    /// Основной игрок: первый живой Player
    pub fn main_player(&self) -> Option<&ActorSnapshot> {
        self.actors
            .iter()
            .find(|snapshot| snapshot.alive && snapshot.kind == ActorKind::Player)
    }

    pub fn players(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors
            .iter()
            .filter(|snapshot| snapshot.alive && snapshot.kind == ActorKind::Player)
    }

    /// Основной игрок, если его можно увидеть (без VISIBLE скрипты его не замечают)
    pub fn visible_player(&self) -> Option<&ActorSnapshot> {
        self.main_player().filter(|snapshot| snapshot.is_visible())
    }

    /// Живые акторы с ON_RADAR (для внешнего HUD слоя)
    pub fn radar_blips(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter().filter(|snapshot| snapshot.alive && snapshot.on_radar())
    }
}

/// Система: пересборка registry (первая в тике)
pub fn refresh_actor_registry(
    mut registry: ResMut<ActorRegistry>,
    actors: Query<(Entity, &ActorKind, &ActorMotion, Option<&Health>, Option<&ActorStatus>, Has<Dead>)>,
) {
    let snapshots = actors
        .iter()
        .map(|(entity, kind, motion, health, status, dead)| {
            let health_value = health.map_or(0, |h| h.current);
            let destroyed = status.is_some_and(|s| s.is_destroyed());
            ActorSnapshot {
                entity,
                kind: *kind,
                position: motion.position,
                health: health_value,
                alive: !dead && !destroyed && health.is_none_or(|h| h.is_alive()),
                radius: status.map_or(0.0, |s| s.bounding_radius),
                flags: status.map_or(ActorFlags::VISIBLE, |s| s.flags),
            }
        })
        .collect();
    *registry = ActorRegistry::from_snapshots(snapshots);
}
