//! ActorContext: всё, что скрипт актора видит за один тик
//!
//! Собственные мутабельные данные актора (motion, health, status) +
//! read-only мир (geometry, registry) + исходящие буферы (cues, damage).
//! Буферы сбрасываются host'ом в события после `Process()` актора.

use bevy::prelude::*;

use super::ActorState;
use crate::collision::{cylinder_overlap_sphere, segment_blocked, CollisionResult, GeometryIndex, TestFlags};
use crate::host::{
    self, ActorCue, ActorFlags, ActorRegistry, ActorSnapshot, ActorStatus, DamageFlags, DamageRequest, Health,
};
use crate::movement::{integrate_and_resolve, kernel::BlockingParams, ActorMotion, ContactReport};
use crate::rng::RngStream;
use crate::volume::Volume;

pub struct ActorContext<'a> {
    pub entity: Entity,
    /// Номер глобального тика
    pub frame: u64,
    /// Тиков в текущем состоянии (0 на первом тике состояния)
    pub ticks_in_state: u32,
    pub motion: &'a mut ActorMotion,
    pub health: &'a mut Health,
    pub status: &'a mut ActorStatus,
    pub geometry: &'a dyn GeometryIndex,
    pub registry: &'a ActorRegistry,
    rng: &'a mut dyn RngStream,
    cues: &'a mut Vec<ActorCue>,
    damage: &'a mut Vec<DamageRequest>,
    forced_state: Option<usize>,
}

impl<'a> ActorContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity: Entity,
        frame: u64,
        motion: &'a mut ActorMotion,
        health: &'a mut Health,
        status: &'a mut ActorStatus,
        geometry: &'a dyn GeometryIndex,
        registry: &'a ActorRegistry,
        rng: &'a mut dyn RngStream,
        cues: &'a mut Vec<ActorCue>,
        damage: &'a mut Vec<DamageRequest>,
    ) -> Self {
        Self {
            entity,
            frame,
            ticks_in_state: 0,
            motion,
            health,
            status,
            geometry,
            registry,
            rng,
            cues,
            damage,
            forced_state: None,
        }
    }

    // --- RNG ---

    /// `[0, bound)` из общего детерминированного stream
    pub fn next_uint(&mut self, bound: u32) -> u32 {
        self.rng.next_uint(bound)
    }

    // --- Внешние коллабораторы (fire-and-forget) ---

    pub fn set_animation(&mut self, id: u16, flags: u16) {
        self.cues.push(ActorCue::Animation {
            entity: self.entity,
            id,
            flags,
        });
    }

    pub fn play_sfx(&mut self, id: u16) {
        self.cues.push(ActorCue::Sfx {
            entity: self.entity,
            id,
        });
    }

    /// Эффект в позиции с базисом актора
    pub fn spawn_effect(&mut self, id: u16, position: Vec3) {
        self.cues.push(ActorCue::Effect {
            entity: self.entity,
            id,
            position,
            facing: self.motion.facing,
            up: self.motion.up,
        });
    }

    // --- Урон ---

    /// Урон другому актору (применяется host'ом после тика актора)
    pub fn damage(&mut self, target: Entity, amount: u32, flags: DamageFlags, direction: Vec3) {
        self.damage.push(DamageRequest {
            source: Some(self.entity),
            target,
            amount,
            flags,
            direction,
        });
    }

    /// Урон самому себе с учётом INVINCIBLE. Возвращает true если убил.
    pub fn apply_damage(&mut self, request: &DamageRequest) -> bool {
        host::apply_damage(&mut *self.health, Some(&mut *self.status), request)
    }

    /// Лечение самого себя (не выше max)
    pub fn heal(&mut self, amount: u32) {
        self.health.heal(amount);
    }

    /// Always-on контактный урон: игроки, чья bounding sphere пересекает `hurt_volume`.
    ///
    /// Возвращает сколько игроков задето.
    pub fn contact_damage_players(&mut self, hurt_volume: &Volume, amount: u32) -> usize {
        let hits: Vec<(Entity, Vec3)> = self
            .registry
            .players()
            .filter(|player| {
                Volume::Sphere {
                    center: player.position,
                    radius: player.radius,
                }
                .overlaps(hurt_volume)
                .is_some()
            })
            .map(|player| (player.entity, player.position))
            .collect();

        for (entity, position) in &hits {
            let direction = (*position - self.motion.position).normalize_or_zero();
            self.damage(*entity, amount, DamageFlags::CONTACT, direction);
        }
        hits.len()
    }

    /// Луч `a → b` радиуса `radius` против bounding sphere цели
    pub fn beam_hits(&self, a: Vec3, b: Vec3, radius: f32, target: &ActorSnapshot) -> Option<CollisionResult> {
        cylinder_overlap_sphere(a, b, target.position, radius + target.radius)
    }

    // --- Мир ---

    pub fn main_player(&self) -> Option<&'a ActorSnapshot> {
        self.registry.main_player()
    }

    /// Основной игрок с VISIBLE (цель для sight-проверок)
    pub fn visible_player(&self) -> Option<&'a ActorSnapshot> {
        self.registry.visible_player()
    }

    /// Стена между актором и точкой
    pub fn blocked_towards(&self, target: Vec3, flags: TestFlags) -> Option<CollisionResult> {
        segment_blocked(self.geometry, self.motion.position, target, flags)
    }

    /// Интеграция скорости + blocking response для собственного motion
    pub fn move_and_collide(&mut self, delta_speed: Vec3, params: BlockingParams) -> ContactReport {
        integrate_and_resolve(self.motion, delta_speed, self.geometry, params)
    }

    // --- State machine ---

    /// Принудительный переход (применяется, только если ни один guard не сработал)
    pub fn request_state<S: ActorState>(&mut self, state: S) {
        self.forced_state = Some(state.index());
    }

    pub(crate) fn take_forced_state<S: ActorState>(&mut self) -> Option<S> {
        self.forced_state.take().and_then(S::from_index)
    }

    /// Скрипт объявляет актора уничтоженным (host ставит Dead)
    pub fn destroy(&mut self) {
        self.status.flags.insert(ActorFlags::DESTROYED);
    }
}
