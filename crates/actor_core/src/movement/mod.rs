//! MovementKernel: позиция, скорость, ориентация актора
//!
//! Содержит:
//! - ActorMotion (position/speed/facing/up, per-actor, не shared)
//! - kernel: integrate + blocking collision response
//! - seek: bounded-angle поворот к цели
//! - move_to: движение к точке фиксированными шагами
//!
//! Вырожденные вектора (параллельные facing/up, нормализация нуля)
//! исправляются локально fallback осью, никогда не пропагируются.

use bevy::prelude::*;

pub mod kernel;
pub mod move_to;
pub mod seek;

pub use kernel::{integrate, integrate_and_resolve, resolve_blocking, BlockingMode, ContactReport};
pub use move_to::{start_move_to, MoveTo};
pub use seek::{rotate_vector, seek_target_facing, seek_target_vector, SeekPlan};

/// Порог |dot| после которого facing/up считаются параллельными
const PARALLEL_THRESHOLD: f32 = 0.9999;

/// Состояние движения актора
///
/// Invariant: `facing` и `up` единичные и не параллельны
/// (исправляется в `set_transform`).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ActorMotion {
    pub position: Vec3,
    /// Смещение за один тик (уже в текущей частоте)
    pub speed: Vec3,
    pub facing: Vec3,
    pub up: Vec3,
}

impl Default for ActorMotion {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            speed: Vec3::ZERO,
            facing: Vec3::Z,
            up: Vec3::Y,
        }
    }
}

impl ActorMotion {
    pub fn new(position: Vec3, facing: Vec3, up: Vec3) -> Self {
        let mut motion = Self {
            position,
            ..Self::default()
        };
        motion.set_transform(facing, up);
        motion
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Ортонормализует базис: facing приоритетен, up подгоняется
    pub fn set_transform(&mut self, facing: Vec3, up: Vec3) {
        let facing = facing.try_normalize().unwrap_or(self.facing);
        let up = fix_parallel_vectors(facing, up);
        // Gram-Schmidt: убираем из up компоненту вдоль facing
        let up = (up - facing * facing.dot(up)).try_normalize().unwrap_or(Vec3::Y);
        self.facing = facing;
        self.up = up;
    }

    /// Только направление взгляда (up пересчитывается)
    pub fn set_facing(&mut self, facing: Vec3) {
        let up = self.up;
        self.set_transform(facing, up);
    }

    pub fn right(&self) -> Vec3 {
        self.up.cross(self.facing).normalize_or_zero()
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

/// Если `up` параллелен `facing`: подменяет его на мировую Z (или X,
/// если facing сам вдоль Z). Иначе возвращает `up` как есть.
pub fn fix_parallel_vectors(facing: Vec3, up: Vec3) -> Vec3 {
    let Some(up_unit) = up.try_normalize() else {
        return fallback_up(facing);
    };
    let Some(facing_unit) = facing.try_normalize() else {
        return up_unit;
    };
    if facing_unit.dot(up_unit).abs() < PARALLEL_THRESHOLD {
        return up_unit;
    }
    fallback_up(facing_unit)
}

fn fallback_up(facing: Vec3) -> Vec3 {
    if facing.normalize_or_zero().dot(Vec3::Z).abs() < PARALLEL_THRESHOLD {
        Vec3::Z
    } else {
        Vec3::X
    }
}
