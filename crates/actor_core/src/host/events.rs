//! Boundary events: cues для animation/audio/effects и damage requests

use bevy::prelude::*;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DamageFlags: u16 {
        /// Пробивает INVINCIBLE
        const IGNORE_INVINCIBLE = 1 << 0;
        /// Контактный урон (тело актора, damaging поверхность)
        const CONTACT = 1 << 1;
        /// Мгновенное уничтожение
        const KILL = 1 << 2;
    }
}

/// Запрос урона: `TakeDamage(amount, flags, direction, source)`
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: u32,
    pub flags: DamageFlags,
    pub direction: Vec3,
}

/// Fire-and-forget вызовы внешних коллабораторов (анимация, звук, эффекты)
/// + наблюдаемые переходы состояний.
///
/// Ядро их только пишет; рендер/аудио слой читает.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ActorCue {
    Animation {
        entity: Entity,
        id: u16,
        flags: u16,
    },
    Sfx {
        entity: Entity,
        id: u16,
    },
    Effect {
        entity: Entity,
        id: u16,
        position: Vec3,
        facing: Vec3,
        up: Vec3,
    },
    StateEntered {
        entity: Entity,
        class: &'static str,
        from: &'static str,
        to: &'static str,
        frame: u64,
    },
    Died {
        entity: Entity,
        frame: u64,
    },
}

impl ActorCue {
    pub fn entity(&self) -> Entity {
        match self {
            ActorCue::Animation { entity, .. }
            | ActorCue::Sfx { entity, .. }
            | ActorCue::Effect { entity, .. }
            | ActorCue::StateEntered { entity, .. }
            | ActorCue::Died { entity, .. } => *entity,
        }
    }
}
