//! Компоненты актора, которыми владеет host (health, status, kind, inbox)

use bevy::prelude::*;
use bitflags::bitflags;

use super::events::DamageRequest;

/// Здоровье актора
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Возвращает true если этот удар убил
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive();
        self.current = self.current.saturating_sub(amount);
        was_alive && !self.is_alive()
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

bitflags! {
    /// Actor-level флаги (видимость, неуязвимость, радар, уничтожен)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActorFlags: u16 {
        const VISIBLE = 1 << 0;
        const INVINCIBLE = 1 << 1;
        const ON_RADAR = 1 << 2;
        /// Скрипт сообщил об уничтожении (host снимает актора)
        const DESTROYED = 1 << 3;
    }
}

/// Статус актора вне state machine
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ActorStatus {
    pub flags: ActorFlags,
    /// Радиус bounding sphere (registry, contact damage)
    pub bounding_radius: f32,
    /// Тиков с последнего полученного урона (`u32::MAX`: не получал)
    pub ticks_since_damage: u32,
}

impl Default for ActorStatus {
    fn default() -> Self {
        Self {
            flags: ActorFlags::VISIBLE,
            bounding_radius: 0.5,
            ticks_since_damage: u32::MAX,
        }
    }
}

impl ActorStatus {
    pub fn with_radius(bounding_radius: f32) -> Self {
        Self {
            bounding_radius,
            ..Self::default()
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(ActorFlags::DESTROYED)
    }
}

/// Тип актора для registry запросов ("ближайший игрок", "сколько таких живо")
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorKind {
    Player,
    /// Скриптовый актор с class id
    Enemy(u16),
    /// Прочие объекты (платформы, двери) с id
    Object(u16),
}

/// Маркер: актор мёртв (health == 0 или DESTROYED), state machine не крутится.
///
/// Деспавн не автоматический.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

/// Маркер: начальное состояние инстанса вне таблицы класса.
///
/// Актор стоит статично (dispatch пропускается), урон идёт сразу в Health.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Stalled;

/// Входящий урон, ожидающий `Process()` актора
#[derive(Component, Debug, Clone, Default)]
pub struct DamageInbox {
    requests: Vec<DamageRequest>,
}

impl DamageInbox {
    pub fn push(&mut self, request: DamageRequest) {
        self.requests.push(request);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, DamageRequest> {
        self.requests.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}
