//! ActorClass: скрипт актора = данные + load-time таблица состояний

use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use super::{ActorContext, ActorState, StateTable};
use crate::error::ConfigError;
use crate::host::DamageRequest;

/// Что делать после always-on части `Process()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessFlow {
    /// Обычный путь: `RunState()`
    #[default]
    RunState,
    /// Пропустить state machine на этом тике (неактивен, ждёт триггера)
    Skip,
}

/// Класс актора (один тип на скрипт).
///
/// Компонент хранит приватные поля инстанса (таймеры, цели, values).
/// Поведение: в `state_table()`, строится один раз при регистрации класса
/// и разделяется всеми инстансами.
pub trait ActorClass: Component<Mutability = Mutable> + Sized {
    type State: ActorState;

    const NAME: &'static str;
    /// `ActorKind::Enemy(CLASS_ID)` для registry запросов
    const CLASS_ID: u16;

    fn state_table() -> Result<StateTable<Self>, ConfigError>;

    fn initial_state(&self) -> Self::State;

    /// Always-on эффекты до `RunState()` (контактный урон, ambient звук)
    fn process(&mut self, _cx: &mut ActorContext<'_>) -> ProcessFlow {
        ProcessFlow::RunState
    }

    /// `EnemyTakeDamage(source) -> consumed`. false → host применяет урон к Health.
    fn take_damage(&mut self, _request: &DamageRequest, _cx: &mut ActorContext<'_>) -> bool {
        false
    }
}
