//! Per-actor state machine + subroutine dispatch (`RunState()`)

use bevy::prelude::*;

use super::{ActorClass, ActorContext, ActorState, StateTable};

/// Мутабельная часть state machine: current + pending.
///
/// `pending` пишется во время dispatch и становится `current` только на
/// границе state machine (host вызывает `commit` после `Process()`), поэтому
/// action нового состояния впервые выполняется на следующем тике.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct StateMachine<S: ActorState> {
    current: S,
    pending: Option<S>,
    previous: Option<S>,
    ticks_in_state: u32,
}

impl<S: ActorState> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            pending: None,
            previous: None,
            ticks_in_state: 0,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn pending(&self) -> Option<S> {
        self.pending
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    /// Сколько тиков action текущего состояния уже отработал
    pub fn ticks_in_state(&self) -> u32 {
        self.ticks_in_state
    }

    /// Переход вне dispatch (спавн-скрипты, debug). Применится на commit.
    ///
    /// Состояние вне `S::ALL` игнорируется (false).
    pub fn set_pending(&mut self, state: S) -> bool {
        if !state.is_listed() {
            return false;
        }
        self.pending = Some(state);
        true
    }

    /// Атомарная замена current ← pending. Возвращает (from, to) если был переход.
    ///
    /// Переход в то же состояние тоже считается входом (счётчик тиков сбрасывается).
    pub fn commit(&mut self) -> Option<(S, S)> {
        let next = self.pending.take()?;
        let from = self.current;
        self.previous = Some(from);
        self.current = next;
        self.ticks_in_state = 0;
        Some((from, next))
    }
}

/// Результат одного `RunState()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome<S> {
    /// Индекс сработавшего subroutine в списке состояния
    pub fired: Option<usize>,
    pub subroutine: Option<&'static str>,
    /// Что будет current после commit
    pub pending: Option<S>,
}

/// Один тик state machine: action состояния, затем scan subroutines.
///
/// Первый guard, вернувший true, выставляет pending и останавливает scan.
/// Запрос `cx.request_state` применяется только если ни один guard не сработал.
/// Current вне таблицы: ничего не выполняется, актор стоит.
pub fn run_state<A: ActorClass>(
    actor: &mut A,
    machine: &mut StateMachine<A::State>,
    table: &StateTable<A>,
    cx: &mut ActorContext<'_>,
) -> StepOutcome<A::State> {
    let mut outcome = StepOutcome {
        fired: None,
        subroutine: None,
        pending: None,
    };
    let Some(descriptor) = table.descriptor(machine.current) else {
        return outcome;
    };
    cx.ticks_in_state = machine.ticks_in_state;

    (descriptor.action)(actor, cx);

    for (index, subroutine) in descriptor.subroutines.iter().enumerate() {
        if (subroutine.guard)(actor, cx) {
            outcome.fired = Some(index);
            outcome.subroutine = Some(subroutine.name);
            machine.pending = Some(subroutine.next);
            break;
        }
    }

    let forced = cx.take_forced_state::<A::State>();
    if outcome.fired.is_none() {
        if let Some(state) = forced {
            machine.pending = Some(state);
        }
    }

    machine.ticks_in_state = machine.ticks_in_state.saturating_add(1);
    outcome.pending = machine.pending;
    outcome
}
