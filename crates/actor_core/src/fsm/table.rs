//! Load-time таблица состояний actor class
//!
//! Immutable после `build()`, одна на класс, разделяется всеми инстансами
//! по ссылке (`ClassTable<A>` resource). Валидация: здесь, не в dispatch.

use std::fmt::Debug;

use super::{ActorClass, ActorContext};
use crate::error::ConfigError;

/// Состояние actor class: enum с плотными индексами `0..ALL.len()`
pub trait ActorState: Copy + Eq + Debug + Send + Sync + 'static {
    /// Все состояния в порядке индексов
    const ALL: &'static [Self];

    fn index(self) -> usize;

    /// Имя для логов и StateEntered cue
    fn name(self) -> &'static str;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Вариант присутствует в `ALL` под своим индексом
    fn is_listed(self) -> bool {
        Self::from_index(self.index()) == Some(self)
    }
}

/// Per-tick действие состояния
pub type StateAction<A> = fn(&mut A, &mut ActorContext<'_>);

/// Guard с side effects: true → переход в `next`
pub type Guard<A> = fn(&mut A, &mut ActorContext<'_>) -> bool;

pub struct Subroutine<A: ActorClass> {
    pub name: &'static str,
    pub guard: Guard<A>,
    pub next: A::State,
}

impl<A: ActorClass> Subroutine<A> {
    pub fn new(name: &'static str, guard: Guard<A>, next: A::State) -> Self {
        Self { name, guard, next }
    }
}

impl<A: ActorClass> Clone for Subroutine<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            guard: self.guard,
            next: self.next,
        }
    }
}

pub struct StateDescriptor<A: ActorClass> {
    pub state: A::State,
    pub action: StateAction<A>,
    /// Упорядоченный список, первый true побеждает
    pub subroutines: Vec<Subroutine<A>>,
}

/// Действие-заглушка для состояний без per-tick логики
pub fn no_action<A>(_actor: &mut A, _cx: &mut ActorContext<'_>) {}

pub struct StateTable<A: ActorClass> {
    descriptors: Vec<StateDescriptor<A>>,
}

impl<A: ActorClass> StateTable<A> {
    pub fn builder() -> StateTableBuilder<A> {
        StateTableBuilder {
            entries: Vec::new(),
        }
    }

    /// Дескриптор состояния. None для варианта вне `ALL`: такие состояния
    /// могут прийти из `initial_state`, минуя `build`.
    pub fn descriptor(&self, state: A::State) -> Option<&StateDescriptor<A>> {
        if !state.is_listed() {
            return None;
        }
        self.descriptors.get(state.index())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateDescriptor<A>> {
        self.descriptors.iter()
    }
}

pub struct StateTableBuilder<A: ActorClass> {
    entries: Vec<StateDescriptor<A>>,
}

impl<A: ActorClass> StateTableBuilder<A> {
    pub fn state(mut self, state: A::State, action: StateAction<A>, subroutines: Vec<Subroutine<A>>) -> Self {
        self.entries.push(StateDescriptor {
            state,
            action,
            subroutines,
        });
        self
    }

    /// Валидация: каждое состояние ровно один раз, индексы плотные,
    /// все переходы в пределах таблицы.
    pub fn build(self) -> Result<StateTable<A>, ConfigError> {
        let all = A::State::ALL;
        if all.is_empty() || self.entries.is_empty() {
            return Err(ConfigError::EmptyStateTable { class: A::NAME });
        }

        for (expected, state) in all.iter().enumerate() {
            if state.index() != expected {
                return Err(ConfigError::StateIndexMismatch {
                    class: A::NAME,
                    state: format!("{state:?}"),
                    expected,
                    actual: state.index(),
                });
            }
        }

        let count = all.len();
        let mut slots: Vec<Option<StateDescriptor<A>>> = (0..count).map(|_| None).collect();
        for entry in self.entries {
            let index = entry.state.index();
            if index >= count {
                return Err(ConfigError::StateIndexMismatch {
                    class: A::NAME,
                    state: format!("{:?}", entry.state),
                    expected: count.saturating_sub(1),
                    actual: index,
                });
            }
            for (subroutine, sub) in entry.subroutines.iter().enumerate() {
                let target = sub.next.index();
                if target >= count {
                    return Err(ConfigError::TransitionOutOfRange {
                        class: A::NAME,
                        state: format!("{:?}", entry.state),
                        subroutine,
                        target,
                        count,
                    });
                }
            }
            if slots[index].is_some() {
                return Err(ConfigError::DuplicateState {
                    class: A::NAME,
                    state: format!("{:?}", entry.state),
                });
            }
            slots[index] = Some(entry);
        }

        let mut descriptors = Vec::with_capacity(count);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(descriptor) => descriptors.push(descriptor),
                None => {
                    return Err(ConfigError::MissingState {
                        class: A::NAME,
                        state: format!("{:?}", all[index]),
                    })
                }
            }
        }

        Ok(StateTable { descriptors })
    }
}
