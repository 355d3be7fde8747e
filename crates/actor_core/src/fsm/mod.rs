//! State machine / subroutine dispatch
//!
//! Архитектура:
//! - `StateTable<A>`: immutable таблица класса (enum state → action + guards)
//! - `StateMachine<S>`: component с current/pending
//! - `run_state`: action, затем first-true-wins scan
//! - `ActorContext`: всё, что видит скрипт за тик

pub mod class;
pub mod context;
pub mod machine;
pub mod table;


pub use class::{ActorClass, ProcessFlow};
pub use context::ActorContext;
pub use machine::{run_state, StateMachine, StepOutcome};
pub use table::{no_action, ActorState, Guard, StateAction, StateDescriptor, StateTable, Subroutine};
