//! Load-time ошибки конфигурации
//!
//! Единственный error type крейта. Runtime пути (queries, movement, dispatch)
//! ошибок не возвращают: только пустые результаты / false / fallback оси.

use thiserror::Error;

/// Ошибка конфигурации actor class / volume / geometry / config.
///
/// Ловится при загрузке класса, до первого тика. Фатальна для класса,
/// не для симуляции.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("actor class {class}: state table is empty")]
    EmptyStateTable { class: &'static str },

    #[error("actor class {class}: state {state} has no descriptor")]
    MissingState { class: &'static str, state: String },

    #[error("actor class {class}: state {state} is defined twice")]
    DuplicateState { class: &'static str, state: String },

    #[error("actor class {class}: state {state} reports index {actual}, expected {expected}")]
    StateIndexMismatch {
        class: &'static str,
        state: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "actor class {class}: state {state} subroutine #{subroutine} targets index {target} (only {count} states)"
    )]
    TransitionOutOfRange {
        class: &'static str,
        state: String,
        subroutine: usize,
        target: usize,
        count: usize,
    },

    #[error("invalid volume: {reason}")]
    InvalidVolume { reason: String },

    #[error("degenerate surface ({points} points): {reason}")]
    DegenerateSurface { points: usize, reason: &'static str },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
