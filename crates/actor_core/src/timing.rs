//! Tick-rate convention
//!
//! Скрипты авторены под исходную симуляцию, которая тикала в 2 раза медленнее.
//! Поэтому:
//! - длительности (N исходных тиков) хранятся как `N * RATE_FACTOR` тиков;
//! - per-tick дельты (скорость, шаг угла) хранятся как `delta / RATE_FACTOR`.
//!
//! Конвертация делается ровно один раз: в момент записи значения в состояние
//! актора (`Countdown::original`, `per_tick`), никогда в месте использования.

use serde::{Deserialize, Serialize};

/// Множитель исходной частоты тиков → текущей (process-wide).
pub const RATE_FACTOR: u16 = 2;

/// Частота исходной симуляции (Hz).
pub const ORIGINAL_TICK_HZ: f64 = 30.0;

/// Частота этой симуляции (Hz).
pub const TICK_HZ: f64 = ORIGINAL_TICK_HZ * RATE_FACTOR as f64;

/// Длительность в исходных тиках → количество тиков на текущей частоте.
pub const fn ticks(original: u16) -> u16 {
    ticks_at(original, RATE_FACTOR)
}

/// То же, но с явным множителем (для проверки инвариантности к rate).
pub const fn ticks_at(original: u16, rate_factor: u16) -> u16 {
    original.saturating_mul(rate_factor)
}

/// Авторская per-tick дельта → дельта на текущей частоте.
pub fn per_tick(authored: f32) -> f32 {
    per_tick_at(authored, RATE_FACTOR)
}

pub fn per_tick_at(authored: f32, rate_factor: u16) -> f32 {
    authored / f32::from(rate_factor.max(1))
}

/// Обратный счётчик, принадлежащий актору.
///
/// Уменьшается раз в тик, пока активен; достижение нуля: наблюдаемое
/// событие "fire", которое проверяют subroutines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Countdown {
    count: u16,
}

impl Countdown {
    /// Нулевой (уже сработавший) счётчик.
    pub const ZERO: Self = Self { count: 0 };

    /// Длительность, заданная в исходных тиках.
    pub const fn original(duration: u16) -> Self {
        Self { count: ticks(duration) }
    }

    /// Длительность в исходных тиках с явным rate factor.
    pub const fn original_at(duration: u16, rate_factor: u16) -> Self {
        Self { count: ticks_at(duration, rate_factor) }
    }

    /// Уже сконвертированное количество тиков (без умножения).
    pub const fn raw(count: u16) -> Self {
        Self { count }
    }

    pub const fn count(&self) -> u16 {
        self.count
    }

    pub const fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// Один тик обратного отсчёта без проверки.
    pub fn tick(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    /// Идиома guard'ов: если счётчик > 0: уменьшить и вернуть false,
    /// иначе вернуть true ("сработал").
    pub fn tick_or_fire(&mut self) -> bool {
        if self.count > 0 {
            self.count -= 1;
            false
        } else {
            true
        }
    }

    /// Перезарядить на длительность в исходных тиках.
    pub fn reset_original(&mut self, duration: u16) {
        *self = Self::original(duration);
    }

    /// Сколько исходных тиков осталось (округление вверх).
    pub fn original_remaining_at(&self, rate_factor: u16) -> u16 {
        let factor = rate_factor.max(1);
        self.count.div_ceil(factor)
    }
}
