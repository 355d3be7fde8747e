//! Движение к точке фиксированными шагами

use bevy::prelude::*;

use super::ActorMotion;
use crate::timing::{per_tick, ticks, Countdown};

/// Активное движение к цели (перезаписывается, без очереди)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveTo {
    pub target: Vec3,
    /// Длина шага за тик (уже в текущей частоте)
    pub step_distance: f32,
    /// Шагов в исходных тиках (floor(distance / step) + 1)
    pub original_steps: u16,
    pub steps: Countdown,
}

/// Новая цель: пишет скорость в `motion.speed`, возвращает счётчик шагов.
///
/// `step_speed`: авторская дистанция за исходный тик. Количество шагов
/// `floor(distance / step_speed) + 1` считается в исходных тиках и
/// конвертируется в текущие. Нулевая дистанция → нулевая скорость и один тик.
pub fn start_move_to(motion: &mut ActorMotion, target: Vec3, step_speed: f32) -> MoveTo {
    let travel = target - motion.position;
    let distance = travel.length();
    let step_distance = per_tick(step_speed);

    if distance == 0.0 || step_speed <= 0.0 {
        motion.speed = Vec3::ZERO;
        return MoveTo {
            target,
            step_distance,
            original_steps: 1,
            steps: Countdown::raw(1),
        };
    }

    let original_steps = (distance / step_speed).floor().min(f32::from(u16::MAX - 1)) as u16 + 1;
    motion.speed = travel * (step_distance / distance);
    MoveTo {
        target,
        step_distance,
        original_steps,
        steps: Countdown::raw(ticks(original_steps)),
    }
}

impl MoveTo {
    pub fn remaining(&self) -> u16 {
        self.steps.count()
    }

    /// Тик обратного отсчёта; true когда шаги кончились
    pub fn tick_or_fire(&mut self) -> bool {
        self.steps.tick_or_fire()
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::RATE_FACTOR;
    use approx::assert_relative_eq;

    #[test]
    fn test_start_move_to_scenario() {
        let mut motion = ActorMotion::at(Vec3::ZERO);
        let plan = start_move_to(&mut motion, Vec3::new(10.0, 0.0, 0.0), 1.0);
        assert_eq!(plan.original_steps, 11);
        assert_eq!(plan.remaining(), 11 * RATE_FACTOR);
        // (1,0,0) за исходный тик → половина за текущий
        assert_relative_eq!(motion.speed.x, 1.0 / f32::from(RATE_FACTOR), epsilon = 1e-6);
        assert_relative_eq!(motion.speed.length() * f32::from(RATE_FACTOR), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_start_move_to_zero_distance() {
        let mut motion = ActorMotion::at(Vec3::ONE);
        motion.speed = Vec3::X;
        let plan = start_move_to(&mut motion, Vec3::ONE, 0.5);
        assert_eq!(motion.speed, Vec3::ZERO);
        assert_eq!(plan.remaining(), 1);
    }

    #[test]
    fn test_restart_overwrites_previous_target() {
        let mut motion = ActorMotion::at(Vec3::ZERO);
        let _first = start_move_to(&mut motion, Vec3::new(10.0, 0.0, 0.0), 1.0);
        let second = start_move_to(&mut motion, Vec3::new(0.0, 0.0, 4.0), 2.0);
        assert_eq!(second.target, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(second.original_steps, 3);
        assert_relative_eq!(motion.speed.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(motion.speed.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_walking_all_steps_reaches_target_neighborhood() {
        let mut motion = ActorMotion::at(Vec3::ZERO);
        let mut plan = start_move_to(&mut motion, Vec3::new(3.0, 0.0, 4.0), 0.5);
        while !plan.tick_or_fire() {
            motion.position += motion.speed;
        }
        // floor(5 / 0.5) + 1 = 11 исходных шагов по 0.5 → на один шаг дальше цели
        assert_relative_eq!(motion.distance_to(Vec3::new(3.0, 0.0, 4.0)), 0.5, epsilon = 1e-4);
    }
}
