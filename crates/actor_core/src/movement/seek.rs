//! Seek: поворот вектора к цели с ограниченным шагом за тик
//!
//! Вызывающий считает `step_angle = total_angle / steps` один раз на новую цель,
//! поэтому ровно `steps` вызовов проходят весь угол.

use bevy::prelude::*;

use super::ActorMotion;
use crate::timing::ticks;

/// Допуск сравнения остатка угла с шагом (градусы)
const ANGLE_EPSILON_DEG: f32 = 1e-3;

/// Поворот `vector` вокруг `axis` на `degrees`
pub fn rotate_vector(vector: Vec3, axis: Vec3, degrees: f32) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, degrees.to_radians()) * vector,
        None => vector,
    }
}

/// Угол между векторами в градусах (0 для вырожденных)
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let cross = a.cross(b).length();
    let dot = a.dot(b);
    if cross == 0.0 && dot == 0.0 {
        return 0.0;
    }
    cross.atan2(dot).to_degrees()
}

/// Ось поворота `from → to`: нормаль к обоим, либо `fallback` для (анти)параллельных
pub fn seek_axis(from: Vec3, to: Vec3, fallback: Vec3) -> Vec3 {
    from.cross(to)
        .try_normalize()
        .or_else(|| fallback.try_normalize())
        .unwrap_or_else(|| from.any_orthonormal_vector())
}

/// Один шаг поворота `current` к `target` вокруг `axis`.
///
/// Возвращает true (и ставит `current` ровно в `target`), когда остаток угла
/// не больше одного шага или шаги кончились. Иначе поворачивает на
/// `step_angle` градусов и уменьшает `steps`.
pub fn seek_target_vector(
    target: Vec3,
    current: &mut Vec3,
    axis: Vec3,
    steps: &mut u16,
    step_angle: f32,
) -> bool {
    let target = target.try_normalize().unwrap_or(*current);
    if *steps == 0 {
        *current = target;
        return true;
    }
    let remaining = angle_between_deg(*current, target);
    if remaining <= step_angle.abs() + ANGLE_EPSILON_DEG {
        *current = target;
        *steps = 0;
        return true;
    }
    *current = rotate_vector(*current, axis, step_angle).normalize_or_zero();
    *steps -= 1;
    if *steps == 0 {
        *current = target;
        return true;
    }
    false
}

/// Поворот facing к `target` вокруг лучшей доступной перпендикулярной оси.
///
/// Ось пересчитывается на каждом вызове; для противоположных векторов
/// вращение идёт вокруг `up`.
pub fn seek_target_facing(
    facing: &mut Vec3,
    target: Vec3,
    up: Vec3,
    steps: &mut u16,
    step_angle: f32,
) -> bool {
    let axis = seek_axis(*facing, target, up);
    seek_target_vector(target, facing, axis, steps, step_angle)
}

/// Предрасчитанный поворот к цели: ось, шаг угла, оставшиеся шаги
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeekPlan {
    pub target: Vec3,
    pub axis: Vec3,
    pub step_angle: f32,
    pub steps: u16,
}

impl SeekPlan {
    /// `steps`: уже в тиках текущей частоты
    pub fn new(current: Vec3, target: Vec3, steps: u16, fallback_axis: Vec3) -> Self {
        let target = target.try_normalize().unwrap_or(current);
        let angle = angle_between_deg(current, target);
        let step_angle = if steps > 0 { angle / f32::from(steps) } else { angle };
        Self {
            target,
            axis: seek_axis(current, target, fallback_axis),
            step_angle,
            steps,
        }
    }

    /// `original_steps`: в исходных тиках (конвертируется здесь)
    pub fn original(current: Vec3, target: Vec3, original_steps: u16, fallback_axis: Vec3) -> Self {
        Self::new(current, target, ticks(original_steps), fallback_axis)
    }

    pub fn is_done(&self) -> bool {
        self.steps == 0
    }

    /// Шаг вектора `current` по плану
    pub fn advance(&mut self, current: &mut Vec3) -> bool {
        seek_target_vector(self.target, current, self.axis, &mut self.steps, self.step_angle)
    }

    /// Шаг facing актора по плану (up пересчитывается)
    pub fn advance_facing(&mut self, motion: &mut ActorMotion) -> bool {
        let mut facing = motion.facing;
        let reached = self.advance(&mut facing);
        motion.set_facing(facing);
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Vec3::X, Vec3::Z, 4)]
    #[case(Vec3::X, Vec3::Z, 9)]
    #[case(Vec3::Z, Vec3::new(-1.0, 0.0, 0.2), 7)]
    #[case(Vec3::new(0.3, 0.5, 1.0), Vec3::new(-0.2, -0.4, -1.0), 12)]
    fn test_seek_converges_in_n_calls_without_overshoot(
        #[case] start: Vec3,
        #[case] target: Vec3,
        #[case] n: u16,
    ) {
        let mut current = start.normalize();
        let target_unit = target.normalize();
        let total = angle_between_deg(current, target_unit);
        let step_angle = total / f32::from(n);
        let axis = seek_axis(current, target_unit, Vec3::Y);
        let mut steps = n;

        let mut reached_at = None;
        let mut previous_remaining = total;
        for call in 1..=n {
            let reached = seek_target_vector(target_unit, &mut current, axis, &mut steps, step_angle);
            let remaining = angle_between_deg(current, target_unit);
            // Никогда не проскакиваем: остаток монотонно уменьшается
            assert!(remaining <= previous_remaining + 1e-3);
            previous_remaining = remaining;
            if reached {
                reached_at = Some(call);
                break;
            }
        }
        assert!(reached_at.is_some_and(|call| call <= n));
        assert_relative_eq!(current.dot(target_unit), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_seek_with_zero_steps_snaps() {
        let mut current = Vec3::X;
        let mut steps = 0;
        assert!(seek_target_vector(Vec3::Z, &mut current, Vec3::Y, &mut steps, 10.0));
        assert_eq!(current, Vec3::Z);
    }

    #[test]
    fn test_seek_single_step_magnitude() {
        let mut current = Vec3::X;
        let mut steps = 9;
        let reached = seek_target_vector(Vec3::Z, &mut current, Vec3::X.cross(Vec3::Z), &mut steps, 10.0);
        assert!(!reached);
        assert_eq!(steps, 8);
        assert_relative_eq!(angle_between_deg(Vec3::X, current), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_seek_facing_opposite_direction_uses_up() {
        let mut facing = Vec3::Z;
        let mut steps = 2;
        let reached = seek_target_facing(&mut facing, Vec3::NEG_Z, Vec3::Y, &mut steps, 90.0);
        assert!(!reached);
        // Поворот вокруг Y: facing лежит в горизонтальной плоскости
        assert_relative_eq!(facing.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(facing.z, 0.0, epsilon = 1e-5);
        assert!(seek_target_facing(&mut facing, Vec3::NEG_Z, Vec3::Y, &mut steps, 90.0));
        assert_eq!(facing, Vec3::NEG_Z);
    }

    #[test]
    fn test_seek_plan_original_doubles_steps() {
        let plan = SeekPlan::original(Vec3::X, Vec3::Z, 5, Vec3::Y);
        assert_eq!(plan.steps, 10);
        assert_relative_eq!(plan.step_angle, 9.0, epsilon = 1e-4);
    }

    #[test]
    fn test_seek_plan_advance_facing() {
        let mut motion = ActorMotion::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        let mut plan = SeekPlan::new(motion.facing, Vec3::Z, 3, motion.up);
        let mut calls = 0;
        while !plan.advance_facing(&mut motion) {
            calls += 1;
            assert!(calls < 3);
        }
        assert_relative_eq!(motion.facing.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(motion.up.y, 1.0, epsilon = 1e-6);
    }
}
