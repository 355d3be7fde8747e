//! Интеграция скорости + blocking collision response

use bevy::prelude::*;

use super::ActorMotion;
use crate::collision::{sphere_in_radius, GeometryIndex, SurfaceFlags, TestFlags};
use crate::config::KernelTuning;

/// Реакция на боковые стены
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BlockingMode {
    /// Убрать входящую компоненту скорости (скольжение вдоль поверхности)
    #[default]
    Slide,
    /// Отразить скорость от стены и добавить вертикальный импульс
    Bounce { restitution: f32, lift: f32 },
}

/// Параметры blocking запроса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingParams {
    /// Радиус hurt-сферы актора
    pub radius: f32,
    pub mode: BlockingMode,
    pub flags: TestFlags,
}

impl BlockingParams {
    pub fn slide(radius: f32) -> Self {
        Self {
            radius,
            mode: BlockingMode::Slide,
            flags: TestFlags::empty(),
        }
    }

    pub fn bounce(radius: f32, restitution: f32, lift: f32) -> Self {
        Self {
            radius,
            mode: BlockingMode::Bounce { restitution, lift },
            flags: TestFlags::empty(),
        }
    }
}

/// Что произошло за один resolve (для выбора animation/sfx cues снаружи)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactReport {
    /// Сколько контактов вернул запрос
    pub contacts: usize,
    /// Сколько из них выталкивали актора
    pub blocked: usize,
    /// Контакт с полом (n·up > порога), включая рёбра и вершины
    pub grounded: bool,
    /// Боковая стена (|n·up| < порога)
    pub walled: bool,
    /// Хотя бы одна поверхность с DAMAGING
    pub damaging: bool,
}

impl ContactReport {
    pub fn any(&self) -> bool {
        self.contacts > 0
    }
}

/// `position += speed`
pub fn integrate(motion: &mut ActorMotion) {
    motion.position += motion.speed;
}

/// Выталкивает актора из поверхностей, к которым он движется.
///
/// Для каждого контакта с `dot(speed, n) < 0`: позиция сдвигается вдоль
/// нормали на глубину проникновения, входящая компонента скорости убирается
/// (или отражается для стен в `Bounce`). Контакты, от которых актор
/// удаляется или стоит на месте, позицию не трогают.
pub fn resolve_blocking(
    motion: &mut ActorMotion,
    geometry: &dyn GeometryIndex,
    params: BlockingParams,
) -> ContactReport {
    let contacts = sphere_in_radius(
        geometry,
        motion.position,
        params.radius,
        KernelTuning::MAX_CONTACTS,
        false,
        params.flags,
    );

    let mut report = ContactReport {
        contacts: contacts.len(),
        ..Default::default()
    };
    // Пол/стена относительно собственного up актора
    let up = motion.up.try_normalize().unwrap_or(Vec3::Y);

    for contact in &contacts {
        let normal = contact.normal();
        let vertical = normal.dot(up);

        if contact.flags.contains(SurfaceFlags::DAMAGING) {
            report.damaging = true;
        }
        if vertical > KernelTuning::GROUNDED_NORMAL_Y {
            report.grounded = true;
        }

        let inward = motion.speed.dot(normal);
        if inward >= 0.0 {
            continue;
        }
        report.blocked += 1;
        motion.position += normal * contact.penetration(params.radius);

        let is_wall = vertical.abs() < KernelTuning::WALL_NORMAL_BAND;
        match params.mode {
            BlockingMode::Bounce { restitution, lift } if is_wall => {
                report.walled = true;
                motion.speed = (motion.speed - normal * (2.0 * inward)) * restitution;
                motion.speed.y += lift;
            }
            _ => {
                if is_wall {
                    report.walled = true;
                }
                motion.speed -= normal * inward;
            }
        }
    }

    report
}

/// `speed += delta_speed`, интеграция, затем blocking response
pub fn integrate_and_resolve(
    motion: &mut ActorMotion,
    delta_speed: Vec3,
    geometry: &dyn GeometryIndex,
    params: BlockingParams,
) -> ContactReport {
    motion.speed += delta_speed;
    integrate(motion);
    resolve_blocking(motion, geometry, params)
}
