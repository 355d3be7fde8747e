//! Volume: sphere / cylinder / box с тестами принадлежности и пересечения
//!
//! Volume immutable после построения. Конструкторы валидируют параметры
//! (load-time `ConfigError`), дальше все тесты: тотальные чистые функции.
//! Акторы пересобирают свои volumes через `translated` когда двигаются;
//! "home"/"trigger" volumes считаются один раз при инициализации.

use bevy::prelude::*;

use crate::collision::geometry::Bounds;
use crate::error::ConfigError;

mod overlap;

/// Допуск ортогональности осей box
const AXIS_ORTHOGONALITY_TOLERANCE: f32 = 1e-3;

/// Геометрическая форма (kind фиксирован при построении)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Volume {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// `base + axis * [0, height]`, axis: единичный
    Cylinder {
        base: Vec3,
        axis: Vec3,
        radius: f32,
        height: f32,
    },
    /// Центр + три ортогональные единичные оси + половины длин вдоль них
    Box {
        center: Vec3,
        axes: [Vec3; 3],
        half: [f32; 3],
    },
}

fn check_extent(name: &str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidVolume {
            reason: format!("{name} must be finite and >= 0, got {value}"),
        });
    }
    Ok(())
}

fn check_point(name: &str, value: Vec3) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidVolume {
            reason: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(())
}

fn unit_axis(name: &str, axis: Vec3) -> Result<Vec3, ConfigError> {
    check_point(name, axis)?;
    axis.try_normalize().ok_or_else(|| ConfigError::InvalidVolume {
        reason: format!("{name} has zero length"),
    })
}

impl Volume {
    pub fn sphere(center: Vec3, radius: f32) -> Result<Self, ConfigError> {
        check_point("sphere center", center)?;
        check_extent("sphere radius", radius)?;
        Ok(Self::Sphere { center, radius })
    }

    /// Ось нормализуется; `height`: протяжённость вдоль оси
    pub fn cylinder(base: Vec3, axis: Vec3, radius: f32, height: f32) -> Result<Self, ConfigError> {
        check_point("cylinder base", base)?;
        let axis = unit_axis("cylinder axis", axis)?;
        check_extent("cylinder radius", radius)?;
        check_extent("cylinder height", height)?;
        Ok(Self::Cylinder {
            base,
            axis,
            radius,
            height,
        })
    }

    /// Box из центра, осей (нормализуются, должны быть ортогональны) и половин длин
    pub fn boxed(center: Vec3, axes: [Vec3; 3], half: [f32; 3]) -> Result<Self, ConfigError> {
        check_point("box center", center)?;
        let axes = [
            unit_axis("box axis 0", axes[0])?,
            unit_axis("box axis 1", axes[1])?,
            unit_axis("box axis 2", axes[2])?,
        ];
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let dot = axes[i].dot(axes[j]).abs();
            if dot > AXIS_ORTHOGONALITY_TOLERANCE {
                return Err(ConfigError::InvalidVolume {
                    reason: format!("box axes {i} and {j} are not orthogonal (|dot| = {dot})"),
                });
            }
        }
        for extent in half {
            check_extent("box half-length", extent)?;
        }
        Ok(Self::Box { center, axes, half })
    }

    /// Axis-aligned box
    pub fn aabb(center: Vec3, half: Vec3) -> Result<Self, ConfigError> {
        Self::boxed(center, [Vec3::X, Vec3::Y, Vec3::Z], half.to_array())
    }

    /// Box в авторской форме: угол + векторы рёбер + dot-протяжённости.
    ///
    /// Точка внутри если `dot(vector_i, p - corner)` в `[0, dots_i]` для всех i.
    /// Векторы не обязательно единичные: протяжённость вдоль единичной оси
    /// равна `dots_i / |vector_i|`.
    pub fn box_from_corner(corner: Vec3, vectors: [Vec3; 3], dots: [f32; 3]) -> Result<Self, ConfigError> {
        check_point("box corner", corner)?;
        let mut axes = [Vec3::ZERO; 3];
        let mut half = [0.0; 3];
        let mut center = corner;
        for i in 0..3 {
            check_extent("box dot", dots[i])?;
            let length = vectors[i].length();
            let axis = unit_axis("box vector", vectors[i])?;
            let extent = dots[i] / length;
            axes[i] = axis;
            half[i] = extent * 0.5;
            center += axis * half[i];
        }
        Self::boxed(center, axes, half)
    }

    /// Копия, сдвинутая на `offset` (template volume → позиция актора)
    pub fn translated(&self, offset: Vec3) -> Self {
        match *self {
            Self::Sphere { center, radius } => Self::Sphere {
                center: center + offset,
                radius,
            },
            Self::Cylinder {
                base,
                axis,
                radius,
                height,
            } => Self::Cylinder {
                base: base + offset,
                axis,
                radius,
                height,
            },
            Self::Box { center, axes, half } => Self::Box {
                center: center + offset,
                axes,
                half,
            },
        }
    }

    /// Точная принадлежность точки (границы включительно)
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Sphere { center, radius } => point.distance_squared(center) <= radius * radius,
            Self::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                let offset = point - base;
                let along = offset.dot(axis);
                if !(0.0..=height).contains(&along) {
                    return false;
                }
                (offset - axis * along).length_squared() <= radius * radius
            }
            Self::Box { center, axes, half } => {
                let offset = point - center;
                axes.iter()
                    .zip(half.iter())
                    .all(|(axis, extent)| offset.dot(*axis).abs() <= *extent)
            }
        }
    }

    /// Геометрический центр
    pub fn center(&self) -> Vec3 {
        match *self {
            Self::Sphere { center, .. } => center,
            Self::Cylinder {
                base, axis, height, ..
            } => base + axis * (height * 0.5),
            Self::Box { center, .. } => center,
        }
    }

    /// Радиус описанной сферы вокруг `center()`
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Sphere { radius, .. } => radius,
            Self::Cylinder { radius, height, .. } => (radius * radius + height * height * 0.25).sqrt(),
            Self::Box { half, .. } => Vec3::from_array(half).length(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match *self {
            Self::Sphere { center, radius } => Bounds::around_point(center, radius),
            Self::Cylinder {
                base,
                axis,
                radius,
                height,
            } => Bounds::around_segment(base, base + axis * height, radius),
            Self::Box { center, axes, half } => {
                let extent = axes[0].abs() * half[0] + axes[1].abs() * half[1] + axes[2].abs() * half[2];
                Bounds {
                    min: center - extent,
                    max: center + extent,
                }
            }
        }
    }
}
