//! Capsule / cylinder примитивы (лучи, лазеры, вертикальные акторы)

use bevy::prelude::*;

use super::{CollisionResult, ContactKind, Plane, SurfaceFlags};
use crate::volume::Volume;

/// Итераций ternary search для segment-vs-box (сходимость ~1e-9 доли сегмента)
const SEGMENT_SEARCH_ITERATIONS: usize = 48;

/// Сегмент `a → b` против вертикального стоящего цилиндра.
///
/// `base`: нижняя точка оси, цилиндр тянется вверх на `height`.
pub fn cylinder_between_points(
    a: Vec3,
    b: Vec3,
    base: Vec3,
    height: f32,
    radius: f32,
) -> Option<CollisionResult> {
    let travel = b - a;
    let length = travel.length();
    if length <= f32::EPSILON {
        return None;
    }
    let travel = travel / length;
    let to_cylinder = base - a;
    let along = travel.dot(to_cylinder);
    if along < -radius || along > length + radius {
        return None;
    }
    // offset = base - ближайшая точка луча
    let offset = to_cylinder - travel * along;
    if offset.y > 0.0 || offset.y < -height {
        return None;
    }
    if offset.x * offset.x + offset.z * offset.z > radius * radius {
        return None;
    }
    Some(CollisionResult {
        position: base - offset,
        plane: Plane::new(-travel, 0.0),
        contact: ContactKind::Planar,
        distance: (along / length).clamp(0.0, 1.0),
        clearance: 0.0,
        edge: None,
        flags: SurfaceFlags::empty(),
    })
}

/// Диапазон параметра сегмента, попадающий в слой [0, height] вдоль оси
fn clip_to_slab(start_proj: f32, end_proj: f32, height: f32) -> Option<(f32, f32)> {
    let delta = end_proj - start_proj;
    if delta.abs() <= f32::EPSILON {
        return (0.0..=height).contains(&start_proj).then_some((0.0, 1.0));
    }
    let t_bottom = -start_proj / delta;
    let t_top = (height - start_proj) / delta;
    let (enter, exit) = if t_bottom <= t_top {
        (t_bottom, t_top)
    } else {
        (t_top, t_bottom)
    };
    let enter = enter.max(0.0);
    let exit = exit.min(1.0);
    (enter <= exit).then_some((enter, exit))
}

/// Сегмент `one_bottom → one_top` (толщина включена в `radii`) против цилиндра
/// `two_base + two_axis * [0, two_height]`.
///
/// `distance`: первая доля сегмента, где начинается касание.
pub fn cylinders_overlap(
    one_bottom: Vec3,
    one_top: Vec3,
    two_base: Vec3,
    two_axis: Vec3,
    two_height: f32,
    radii: f32,
) -> Option<CollisionResult> {
    let start_proj = (one_bottom - two_base).dot(two_axis);
    let end_proj = (one_top - two_base).dot(two_axis);
    let (enter, exit) = clip_to_slab(start_proj, end_proj, two_height)?;

    let travel = one_top - one_bottom;
    // Компонента travel, перпендикулярная оси two
    let lateral = travel - two_axis * (end_proj - start_proj);
    let axis_point = two_base + two_axis * start_proj;
    let lateral_sq = lateral.length_squared();

    let closest = if lateral_sq > f32::EPSILON {
        (lateral.dot(axis_point - one_bottom) / lateral_sq).clamp(enter, exit)
    } else {
        enter
    };
    let offset = one_bottom + lateral * closest - axis_point;
    let offset_sq = offset.length_squared();
    if offset_sq > radii * radii {
        return None;
    }

    let contact = if lateral_sq > f32::EPSILON {
        (closest - (radii - offset_sq.sqrt()) / lateral_sq.sqrt()).clamp(enter, exit)
    } else {
        enter
    };
    let normal = -travel.try_normalize().unwrap_or(Vec3::NEG_X);
    Some(CollisionResult {
        position: one_bottom + travel * contact,
        plane: Plane::new(normal, 0.0),
        contact: ContactKind::Planar,
        distance: contact,
        clearance: 0.0,
        edge: None,
        flags: SurfaceFlags::empty(),
    })
}

/// Сегмент `bottom → top` с толщиной (включена в `radii`) против точки-сферы.
///
/// Вырожденный сегмент → обычный sphere-sphere тест.
pub fn cylinder_overlap_sphere(
    bottom: Vec3,
    top: Vec3,
    sphere_center: Vec3,
    radii: f32,
) -> Option<CollisionResult> {
    let axis = top - bottom;
    let length = axis.length();
    let to_sphere = sphere_center - bottom;

    if length <= 0.0 {
        if to_sphere.length_squared() > radii * radii {
            return None;
        }
        return Some(CollisionResult {
            position: bottom,
            plane: Plane::new(Vec3::X, 0.0),
            contact: ContactKind::Planar,
            distance: 0.0,
            clearance: 0.0,
            edge: None,
            flags: SurfaceFlags::empty(),
        });
    }

    let axis = axis / length;
    let along = axis.dot(to_sphere);
    if along < -radii || along > length + radii {
        return None;
    }
    let lateral = to_sphere - axis * along;
    let lateral_sq = lateral.length_squared();
    if lateral_sq > radii * radii {
        return None;
    }
    // Точка входа оси в сферу
    let position = sphere_center - lateral - axis * (radii * radii - lateral_sq).sqrt();
    let normal = (position - sphere_center).try_normalize().unwrap_or(-axis);
    Some(CollisionResult {
        position,
        plane: Plane::new(normal, 0.0),
        contact: ContactKind::Planar,
        distance: (along / (length + 2.0 * radii)).clamp(0.0, 1.0),
        clearance: 0.0,
        edge: None,
        flags: SurfaceFlags::empty(),
    })
}

/// Точка пересечения оси `bottom → top` с плоскостью
pub fn cylinder_intersect_plane(bottom: Vec3, top: Vec3, plane: Plane) -> Option<CollisionResult> {
    let denominator = plane.normal.dot(top - bottom);
    if denominator == 0.0 {
        return None;
    }
    let fraction = (plane.offset - plane.normal.dot(bottom)) / denominator;
    if !(0.0..=1.0).contains(&fraction) {
        return None;
    }
    Some(CollisionResult {
        position: bottom.lerp(top, fraction),
        plane,
        contact: ContactKind::Planar,
        distance: fraction,
        clearance: 0.0,
        edge: None,
        flags: SurfaceFlags::empty(),
    })
}

/// Расстояние между сегментом и OBB.
///
/// Возвращает (расстояние, ближайшая точка сегмента, ближайшая точка box).
/// Расстояние до выпуклого множества вдоль сегмента выпукло → ternary search.
pub fn segment_box_distance(
    p0: Vec3,
    p1: Vec3,
    center: Vec3,
    axes: &[Vec3; 3],
    half: &[f32; 3],
) -> (f32, Vec3, Vec3) {
    let distance_at = |t: f32| {
        let point = p0.lerp(p1, t);
        let on_box = closest_point_on_box(point, center, axes, half);
        (point.distance(on_box), point, on_box)
    };

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..SEGMENT_SEARCH_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if distance_at(m1).0 <= distance_at(m2).0 {
            hi = m2;
        } else {
            lo = m1;
        }
    }

    // Концы сегмента тоже кандидаты (плато на нуле внутри box)
    [distance_at(0.0), distance_at((lo + hi) * 0.5), distance_at(1.0)]
        .into_iter()
        .fold((f32::MAX, p0, p0), |best, candidate| {
            if candidate.0 < best.0 {
                candidate
            } else {
                best
            }
        })
}

/// Ближайшая точка OBB к `point` (сама точка, если внутри)
pub fn closest_point_on_box(point: Vec3, center: Vec3, axes: &[Vec3; 3], half: &[f32; 3]) -> Vec3 {
    let offset = point - center;
    let mut closest = center;
    for (axis, extent) in axes.iter().zip(half.iter()) {
        let projection = offset.dot(*axis).clamp(-extent, *extent);
        closest += *axis * projection;
    }
    closest
}

/// Curved sweep: сегмент `p0 → p1` радиуса `radius` против volume актора
pub fn cylinder_overlaps_volume(volume: &Volume, p0: Vec3, p1: Vec3, radius: f32) -> bool {
    match *volume {
        Volume::Sphere {
            center,
            radius: sphere_radius,
        } => cylinder_overlap_sphere(p0, p1, center, radius + sphere_radius).is_some(),
        Volume::Cylinder {
            base,
            axis,
            radius: cylinder_radius,
            height,
        } => cylinders_overlap(p0, p1, base, axis, height, radius + cylinder_radius).is_some(),
        Volume::Box { center, axes, half } => {
            segment_box_distance(p0, p1, center, &axes, &half).0 <= radius
        }
    }
}
