//! Volume vs volume: shape-pair dispatch
//!
//! Результат: нормаль выталкивает `self` из `other`,
//! `clearance` = signed separation (≤ 0 при пересечении).

use bevy::prelude::*;

use super::Volume;
use crate::collision::capsule::{closest_point_on_box, segment_box_distance};
use crate::collision::{CollisionResult, ContactKind, Plane, SurfaceFlags};

/// Fallback направление выталкивания при совпадающих центрах
const FALLBACK_PUSH: Vec3 = Vec3::Y;

fn contact(position: Vec3, normal: Vec3, clearance: f32, kind: ContactKind) -> CollisionResult {
    CollisionResult {
        position,
        plane: Plane::through(normal, position),
        contact: kind,
        distance: 0.0,
        clearance,
        edge: None,
        flags: SurfaceFlags::empty(),
    }
}

fn flipped(mut result: CollisionResult) -> CollisionResult {
    result.plane = Plane::through(-result.plane.normal, result.position);
    result
}

impl Volume {
    /// Пересекается ли `self` с `other`; при пересечении: separation данные
    pub fn overlaps(&self, other: &Volume) -> Option<CollisionResult> {
        match (*self, *other) {
            (Volume::Sphere { center, radius }, _) => other.sphere_contact(center, radius),
            (_, Volume::Sphere { center, radius }) => self.sphere_contact(center, radius).map(flipped),
            (
                Volume::Cylinder {
                    base: a_base,
                    axis: a_axis,
                    radius: a_radius,
                    height: a_height,
                },
                Volume::Cylinder {
                    base: b_base,
                    axis: b_axis,
                    radius: b_radius,
                    height: b_height,
                },
            ) => cylinder_cylinder(
                (a_base, a_base + a_axis * a_height, a_radius),
                (b_base, b_base + b_axis * b_height, b_radius),
            ),
            (Volume::Cylinder { base, axis, radius, height }, Volume::Box { center, axes, half }) => {
                capsule_box(base, base + axis * height, radius, center, &axes, &half)
            }
            (Volume::Box { center, axes, half }, Volume::Cylinder { base, axis, radius, height }) => {
                capsule_box(base, base + axis * height, radius, center, &axes, &half).map(flipped)
            }
            (
                Volume::Box {
                    center: a_center,
                    axes: a_axes,
                    half: a_half,
                },
                Volume::Box {
                    center: b_center,
                    axes: b_axes,
                    half: b_half,
                },
            ) => box_box((a_center, a_axes, a_half), (b_center, b_axes, b_half)),
        }
    }

    /// Сфера (`center`, `radius`) против self; нормаль выталкивает сферу
    fn sphere_contact(&self, center: Vec3, radius: f32) -> Option<CollisionResult> {
        match *self {
            Volume::Sphere {
                center: other_center,
                radius: other_radius,
            } => {
                let between = center - other_center;
                let reach = radius + other_radius;
                if between.length_squared() > reach * reach {
                    return None;
                }
                let distance = between.length();
                let normal = between.try_normalize().unwrap_or(FALLBACK_PUSH);
                Some(contact(
                    other_center + normal * other_radius,
                    normal,
                    distance - reach,
                    ContactKind::Curved,
                ))
            }
            _ => {
                let closest = self.closest_point(center);
                let offset = center - closest;
                let distance_sq = offset.length_squared();
                if distance_sq > radius * radius {
                    return None;
                }
                if distance_sq > f32::EPSILON {
                    let distance = distance_sq.sqrt();
                    let kind = if matches!(self, Volume::Box { .. }) {
                        ContactKind::Planar
                    } else {
                        ContactKind::Curved
                    };
                    return Some(contact(closest, offset / distance, distance - radius, kind));
                }
                // Центр сферы внутри volume
                let (normal, depth) = self.interior_push(center);
                Some(contact(center + normal * depth, normal, -(depth + radius), ContactKind::Planar))
            }
        }
    }

    /// Ближайшая точка volume к `point` (сама точка, если внутри)
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        match *self {
            Volume::Sphere { center, radius } => {
                let offset = point - center;
                if offset.length_squared() <= radius * radius {
                    point
                } else {
                    center + offset.normalize_or_zero() * radius
                }
            }
            Volume::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                let offset = point - base;
                let along = offset.dot(axis).clamp(0.0, height);
                let radial = offset - axis * offset.dot(axis);
                let radial_length = radial.length();
                let radial = if radial_length > radius {
                    radial * (radius / radial_length)
                } else {
                    radial
                };
                base + axis * along + radial
            }
            Volume::Box { center, axes, half } => closest_point_on_box(point, center, &axes, &half),
        }
    }

    /// Кратчайший выход изнутри: (нормаль, глубина)
    fn interior_push(&self, point: Vec3) -> (Vec3, f32) {
        match *self {
            Volume::Sphere { center, radius } => {
                let offset = point - center;
                let normal = offset.try_normalize().unwrap_or(FALLBACK_PUSH);
                (normal, radius - offset.length())
            }
            Volume::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                let offset = point - base;
                let along = offset.dot(axis);
                let radial = offset - axis * along;
                let side_depth = radius - radial.length();
                let bottom_depth = along;
                let top_depth = height - along;
                if side_depth <= bottom_depth && side_depth <= top_depth {
                    let normal = radial.try_normalize().unwrap_or_else(|| axis.any_orthonormal_vector());
                    (normal, side_depth)
                } else if bottom_depth <= top_depth {
                    (-axis, bottom_depth)
                } else {
                    (axis, top_depth)
                }
            }
            Volume::Box { center, axes, half } => {
                let offset = point - center;
                let mut best = (FALLBACK_PUSH, f32::MAX);
                for (axis, extent) in axes.iter().zip(half.iter()) {
                    let projection = offset.dot(*axis);
                    let depth = extent - projection.abs();
                    if depth < best.1 {
                        let sign = if projection < 0.0 { -1.0 } else { 1.0 };
                        best = (*axis * sign, depth);
                    }
                }
                best
            }
        }
    }
}

/// Ближайшие точки двух сегментов (параметры s, t)
fn closest_segment_points(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a <= f32::EPSILON && e <= f32::EPSILON {
        return (p1, p2);
    }
    let (s, t) = if a <= f32::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= f32::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > f32::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

/// Cylinder vs cylinder как capsule vs capsule (оси-сегменты + радиусы)
fn cylinder_cylinder(a: (Vec3, Vec3, f32), b: (Vec3, Vec3, f32)) -> Option<CollisionResult> {
    let (on_a, on_b) = closest_segment_points(a.0, a.1, b.0, b.1);
    let reach = a.2 + b.2;
    let between = on_a - on_b;
    if between.length_squared() > reach * reach {
        return None;
    }
    let normal = between.try_normalize().unwrap_or_else(|| {
        let axis = (a.1 - a.0).try_normalize().unwrap_or(FALLBACK_PUSH);
        axis.any_orthonormal_vector()
    });
    Some(contact(on_b + normal * b.2, normal, between.length() - reach, ContactKind::Curved))
}

/// Capsule (ось cylinder) vs OBB
fn capsule_box(
    bottom: Vec3,
    top: Vec3,
    radius: f32,
    center: Vec3,
    axes: &[Vec3; 3],
    half: &[f32; 3],
) -> Option<CollisionResult> {
    let (distance, on_segment, on_box) = segment_box_distance(bottom, top, center, axes, half);
    if distance > radius {
        return None;
    }
    let normal = (on_segment - on_box)
        .try_normalize()
        .or_else(|| ((bottom + top) * 0.5 - center).try_normalize())
        .unwrap_or(FALLBACK_PUSH);
    Some(contact(on_box, normal, distance - radius, ContactKind::Planar))
}

/// Separating axis test для двух OBB
fn box_box(a: (Vec3, [Vec3; 3], [f32; 3]), b: (Vec3, [Vec3; 3], [f32; 3])) -> Option<CollisionResult> {
    let (a_center, a_axes, a_half) = a;
    let (b_center, b_axes, b_half) = b;
    let between = a_center - b_center;

    let projected_radius = |axes: &[Vec3; 3], half: &[f32; 3], direction: Vec3| {
        axes.iter()
            .zip(half.iter())
            .map(|(axis, extent)| axis.dot(direction).abs() * extent)
            .sum::<f32>()
    };

    let mut candidates: Vec<Vec3> = Vec::with_capacity(15);
    candidates.extend_from_slice(&a_axes);
    candidates.extend_from_slice(&b_axes);
    for a_axis in &a_axes {
        for b_axis in &b_axes {
            if let Some(cross) = a_axis.cross(*b_axis).try_normalize() {
                candidates.push(cross);
            }
        }
    }

    let mut best: Option<(Vec3, f32)> = None;
    for axis in candidates {
        let distance = between.dot(axis);
        let overlap = projected_radius(&a_axes, &a_half, axis) + projected_radius(&b_axes, &b_half, axis)
            - distance.abs();
        if overlap < 0.0 {
            return None;
        }
        if best.is_none_or(|(_, depth)| overlap < depth) {
            let normal = if distance < 0.0 { -axis } else { axis };
            best = Some((normal, overlap));
        }
    }

    let (normal, depth) = best?;
    let position = a_center - normal * projected_radius(&a_axes, &a_half, normal);
    Some(contact(position, normal, -depth, ContactKind::Planar))
}
