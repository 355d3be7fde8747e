//! Запросы к геометрии: сегмент, swept sphere, сфера в радиусе

use bevy::prelude::*;

use super::geometry::{Bounds, GeometryIndex, Surface};
use super::{CollisionResult, ContactKind, Plane, TestFlags};
use crate::config::KernelTuning;

/// Минимальная длина сегмента (короче = "не заблокирован")
const MIN_SEGMENT_LENGTH_SQ: f32 = 1e-12;

/// Порог параллельности сегмента плоскости в swept sphere
const PARALLEL_EPSILON: f32 = 1.0 / 4096.0;

fn visible(surface: &Surface, flags: TestFlags) -> bool {
    !surface.flags.intersects(flags.surface_mask())
}

/// Ближайшая блокирующая поверхность на сегменте `a → b`.
///
/// Поверхность блокирует если `a` строго перед ней, а `b` на ней или позади.
/// Возвращает ближайший к `a` hit (минимальный `distance`).
pub fn segment_blocked(
    geometry: &dyn GeometryIndex,
    a: Vec3,
    b: Vec3,
    flags: TestFlags,
) -> Option<CollisionResult> {
    if (b - a).length_squared() <= MIN_SEGMENT_LENGTH_SQ {
        return None;
    }

    let bounds = Bounds::around_segment(a, b, 0.0);
    let mut best: Option<CollisionResult> = None;

    for surface in geometry.candidates(&bounds) {
        if !visible(surface, flags) {
            continue;
        }
        let plane = surface.plane();
        let dot1 = plane.signed_distance(a);
        if dot1 <= 0.0 {
            continue;
        }
        let dot2 = plane.signed_distance(b);
        if dot2 > 0.0 {
            continue;
        }
        let fraction = (dot1 / (dot1 - dot2)).clamp(0.0, 1.0);
        if best.is_some_and(|hit| fraction >= hit.distance) {
            continue;
        }
        let position = a.lerp(b, fraction);
        if !surface.contains_projected(position, 0.0) {
            continue;
        }
        best = Some(CollisionResult {
            position,
            plane,
            contact: ContactKind::Planar,
            distance: fraction,
            clearance: 0.0,
            edge: None,
            flags: surface.flags,
        });
    }

    best
}

/// Swept sphere `a → b`: до `limit` поверхностей, которых сфера касается.
///
/// Поверхность учитывается если `a` перед ней, а `b` не дальше `radius` от неё.
/// Точка пересечения вне полигона дальше edge margin → не полный контакт;
/// при `include_edges` такой контакт в пределах `radius` возвращается как `Edge`
/// (проверяется только первое ребро, снаружи которого точка).
pub fn sphere_between_points(
    geometry: &dyn GeometryIndex,
    a: Vec3,
    b: Vec3,
    radius: f32,
    limit: usize,
    include_edges: bool,
    flags: TestFlags,
) -> Vec<CollisionResult> {
    let mut results = Vec::new();
    if limit == 0 {
        return results;
    }

    let bounds = Bounds::around_segment(a, b, radius);
    for surface in geometry.candidates(&bounds) {
        if results.len() == limit {
            break;
        }
        if !visible(surface, flags) {
            continue;
        }
        let plane = surface.plane();
        let dot1 = plane.signed_distance(a);
        if dot1 <= 0.0 {
            // плоскость позади начальной точки
            continue;
        }
        let dot2 = plane.signed_distance(b);
        if dot2 > radius {
            continue;
        }

        let fraction = if (dot1 - dot2).abs() >= PARALLEL_EPSILON {
            (dot1 / (dot1 - dot2)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let position = a.lerp(b, fraction);

        match surface.first_edge_outside(position, KernelTuning::EDGE_MARGIN) {
            None => results.push(CollisionResult {
                position,
                plane,
                contact: ContactKind::Planar,
                distance: fraction,
                clearance: dot2,
                edge: None,
                flags: surface.flags,
            }),
            Some((edge, diff)) if include_edges && diff >= -radius => results.push(CollisionResult {
                position,
                plane,
                contact: ContactKind::Edge,
                distance: fraction,
                clearance: dot2,
                edge: Some(surface.edge(edge)),
                flags: surface.flags,
            }),
            Some(_) => {}
        }
    }

    results
}

/// До `limit` поверхностей в пределах `radius` от `center`.
///
/// Для каждой поверхности перед центром:
/// - проекция внутри полигона (с edge margin) → `Planar`, clearance = расстояние до плоскости;
/// - иначе ближайшая точка на внешних рёбрах: внутри ребра → `Edge`,
///   на конце ребра → `Vertex`, clearance = расстояние до неё.
///
/// `simple_normal` оставляет нормаль плоскости для edge/vertex контактов,
/// иначе нормаль направлена от ближайшей точки к центру.
pub fn sphere_in_radius(
    geometry: &dyn GeometryIndex,
    center: Vec3,
    radius: f32,
    limit: usize,
    simple_normal: bool,
    flags: TestFlags,
) -> Vec<CollisionResult> {
    let mut results = Vec::new();
    if limit == 0 {
        return results;
    }

    let bounds = Bounds::around_point(center, radius);
    for surface in geometry.candidates(&bounds) {
        if results.len() == limit {
            break;
        }
        if !visible(surface, flags) {
            continue;
        }
        let plane = surface.plane();
        let dot = plane.signed_distance(center);
        if dot <= 0.0 || dot > radius {
            continue;
        }

        if surface.contains_projected(center, KernelTuning::EDGE_MARGIN) {
            results.push(CollisionResult {
                position: center - plane.normal * dot,
                plane,
                contact: ContactKind::Planar,
                distance: 0.0,
                clearance: dot,
                edge: None,
                flags: surface.flags,
            });
            continue;
        }

        if let Some(feature) = nearest_outside_feature(surface, center) {
            if feature.distance > radius {
                continue;
            }
            let normal = if simple_normal {
                plane.normal
            } else {
                (center - feature.point).try_normalize().unwrap_or(plane.normal)
            };
            results.push(CollisionResult {
                position: feature.point,
                plane: Plane::through(normal, feature.point),
                contact: feature.kind,
                distance: 0.0,
                clearance: feature.distance,
                edge: Some(feature.edge),
                flags: surface.flags,
            });
        }
    }

    results
}

struct EdgeFeature {
    point: Vec3,
    distance: f32,
    kind: ContactKind,
    edge: (Vec3, Vec3),
}

/// Ближайшая точка на рёбрах, снаружи которых лежит `point`
fn nearest_outside_feature(surface: &Surface, point: Vec3) -> Option<EdgeFeature> {
    let mut best: Option<EdgeFeature> = None;
    for index in 0..surface.edge_count() {
        if surface.edge_distance(index, point) >= 0.0 {
            continue;
        }
        let (from, to) = surface.edge(index);
        let edge = to - from;
        let length_sq = edge.length_squared();
        let t = if length_sq > 0.0 {
            (edge.dot(point - from) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = from + edge * t;
        let distance = point.distance(closest);
        let kind = if t <= 0.0 || t >= 1.0 {
            ContactKind::Vertex
        } else {
            ContactKind::Edge
        };
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(EdgeFeature {
                point: closest,
                distance,
                kind,
                edge: (from, to),
            });
        }
    }
    best
}
