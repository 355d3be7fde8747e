//! CollisionQuery: read-only запросы к геометрии мира
//!
//! Архитектура:
//! - `GeometryIndex`: boundary trait (broad phase: кандидаты по AABB)
//! - `StaticGeometry`: in-memory реализация (Resource)
//! - query функции: чистые, никогда не мутируют мир
//!
//! Промахи (нет контактов, нулевой сегмент): пустой результат, не ошибка.

use bevy::prelude::*;
use bitflags::bitflags;

pub mod capsule;
pub mod geometry;
pub mod query;


pub use capsule::{
    cylinder_between_points, cylinder_intersect_plane, cylinder_overlap_sphere, cylinder_overlaps_volume,
    cylinders_overlap, segment_box_distance,
};
pub use geometry::{Bounds, GeometryIndex, StaticGeometry, Surface};
pub use query::{segment_blocked, sphere_between_points, sphere_in_radius};

bitflags! {
    /// Свойства поверхности (задаются при загрузке геометрии)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u16 {
        /// Игроки проходят сквозь (маскируется `TestFlags::PLAYERS`)
        const IGNORE_PLAYERS = 1 << 0;
        /// Лучи проходят сквозь (маскируется `TestFlags::BEAMS`)
        const IGNORE_BEAMS = 1 << 1;
        /// Наносит урон при контакте (query только репортит)
        const DAMAGING = 1 << 2;
        /// Поверхность подвижного объекта (исключается `TestFlags::SCAN`)
        const ENTITY = 1 << 3;
    }
}

bitflags! {
    /// Кто спрашивает: определяет какие поверхности пропускаются
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TestFlags: u16 {
        const PLAYERS = 1 << 0;
        const BEAMS = 1 << 1;
        /// Только статическая геометрия
        const SCAN = 1 << 2;
    }
}

impl TestFlags {
    /// Маска поверхностей, которые этот запрос не видит
    pub fn surface_mask(self) -> SurfaceFlags {
        let mut mask = SurfaceFlags::empty();
        if self.contains(TestFlags::PLAYERS) {
            mask |= SurfaceFlags::IGNORE_PLAYERS;
        }
        if self.contains(TestFlags::BEAMS) {
            mask |= SurfaceFlags::IGNORE_BEAMS;
        }
        if self.contains(TestFlags::SCAN) {
            mask |= SurfaceFlags::ENTITY;
        }
        mask
    }
}

/// Плоскость: `dot(normal, p) - offset` = signed distance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Плоскость с нормалью `normal`, проходящая через `point`
    pub fn through(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// Тип контакта: плоская грань vs ребро/вершина/кривая поверхность
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactKind {
    #[default]
    Planar,
    Edge,
    Vertex,
    Curved,
}

/// Результат запроса (эфемерный, потребляется сразу)
///
/// - `plane`: наружная нормаль (для volume overlap: выталкивает self из other);
///   для edge/vertex контактов плоскость проходит через `position`
/// - `distance`: доля пути вдоль сегмента запроса [0, 1] (sweep queries)
/// - `clearance`: для sphere queries: расстояние от центра до поверхности,
///   для volume overlap: signed separation (≤ 0 при пересечении)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionResult {
    pub position: Vec3,
    pub plane: Plane,
    pub contact: ContactKind,
    pub distance: f32,
    pub clearance: f32,
    pub edge: Option<(Vec3, Vec3)>,
    pub flags: SurfaceFlags,
}

impl CollisionResult {
    pub fn normal(&self) -> Vec3 {
        self.plane.normal
    }

    /// Глубина проникновения сферы радиуса `radius` (sphere queries)
    pub fn penetration(&self, radius: f32) -> f32 {
        (radius - self.clearance).max(0.0)
    }

    /// Глубина проникновения для volume overlap
    pub fn overlap_depth(&self) -> f32 {
        (-self.clearance).max(0.0)
    }

    pub fn is_planar(&self) -> bool {
        self.contact == ContactKind::Planar
    }
}
