//! Геометрия мира: полигоны + broad phase по AABB

use bevy::prelude::*;

use super::{Plane, SurfaceFlags};
use crate::error::ConfigError;

/// Axis-aligned bounding box (world space)
///
/// Invariant: `min` <= `max` покомпонентно.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some(Self { min, max })
    }

    /// AABB сегмента `a → b`, расширенный на `margin`
    pub fn around_segment(a: Vec3, b: Vec3, margin: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
        .inflate(margin)
    }

    pub fn around_point(center: Vec3, radius: f32) -> Self {
        Self {
            min: center,
            max: center,
        }
        .inflate(radius)
    }

    pub fn inflate(&self, margin: f32) -> Self {
        let delta = Vec3::splat(margin.max(0.0));
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Пересечение включительно (касание гранями = overlap)
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Плоский выпуклый полигон коллизии.
///
/// Вершины CCW если смотреть со стороны нормали. Нормаль и offset
/// вычисляются при загрузке (Newell), дальше поверхность immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    points: Vec<Vec3>,
    plane: Plane,
    bounds: Bounds,
    pub flags: SurfaceFlags,
}

impl Surface {
    pub fn new(points: Vec<Vec3>, flags: SurfaceFlags) -> Result<Self, ConfigError> {
        if points.len() < 3 {
            return Err(ConfigError::DegenerateSurface {
                points: points.len(),
                reason: "fewer than 3 points",
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(ConfigError::DegenerateSurface {
                points: points.len(),
                reason: "non-finite point",
            });
        }

        // Newell normal: устойчива к почти-коллинеарным вершинам
        let mut newell = Vec3::ZERO;
        let mut centroid = Vec3::ZERO;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            newell.x += (p.y - q.y) * (p.z + q.z);
            newell.y += (p.z - q.z) * (p.x + q.x);
            newell.z += (p.x - q.x) * (p.y + q.y);
            centroid += *p;
        }
        let Some(normal) = newell.try_normalize() else {
            return Err(ConfigError::DegenerateSurface {
                points: points.len(),
                reason: "zero area",
            });
        };
        centroid /= points.len() as f32;

        let Some(bounds) = Bounds::from_points(&points) else {
            return Err(ConfigError::DegenerateSurface {
                points: 0,
                reason: "no points",
            });
        };

        Ok(Self {
            plane: Plane::through(normal, centroid),
            points,
            bounds,
            flags,
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn edge_count(&self) -> usize {
        self.points.len()
    }

    /// Ребро `i`: (p_i, p_{i+1}) с wrap-around
    pub fn edge(&self, index: usize) -> (Vec3, Vec3) {
        let n = self.points.len();
        (self.points[index % n], self.points[(index + 1) % n])
    }

    /// Signed расстояние от `point` до линии ребра внутри плоскости.
    ///
    /// > 0: с внутренней стороны ребра, < 0: снаружи.
    pub fn edge_distance(&self, index: usize, point: Vec3) -> f32 {
        let (from, to) = self.edge(index);
        let edge_dir = (from - to).normalize_or_zero();
        let inward = edge_dir.cross(self.plane.normal);
        point.dot(inward) - inward.dot(to)
    }

    /// Проекция `point` лежит внутри полигона (с допуском `margin` наружу)
    pub fn contains_projected(&self, point: Vec3, margin: f32) -> bool {
        (0..self.edge_count()).all(|i| self.edge_distance(i, point) >= -margin)
    }

    /// Первое ребро, снаружи которого точка дальше чем на `margin`
    pub fn first_edge_outside(&self, point: Vec3, margin: f32) -> Option<(usize, f32)> {
        (0..self.edge_count())
            .map(|i| (i, self.edge_distance(i, point)))
            .find(|(_, diff)| *diff < -margin)
    }
}

/// World geometry index (boundary contract, read-only для ядра)
///
/// Реализации обязаны возвращать кандидатов в детерминированном порядке.
pub trait GeometryIndex {
    /// Поверхности, чьи AABB пересекают `bounds`
    fn candidates(&self, bounds: &Bounds) -> Vec<&Surface>;
}

/// In-memory геометрия уровня (linear AABB filter, порядок = порядок загрузки)
#[derive(Resource, Debug, Clone, Default)]
pub struct StaticGeometry {
    surfaces: Vec<Surface>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        Self { surfaces }
    }

    pub fn add_surface(&mut self, surface: Surface) -> usize {
        self.surfaces.push(surface);
        self.surfaces.len() - 1
    }

    /// Прямоугольник по 4 вершинам (CCW со стороны нормали)
    pub fn add_quad(&mut self, corners: [Vec3; 4], flags: SurfaceFlags) -> Result<usize, ConfigError> {
        let surface = Surface::new(corners.to_vec(), flags)?;
        Ok(self.add_surface(surface))
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl GeometryIndex for StaticGeometry {
    fn candidates(&self, bounds: &Bounds) -> Vec<&Surface> {
        self.surfaces
            .iter()
            .filter(|surface| surface.bounds.overlaps(bounds))
            .collect()
    }
}
