//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{
    hittable::{HitRecord, Hittable},
    material::MaterialId,
    Ray,
};
use blunder_math::util::ensure_finite_vec;
use blunder_math::{Aabb, GeometryError, GeometryResult, Interval, Vec3};

/// Smallest sine of an angle still treated as non-zero. Applied to the
/// angle between the two edges (degenerate triangles) and between the ray
/// and the triangle's plane (parallel rays), so both tests are independent
/// of triangle size and ray length.
const ANGLE_TOLERANCE: f32 = 1e-6;

/// A triangle primitive.
///
/// Vertices are wound counter-clockwise when seen from the side the
/// outward normal points to. Each vertex follows a linear path over the
/// frame, like a moving sphere's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Ray; 3],
    material: MaterialId,
    bbox: Aabb,
}

impl Triangle {
    /// Create a stationary triangle from three vertices.
    pub fn new(a: Vec3, b: Vec3, c: Vec3, material: MaterialId) -> GeometryResult<Self> {
        Self::moving([a, b, c], [a, b, c], material)
    }

    /// Create a triangle whose vertices move from `start` at time 0 to
    /// `end` at time 1.
    pub fn moving(start: [Vec3; 3], end: [Vec3; 3], material: MaterialId) -> GeometryResult<Self> {
        let mut vertices = [Ray::default(); 3];
        for (vertex, (s, e)) in vertices.iter_mut().zip(start.into_iter().zip(end)) {
            let s = ensure_finite_vec("triangle vertex", s)?;
            let e = ensure_finite_vec("triangle vertex", e)?;
            *vertex = Ray::new(s, e - s, 0.0);
        }

        let triangle = Self {
            vertices,
            material,
            bbox: Aabb::EMPTY,
        };
        for time in [0.0, 1.0] {
            let [a, b, c] = triangle.vertices_at(time);
            let (ab, ac) = (b - a, c - a);
            if ab.cross(ac).length() <= ANGLE_TOLERANCE * ab.length() * ac.length() {
                return Err(GeometryError::Degenerate {
                    what: "triangle",
                });
            }
        }

        Ok(Self {
            bbox: Aabb::surrounding(&triangle.box_at(0.0), &triangle.box_at(1.0)),
            ..triangle
        })
    }

    /// Vertex positions at the given time.
    #[inline]
    pub fn vertices_at(&self, time: f32) -> [Vec3; 3] {
        [
            self.vertices[0].at(time),
            self.vertices[1].at(time),
            self.vertices[2].at(time),
        ]
    }

    /// Unit outward normal at the given time.
    pub fn normal(&self, time: f32) -> Vec3 {
        let [a, b, c] = self.vertices_at(time);
        (b - a).cross(c - a).normalize()
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Flip the outward normal by reversing the winding order.
    pub fn invert_normal(&mut self) {
        self.vertices.swap(0, 1);
    }

    fn box_at(&self, time: f32) -> Aabb {
        let [a, b, c] = self.vertices_at(time);
        Aabb::from_points(a.min(b).min(c), a.max(b).max(c))
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let [v0, v1, v2] = self.vertices_at(ray.time());
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction().cross(edge2);
        let det = edge1.dot(h);

        // Ray is parallel to triangle
        if det.abs() <= ANGLE_TOLERANCE * edge1.length() * h.length() {
            return None;
        }

        let f = 1.0 / det;
        let s = ray.origin() - v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(HitRecord::new(ray, t, edge1.cross(edge2), self.material))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle() -> Triangle {
        // Triangle in XY plane at z=-1, facing +Z
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            MaterialId::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_triangle_miss_outside_edges() {
        let tri = xy_triangle();
        let ray = Ray::new_simple(Vec3::new(2.0, 2.0, 0.0), Vec3::new(0.0, 0.0, -1.0));

        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let tri = xy_triangle();
        // Travels inside the triangle's plane
        let ray = Ray::new_simple(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        assert!(tri.hit(&ray, Interval::UNIVERSE).is_none());

        // Parallel but offset from the plane
        let ray = Ray::new_simple(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(tri.hit(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_back_face_hit_flips_normal() {
        let tri = xy_triangle();
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!(!rec.front_face);
        assert!((rec.normal - (-Vec3::Z)).length() < 1e-5);
    }

    #[test]
    fn test_invert_normal() {
        let mut tri = xy_triangle();
        assert!((tri.normal(0.0) - Vec3::Z).length() < 1e-5);

        tri.invert_normal();
        assert!((tri.normal(0.0) + Vec3::Z).length() < 1e-5);
        assert_eq!(tri.bounding_box(), xy_triangle().bounding_box());
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let result = Triangle::new(
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(2.0, 0.0, 0.0),
            MaterialId::default(),
        );
        assert_eq!(result, Err(GeometryError::Degenerate { what: "triangle" }));

        let result = Triangle::new(Vec3::ZERO, Vec3::splat(f32::NAN), Vec3::Y, MaterialId::default());
        assert!(matches!(result, Err(GeometryError::NonFinite { .. })));
    }

    #[test]
    fn test_tiny_triangle_hit_by_short_ray() {
        let size = 1e-5;
        let z = -1e-3;
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, z),
            Vec3::new(size, 0.0, z),
            Vec3::new(0.0, size, z),
            MaterialId::default(),
        )
        .unwrap();

        // Direction length matches the distance, so the hit is at t = 1
        let ray = Ray::new_simple(Vec3::new(2e-6, 2e-6, 0.0), Vec3::new(0.0, 0.0, z));
        let rec = tri.hit(&ray, Interval::new(0.0, f32::INFINITY)).unwrap();
        assert!((rec.t - 1.0).abs() < 1e-3);
        assert!((rec.normal - Vec3::Z).length() < 1e-4);

        // Nearly collinear at any scale is still rejected
        let result = Triangle::new(
            Vec3::ZERO,
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(2.0 * size, size * 1e-9, 0.0),
            MaterialId::default(),
        );
        assert_eq!(result, Err(GeometryError::Degenerate { what: "triangle" }));
    }

    #[test]
    fn test_flat_triangle_box_is_padded() {
        let bbox = xy_triangle().bounding_box();
        assert!(bbox.z.size() > 0.0);
        assert!(bbox.z.contains(-1.0));
        assert_eq!(bbox.x, Interval::new(-1.0, 1.0));
    }

    #[test]
    fn test_moving_triangle_box_covers_both_ends() {
        let start = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let end = start.map(|v| v + Vec3::new(0.0, 0.0, 3.0));
        let tri = Triangle::moving(start, end, MaterialId::default()).unwrap();

        let bbox = tri.bounding_box();
        assert!(bbox.z.contains(0.0));
        assert!(bbox.z.contains(3.0));

        let ray = Ray::new(Vec3::new(0.2, 0.2, 5.0), -Vec3::Z, 1.0);
        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.p.z - 3.0).abs() < 1e-5);
    }
}
