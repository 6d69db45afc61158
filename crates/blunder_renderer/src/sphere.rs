//! Sphere primitive for ray tracing.

use crate::{
    hittable::{HitRecord, Hittable},
    material::MaterialId,
    Ray,
};
use blunder_math::util::{ensure_finite_vec, ensure_positive};
use blunder_math::{Aabb, GeometryResult, Interval, Vec3};

/// A sphere primitive, optionally moving linearly over the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center path: origin is the center at time 0, direction the
    /// displacement reached at time 1.
    center: Ray,
    radius: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Sphere {
    /// Create a stationary sphere.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> GeometryResult<Self> {
        Self::moving(center, center, radius, material)
    }

    /// Create a sphere moving from `center0` at time 0 to `center1` at time 1.
    pub fn moving(
        center0: Vec3,
        center1: Vec3,
        radius: f32,
        material: MaterialId,
    ) -> GeometryResult<Self> {
        let center0 = ensure_finite_vec("sphere center", center0)?;
        let center1 = ensure_finite_vec("sphere end center", center1)?;
        let radius = ensure_positive("sphere radius", radius)?;

        let center = Ray::new(center0, center1 - center0, 0.0);
        let rvec = Vec3::splat(radius);
        let box0 = Aabb::from_points(center.at(0.0) - rvec, center.at(0.0) + rvec);
        let box1 = Aabb::from_points(center.at(1.0) - rvec, center.at(1.0) + rvec);

        Ok(Self {
            center,
            radius,
            material,
            bbox: Aabb::surrounding(&box0, &box1),
        })
    }

    /// Center of the sphere at the given time.
    #[inline]
    pub fn center(&self, time: f32) -> Vec3 {
        self.center.at(time)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn is_moving(&self) -> bool {
        self.center.direction() != Vec3::ZERO
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let current_center = self.center(ray.time());
        let oc = current_center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - current_center) / self.radius;
        Some(HitRecord::new(ray, root, outward_normal, self.material))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
