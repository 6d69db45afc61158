//! Camera for ray generation.
//!
//! [`Camera`] holds validated user-facing settings. Before rendering it is
//! resolved against an image size into a [`CameraFrame`], which caches the
//! basis and viewport vectors needed to shoot rays.

use crate::{Ray, RenderError, RenderResult};
use blunder_core::CameraDescription;
use blunder_math::util::{
    ensure_direction, ensure_finite, ensure_finite_vec, ensure_positive, gen_f32, is_near_zero,
    random_in_unit_disk, sample_square,
};
use blunder_math::{GeometryError, GeometryResult, Interval, Vec3};
use rand::RngCore;

/// Camera settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,               // Vertical field of view in degrees
    defocus_angle: f32,      // Variation angle of rays through each pixel
    focus_dist: Option<f32>, // Distance to the plane of perfect focus

    /// Whether rays sample a time in [0, 1) for motion blur
    motion_blur: bool,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 90 degree field of view.
    pub fn new() -> Self {
        Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: None,
            motion_blur: false,
        }
    }

    /// Build a camera from a parsed scene description.
    pub fn from_description(description: &CameraDescription) -> GeometryResult<Self> {
        Self::new()
            .with_position(description.position, description.look_at, description.up_direction)?
            .with_fov(description.fov)?
            .with_defocus(description.focus_angle, description.focus_distance)
    }

    /// Set camera position, target and up direction.
    ///
    /// Fails if any vector is non-finite, the position coincides with the
    /// target, or the up direction is zero or parallel to the view direction.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> GeometryResult<Self> {
        let look_from = ensure_finite_vec("camera position", look_from)?;
        let look_at = ensure_finite_vec("camera look_at", look_at)?;
        let vup = ensure_direction("camera up direction", vup)?;

        let view = look_from - look_at;
        if is_near_zero(view) {
            return Err(GeometryError::Coincident {
                what: "camera position and look_at",
            });
        }
        if is_near_zero(vup.cross(view.normalize())) {
            return Err(GeometryError::Degenerate {
                what: "camera up direction",
            });
        }

        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        Ok(self)
    }

    /// Set the vertical field of view in degrees, strictly inside (0, 180).
    pub fn with_fov(mut self, vfov: f32) -> GeometryResult<Self> {
        if !vfov.is_finite() {
            return Err(GeometryError::NonFinite { what: "field of view" });
        }
        if !Interval::new(0.0, 180.0).surrounds(vfov) {
            return Err(GeometryError::OutOfRange {
                what: "field of view",
                value: vfov,
                min: 0.0,
                max: 180.0,
            });
        }
        self.vfov = vfov;
        Ok(self)
    }

    /// Set lens settings.
    ///
    /// `focus_dist` of `None` focuses on the look-at point.
    pub fn with_defocus(mut self, defocus_angle: f32, focus_dist: Option<f32>) -> GeometryResult<Self> {
        let defocus_angle = ensure_finite("defocus angle", defocus_angle)?;
        // 0 disables depth of field
        if !(0.0..180.0).contains(&defocus_angle) {
            return Err(GeometryError::OutOfRange {
                what: "defocus angle",
                value: defocus_angle,
                min: 0.0,
                max: 180.0,
            });
        }
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist
            .map(|d| ensure_positive("focus distance", d))
            .transpose()?;
        Ok(self)
    }

    pub fn with_motion_blur(mut self, enabled: bool) -> Self {
        self.motion_blur = enabled;
        self
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    /// Distance to the plane of perfect focus.
    pub fn focus_dist(&self) -> f32 {
        self.focus_dist
            .unwrap_or_else(|| (self.look_from - self.look_at).length())
    }

    /// Derive the per-render frame for an image of the given size.
    pub fn frame(&self, image_width: u32, image_height: u32) -> RenderResult<CameraFrame> {
        if image_width == 0 {
            return Err(RenderError::ZeroCount { what: "image width" });
        }
        if image_height == 0 {
            return Err(RenderError::ZeroCount { what: "image height" });
        }

        let center = self.look_from;
        let focus_dist = self.focus_dist();

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * focus_dist;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Calculate camera basis vectors
        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        // Calculate pixel delta vectors
        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left = center - focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        Ok(CameraFrame {
            image_width,
            image_height,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            defocus: self.defocus_angle > 0.0,
            motion_blur: self.motion_blur,
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera resolved against an image size.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    image_width: u32,
    image_height: u32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    defocus: bool,
    motion_blur: bool,
}

impl CameraFrame {
    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Orthonormal camera basis `(u, v, w)`; `w` points away from the view.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Generate a jittered ray through pixel (i, j).
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> RenderResult<Ray> {
        if i >= self.image_width || j >= self.image_height {
            return Err(RenderError::PixelOutOfBounds {
                x: i,
                y: j,
                width: self.image_width,
                height: self.image_height,
            });
        }
        Ok(self.sample_ray(i, j, rng))
    }

    /// Unchecked variant of [`CameraFrame::get_ray`] for the render loop.
    pub(crate) fn sample_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus {
            self.defocus_disk_sample(rng)
        } else {
            self.center
        };

        let ray_direction = pixel_sample - ray_origin;
        let ray_time = if self.motion_blur { gen_f32(rng) } else { 0.0 };

        Ray::new(ray_origin, ray_direction, ray_time)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_frame_basis() {
        let frame = Camera::new()
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .unwrap()
            .frame(800, 600)
            .unwrap();

        let (u, v, w) = frame.basis();
        assert!((u - Vec3::X).length() < 0.001);
        assert!((v - Vec3::Y).length() < 0.001);
        assert!((w - Vec3::Z).length() < 0.001);
    }

    #[test]
    fn test_camera_ray_direction() {
        let frame = Camera::new().frame(100, 100).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = frame.get_ray(50, 50, &mut rng).unwrap();
        assert!(ray.direction().z < 0.0);
        assert_eq!(ray.origin(), Vec3::ZERO);
        assert_eq!(ray.time(), 0.0);

        // Corner pixel points up and to the left
        let ray = frame.get_ray(0, 0, &mut rng).unwrap();
        assert!(ray.direction().x < 0.0);
        assert!(ray.direction().y > 0.0);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let frame = Camera::new().frame(10, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(frame.get_ray(9, 4, &mut rng).is_ok());
        assert!(matches!(
            frame.get_ray(10, 0, &mut rng),
            Err(RenderError::PixelOutOfBounds { x: 10, y: 0, .. })
        ));
        assert!(frame.get_ray(0, 5, &mut rng).is_err());
    }

    #[test]
    fn test_zero_sized_frame() {
        assert!(matches!(
            Camera::new().frame(0, 10),
            Err(RenderError::ZeroCount { .. })
        ));
    }

    #[test]
    fn test_camera_validation() {
        let cam = Camera::new();
        assert!(matches!(
            cam.clone().with_position(Vec3::ONE, Vec3::ONE, Vec3::Y),
            Err(GeometryError::Coincident { .. })
        ));
        assert!(matches!(
            cam.clone().with_position(Vec3::ZERO, -Vec3::Z, Vec3::ZERO),
            Err(GeometryError::ZeroLength { .. })
        ));
        assert!(matches!(
            cam.clone().with_position(Vec3::ZERO, -Vec3::Y, Vec3::Y),
            Err(GeometryError::Degenerate { .. })
        ));
        assert!(matches!(
            cam.clone().with_position(Vec3::splat(f32::NAN), -Vec3::Z, Vec3::Y),
            Err(GeometryError::NonFinite { .. })
        ));

        assert!(cam.clone().with_fov(1.0).is_ok());
        for bad in [0.0, 180.0, -10.0, 270.0] {
            assert!(matches!(
                cam.clone().with_fov(bad),
                Err(GeometryError::OutOfRange { .. })
            ));
        }
        assert!(matches!(
            cam.clone().with_fov(f32::NAN),
            Err(GeometryError::NonFinite { .. })
        ));

        assert!(cam.clone().with_defocus(10.0, Some(3.4)).is_ok());
        assert!(cam.clone().with_defocus(-1.0, None).is_err());
        assert!(cam.with_defocus(1.0, Some(0.0)).is_err());
    }

    #[test]
    fn test_focus_distance_defaults_to_target() {
        let cam = Camera::new()
            .with_position(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y)
            .unwrap();
        assert_eq!(cam.focus_dist(), 4.0);

        let cam = cam.with_defocus(2.0, Some(10.0)).unwrap();
        assert_eq!(cam.focus_dist(), 10.0);
    }

    #[test]
    fn test_defocus_rays_start_on_lens_disk() {
        let frame = Camera::new()
            .with_defocus(20.0, Some(2.0))
            .unwrap()
            .frame(32, 32)
            .unwrap();
        let radius = 2.0 * (10.0f32).to_radians().tan();
        let mut rng = StdRng::seed_from_u64(11);

        let mut moved = false;
        for _ in 0..50 {
            let ray = frame.get_ray(16, 16, &mut rng).unwrap();
            assert!(ray.origin().length() <= radius + 1e-5);
            assert_eq!(ray.origin().z, 0.0);
            moved |= ray.origin() != Vec3::ZERO;
        }
        assert!(moved);
    }

    #[test]
    fn test_motion_blur_samples_time() {
        let frame = Camera::new().with_motion_blur(true).frame(8, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let times: Vec<f32> = (0..20)
            .map(|_| frame.get_ray(4, 4, &mut rng).unwrap().time())
            .collect();
        assert!(times.iter().all(|t| (0.0..1.0).contains(t)));
        assert!(times.iter().any(|&t| t > 0.0));
    }
}
