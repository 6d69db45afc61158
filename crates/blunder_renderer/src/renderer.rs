//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Anti-aliasing via multi-sampling
//! - Parallel bucket rendering with per-bucket seeded generators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::bucket::{generate_buckets, render_bucket, DEFAULT_BUCKET_SIZE};
use crate::material::Scatter;
use crate::{Camera, CameraFrame, Color, Hittable, ImageBuffer, Ray, RenderError, RenderResult, Scene};
use blunder_core::{RenderSettings, SceneDescription};
use blunder_math::util::ensure_direction;
use blunder_math::{GeometryResult, Interval, Vec3};
use rand::RngCore;
use rayon::prelude::*;

/// Lower bound of the hit interval; avoids self-intersection ("shadow acne").
pub const HIT_EPSILON: f32 = 0.001;

/// Color returned for rays that escape the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    /// Constant color
    Solid(Color),
    /// Blend from `bottom` (looking against `up`) to `top` (looking along it).
    /// `up` is unit length.
    Gradient { bottom: Color, top: Color, up: Vec3 },
}

impl Background {
    /// White horizon fading to light blue overhead, y up.
    pub const SKY: Background = Background::Gradient {
        bottom: Color::ONE,
        top: Color::new(0.5, 0.7, 1.0),
        up: Vec3::Y,
    };

    /// Gradient whose vertical axis is `up`.
    pub fn gradient(bottom: Color, top: Color, up: Vec3) -> GeometryResult<Self> {
        let up = ensure_direction("background up direction", up)?.normalize();
        Ok(Background::Gradient { bottom, top, up })
    }

    /// Black below fading to white overhead, as seen by a camera whose
    /// up direction is `up`. This is the sky of `.blunder` scene files.
    pub fn scene_sky(up: Vec3) -> GeometryResult<Self> {
        Self::gradient(Color::ZERO, Color::ONE, up)
    }

    /// Background color seen along `ray`.
    pub fn color(&self, ray: &Ray) -> Color {
        match *self {
            Background::Solid(color) => color,
            Background::Gradient { bottom, top, up } => {
                let unit_direction = ray.direction().normalize();
                let a = 0.5 * (unit_direction.dot(up) + 1.0);
                bottom * (1.0 - a) + top * a
            }
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::SKY
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Color of rays that hit nothing
    pub background: Background,
    /// Seed for reproducible renders; random when `None`
    pub seed: Option<u64>,
    /// Edge length of render buckets in pixels
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            samples_per_pixel: 100,
            max_depth: 50,
            background: Background::SKY,
            seed: None,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Create a validated configuration.
    pub fn new(width: u32, height: u32, samples_per_pixel: u32, max_depth: u32) -> RenderResult<Self> {
        let config = Self {
            width,
            height,
            samples_per_pixel,
            max_depth,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration from the settings block of a scene file.
    pub fn from_settings(settings: &RenderSettings) -> RenderResult<Self> {
        Self::new(settings.width, settings.height, settings.samples, settings.bounces)
    }

    /// Configuration for a whole scene file: its settings, plus a sky
    /// oriented along the camera's up direction.
    pub fn from_description(description: &SceneDescription) -> RenderResult<Self> {
        let background = Background::scene_sky(description.camera.up_direction)?;
        Ok(Self::from_settings(&description.settings)?.with_background(background))
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Check that every count is non-zero.
    pub fn validate(&self) -> RenderResult<()> {
        let counts = [
            (self.width, "image width"),
            (self.height, "image height"),
            (self.samples_per_pixel, "samples per pixel"),
            (self.max_depth, "max depth"),
            (self.bucket_size, "bucket size"),
        ];
        match counts.iter().find(|(value, _)| *value == 0) {
            Some(&(_, what)) => Err(RenderError::ZeroCount { what }),
            None => Ok(()),
        }
    }
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and
/// attenuating by each material until the ray escapes, is absorbed, or
/// runs out of depth. Zero depth is black, never an error.
pub fn ray_color(
    ray: &Ray,
    scene: &Scene,
    depth: u32,
    background: &Background,
    rng: &mut dyn RngCore,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = scene.hit(ray, Interval::new(HIT_EPSILON, f32::INFINITY)) else {
        return background.color(ray);
    };

    match scene.material(rec.material).scatter(ray, &rec, rng) {
        Some(result) => {
            let scattered_color = ray_color(&result.scattered, scene, depth - 1, background, rng);
            result.attenuation * scattered_color
        }
        // Ray was absorbed
        None => Color::ZERO,
    }
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(
    frame: &CameraFrame,
    scene: &Scene,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..config.samples_per_pixel {
        let ray = frame.sample_ray(x, y, rng);
        pixel_color += ray_color(&ray, scene, config.max_depth, &config.background, rng);
    }

    // Average the samples
    pixel_color / config.samples_per_pixel as f32
}

/// Render the entire scene to an image buffer.
///
/// Buckets are rendered in parallel. With `config.seed` set the output is
/// bit-identical between runs regardless of thread count.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    config.validate()?;
    let frame = camera.frame(config.width, config.height)?;
    let mut image = ImageBuffer::new(config.width, config.height)?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let buckets = generate_buckets(config.width, config.height, config.bucket_size);
    let total = buckets.len();

    log::info!(
        "Rendering {}x{} @ {} spp, depth {}, {} buckets, seed {}",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth,
        total,
        seed
    );
    let start = Instant::now();
    let completed = AtomicUsize::new(0);

    let results: Vec<_> = buckets
        .par_iter()
        .map(|bucket| {
            let result = render_bucket(bucket, &frame, scene, config, seed);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!("Bucket {} done ({}/{})", bucket.index, done, total);
            result
        })
        .collect();

    for result in results {
        let bucket = result.bucket;
        let rows = result.pixels.chunks_exact(bucket.width as usize);
        for (local_y, row) in (0..bucket.height).zip(rows) {
            for (local_x, &color) in (0..bucket.width).zip(row) {
                image.set(bucket.x + local_x, bucket.y + local_y, color)?;
            }
        }
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dielectric, Lambertian, Metal, Sphere, Triangle};
    use blunder_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn demo_scene() -> Scene {
        let mut builder = Scene::builder();
        let ground = builder.material(Lambertian::new(Color::new(0.8, 0.8, 0.0)).unwrap());
        let center = builder.material(Lambertian::new(Color::new(0.1, 0.2, 0.5)).unwrap());
        let left = builder.material(Dielectric::new(1.5).unwrap());
        let right = builder.material(Metal::new(Color::new(0.8, 0.6, 0.2), 0.3).unwrap());

        builder
            .add(Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0, ground).unwrap())
            .add(Sphere::new(Vec3::new(0.0, 0.0, -1.2), 0.5, center).unwrap())
            .add(Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, left).unwrap())
            .add(
                Sphere::moving(Vec3::new(1.0, 0.0, -1.0), Vec3::new(1.0, 0.2, -1.0), 0.5, right)
                    .unwrap(),
            )
            .add(
                Triangle::new(
                    Vec3::new(-2.0, -0.5, -3.0),
                    Vec3::new(2.0, -0.5, -3.0),
                    Vec3::new(0.0, 1.5, -3.0),
                    right,
                )
                .unwrap(),
            );
        builder.build().unwrap()
    }

    #[test]
    fn test_sky_gradient() {
        let up = Background::SKY.color(&Ray::new(Vec3::ZERO, Vec3::Y, 0.0));
        let down = Background::SKY.color(&Ray::new(Vec3::ZERO, -Vec3::Y, 0.0));

        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((down - Color::ONE).length() < 1e-6);
        assert_eq!(
            Background::Solid(Color::X).color(&Ray::new(Vec3::ZERO, Vec3::Y, 0.0)),
            Color::X
        );
    }

    #[test]
    fn test_scene_sky_follows_camera_up() {
        let mut description = SceneDescription::default();
        description.camera.position = Vec3::new(0.0, -5.0, 0.0);
        description.camera.look_at = Vec3::ZERO;
        description.camera.up_direction = Vec3::new(0.0, 0.0, 2.0);
        let config = RenderConfig::from_description(&description).unwrap();

        let straight_up = Ray::new(Vec3::ZERO, Vec3::Z, 0.0);
        let straight_down = Ray::new(Vec3::ZERO, -Vec3::Z, 0.0);
        let horizon = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        assert_eq!(config.background.color(&straight_up), Color::ONE);
        assert_eq!(config.background.color(&straight_down), Color::ZERO);
        assert!((config.background.color(&horizon) - Color::splat(0.5)).length() < 1e-6);

        // Empty z-up scene sees the top color straight up
        let mut rng = StdRng::seed_from_u64(5);
        let color = ray_color(&straight_up, &Scene::empty(), 4, &config.background, &mut rng);
        assert_eq!(color, Color::ONE);

        assert!(Background::scene_sky(Vec3::ZERO).is_err());
    }

    #[test]
    fn test_unit_sphere_hit_from_below() {
        let mut builder = Scene::builder();
        let mat = builder.material(Lambertian::new(Color::splat(0.5)).unwrap());
        builder.add(Sphere::new(Vec3::ZERO, 1.0, mat).unwrap());
        let scene = builder.build().unwrap();

        let from = Vec3::new(0.0, -5.0, 0.0);
        let ray = Ray::try_new(from, Vec3::ZERO - from, 0.0).unwrap();
        let rec = scene
            .hit(&ray, Interval::new(HIT_EPSILON, f32::INFINITY))
            .unwrap();

        assert!((rec.p - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
        assert!((rec.normal - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
        assert!(rec.front_face);
    }

    #[test]
    fn test_empty_scene_returns_background() {
        let scene = Scene::empty();
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, 0.6, -1.0), 0.0);
        let expected = Background::SKY.color(&ray);

        for depth in [1, 2, 50] {
            assert_eq!(
                ray_color(&ray, &scene, depth, &Background::SKY, &mut rng),
                expected
            );
        }
    }

    #[test]
    fn test_zero_depth_is_black() {
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);

        for scene in [Scene::empty(), demo_scene()] {
            assert_eq!(
                ray_color(&ray, &scene, 0, &Background::SKY, &mut rng),
                Color::ZERO
            );
        }
    }

    #[test]
    fn test_hit_attenuates_background() {
        let scene = demo_scene();
        let mut rng = StdRng::seed_from_u64(4);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);

        for _ in 0..20 {
            let color = ray_color(&ray, &scene, 10, &Background::SKY, &mut rng);
            assert!(color.is_finite());
            assert!(color.cmpge(Color::ZERO).all() && color.cmple(Color::ONE).all());
        }
    }

    #[test]
    fn test_fixed_seed_renders_identically() {
        let scene = demo_scene();
        let camera = Camera::new()
            .with_position(Vec3::new(0.0, 0.5, 1.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .unwrap()
            .with_defocus(2.0, None)
            .unwrap()
            .with_motion_blur(true);
        let config = RenderConfig::new(37, 23, 1, 8)
            .unwrap()
            .with_seed(1234)
            .with_bucket_size(16);

        let first = render(&scene, &camera, &config).unwrap();
        let second = render(&scene, &camera, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.width(), 37);
        assert_eq!(first.height(), 23);
        assert!(first.pixels().iter().any(|&c| c != Color::ZERO));
    }

    #[test]
    fn test_render_pixel_averages_samples() {
        let scene = Scene::empty();
        let frame = Camera::new().frame(10, 10).unwrap();
        let config = RenderConfig::new(10, 10, 8, 5)
            .unwrap()
            .with_background(Background::Solid(Color::new(0.2, 0.4, 0.6)));
        let mut rng = StdRng::seed_from_u64(42);

        let color = render_pixel(&frame, &scene, 5, 5, &config, &mut rng);
        assert!((color - Color::new(0.2, 0.4, 0.6)).length() < 1e-5);
    }

    #[test]
    fn test_config_validation() {
        assert!(RenderConfig::new(10, 10, 1, 1).is_ok());
        assert!(matches!(
            RenderConfig::new(10, 10, 0, 1),
            Err(RenderError::ZeroCount { what: "samples per pixel" })
        ));
        assert!(matches!(
            RenderConfig::new(10, 10, 1, 0),
            Err(RenderError::ZeroCount { what: "max depth" })
        ));

        let config = RenderConfig::default().with_bucket_size(0);
        assert!(render(&Scene::empty(), &Camera::new(), &config).is_err());
    }
}
