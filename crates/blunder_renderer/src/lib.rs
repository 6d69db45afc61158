//! Blunder renderer - CPU path tracing.
//!
//! A Monte Carlo path tracer for offline rendering of spheres and
//! triangles with diffuse, metallic and glass materials.
//!
//! # Example
//!
//! ```ignore
//! use blunder_renderer::{render, Camera, Lambertian, RenderConfig, Scene, Sphere, Vec3};
//!
//! let mut builder = Scene::builder();
//! let gray = builder.material(Lambertian::new(Vec3::splat(0.5))?);
//! builder.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, gray)?);
//! let scene = builder.build()?;
//!
//! let image = render(&scene, &Camera::new(), &RenderConfig::new(400, 225, 16, 10)?)?;
//! image.save("out.png")?;
//! ```

mod bucket;
mod bvh;
mod camera;
mod error;
mod hittable;
mod image;
mod material;
mod primitive;
mod renderer;
mod scene;
mod sphere;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, BvhChild, BvhNode};
pub use camera::{Camera, CameraFrame};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use image::{color_to_rgb8, linear_to_gamma, ImageBuffer};
pub use material::{
    Color, Dielectric, Lambertian, Material, MaterialId, Materials, Metal, Scatter, ScatterRecord,
};
pub use primitive::Primitive;
pub use renderer::{ray_color, render, render_pixel, Background, RenderConfig, HIT_EPSILON};
pub use scene::{Scene, SceneBuilder, World};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from blunder_math
pub use blunder_math::{Aabb, GeometryError, Interval, Ray, Vec3};
