//! Blunder math - geometric building blocks shared by the renderer.
//!
//! Re-exports [`glam`] so downstream crates agree on one `Vec3`.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod error;
mod interval;
mod ray;
pub mod util;

pub use aabb::Aabb;
pub use error::{GeometryError, GeometryResult};
pub use interval::Interval;
pub use ray::Ray;
