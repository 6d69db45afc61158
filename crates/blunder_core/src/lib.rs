//! Blunder core - scene descriptions and the `.blunder` file format.
//!
//! This crate provides:
//!
//! - **Scene description types**: `SceneDescription`, `RenderSettings`,
//!   `CameraDescription`, and named materials and primitives
//! - **Scene files**: parsing and loading of `.blunder` files
//!
//! # Example
//!
//! ```ignore
//! use blunder_core::load_blunder;
//!
//! let description = load_blunder("scene.blunder")?;
//! println!("Loaded {} spheres, {} triangles",
//!     description.spheres.len(),
//!     description.triangles.len());
//! ```

pub mod parser;
pub mod scene;

// Re-export commonly used types
pub use parser::{load_blunder, parse_blunder, BlunderParser, ParseError, ParseResult};
pub use scene::{
    CameraDescription, MaterialDescription, NamedMaterial, RenderSettings, SceneDescription,
    SphereDescription, TriangleDescription,
};
