//! Errors raised while assembling scenes, configuring renders and
//! writing images.

use blunder_math::GeometryError;
use thiserror::Error;

/// Errors that can occur outside the render hot path.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("{what} must be greater than zero")]
    ZeroCount { what: &'static str },

    #[error("Pixel ({x}, {y}) is outside the {width}x{height} image")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Material handle {id} does not exist (scene has {count} materials)")]
    UnknownMaterial { id: usize, count: usize },

    #[error("Invalid primitive on line {line}: {source}")]
    InvalidPrimitive {
        line: usize,
        #[source]
        source: GeometryError,
    },

    #[error("Material '{name}' is not defined")]
    UndefinedMaterial { name: String },

    #[error("Output file name is empty")]
    EmptyFilename,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] ::image::ImageError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
