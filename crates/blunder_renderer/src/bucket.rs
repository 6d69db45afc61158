//! Tiles ("buckets") of the image, the unit of work handed to rayon.
//!
//! Each bucket draws from its own generator, seeded from the render seed
//! and the bucket position, so a seeded render does not depend on which
//! thread picks up which bucket.

use crate::renderer::render_pixel;
use crate::{CameraFrame, Color, RenderConfig, Scene};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A tile of the image, rendered as one unit of parallel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order; 0 is rendered first
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Generator for this bucket, derived from the render seed and the
    /// bucket's position (not its index, which depends on the sort order).
    pub fn rng(&self, seed: u64) -> StdRng {
        let position = (u64::from(self.x) << 32) | u64::from(self.y);
        StdRng::seed_from_u64(seed ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Squared distance from this bucket's midpoint to the image midpoint,
    /// in half-pixel units so it stays integral.
    fn distance_to_middle(&self, image_width: u32, image_height: u32) -> u64 {
        let offset = |start: u32, extent: u32, image_extent: u32| {
            (2 * i64::from(start) + i64::from(extent) - i64::from(image_extent)).unsigned_abs()
        };
        let dx = offset(self.x, self.width, image_width);
        let dy = offset(self.y, self.height, image_height);
        dx * dx + dy * dy
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Split an image into `bucket_size` tiles, clipped at the right and
/// bottom edges, ordered from the middle of the frame outward.
///
/// Tiles at equal distance keep row-major order.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let step = bucket_size.max(1) as usize;

    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(step)
        .flat_map(|y| {
            (0..width).step_by(step).map(move |x| {
                let size = step as u32;
                Bucket::new(x, y, size.min(width - x), size.min(height - y), 0)
            })
        })
        .collect();

    buckets.sort_by_key(|b| b.distance_to_middle(width, height));
    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }
    buckets
}

/// Pixels of one rendered bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Row-major within the bucket
    pub pixels: Vec<Color>,
}

/// Render every pixel of `bucket` with the bucket's own generator.
pub fn render_bucket(
    bucket: &Bucket,
    frame: &CameraFrame,
    scene: &Scene,
    config: &RenderConfig,
    seed: u64,
) -> BucketResult {
    let mut rng = bucket.rng(seed);
    let rows = bucket.y..bucket.y + bucket.height;
    let pixels = rows
        .flat_map(|y| (bucket.x..bucket.x + bucket.width).map(move |x| (x, y)))
        .map(|(x, y)| render_pixel(frame, scene, x, y, config, &mut rng))
        .collect();

    BucketResult {
        bucket: *bucket,
        pixels,
    }
}
