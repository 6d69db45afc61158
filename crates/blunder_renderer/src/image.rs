//! Render output buffer and image file writing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{Color, RenderError, RenderResult};
use blunder_math::Interval;

/// Displayable intensity range before quantization.
const INTENSITY: Interval = Interval::new(0.0, 0.999);

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let quantize = |c: f32| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Linear RGB image, row-major with (0, 0) at the top left.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 {
            return Err(RenderError::ZeroCount { what: "image width" });
        }
        if height == 0 {
            return Err(RenderError::ZeroCount { what: "image height" });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> RenderResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(RenderError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> RenderResult<Color> {
        Ok(self.pixels[self.index(x, y)?])
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) -> RenderResult<()> {
        let index = self.index(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// Convert to gamma-corrected RGB bytes.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&color| color_to_rgb8(color))
            .collect()
    }

    /// Write the image as an ASCII PPM (`P3`).
    pub fn write_ppm<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "P3\n{} {}\n255", self.width, self.height)?;
        for &color in &self.pixels {
            let [r, g, b] = color_to_rgb8(color);
            writeln!(out, "{r} {g} {b}")?;
        }
        out.flush()
    }

    /// Save the image, choosing the format from the file extension.
    ///
    /// `.ppm` is written as ASCII PPM; anything else goes through the
    /// `image` crate (PNG, JPEG).
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(RenderError::EmptyFilename);
        }

        let is_ppm = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            self.write_ppm(BufWriter::new(File::create(path)?))?;
        } else {
            let rgb = ::image::RgbImage::from_fn(self.width, self.height, |x, y| {
                ::image::Rgb(color_to_rgb8(
                    self.pixels[y as usize * self.width as usize + x as usize],
                ))
            });
            rgb.save(path)?;
        }

        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert_eq!(linear_to_gamma(f32::NAN), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_quantization() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        // Out of range values clamp instead of wrapping
        assert_eq!(color_to_rgb8(Color::new(4.0, -1.0, 0.25)), [255, 0, 128]);
    }

    #[test]
    fn test_pixel_access_is_range_checked() {
        let mut image = ImageBuffer::new(4, 3).unwrap();
        image.set(3, 2, Color::ONE).unwrap();

        assert_eq!(image.get(3, 2).unwrap(), Color::ONE);
        assert_eq!(image.pixels()[11], Color::ONE);
        assert!(matches!(
            image.get(4, 0),
            Err(RenderError::PixelOutOfBounds { x: 4, y: 0, width: 4, height: 3 })
        ));
        assert!(image.set(0, 3, Color::ONE).is_err());
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        assert!(matches!(
            ImageBuffer::new(0, 5),
            Err(RenderError::ZeroCount { what: "image width" })
        ));
        assert!(matches!(
            ImageBuffer::new(5, 0),
            Err(RenderError::ZeroCount { what: "image height" })
        ));
    }

    #[test]
    fn test_write_ppm() {
        let mut image = ImageBuffer::new(2, 1).unwrap();
        image.set(1, 0, Color::new(1.0, 0.25, 0.0)).unwrap();

        let mut out = Vec::new();
        image.write_ppm(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "P3\n2 1\n255\n0 0 0\n255 128 0\n");
    }

    #[test]
    fn test_save_rejects_empty_filename() {
        let image = ImageBuffer::new(1, 1).unwrap();
        assert!(matches!(image.save(""), Err(RenderError::EmptyFilename)));
    }

    #[test]
    fn test_save_ppm_and_png() {
        let dir = std::env::temp_dir().join(format!("blunder-image-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let image = ImageBuffer::new(3, 2).unwrap();
        let ppm = dir.join("out.ppm");
        let png = dir.join("out.png");
        image.save(&ppm).unwrap();
        image.save(&png).unwrap();

        assert!(std::fs::read_to_string(&ppm).unwrap().starts_with("P3\n3 2\n255\n"));
        assert!(std::fs::metadata(&png).unwrap().len() > 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
