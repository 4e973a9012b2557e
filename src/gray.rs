use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::error::SetupError;

/// single-channel luminance image. wraps the 8-bit Luma buffer and exposes
/// the handful of operations the pipeline needs: sub-rectangle extraction,
/// smooth resampling, mean intensity and the brightness transform.
#[derive(Clone, Debug)]
pub struct GrayMap {
    buf: GrayImage,
}

impl GrayMap {
    /// decode an image file and reduce it to its luminance channel
    pub fn open(path: &Path) -> Result<Self, SetupError> {
        let img = image::open(path).map_err(|source| SetupError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { buf: img.to_luma8() })
    }

    pub fn from_buffer(buf: GrayImage) -> Self {
        Self { buf }
    }

    /// constant-intensity image, mostly useful in tests
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            buf: GrayImage::from_pixel(width, height, image::Luma([value])),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.buf.get_pixel(x, y).0[0]
    }

    /// raw row-major intensity samples
    #[inline]
    pub fn samples(&self) -> &[u8] {
        self.buf.as_raw()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.buf
    }

    /// copy out an axis-aligned sub-rectangle
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            buf: imageops::crop_imm(&self.buf, x, y, w, h).to_image(),
        }
    }

    /// resample to an arbitrary grid size. Triangle filtering stands in for
    /// the smooth bilinear scaling the source material was produced with.
    pub fn scaled(&self, w: u32, h: u32) -> Self {
        Self {
            buf: imageops::resize(&self.buf, w, h, FilterType::Triangle),
        }
    }

    pub fn mean(&self) -> f64 {
        let sum: u64 = self.samples().iter().map(|&c| c as u64).sum();
        sum as f64 / (self.width() as u64 * self.height() as u64) as f64
    }

    /// produce a brightness-shifted copy. the shift is compressed toward the
    /// value extremes so pushed pixels do not clip into flat white or black.
    pub fn apply_brightness(&self, brightness: i32) -> Self {
        profiling::scope!("apply_brightness");
        let mut buf = self.buf.clone();
        for px in buf.pixels_mut() {
            px.0[0] = shift_sample(px.0[0], brightness);
        }
        Self { buf }
    }
}

/// brightness-correct one sample: c' = c + (0.5 - c/255)*|b| + b*0.5,
/// truncated and clamped to [0, 255]
#[inline]
pub fn shift_sample(c: u8, brightness: i32) -> u8 {
    let c = c as f64;
    let b = brightness as f64;
    let shifted = (c + (0.5 - c / 255.0) * b.abs() + b * 0.5) as i32;
    shifted.clamp(0, 255) as u8
}
