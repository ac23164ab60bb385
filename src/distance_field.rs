
use std::ops::Range;

use image::{GrayImage, ImageEncoder, ImageError, Luma, Rgba, RgbaImage};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::distance_grid::DistanceGrid;


/// A normalized signed distance image, where `0.5` marks the boundary of the shape,
/// darker values lie inside it and brighter values outside of it.
#[derive(Clone, PartialEq, Debug)]
pub struct SignedDistanceImage<D: DistanceStorage> {
    pub width: u32,
    pub height: u32,
    pub values: D,
}

/// Maps signed pixel distances into the normalized output range.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Normalization {
    /// How many pixel units of distance span the whole output range.
    pub spread: f32,

    /// Whether values are clamped to `0.0..=1.0`.
    /// Unclamped values are saturated only when encoding to bytes.
    pub clamp: bool,
}

/// Needs less storage with sufficient precision, but takes about
/// twice as long because of conversions between f16 and f32.
pub type F16DistanceStorage = Vec<half::f16>;

/// Needs more storage with high precision, but takes about
/// half as long because no conversions between f16 and f32 must be made.
pub type F32DistanceStorage = Vec<f32>;

pub trait DistanceStorage {
    fn new(length: usize) -> Self;

    fn get(&self, index: usize) -> f32;

    fn set(&mut self, index: usize, value: f32);
}


impl Normalization {
    #[inline]
    pub fn normalize(&self, signed_distance: f32) -> f32 {
        let value = 0.5 + signed_distance / self.spread;
        if self.clamp { value.clamp(0.0, 1.0) } else { value }
    }
}

/// The distance to the nearest inside seed minus the distance to the nearest outside seed.
/// Negative inside the shape, positive outside of it.
#[inline]
pub fn signed_distance(inside: &DistanceGrid, outside: &DistanceGrid, x: i32, y: i32) -> f32 {
    inside.distance(x, y) - outside.distance(x, y)
}


impl<D> SignedDistanceImage<D> where D: DistanceStorage {

    /// Allocate an image of the given size. Every value is zero until composited.
    pub fn new(width: u32, height: u32) -> Self {
        SignedDistanceImage {
            width, height,
            values: D::new(width as usize * height as usize),
        }
    }

    /// Combine two fully transformed grids into a normalized image.
    pub fn composite(inside: &DistanceGrid, outside: &DistanceGrid, normalization: Normalization) -> Self {
        let mut image = Self::new(inside.width(), inside.height());
        image.composite_rows(inside, outside, normalization, 0..inside.height());
        image
    }

    /// Composite only the given rows, so that large images can be processed in chunks.
    /// Rows beyond the image are skipped.
    pub fn composite_rows(
        &mut self, inside: &DistanceGrid, outside: &DistanceGrid,
        normalization: Normalization, rows: Range<u32>
    ) {
        debug_assert_eq!((inside.width(), inside.height()), (self.width, self.height), "Grid dimension mismatch");
        debug_assert_eq!((outside.width(), outside.height()), (self.width, self.height), "Grid dimension mismatch");

        for y in rows.start..rows.end.min(self.height) {
            for x in 0..self.width {
                let distance = signed_distance(inside, outside, x as i32, y as i32);
                let index = self.flatten_index(x, y);
                self.values.set(index, normalization.normalize(distance));
            }
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values.get(self.flatten_index(x, y))
    }

    /// Quantize to one byte per pixel. Values outside of `0.0..=1.0` saturate.
    pub fn to_gray_u8_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([to_byte(self.get(x, y))]))
    }

    /// The gray value replicated into all color channels, fully opaque.
    pub fn to_rgba_u8_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let value = to_byte(self.get(x, y));
            Rgba([value, value, value, u8::MAX])
        })
    }

    /// Encode the RGBA image as a lossless PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ImageError> {
        let rgba = self.to_rgba_u8_image();
        let mut bytes = Vec::new();

        let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Fast, FilterType::Adaptive);
        encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), image::ExtendedColorType::Rgba8)?;
        Ok(bytes)
    }

    #[inline]
    pub fn flatten_index(&self, x: u32, y: u32) -> usize {
        self.width as usize * y as usize + x as usize
    }
}

/// Float to int casts saturate, so out-of-range values end up at 0 or 255.
#[inline]
fn to_byte(value: f32) -> u8 {
    (value * 255.0).round() as u8
}


impl DistanceStorage for F16DistanceStorage {
    fn new(length: usize) -> Self {
        vec![half::f16::ZERO; length]
    }

    #[inline]
    fn get(&self, index: usize) -> f32 {
        self[index].to_f32()
    }

    #[inline]
    fn set(&mut self, index: usize, value: f32) {
        self[index] = half::f16::from_f32(value)
    }
}

impl DistanceStorage for F32DistanceStorage {
    fn new(length: usize) -> Self {
        vec![0.0; length]
    }

    #[inline]
    fn get(&self, index: usize) -> f32 {
        self[index]
    }

    #[inline]
    fn set(&mut self, index: usize, value: f32) {
        self[index] = value
    }
}
