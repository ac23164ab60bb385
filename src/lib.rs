//! This crate converts a binary mask image
//! into a normalized signed distance field image.
//! The distances are approximated with the eight-point
//! sequential euclidean distance transform (`8SSEDT`),
//! run once from the pixels inside the shape and once from the pixels outside of it.
//!
//! Use [`compute_distance_field`] to convert an in-memory image in one call,
//! or drive a [`pipeline::PipelineRun`] tick by tick from a host loop.

pub mod binary_image;
pub mod classify;
pub mod config;
pub mod distance_field;
pub mod distance_grid;
pub mod error;
pub mod files;
pub mod host;
pub mod pipeline;
pub mod transform;

pub mod prelude {
    pub use crate::{
        compute_distance_field,
        compute_f16_distance_field,
        compute_f32_distance_field
    };

    pub use crate::binary_image::{
        GrayscaleImage, GrayscaleByteImage, BinaryMask
    };

    pub use crate::distance_grid::{ DistanceGrid, SeedOffset };

    pub use crate::distance_field::{
        SignedDistanceImage, Normalization, DistanceStorage,
        F16DistanceStorage, F32DistanceStorage
    };

    pub use crate::config::GeneratorConfig;
    pub use crate::error::{ PipelineError, AssetError };

    pub use crate::host::{
        HostImage, SourceImage, TargetImage, ProgressObserver, Control,
        IgnoreProgress, MemorySource, MemoryTarget
    };

    pub use crate::pipeline::{
        PipelineRun, GenerationRequest, RunStatus, Phase, Progress, Precondition
    };

    pub use crate::files::{ FileSource, FileTarget };
}


use prelude::*;

/// Compute the signed distance image with the specified storage of the specified grayscale image.
/// Runs every phase at once, without any host interaction.
pub fn compute_distance_field<D: DistanceStorage>(image: &impl GrayscaleImage, config: &GeneratorConfig) -> SignedDistanceImage<D> {
    let (mut inside, mut outside) = classify::classify(image, config.threshold);
    transform::transform(&mut inside);
    transform::transform(&mut outside);
    SignedDistanceImage::composite(&inside, &outside, config.normalization())
}

/// Compute the signed distance image with an `f16` storage of the specified grayscale image.
pub fn compute_f16_distance_field(image: &impl GrayscaleImage, config: &GeneratorConfig) -> SignedDistanceImage<F16DistanceStorage> {
    compute_distance_field(image, config)
}

/// Compute the signed distance image with an `f32` storage of the specified grayscale image.
pub fn compute_f32_distance_field(image: &impl GrayscaleImage, config: &GeneratorConfig) -> SignedDistanceImage<F32DistanceStorage> {
    compute_distance_field(image, config)
}
