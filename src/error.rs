//! Error types for the generator and its host collaborators.

use std::path::PathBuf;

use crate::distance_grid::MAX_DIMENSION;


/// Errors that stop a distance field run from starting or advancing.
///
/// Conditions the run can wait for (a missing target, an unreadable image)
/// are not errors, see [`crate::pipeline::Precondition`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No source image was given to the request.
    #[error("no source image was provided")]
    MissingSource,

    /// The source image has no pixels.
    #[error("source image is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },

    /// The source image exceeds the largest supported grid.
    #[error("source image is {width}x{height}, but at most {max} pixels per side are supported", max = MAX_DIMENSION)]
    SourceTooLarge { width: u32, height: u32 },

    /// The readable pixels of the source differ in size from what it reported when the run started.
    #[error("source image changed size from {expected:?} to {actual:?} during the run")]
    SourceSizeChanged { expected: (u32, u32), actual: (u32, u32) },

    /// The generator configuration is invalid.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// The distance image could not be encoded.
    #[error("failed to encode distance image: {0}")]
    Encode(#[from] image::ImageError),

    /// A host collaborator failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Failures of the host side: loading, toggling and storing images.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The image file does not exist.
    #[error("image not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Another run currently writes to this target.
    #[error("target {} is already in use by another run", .0.display())]
    Busy(PathBuf),

    /// Reading or writing the file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a decodable image.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An image could not be encoded for writing.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io { path: path.into(), source }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        AssetError::Decode { path: path.into(), source }
    }
}
