//! Source and target images backed by files.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};

use crate::config::GeneratorConfig;
use crate::distance_field::DistanceStorage;
use crate::error::{AssetError, PipelineError};
use crate::host::{HostImage, SourceImage, TargetImage};
use crate::pipeline::{GenerationRequest, PipelineRun};


/// The conventional output path for a source: `<name>_distance.png` next to it.
pub fn default_target_path(source: &Path) -> PathBuf {
    let stem = source.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
    source.with_file_name(format!("{}_distance.png", stem))
}

/// Write a white image to be used as the target of a later run.
pub fn create_blank_target(path: &Path, width: u32, height: u32) -> Result<(), AssetError> {
    let blank = RgbaImage::from_pixel(width, height, Rgba([u8::MAX; 4]));

    let mut png = Cursor::new(Vec::new());
    blank.write_to(&mut png, ImageFormat::Png)
        .map_err(|source| AssetError::Encode { path: path.to_path_buf(), source })?;

    fs::write(path, png.into_inner()).map_err(|error| AssetError::io(path, error))?;
    debug!("created blank target {}", path.display());
    Ok(())
}

/// Start a run from a source file into a target file.
///
/// The source is validated before anything is written,
/// and only then a missing target is created as a blank image.
pub fn start_file_run<D: DistanceStorage>(
    source: impl Into<PathBuf>, target: impl Into<PathBuf>,
    config: GeneratorConfig
) -> Result<PipelineRun<FileSource, FileTarget, D>, PipelineError>
{
    let source = FileSource::open(source)?;
    let (width, height) = source.dimensions();

    let request = GenerationRequest { source: Some(source), target: None, config };
    let mut run = PipelineRun::start(request)?;

    let target = target.into();
    if !target.exists() {
        warn!("target {} does not exist, creating a blank one", target.display());
        create_blank_target(&target, width, height)?;
    }

    // a run started without a target always accepts one
    let _ = run.provide_target(FileTarget::open(target)?);

    Ok(run)
}


/// A mask image file. Readable means decoded: pixels are loaded
/// when readable access is requested and dropped again when it is revoked.
///
/// Color is kept, so that colored masks are thresholded
/// by their NTSC luma, see the [`GrayscaleImage`](crate::binary_image::GrayscaleImage) impl of `RgbaImage`.
pub struct FileSource {
    path: PathBuf,
    dimensions: (u32, u32),
    pixels: Option<RgbaImage>,
}

impl FileSource {
    /// Open an image file, reading only its header.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let path = path.into();
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }

        let dimensions = image::image_dimensions(&path)
            .map_err(|error| AssetError::decode(&path, error))?;

        Ok(FileSource { path, dimensions, pixels: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostImage for FileSource {
    fn is_readable(&self) -> bool {
        self.pixels.is_some()
    }

    fn set_readable(&mut self, readable: bool) -> Result<(), AssetError> {
        if !readable {
            self.pixels = None;
        }
        else if self.pixels.is_none() {
            let image = image::open(&self.path).map_err(|error| AssetError::decode(&self.path, error))?;
            debug!("decoded {}", self.path.display());
            self.pixels = Some(image.to_rgba8());
        }

        Ok(())
    }
}

impl SourceImage for FileSource {
    type Pixels = RgbaImage;

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }
}


/// An existing image file that receives the distance field.
///
/// Holds an exclusive lock on `<path>.lock` while open, so that only one target
/// at a time writes to a path, even across processes. The operating system
/// releases the lock when the process exits, however it exits.
pub struct FileTarget {
    path: PathBuf,
    readable: bool,
    _lock: TargetLock,
}

impl FileTarget {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let path = path.into();
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }

        let lock = TargetLock::acquire(&path)?;
        Ok(FileTarget { path, readable: true, _lock: lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostImage for FileTarget {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn set_readable(&mut self, readable: bool) -> Result<(), AssetError> {
        self.readable = readable;
        Ok(())
    }
}

impl TargetImage for FileTarget {
    /// Writes next to the target first and renames afterwards,
    /// so the target is either fully replaced or untouched.
    fn store(&mut self, png: &[u8]) -> Result<(), AssetError> {
        let partial = sibling(&self.path, ".partial");

        if let Err(error) = fs::write(&partial, png) {
            let _ = fs::remove_file(&partial);
            return Err(AssetError::io(&partial, error));
        }

        fs::rename(&partial, &self.path).map_err(|error| AssetError::io(&self.path, error))
    }
}


/// An advisory lock on the lock file next to a target.
/// The lock file itself stays on disk, only the lock on it is released.
struct TargetLock {
    file: File,
}

impl TargetLock {
    fn acquire(target: &Path) -> Result<Self, AssetError> {
        let path = sibling(target, ".lock");

        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)
            .map_err(|error| AssetError::io(&path, error))?;

        match file.try_lock() {
            Ok(()) => Ok(TargetLock { file }),
            Err(TryLockError::WouldBlock) => Err(AssetError::Busy(target.to_path_buf())),
            Err(TryLockError::Error(error)) => Err(AssetError::io(path, error)),
        }
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            warn!("failed to unlock target: {}", error);
        }
    }
}

/// The path with a suffix appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
