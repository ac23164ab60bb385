//! The collaborators a run talks to: the image it reads, the image it writes,
//! and whoever watches its progress.
//!
//! Hosts often keep images packed or compressed and only allow pixel access
//! after switching an image into a readable mode. A run requests that switch
//! through [`HostImage::set_readable`] and checks [`HostImage::is_readable`]
//! again on its next tick, so hosts may apply the change lazily.

use image::GrayImage;

use crate::binary_image::GrayscaleImage;
use crate::error::AssetError;
use crate::pipeline::Progress;


/// An image owned by the host whose pixel access can be toggled.
pub trait HostImage {
    fn is_readable(&self) -> bool;

    /// Request pixel access to be switched on or off, persisting the setting.
    fn set_readable(&mut self, readable: bool) -> Result<(), AssetError>;
}

/// The mask a distance field is generated from.
pub trait SourceImage: HostImage {
    type Pixels: GrayscaleImage;

    /// Width and height, available even while the pixels are not readable.
    fn dimensions(&self) -> (u32, u32);

    /// The pixels, or `None` while the image is not readable.
    fn pixels(&self) -> Option<&Self::Pixels>;
}

/// Where the finished distance field is persisted.
pub trait TargetImage: HostImage {
    /// Persist an encoded PNG. Must not leave a partially written image behind on failure.
    fn store(&mut self, png: &[u8]) -> Result<(), AssetError>;
}


/// The answer of a [`ProgressObserver`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Continue,
    Cancel,
}

/// Receives the progress of a run at the start of every tick
/// and may cancel the run in response.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: &Progress) -> Control;
}

impl<F> ProgressObserver for F where F: FnMut(&Progress) -> Control {
    fn on_progress(&mut self, progress: &Progress) -> Control {
        self(progress)
    }
}

/// An observer that never cancels.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct IgnoreProgress;

impl ProgressObserver for IgnoreProgress {
    fn on_progress(&mut self, _: &Progress) -> Control {
        Control::Continue
    }
}


/// A source image held in memory. The readable flag only gates access;
/// switching it records the request so that callers can inspect it.
#[derive(Clone, Debug)]
pub struct MemorySource {
    pixels: GrayImage,
    readable: bool,
    toggles: usize,
}

impl MemorySource {
    pub fn new(pixels: GrayImage, readable: bool) -> Self {
        MemorySource { pixels, readable, toggles: 0 }
    }

    /// How many times the readable flag was changed.
    pub fn toggles(&self) -> usize {
        self.toggles
    }
}

impl HostImage for MemorySource {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn set_readable(&mut self, readable: bool) -> Result<(), AssetError> {
        if self.readable != readable {
            self.readable = readable;
            self.toggles += 1;
        }

        Ok(())
    }
}

impl SourceImage for MemorySource {
    type Pixels = GrayImage;

    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn pixels(&self) -> Option<&GrayImage> {
        if self.readable { Some(&self.pixels) } else { None }
    }
}


/// A target that keeps the last stored PNG in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryTarget {
    stored: Option<Vec<u8>>,
    readable: bool,
    toggles: usize,
}

impl MemoryTarget {
    pub fn new(readable: bool) -> Self {
        MemoryTarget { stored: None, readable, toggles: 0 }
    }

    pub fn stored(&self) -> Option<&[u8]> {
        self.stored.as_deref()
    }

    pub fn toggles(&self) -> usize {
        self.toggles
    }
}

impl HostImage for MemoryTarget {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn set_readable(&mut self, readable: bool) -> Result<(), AssetError> {
        if self.readable != readable {
            self.readable = readable;
            self.toggles += 1;
        }

        Ok(())
    }
}

impl TargetImage for MemoryTarget {
    fn store(&mut self, png: &[u8]) -> Result<(), AssetError> {
        self.stored = Some(png.to_vec());
        Ok(())
    }
}
