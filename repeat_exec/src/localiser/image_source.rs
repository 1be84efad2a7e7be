//! # Reference image sources
//!
//! The localiser fetches reference frames through the [`ImageSource`]
//! capability rather than reading files directly. Production uses
//! [`FsImageSource`] over the teach dataset directory; tests and benchmarks
//! use [`MemoryImageSource`]. A caching or prefetching source can be slotted
//! in here without touching the matching logic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::GrayImage;
use std::collections::HashMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with fetching reference images.
#[derive(Debug, thiserror::Error)]
pub enum ImageSourceError {
    #[error("Cannot load reference frame {0}: {1}")]
    LoadError(usize, image::ImageError),

    #[error("No reference frame with id {0}")]
    UnknownFrame(usize),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of comparison-resolution reference images, addressed by teach
/// frame id.
pub trait ImageSource {
    /// Fetch the reference image for the given teach frame.
    fn fetch(&self, frame_id: usize) -> Result<GrayImage, ImageSourceError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An image source reading reference frames from the teach dataset
/// directory.
pub struct FsImageSource {
    root: PathBuf,
}

/// An in-memory image source, used by unit tests and benchmarks.
#[derive(Default)]
pub struct MemoryImageSource {
    frames: HashMap<usize, GrayImage>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The on-disk file name of the frame with the given id.
pub fn frame_file_name(frame_id: usize) -> String {
    format!("frame_{:06}.png", frame_id)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FsImageSource {
    /// Create a source over the given directory of `frame_%06d.png` files.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for FsImageSource {
    fn fetch(&self, frame_id: usize) -> Result<GrayImage, ImageSourceError> {
        let path = self.root.join(frame_file_name(frame_id));

        image::open(path)
            .map(|img| img.to_luma8())
            .map_err(|e| ImageSourceError::LoadError(frame_id, e))
    }
}

impl MemoryImageSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reference image under the given frame id.
    pub fn insert(&mut self, frame_id: usize, image: GrayImage) {
        self.frames.insert(frame_id, image);
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, frame_id: usize) -> Result<GrayImage, ImageSourceError> {
        self.frames
            .get(&frame_id)
            .cloned()
            .ok_or(ImageSourceError::UnknownFrame(frame_id))
    }
}
