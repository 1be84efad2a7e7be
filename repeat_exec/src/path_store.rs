//! # Path store
//!
//! The path store holds the teach sequence: the ordered set of reference
//! frames recorded during the teach pass. Each entry carries the relative
//! odometry from the previous frame and the relative pose from the first
//! frame of the route. The store is loaded once at startup and never
//! mutated afterwards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

// Internal
use crate::transform::Se2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single reference sample recorded during the teach pass.
#[derive(Debug, Clone, Copy)]
pub struct TeachFrame {
    /// The id of this frame within the teach sequence.
    ///
    /// Ids are contiguous from 0 and always derived from row order, never
    /// from the dataset file itself.
    pub id: usize,

    /// Transform from the previous teach frame to this one.
    pub relative_odom: Se2,

    /// Transform from the first teach frame to this one. Retained for
    /// bookkeeping and export, not consumed by the control path.
    pub relative_pose: Se2,
}

/// The ordered, immutable teach sequence.
pub struct PathStore {
    frames: Vec<TeachFrame>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with loading or querying the path store.
#[derive(Debug, thiserror::Error)]
pub enum PathStoreError {
    #[error("Cannot open the teach dataset: {0}")]
    OpenError(std::io::Error),

    #[error("Teach dataset row {0} is malformed: {1}")]
    RowError(usize, csv::Error),

    #[error("The teach dataset contains no frames")]
    Empty,

    #[error("Frame id {id} is outside the teach sequence (length {len})")]
    IdOutOfRange { id: usize, len: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

/// One dataset row: frame id, relative odom (x, y, yaw), relative pose
/// (x, y, yaw). The frame id field is parsed but ignored.
type DatasetRow = (f64, f64, f64, f64, f64, f64, f64);

impl PathStore {
    /// Load the teach sequence from a dataset file.
    ///
    /// The file is a header line followed by one 7 column row per frame,
    /// see [`DatasetRow`]. A missing, empty or malformed file is an error:
    /// the repeat pass cannot run without a valid teach sequence.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PathStoreError> {
        let file = File::open(path).map_err(PathStoreError::OpenError)?;
        Self::from_reader(file)
    }

    /// Load the teach sequence from any reader, see [`PathStore::load`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PathStoreError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut frames = Vec::new();

        for (row, record) in csv_reader.deserialize::<DatasetRow>().enumerate() {
            let (_, odom_x, odom_y, odom_yaw, pose_x, pose_y, pose_yaw) =
                record.map_err(|e| PathStoreError::RowError(row, e))?;

            // The id is the positional index of the row, the id column of
            // the file is not trusted.
            frames.push(TeachFrame {
                id: row,
                relative_odom: Se2::new(odom_x, odom_y, odom_yaw),
                relative_pose: Se2::new(pose_x, pose_y, pose_yaw),
            });
        }

        if frames.is_empty() {
            return Err(PathStoreError::Empty);
        }

        Ok(Self { frames })
    }

    /// The number of frames in the teach sequence.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the store holds no frames. Cannot occur after a successful
    /// load.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get the teach frame with the given id.
    ///
    /// Callers are expected to bound-check ids against [`PathStore::len`].
    pub fn get(&self, id: usize) -> Result<&TeachFrame, PathStoreError> {
        self.frames.get(id).ok_or(PathStoreError::IdOutOfRange {
            id,
            len: self.frames.len(),
        })
    }

    /// Get the id range centred on `center` with the given half width,
    /// clamped to the valid id range of the sequence.
    pub fn window(&self, center: usize, half_width: usize) -> std::ops::Range<usize> {
        let start = center.saturating_sub(half_width);
        let end = (center + half_width + 1).min(self.frames.len());

        start..end
    }
}
