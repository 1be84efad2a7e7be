//! # Replay client
//!
//! The executable's input boundary. A replay run is a recorded live
//! traversal stored on disk: a `dataset.txt` holding one absolute odometry
//! pose per camera frame, alongside the frames themselves as
//! `frame_%06d.png`. The client walks the recording and yields an
//! interleaved stream of odometry and image events, so the main loop sees
//! the same asynchronous boundary it would against live transport: poses
//! and images arrive as separate events, and images are decoded (and can
//! fail to decode) downstream of this client.
//!
//! The replay dataset format is a header line followed by rows of
//! `frame_id, pose_x(m), pose_y(m), pose_yaw(rad)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use csv::{ReaderBuilder, Trim};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

// Internal
use crate::loc::Pose2;
use crate::localiser::image_source::frame_file_name;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A client replaying a recorded live run.
pub struct ReplayClient {
    events: VecDeque<ReplayEvent>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One input event from the replayed run.
#[derive(Debug, Clone)]
pub enum ReplayEvent {
    /// An absolute odometry pose update.
    Odom(Pose2),

    /// An undecoded camera frame.
    Image(PathBuf),
}

/// Errors associated with opening a replay run.
#[derive(Debug, thiserror::Error)]
pub enum ReplayClientError {
    #[error("Cannot open the replay dataset: {0}")]
    OpenError(std::io::Error),

    #[error("Replay dataset row {0} is malformed: {1}")]
    RowError(usize, csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

/// One replay row: frame id, absolute pose (x, y, yaw). The frame id field
/// is parsed but ignored, image files are addressed by row order.
type ReplayRow = (f64, f64, f64, f64);

impl ReplayClient {
    /// Open the replay run in the given directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, ReplayClientError> {
        let dir = dir.as_ref();
        let file = File::open(dir.join("dataset.txt")).map_err(ReplayClientError::OpenError)?;

        Self::from_reader(file, dir)
    }

    /// Build a client from any reader of replay rows, with images addressed
    /// relative to `image_dir`.
    pub fn from_reader<R: Read>(
        reader: R,
        image_dir: &Path,
    ) -> Result<Self, ReplayClientError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut events = VecDeque::new();

        for (row, record) in csv_reader.deserialize::<ReplayRow>().enumerate() {
            let (_, x_m, y_m, yaw_rad) =
                record.map_err(|e| ReplayClientError::RowError(row, e))?;

            // The pose precedes its frame, mirroring an odometry topic that
            // publishes ahead of the camera
            events.push_back(ReplayEvent::Odom(Pose2::new(x_m, y_m, yaw_rad)));
            events.push_back(ReplayEvent::Image(image_dir.join(frame_file_name(row))));
        }

        Ok(Self { events })
    }

    /// The number of events remaining.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    /// Take the next input event, or `None` once the recording is
    /// exhausted.
    pub fn next_event(&mut self) -> Option<ReplayEvent> {
        self.events.pop_front()
    }
}
