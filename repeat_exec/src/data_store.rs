//! # Data Store
//!
//! Per-run mutable state shared across main loop cycles. Everything here is
//! owned by the single frame-processing loop; there is no concurrent access.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::loc::Pose2;
use crate::localiser::Match;
use crate::repeat_ctrl::AckermannCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Frame admission
    /// Decimation counter over arriving frames.
    pub frame_counter: u32,

    /// Number of frames fully processed so far, also the id of the next
    /// processed frame.
    pub frame_id: u64,

    // Odometry
    /// The most recent odometry pose. `None` until the first odometry
    /// event arrives, which gates image processing.
    pub current_pose: Option<Pose2>,

    /// The odometry pose at the previously processed frame.
    pub previous_pose: Option<Pose2>,

    /// The odometry pose at the first processed frame.
    pub first_frame_pose: Option<Pose2>,

    // Pipeline outputs
    /// The most recent localiser match.
    pub last_match: Option<Match>,

    /// The most recent emitted command.
    pub last_cmd: Option<AckermannCmd>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Actions at the start of processing a frame: on the very first
    /// processed frame the previous and first poses are seeded from the
    /// current one, so the first relative transforms are identities.
    pub fn start_of_frame(&mut self, current: Pose2) {
        if self.frame_id == 0 {
            self.previous_pose = Some(current);
            self.first_frame_pose = Some(current);
        }
    }

    /// Actions at the end of processing a frame: advance the frame id and
    /// remember this frame's pose and pipeline outputs.
    pub fn end_of_frame(&mut self, current: Pose2, m: Match, cmd: AckermannCmd) {
        self.frame_id += 1;
        self.previous_pose = Some(current);
        self.last_match = Some(m);
        self.last_cmd = Some(cmd);
    }
}
