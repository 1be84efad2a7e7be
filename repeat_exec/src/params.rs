//! # Repeat Executable Parameters
//!
//! This module provides the top level parameters for the repeat executable.
//! Module-specific parameters live with their modules.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatExecParams {
    /// Process every nth arriving frame, dropping the rest. A value of 1
    /// processes everything. Values below 1 are clamped to 1.
    pub process_every_nth_frame: u32,

    /// Path to the teach dataset file. Reference images are expected in
    /// the same directory.
    pub teach_dataset: PathBuf,

    /// Directory of the replay run providing the live input.
    pub replay_dataset_dir: PathBuf,

    /// If true every processed frame is recorded as a new dataset.
    pub save_repeat_data: bool,

    /// Directory the recorded dataset is written into. Recreated on every
    /// run when saving is enabled.
    pub save_dir: PathBuf,

    /// Resolution recorded frames are resized to, as [width, height].
    ///
    /// Units: pixels
    pub save_image_resize_px: [u32; 2],
}
