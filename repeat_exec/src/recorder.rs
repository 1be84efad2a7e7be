//! # Repeat dataset recorder
//!
//! When enabled, each processed live frame is written out as a new dataset
//! in the standard teach format: a `dataset.txt` of relative transforms and
//! one resized `frame_%06d.png` per frame. A repeat run recorded this way
//! can itself be processed into a new teach route.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use csv::Writer;
use image::{imageops::FilterType, DynamicImage};
use std::fs::File;
use std::path::{Path, PathBuf};

// Internal
use crate::localiser::image_source::frame_file_name;
use crate::transform::Se2;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Column headers of the dataset file, shared with the teach format.
const DATASET_HEADER: [&str; 7] = [
    "frame_id",
    "relative_odom_x(m)",
    "relative_odom_y(m)",
    "relative_odom_yaw(rad)",
    "relative_pose_x(m)",
    "relative_pose_y(m)",
    "relative_pose_yaw(rad)",
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Writes processed live frames out as a new dataset.
pub struct Recorder {
    save_dir: PathBuf,

    /// Resolution frames are resized to before saving.
    ///
    /// Units: pixels, as [width, height]
    resize_px: [u32; 2],

    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with recording the repeat dataset.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Cannot prepare the save directory: {0}")]
    DirError(std::io::Error),

    #[error("Cannot write to the dataset file: {0}")]
    DatasetError(csv::Error),

    #[error("Cannot save the frame image: {0}")]
    ImageError(image::ImageError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Recorder {
    /// Create a recorder writing into the given directory.
    ///
    /// An existing directory at the save path is deleted along with its
    /// contents, matching the teach pass behaviour of always producing a
    /// fresh dataset.
    pub fn new<P: AsRef<Path>>(save_dir: P, resize_px: [u32; 2]) -> Result<Self, RecorderError> {
        let save_dir = save_dir.as_ref().to_path_buf();

        if save_dir.exists() {
            std::fs::remove_dir_all(&save_dir).map_err(RecorderError::DirError)?;
        }
        std::fs::create_dir_all(&save_dir).map_err(RecorderError::DirError)?;

        let mut writer =
            Writer::from_path(save_dir.join("dataset.txt")).map_err(RecorderError::DatasetError)?;
        writer
            .write_record(&DATASET_HEADER)
            .map_err(RecorderError::DatasetError)?;

        Ok(Self {
            save_dir,
            resize_px,
            writer,
        })
    }

    /// Record one processed frame.
    pub fn record(
        &mut self,
        frame_id: u64,
        image: &DynamicImage,
        rel_odom: &Se2,
        rel_pose: &Se2,
    ) -> Result<(), RecorderError> {
        // Save the resized frame image
        let resized = image.resize_exact(self.resize_px[0], self.resize_px[1], FilterType::Triangle);
        resized
            .save(self.save_dir.join(frame_file_name(frame_id as usize)))
            .map_err(RecorderError::ImageError)?;

        // Append the dataset row
        self.writer
            .serialize((
                frame_id,
                rel_odom.x_m(),
                rel_odom.y_m(),
                rel_odom.yaw_rad(),
                rel_pose.x_m(),
                rel_pose.y_m(),
                rel_pose.yaw_rad(),
            ))
            .map_err(RecorderError::DatasetError)?;

        self.writer
            .flush()
            .map_err(|e| RecorderError::DatasetError(csv::Error::from(e)))?;

        Ok(())
    }
}
