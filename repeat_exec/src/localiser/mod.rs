//! # Localiser module
//!
//! The localiser finds the teach frame that best matches the current camera
//! view. It does not search the whole teach sequence: the vehicle is assumed
//! to advance monotonically along the path, so only a bounded window of
//! candidates around the previously matched frame (the cursor) is scanned.
//! Each candidate is scored by normalised cross-correlation between its
//! reference image and a centred patch of the live image, and the best
//! score wins. No minimum-score rejection is applied: the temporal window
//! is treated as a sufficient prior, so even a low-confidence match is
//! returned.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod image_source;
pub mod matching;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use image::{imageops, DynamicImage, GrayImage};
use log::{debug, trace};
use serde::Serialize;

// Internal
pub use image_source::{FsImageSource, ImageSource, ImageSourceError, MemoryImageSource};
pub use params::Params;

use crate::path_store::PathStore;
use crate::transform::Se2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Localiser state.
///
/// The cursor is the only state that persists between frames. It is owned
/// here rather than living in some global so that the localiser can be
/// constructed and driven entirely from tests.
pub struct Localiser {
    params: Params,

    /// Id of the most recently matched teach frame.
    cursor: usize,

    /// Size of the centred live patch, derived from the comparison size and
    /// patch portion at init.
    ///
    /// Units: pixels, as [width, height]
    patch_size_px: [u32; 2],
}

/// The result of localising one live frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Match {
    /// Id of the best matching teach frame.
    pub teach_frame_id: usize,

    /// Column of the best patch placement (top-left corner) in
    /// comparison-image pixel coordinates.
    pub x_px: u32,

    /// Row of the best patch placement (top-left corner) in
    /// comparison-image pixel coordinates.
    pub y_px: u32,

    /// The winning normalised cross-correlation score.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during Localiser operation.
#[derive(Debug, thiserror::Error)]
pub enum LocaliserError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid patch portion {0}, expected a value in (0, 1]")]
    InvalidPatchPortion(f64),

    #[error("Invalid comparison size {0}x{1} px")]
    InvalidComparisonSize(u32, u32),

    #[error(
        "Reference frame {id} is {ref_w}x{ref_h} px, too small for the \
         {patch_w}x{patch_h} px comparison patch"
    )]
    ReferenceTooSmall {
        id: usize,
        ref_w: u32,
        ref_h: u32,
        patch_w: u32,
        patch_h: u32,
    },

    #[error(transparent)]
    ImageSourceError(#[from] ImageSourceError),

    #[error(transparent)]
    MatchError(#[from] matching::MatchError),

    #[error("The candidate window contained no frames")]
    EmptyWindow,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Localiser {
    /// Initialise the Localiser module.
    ///
    /// Expected init data is a path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, LocaliserError> {
        let params = match util::params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(LocaliserError::ParamLoadError(e)),
        };

        Self::from_params(params)
    }

    /// Build a Localiser from already-loaded parameters, validating the
    /// configured geometry.
    pub fn from_params(params: Params) -> Result<Self, LocaliserError> {
        let [comp_w, comp_h] = params.comparison_size_px;

        if comp_w < 1 || comp_h < 1 {
            return Err(LocaliserError::InvalidComparisonSize(comp_w, comp_h));
        }

        if params.patch_portion <= 0.0 || params.patch_portion > 1.0 {
            return Err(LocaliserError::InvalidPatchPortion(params.patch_portion));
        }

        // The patch covers the configured fraction of the comparison
        // resolution on both axes, and is never smaller than one pixel.
        let patch_size_px = [
            ((comp_w as f64 * params.patch_portion).round() as u32).max(1),
            ((comp_h as f64 * params.patch_portion).round() as u32).max(1),
        ];

        Ok(Self {
            params,
            cursor: 0,
            patch_size_px,
        })
    }

    /// Check that reference frame 0 is large enough for the configured
    /// patch.
    ///
    /// Undersized references are a configuration error and must be caught
    /// at startup, not in the middle of a run.
    pub fn probe_reference(&self, source: &dyn ImageSource) -> Result<(), LocaliserError> {
        let reference = source.fetch(0)?;
        let (ref_w, ref_h) = reference.dimensions();
        let [patch_w, patch_h] = self.patch_size_px;

        if ref_w < patch_w || ref_h < patch_h {
            return Err(LocaliserError::ReferenceTooSmall {
                id: 0,
                ref_w,
                ref_h,
                patch_w,
                patch_h,
            });
        }

        Ok(())
    }

    /// Id of the most recently matched teach frame.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Size of the centred live patch.
    ///
    /// Units: pixels, as [width, height]
    pub fn patch_size_px(&self) -> [u32; 2] {
        self.patch_size_px
    }

    /// The comparison resolution.
    ///
    /// Units: pixels, as [width, height]
    pub fn comparison_size_px(&self) -> [u32; 2] {
        self.params.comparison_size_px
    }

    /// Localise the live frame against the teach sequence.
    ///
    /// Scans the candidate window around the cursor in ascending id order,
    /// keeping the strictly-best correlation score so that ties fall to the
    /// lowest id. On success the cursor is moved to the winning frame.
    ///
    /// The live relative-odometry transform is accepted but not consumed by
    /// the baseline matcher; it is an input reserved for odometry-aided
    /// matching.
    pub fn localise(
        &mut self,
        live: &DynamicImage,
        rel_odom: Option<&Se2>,
        store: &PathStore,
        source: &dyn ImageSource,
    ) -> Result<Match, LocaliserError> {
        if rel_odom.is_none() {
            trace!("No relative odometry available for this frame");
        }

        // Preprocess: single channel intensity at the comparison
        // resolution, then the centred patch
        let [comp_w, comp_h] = self.params.comparison_size_px;
        let grey = live.to_luma8();
        let resized = imageops::resize(&grey, comp_w, comp_h, imageops::FilterType::Triangle);
        let patch_image = crop_centre(&resized, self.patch_size_px);
        let patch = matching::image_to_array(&patch_image);

        // Scan the candidate window in ascending id order
        let window = store.window(self.cursor, self.params.frame_search_half_width);

        let mut best: Option<Match> = None;

        for id in window {
            let reference = matching::image_to_array(&source.fetch(id)?);
            let surface = matching::match_template(&reference, &patch)?;
            let (x, y, score) = matching::max_location(&surface)?;

            trace!("Candidate frame {} scored {:.4}", id, score);

            // Replace the running best only on a strictly greater score
            let better = match best {
                Some(ref b) => score > b.score,
                None => true,
            };

            if better {
                best = Some(Match {
                    teach_frame_id: id,
                    x_px: x as u32,
                    y_px: y as u32,
                    score,
                });
            }
        }

        let winner = best.ok_or(LocaliserError::EmptyWindow)?;

        debug!(
            "Matched teach frame {} at ({}, {}) with score {:.4}",
            winner.teach_frame_id, winner.x_px, winner.y_px, winner.score
        );

        self.cursor = winner.teach_frame_id;

        Ok(winner)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Crop the centred patch of the given size out of an image.
fn crop_centre(image: &GrayImage, patch_size_px: [u32; 2]) -> GrayImage {
    let (width, height) = image.dimensions();
    let [patch_w, patch_h] = patch_size_px;

    let x0 = (width - patch_w) / 2;
    let y0 = (height - patch_h) / 2;

    imageops::crop_imm(image, x0, y0, patch_w, patch_h).to_image()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path_store::PathStore;

    const TEST_COMPARISON_SIZE: [u32; 2] = [16, 12];

    fn test_params() -> Params {
        Params {
            comparison_size_px: TEST_COMPARISON_SIZE,
            patch_portion: 0.5,
            frame_search_half_width: 1,
        }
    }

    /// A store with one teach frame per reference image.
    fn test_store(num_frames: usize) -> PathStore {
        let mut data = String::from(
            "Frame_ID, relative_odom_x(m), relative_odom_y(m), relative_odom_yaw(rad), \
             relative_pose_x(m), relative_pose_y(m), relative_pose_yaw(rad)",
        );
        for i in 0..num_frames {
            data.push_str(&format!("\n{}, 1.0, 0.0, 0.0, {}.0, 0.0, 0.0", i, i));
        }

        PathStore::from_reader(data.as_bytes()).unwrap()
    }

    /// A reference image with a noise pattern unique to the given seed.
    ///
    /// Hash-derived noise keeps cross-correlation between different seeds
    /// near zero, unlike smooth gradients which correlate strongly.
    fn patterned_image(seed: u32) -> GrayImage {
        GrayImage::from_fn(TEST_COMPARISON_SIZE[0], TEST_COMPARISON_SIZE[1], |x, y| {
            let v = (x + 1)
                .wrapping_mul(73_856_093)
                ^ (y + 1).wrapping_mul(19_349_663)
                ^ (seed + 1).wrapping_mul(83_492_791);
            image::Luma([(v >> 8) as u8])
        })
    }

    #[test]
    fn test_patch_size_from_portion() {
        let localiser = Localiser::from_params(test_params()).unwrap();

        assert_eq!(localiser.patch_size_px(), [8, 6]);
    }

    #[test]
    fn test_invalid_patch_portion_rejected() {
        let mut params = test_params();
        params.patch_portion = 0.0;
        assert!(matches!(
            Localiser::from_params(params),
            Err(LocaliserError::InvalidPatchPortion(_))
        ));

        let mut params = test_params();
        params.patch_portion = 1.5;
        assert!(matches!(
            Localiser::from_params(params),
            Err(LocaliserError::InvalidPatchPortion(_))
        ));
    }

    #[test]
    fn test_probe_rejects_undersized_reference() {
        let localiser = Localiser::from_params(test_params()).unwrap();

        let mut source = MemoryImageSource::new();
        source.insert(0, GrayImage::from_pixel(4, 3, image::Luma([0u8])));

        assert!(matches!(
            localiser.probe_reference(&source),
            Err(LocaliserError::ReferenceTooSmall { .. })
        ));
    }

    #[test]
    fn test_best_match_selected_and_cursor_updated() {
        let mut localiser = Localiser::from_params(test_params()).unwrap();
        let store = test_store(3);

        let mut source = MemoryImageSource::new();
        for id in 0..3 {
            source.insert(id, patterned_image(id as u32));
        }

        // The live view is exactly reference frame 1
        let live = DynamicImage::ImageLuma8(patterned_image(1));

        let m = localiser
            .localise(&live, None, &store, &source)
            .unwrap();

        assert_eq!(m.teach_frame_id, 1);
        assert_eq!(localiser.cursor(), 1);
        assert!(m.score > 0.99, "score was {}", m.score);

        // With the cursor advanced the same frame still wins from the
        // wider window {0, 1, 2}
        let m = localiser
            .localise(&live, None, &store, &source)
            .unwrap();

        assert_eq!(m.teach_frame_id, 1);
    }

    #[test]
    fn test_equal_scores_prefer_lower_id() {
        let mut localiser = Localiser::from_params(test_params()).unwrap();
        let store = test_store(2);

        // Identical reference images produce exactly equal scores
        let mut source = MemoryImageSource::new();
        source.insert(0, patterned_image(7));
        source.insert(1, patterned_image(7));

        let live = DynamicImage::ImageLuma8(patterned_image(7));

        let m = localiser
            .localise(&live, None, &store, &source)
            .unwrap();

        assert_eq!(m.teach_frame_id, 0);
        assert_eq!(localiser.cursor(), 0);
    }

    #[test]
    fn test_window_of_one_still_matches() {
        let mut params = test_params();
        params.frame_search_half_width = 0;
        let mut localiser = Localiser::from_params(params).unwrap();
        let store = test_store(1);

        let mut source = MemoryImageSource::new();
        source.insert(0, patterned_image(3));

        // A live view that looks nothing like the reference still matches,
        // there is no minimum-score rejection
        let live = DynamicImage::ImageLuma8(patterned_image(11));

        let m = localiser
            .localise(&live, None, &store, &source)
            .unwrap();

        assert_eq!(m.teach_frame_id, 0);
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        let mut localiser = Localiser::from_params(test_params()).unwrap();
        let store = test_store(2);

        let mut source = MemoryImageSource::new();
        source.insert(0, patterned_image(0));
        // Frame 1 deliberately missing

        let live = DynamicImage::ImageLuma8(patterned_image(0));

        assert!(matches!(
            localiser.localise(&live, None, &store, &source),
            Err(LocaliserError::ImageSourceError(
                ImageSourceError::UnknownFrame(1)
            ))
        ));
    }
}
