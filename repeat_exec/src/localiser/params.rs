//! Parameters structure for the Localiser

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the Localiser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// The resolution at which live and reference images are compared,
    /// as [width, height].
    ///
    /// Units: pixels
    pub comparison_size_px: [u32; 2],

    /// The fraction of the comparison resolution covered by the centred
    /// live patch, applied to both axes. Must lie in (0, 1].
    pub patch_portion: f64,

    /// Half width of the candidate search window around the cursor. A
    /// value of `n` scans up to `2n + 1` candidate frames per live frame.
    pub frame_search_half_width: usize,
}
