//! # Repeat control module
//!
//! The repeat controller turns the localiser's matched frame and the
//! estimated path offset into a drive command. The steering target is not
//! the matched frame itself but a frame a configurable number of steps
//! further along the teach path (the look-ahead), whose pose relative to
//! the vehicle is produced by the transform composer. The pose error is
//! regulated with a nonlinear law over the polar error coordinates: the
//! distance `rho`, the bearing `alpha` and the terminal heading error
//! `beta`, realised for an Ackermann platform by mapping the commanded
//! angular rate through the bicycle model into a steering angle.
//!
//! When the look-ahead transform is unavailable the path is exhausted: the
//! controller latches into the path-complete mode and demands a stop on
//! every subsequent cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during RepeatCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum RepeatCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),
}
