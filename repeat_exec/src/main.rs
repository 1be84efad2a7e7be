//! Main repeat executable entry point.
//!
//! # Architecture
//!
//! The executable replays a recorded live run against a teach dataset and
//! produces one drive command per processed frame:
//!
//!     - Initialise the session, logging and all modules
//!     - Main loop, one iteration per input event:
//!         - Odometry events update the current pose
//!         - Image events run the frame pipeline:
//!             - Frame admission (odometry gate, decimation)
//!             - Live relative transform derivation
//!             - Image decode
//!             - Localiser -> OffsetEst -> RepeatCtrl
//!             - Command and telemetry archiving
//!
//! Frame processing is strictly serialised: one frame is fully processed
//! before the next event is taken, so the localisation cursor and the
//! previous-pose state are only ever touched from this loop.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use repeat_lib::{
    data_store::DataStore,
    localiser::{FsImageSource, Localiser},
    offset_est::OffsetEst,
    params::RepeatExecParams,
    path_store::PathStore,
    recorder::Recorder,
    repeat_ctrl::RepeatCtrl,
    replay_client::{ReplayClient, ReplayEvent},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::Path;

// Internal
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("repeat_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution
    info!("Repeat Pass Executable\n");
    info!("Running on: {}", host::get_platform_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut exec_params: RepeatExecParams =
        util::params::load("repeat_exec.toml").wrap_err("Could not load exec params")?;

    if exec_params.process_every_nth_frame < 1 {
        warn!("process_every_nth_frame below 1, clamping to 1");
        exec_params.process_every_nth_frame = 1;
    }

    // Keep a record of the resolved parameters with the session
    session.save_json("repeat_exec_params.json", &exec_params);

    info!("Exec parameters loaded");

    // ---- LOAD TEACH DATASET ----

    let path_store =
        PathStore::load(&exec_params.teach_dataset).wrap_err("Could not load the teach dataset")?;

    info!("Teach dataset size: {}", path_store.len());

    // Reference images live alongside the dataset file
    let image_dir = exec_params
        .teach_dataset
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let image_source = FsImageSource::new(image_dir);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut localiser =
        Localiser::init("localiser.toml").wrap_err("Failed to initialise the Localiser")?;
    localiser
        .probe_reference(&image_source)
        .wrap_err("Reference image check failed")?;
    info!("Localiser init complete");

    let offset_est =
        OffsetEst::init("offset_est.toml").wrap_err("Failed to initialise the OffsetEst")?;
    info!("OffsetEst init complete");

    let mut repeat_ctrl =
        RepeatCtrl::init("repeat_ctrl.toml").wrap_err("Failed to initialise RepeatCtrl")?;
    info!("RepeatCtrl init complete");

    let mut recorder = match exec_params.save_repeat_data {
        true => {
            let r = Recorder::new(&exec_params.save_dir, exec_params.save_image_resize_px)
                .wrap_err("Failed to initialise the Recorder")?;
            info!("Recorder init complete, saving into {:?}", exec_params.save_dir);
            Some(r)
        }
        false => None,
    };

    info!("Module initialisation complete\n");

    // ---- INITIALISE INPUT AND ARCHIVES ----

    let mut replay_client = ReplayClient::new(&exec_params.replay_dataset_dir)
        .wrap_err("Failed to open the replay run")?;

    info!(
        "Replaying {} input events from {:?}",
        replay_client.remaining(),
        exec_params.replay_dataset_dir
    );

    let mut cmd_archive = Archiver::from_path(&session, "ackermann_cmd.csv")
        .wrap_err("Failed to create the command archive")?;
    let mut match_archive = Archiver::from_path(&session, "localiser_match.csv")
        .wrap_err("Failed to create the match archive")?;
    let mut report_archive = Archiver::from_path(&session, "repeat_ctrl_report.csv")
        .wrap_err("Failed to create the report archive")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut ds = DataStore::default();

    while let Some(event) = replay_client.next_event() {
        let image_path = match event {
            // Odometry events just update the current pose
            ReplayEvent::Odom(pose) => {
                ds.current_pose = Some(pose);
                continue;
            }
            ReplayEvent::Image(path) => path,
        };

        // ---- FRAME ADMISSION ----

        // Images arriving before the first odometry update are dropped
        let current = match ds.current_pose {
            Some(p) => p,
            None => {
                warn!(
                    "Waiting until odometry data is received, dropping image {:?}",
                    image_path
                );
                continue;
            }
        };

        // Only process every nth frame
        ds.frame_counter = (ds.frame_counter + 1) % exec_params.process_every_nth_frame;
        if ds.frame_counter != 0 {
            continue;
        }

        ds.start_of_frame(current);

        // ---- LIVE FRAME CONTEXT ----

        // Relative transforms from the previous and the first processed
        // frames. The relative odometry is not consumed by matching yet,
        // only checked for availability.
        let rel_odom = ds.previous_pose.map(|prev| current.relative_to(&prev));
        let rel_pose = ds.first_frame_pose.map(|first| current.relative_to(&first));

        if rel_odom.is_none() {
            info!("Relative odometry transform unavailable, matching continues without it");
        }

        let image = match image::open(&image_path) {
            Ok(i) => i,
            Err(e) => {
                warn!("Unable to decode image {:?}: {}", image_path, e);
                continue;
            }
        };

        // Save the repeat dataset if required
        if let Some(ref mut rec) = recorder {
            if let (Some(ro), Some(rp)) = (rel_odom.as_ref(), rel_pose.as_ref()) {
                if let Err(e) = rec.record(ds.frame_id, &image, ro, rp) {
                    warn!("Unable to save repeat frame {}: {}", ds.frame_id, e);
                }
            }
        }

        // ---- PIPELINE PROCESSING ----

        let m = match localiser.localise(&image, rel_odom.as_ref(), &path_store, &image_source) {
            Ok(m) => m,
            Err(e) => {
                warn!("Localisation failed for frame {}: {}", ds.frame_id, e);
                continue;
            }
        };

        let offsets = offset_est.estimate(
            [m.x_px, m.y_px],
            localiser.patch_size_px(),
            localiser.comparison_size_px()[0],
        );

        let (cmd, report) = repeat_ctrl.proc(m.teach_frame_id, &offsets, &path_store);

        debug!(
            "Frame {} matched teach frame {}, demanding {:.3} m/s at {:.3} rad",
            ds.frame_id, m.teach_frame_id, cmd.speed_ms, cmd.steering_angle_rad
        );

        // ---- ARCHIVES ----

        if let Err(e) = cmd_archive.serialise(cmd) {
            warn!("Could not archive the command: {}", e);
        }
        if let Err(e) = match_archive.serialise(m) {
            warn!("Could not archive the match: {}", e);
        }
        if let Err(e) = report_archive.serialise(report) {
            warn!("Could not archive the controller report: {}", e);
        }

        // ---- FRAME MANAGEMENT ----

        ds.end_of_frame(current, m, cmd);
    }

    // ---- SHUTDOWN ----

    info!("End of replay input");
    info!("Processed {} frames", ds.frame_id);

    if let Some(m) = ds.last_match {
        info!("Final matched teach frame: {}", m.teach_frame_id);
    }
    if let Some(cmd) = ds.last_cmd {
        info!(
            "Final command: {:.3} m/s at {:.3} rad",
            cmd.speed_ms, cmd.steering_angle_rad
        );
    }

    info!("End of execution");

    Ok(())
}
