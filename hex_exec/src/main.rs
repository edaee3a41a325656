//! Main hexapod executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing (script, special command register)
//!         - Supply voltage check
//!         - Motion processing:
//!             - Limbs driver, once per PWM synchronisation tick
//!             - Movement engine
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `limbs_driver`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use hex_lib::{
    data_store::DataStore,
    fault::{Fault, ModuleId},
    limbs_driver, movement_engine,
    params::HexExecParams,
    scr_processor,
    servo_driver::SimServoDriver,
    sync::SyncTicker,
    tc_processor,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
#[cfg(feature = "archive")]
use util::archive::Archived;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "hex_exec", about = "Hexapod motion control executable")]
struct Opt {
    /// Script of telecommands to execute, standing in for the command layer.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Stop after this number of seconds when no script is given.
    #[structopt(long)]
    duration_s: Option<f64>,

    /// Log level of the console and session log.
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("hex_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Hexapod Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: HexExecParams =
        util::params::load("hex_exec.toml").wrap_err("Could not load exec params")?;

    let pwm_period_s = exec_params
        .pwm_period_s
        .ok_or_else(|| eyre!("pwm_period_s is not set"))?;
    let cycle_period_s = exec_params
        .cycle_period_s
        .ok_or_else(|| eyre!("cycle_period_s is not set"))?;
    if !(pwm_period_s > 0.0 && cycle_period_s > 0.0) {
        return Err(eyre!("Cycle and PWM periods must be positive"));
    }
    if cycle_period_s >= pwm_period_s {
        warn!(
            "The cycle period ({} s) is not shorter than the PWM period ({} s), ticks will be missed",
            cycle_period_s, pwm_period_s
        );
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let mut script = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        }
        None => {
            info!("No script provided, only the special command register will be processed\n");
            None
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    // Parameter and configuration problems fault the module instead of stopping the executable,
    // the error status register then shows what went wrong.
    match util::params::load::<limbs_driver::Params>("limbs_driver.toml") {
        Ok(p) => {
            if ds.init_limbs_driver(p).is_ok() {
                info!("LimbsDriver init complete");
            }
        }
        Err(e) => {
            error!("Could not load LimbsDriver params: {}", e);
            ds.record_fault(ModuleId::LimbsDriver, Fault::Config);
        }
    }

    match util::params::load::<movement_engine::Params>("movement_engine.toml") {
        Ok(params) => {
            let init_data = movement_engine::InitData {
                params,
                library: movement_engine::build_library(),
            };
            if ds.init_movement_engine(init_data).is_ok() {
                info!("MovementEngine init complete");
            }
        }
        Err(e) => {
            error!("Could not load MovementEngine params: {}", e);
            ds.record_fault(ModuleId::MovementEngine, Fault::Config);
        }
    }

    let archive = exec_params.archive.unwrap_or(false);

    #[cfg(feature = "archive")]
    if archive {
        ds.limbs_driver
            .init_archive(&session)
            .wrap_err("Failed to open the LimbsDriver archive")?;
        ds.movement_engine
            .init_archive(&session)
            .wrap_err("Failed to open the MovementEngine archive")?;
        info!("Archives opened in {:?}", session.arch_root);
    }

    info!("Module initialisation complete\n");

    // ---- INITIALISE ACTUATION ----

    let mut servos = SimServoDriver::new();
    let mut ticker = SyncTicker::spawn(Duration::from_secs_f64(pwm_period_s));
    let cycle_period = Duration::from_secs_f64(cycle_period_s);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut emergency_reported = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match script {
            Some(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
            None => {
                if let Some(d) = opt.duration_s {
                    if session::get_elapsed_seconds() > d {
                        info!("Run duration reached, stopping");
                        break;
                    }
                }
            }
        }

        scr_processor::process(&mut ds);

        if ds.reset_requested {
            info!("Reset command received, stopping");
            break;
        }

        ds.check_voltage();

        if ds.error_status.is_emergency() && !emergency_reported {
            error!(
                "Emergency flag raised, error status {:#06x}",
                ds.error_status.bits()
            );
            emergency_reported = true;
        }

        // ---- MOTION PROCESSING ----

        ds.proc_motion(ticker.counter(), &mut servos);

        // ---- ARCHIVING ----

        #[cfg(feature = "archive")]
        if archive {
            if ds.is_tick_cycle {
                if let Err(e) = ds.limbs_driver.write() {
                    warn!("Could not archive LimbsDriver data: {}", e);
                }
            }
            if let Err(e) = ds.movement_engine.write() {
                warn!("Could not archive MovementEngine data: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        ds.num_cycles += 1;

        // Get the cycle duration and sleep for the remainder of the period
        match cycle_period.checked_sub(cycle_start_instant.elapsed()) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_start_instant.elapsed().as_secs_f64() - cycle_period_s
            ),
        }
    }

    ticker.stop();

    info!(
        "End of execution after {} cycles and {} ticks",
        ds.num_cycles, ds.num_ticks
    );

    Ok(())
}
