//! # Data Store
//!
//! Holds the state of every module of the motion core and runs one cycle of
//! it at a time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::gait::SequenceId;
use log::{error, info, warn};

use crate::{
    fault::{ErrorStatus, Fault, ModuleId, ModuleStatus},
    limbs_driver::{self, LimbsDriverError},
    movement_engine::{self, MoveCommand, MovementEngineError, Orientation, Posture},
    servo_driver::{self, ServoDriver},
    sync::{SyncEvent, SyncMonitor},
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Number of synchronisation ticks processed
    pub num_ticks: u64,

    /// True if a synchronisation tick was processed during this cycle
    pub is_tick_cycle: bool,

    /// Set by the reset command, ends the main loop
    pub reset_requested: bool,

    // Faults
    pub error_status: ErrorStatus,
    pub servo_driver_status: ModuleStatus,
    pub limbs_driver_status: ModuleStatus,
    pub movement_engine_status: ModuleStatus,

    /// Number of faults recorded since startup
    pub num_faults: u32,

    // Synchronisation
    pub sync_monitor: SyncMonitor,

    // LimbsDriver
    pub limbs_driver: limbs_driver::LimbsDriver,
    pub limbs_driver_input: limbs_driver::InputData,
    pub limbs_driver_output: limbs_driver::OutputData,
    pub limbs_driver_status_rpt: limbs_driver::StatusReport,

    // MovementEngine
    pub movement_engine: movement_engine::MovementEngine,
    pub movement_engine_status_rpt: movement_engine::StatusReport,

    // Orientation sensors
    pub orientation: Orientation,

    // Special command register
    /// Command code, 0 when there is no command pending
    pub scr: u8,

    pub scr_argument: i32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Initialise the limbs driver, a failure faults it.
    pub fn init_limbs_driver(
        &mut self,
        params: limbs_driver::Params,
    ) -> Result<(), LimbsDriverError> {
        let result = self.limbs_driver.init(params);

        match result {
            Ok(()) => self.limbs_driver_output = *self.limbs_driver.output(),
            Err(ref e) => {
                error!("Could not initialise LimbsDriver: {}", e);
                self.record_fault(ModuleId::LimbsDriver, e.fault());
            }
        }

        result
    }

    /// Initialise the movement engine, a failure faults it.
    pub fn init_movement_engine(
        &mut self,
        init_data: movement_engine::InitData,
    ) -> Result<(), MovementEngineError> {
        let result = self.movement_engine.init(init_data);

        if let Err(ref e) = result {
            error!("Could not initialise MovementEngine: {}", e);
            self.record_fault(ModuleId::MovementEngine, e.fault());
        }

        result
    }

    /// Record a fault raised by a module, which stops processing it.
    ///
    /// Only the first fault of a module is recorded.
    pub fn record_fault(&mut self, module: ModuleId, fault: Fault) {
        let status = match module {
            ModuleId::ServoDriver => &mut self.servo_driver_status,
            ModuleId::LimbsDriver => &mut self.limbs_driver_status,
            ModuleId::MovementEngine => &mut self.movement_engine_status,
        };

        if !status.is_running() {
            return;
        }

        *status = ModuleStatus::Faulted(fault);
        self.error_status.record(module, fault);
        self.num_faults += 1;

        error!("{:?} faulted: {:?}", module, fault);
        if fault.is_emergency() {
            error!("Emergency stop, motion halted");
        }
    }

    /// Request a sequence from the movement engine.
    ///
    /// Returns `true` if the request was accepted.
    pub fn request_sequence(&mut self, id: SequenceId) -> bool {
        if !self.movement_engine_status.is_running() {
            warn!("Sequence {:?} requested while the MovementEngine is stopped", id);
            return false;
        }

        self.movement_engine.set_orientation(self.orientation);
        self.movement_engine.request_sequence(id)
    }

    /// Lower the hexapod while the supply voltage is in error.
    pub fn check_voltage(&mut self) {
        if self.error_status.is_voltage_error()
            && self.movement_engine.posture() == Posture::Up
            && self.movement_engine.next_sequence() != SequenceId::Down
        {
            info!("Lowering because of the supply voltage error");
            self.request_sequence(SequenceId::Down);
        }
    }

    /// Run one cycle of the motion core.
    ///
    /// The limbs driver steps once per new value of `sync_counter` and
    /// publishes to `servos`. The movement engine steps every cycle, handing
    /// its moves to the limbs driver. Nothing is processed, and the servos
    /// stop updating, once the emergency flag is raised.
    pub fn proc_motion<D: ServoDriver + ?Sized>(&mut self, sync_counter: u32, servos: &mut D) {
        self.is_tick_cycle = false;

        if self.error_status.is_emergency() {
            if let Err(e) = servos.set_update_enabled(false) {
                warn!("Could not stop the servo updates: {}", e);
            }
            return;
        }

        match self.sync_monitor.poll(sync_counter) {
            SyncEvent::NoChange => (),
            SyncEvent::Tick => self.tick_limbs(servos),
            SyncEvent::Missed { delta } => {
                let e = LimbsDriverError::MissedTicks(delta - 1);
                error!("LimbsDriver error: {}", e);
                self.record_fault(ModuleId::LimbsDriver, e.fault());
            }
        }

        self.step_engine();
    }

    fn tick_limbs<D: ServoDriver + ?Sized>(&mut self, servos: &mut D) {
        if !self.limbs_driver_status.is_running() {
            return;
        }

        match self.limbs_driver.proc(&self.limbs_driver_input) {
            Ok((output, report)) => {
                self.limbs_driver_output = output;
                self.limbs_driver_status_rpt = report;
                self.num_ticks += 1;
                self.is_tick_cycle = true;

                if self.servo_driver_status.is_running() {
                    if let Err(e) = servo_driver::publish(servos, &output.angles_deg) {
                        error!("ServoDriver error: {}", e);
                        self.record_fault(ModuleId::ServoDriver, e.fault());
                    }
                }
            }
            Err(e) => {
                error!("LimbsDriver error: {}", e);
                self.record_fault(ModuleId::LimbsDriver, e.fault());
            }
        }
    }

    fn step_engine(&mut self) {
        if !self.movement_engine_status.is_running() {
            return;
        }

        let input = movement_engine::InputData {
            move_complete: self.limbs_driver.is_move_complete(),
            orientation: self.orientation,
        };

        match self.movement_engine.proc(&input) {
            Ok((cmd, report)) => {
                self.movement_engine_status_rpt = report;
                if let Some(cmd) = cmd {
                    self.start_move(&cmd);
                }
            }
            Err(e) => {
                error!("MovementEngine error: {}", e);
                self.record_fault(ModuleId::MovementEngine, e.fault());
            }
        }
    }

    fn start_move(&mut self, cmd: &MoveCommand) {
        if !self.limbs_driver_status.is_running() {
            return;
        }

        let result = self
            .limbs_driver
            .set_smoothness(cmd.smoothness)
            .and_then(|_| self.limbs_driver.start_move(&cmd.points, &cmd.shapes));

        if let Err(e) = result {
            error!("Could not start the move: {}", e);
            self.record_fault(ModuleId::LimbsDriver, e.fault());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fault::ERROR_MASK_EMERGENCY;
    use crate::movement_engine::build_library;
    use crate::servo_driver::SimServoDriver;
    use crate::test_utils::limbs_params;

    fn init_store() -> DataStore {
        let mut ds = DataStore::default();
        ds.init_limbs_driver(limbs_params()).unwrap();
        ds.init_movement_engine(movement_engine::InitData {
            params: movement_engine::Params {
                front_distance_low_limit_mm: Some(150),
            },
            library: build_library(),
        })
        .unwrap();
        ds
    }

    #[test]
    fn test_record_fault_once() {
        let mut ds = DataStore::default();
        ds.record_fault(ModuleId::LimbsDriver, Fault::Math);
        ds.record_fault(ModuleId::LimbsDriver, Fault::Sync);

        assert_eq!(ds.limbs_driver_status, ModuleStatus::Faulted(Fault::Math));
        assert_eq!(ds.num_faults, 1);
        assert!(!ds.error_status.is_emergency());

        ds.record_fault(ModuleId::MovementEngine, Fault::Internal);
        assert!(ds.error_status.contains(ERROR_MASK_EMERGENCY));
    }

    #[test]
    fn test_init_failure_is_recorded() {
        let mut ds = DataStore::default();
        let mut params = limbs_params();
        params.limbs.pop();

        assert!(ds.init_limbs_driver(params).is_err());
        assert_eq!(ds.limbs_driver_status, ModuleStatus::Faulted(Fault::Config));
        assert!(ds.error_status.is_emergency());
    }

    #[test]
    fn test_ticks_drive_limbs() {
        let mut ds = init_store();
        let mut servos = SimServoDriver::new();

        // Many cycles on the same counter value make a single tick
        for _ in 0..10 {
            ds.proc_motion(0, &mut servos);
        }
        assert_eq!(ds.num_ticks, 1);
        assert_eq!(servos.num_latches(), 1);
        assert_eq!(servos.latched_deg(), &ds.limbs_driver_output.angles_deg);

        ds.proc_motion(1, &mut servos);
        assert_eq!(ds.num_ticks, 2);
        assert!(ds.is_tick_cycle);
        ds.proc_motion(1, &mut servos);
        assert!(!ds.is_tick_cycle);
    }

    #[test]
    fn test_emergency_stops_motion() {
        let mut ds = init_store();
        let mut servos = SimServoDriver::new();

        ds.proc_motion(0, &mut servos);
        ds.record_fault(ModuleId::MovementEngine, Fault::Internal);

        ds.proc_motion(1, &mut servos);
        ds.proc_motion(2, &mut servos);
        assert_eq!(ds.num_ticks, 1);
        assert!(!servos.is_update_enabled());
    }

    #[test]
    fn test_voltage_error_lowers() {
        let mut ds = init_store();
        let mut servos = SimServoDriver::new();
        let mut counter = 0;

        assert!(ds.request_sequence(SequenceId::Up));
        while ds.movement_engine.posture() != Posture::Up {
            ds.proc_motion(counter, &mut servos);
            counter += 1;
            assert!(counter < 1000);
        }

        ds.error_status.set_voltage_error();
        ds.check_voltage();
        assert_eq!(ds.movement_engine.next_sequence(), SequenceId::Down);
    }
}
