//! Implementations for the MovementEngine state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal
use super::{MovementEngineError, Params, Sequence};
use crate::trajectory::PathShape;
use crate::NUM_LIMBS;
use comms_if::tc::gait::SequenceId;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Movement engine module state
#[derive(Default)]
pub struct MovementEngine {
    pub(crate) library: HashMap<SequenceId, Sequence>,

    /// Minimum front distance for the forward walking gaits
    ///
    /// Units: millimetres
    pub(crate) front_distance_limit_mm: u32,

    pub(crate) state: EngineState,

    pub(crate) current: SequenceId,

    pub(crate) next: SequenceId,

    pub(crate) posture: Posture,

    /// Index of the iteration in the current sequence
    pub(crate) iteration: usize,

    pub(crate) stage: Stage,

    /// Last known orientation sensor readings
    pub(crate) orientation: Orientation,

    pub(crate) report: StatusReport,

    arch_status: Archiver,
}

/// Data required to initialise the engine.
pub struct InitData {
    pub params: Params,

    /// Every sequence the engine can run, `SequenceId::Down` is required.
    pub library: HashMap<SequenceId, Sequence>,
}

/// Input data to the movement engine.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InputData {
    /// The limbs driver has no move in progress.
    pub move_complete: bool,

    pub orientation: Orientation,
}

/// Readings of the orientation sensors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub front_sensor_enabled: bool,

    /// Distance to the nearest obstacle in front, `None` without an echo.
    ///
    /// Units: millimetres
    pub front_distance_mm: Option<u32>,
}

/// A move to hand off to the limbs driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    pub smoothness: u32,
    pub points: [Point3<f64>; NUM_LIMBS],
    pub shapes: [PathShape; NUM_LIMBS],
}

/// Output of the movement engine, a move only on the ticks starting one.
pub type OutputData = Option<MoveCommand>;

/// Status report for MovementEngine processing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: EngineState,
    pub current: SequenceId,
    pub next: SequenceId,
    pub posture: Posture,
    pub iteration: usize,
    pub stage: Stage,

    /// The next sequence was cancelled this cycle because of an obstacle.
    pub distance_stop: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// State of the engine's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    NoInit,
    Idle,
    Move,
    Wait,
    NextIteration,
    ChangeSequence,
}

/// Coarse posture of the hexapod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Posture {
    /// Resting on the ground
    Down,

    /// Standing on the limbs
    Up,
}

/// Stage of the running sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Prepare,
    Main,
    Finalize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EngineState {
    fn default() -> Self {
        EngineState::NoInit
    }
}

impl Default for Posture {
    fn default() -> Self {
        Posture::Down
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Prepare
    }
}

impl Orientation {
    /// True if nothing is in front of the hexapod closer than `limit_mm`.
    ///
    /// A disabled sensor or a missing echo never blocks.
    pub fn is_front_clear(&self, limit_mm: u32) -> bool {
        !self.front_sensor_enabled || self.front_distance_mm.map_or(true, |d| d >= limit_mm)
    }
}

impl State for MovementEngine {
    type InitData = InitData;
    type InitError = MovementEngineError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MovementEngineError;

    /// Initialise the MovementEngine module.
    ///
    /// Every sequence in the library is validated, and the engine is left
    /// with the lowering sequence requested so the first cycles put the
    /// hexapod into its rest posture.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.front_distance_limit_mm = init_data
            .params
            .front_distance_low_limit_mm
            .ok_or_else(|| {
                MovementEngineError::InvalidParams("front_distance_low_limit_mm not set".into())
            })?;

        for (id, seq) in init_data.library.iter() {
            seq.validate()
                .map_err(|e| MovementEngineError::InvalidSequence(*id, e))?;
        }

        if !init_data.library.contains_key(&SequenceId::Down) {
            return Err(MovementEngineError::InvalidParams(
                "the library has no Down sequence".into(),
            ));
        }

        self.library = init_data.library;
        self.current = SequenceId::None;
        self.next = SequenceId::Down;
        self.posture = Posture::Down;
        self.iteration = 0;
        self.stage = Stage::Prepare;
        self.state = EngineState::Idle;
        self.update_report();

        info!(
            "MovementEngine initialised with {} sequences, front distance limit {} mm",
            self.library.len(),
            self.front_distance_limit_mm
        );

        Ok(())
    }

    /// Process one cycle.
    ///
    /// Makes at most one state machine transition, then cancels any forward
    /// walk if an obstacle is too close.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.orientation = input_data.orientation;
        self.report.distance_stop = false;

        let mut output = None;

        match self.state {
            EngineState::NoInit => return Err(MovementEngineError::NotInitialised),
            EngineState::Idle => {
                if self.next != self.current {
                    self.set_state(EngineState::ChangeSequence);
                }
            }
            EngineState::ChangeSequence => self.change_sequence()?,
            EngineState::Move => {
                output = Some(self.move_command()?);
                self.set_state(EngineState::Wait);
            }
            EngineState::Wait => {
                if input_data.move_complete {
                    self.set_state(EngineState::NextIteration);
                }
            }
            EngineState::NextIteration => self.next_iteration()?,
        }

        self.check_front_distance();
        self.update_report();

        Ok((output, self.report))
    }
}

impl MovementEngine {
    /// Request a change of sequence.
    ///
    /// Returns `false` if the request is refused in the current posture or
    /// because of an obstacle. Refused requests have no effect.
    pub fn request_sequence(&mut self, id: SequenceId) -> bool {
        let accepted = match id {
            SequenceId::None => true,
            SequenceId::Up => self.posture == Posture::Down,
            _ => {
                self.posture == Posture::Up
                    && (!id.is_forward_walk()
                        || self.orientation.is_front_clear(self.front_distance_limit_mm))
            }
        };

        if accepted {
            if self.next != id {
                debug!("MovementEngine sequence {:?} requested", id);
            }
            self.next = id;
        } else {
            debug!(
                "MovementEngine sequence {:?} refused in posture {:?}",
                id, self.posture
            );
        }

        accepted
    }

    /// Update the orientation readings used to gate requests.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    pub fn current_sequence(&self) -> SequenceId {
        self.current
    }

    pub fn next_sequence(&self) -> SequenceId {
        self.next
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Open the status archive in the session directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_status = Archiver::from_path(session, "movement_engine_status.csv")?;
        Ok(())
    }

    fn set_state(&mut self, state: EngineState) {
        debug!("MovementEngine {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn sequence(&self, id: SequenceId) -> Result<&Sequence, MovementEngineError> {
        self.library
            .get(&id)
            .ok_or(MovementEngineError::UnknownSequence(id))
    }

    fn change_sequence(&mut self) -> Result<(), MovementEngineError> {
        if self.next != SequenceId::None {
            self.sequence(self.next)?;
        }

        info!(
            "MovementEngine changing sequence {:?} -> {:?}",
            self.current, self.next
        );

        self.current = self.next;
        self.iteration = 0;
        self.stage = Stage::Prepare;

        if self.current == SequenceId::None {
            self.set_state(EngineState::Idle);
        } else {
            self.set_state(EngineState::Move);
        }

        Ok(())
    }

    fn move_command(&self) -> Result<MoveCommand, MovementEngineError> {
        let it = self
            .sequence(self.current)?
            .iterations
            .get(self.iteration)
            .ok_or(MovementEngineError::UnknownSequence(self.current))?;

        debug!(
            "MovementEngine {:?} iteration {} ({:?})",
            self.current, self.iteration, self.stage
        );

        Ok(MoveCommand {
            smoothness: it.smoothness,
            points: it.points,
            shapes: it.shapes,
        })
    }

    fn next_iteration(&mut self) -> Result<(), MovementEngineError> {
        let (main_begin, finalize_begin, total_count, is_looped) = {
            let seq = self.sequence(self.current)?;
            (
                seq.main_begin,
                seq.finalize_begin,
                seq.total_count,
                seq.is_looped,
            )
        };

        self.iteration += 1;
        self.set_state(EngineState::Move);

        if self.stage == Stage::Prepare && self.iteration >= main_begin {
            self.stage = Stage::Main;
        }

        if self.stage == Stage::Main && self.iteration >= finalize_begin {
            if self.next != self.current {
                self.iteration = finalize_begin;
                self.stage = Stage::Finalize;
            } else if is_looped {
                self.iteration = main_begin;
            } else {
                self.complete_sequence();
                self.next = SequenceId::None;
                self.set_state(EngineState::ChangeSequence);
            }
        }

        if self.stage == Stage::Finalize && self.iteration >= total_count {
            self.complete_sequence();
            self.set_state(EngineState::ChangeSequence);
        }

        Ok(())
    }

    /// The current sequence has run all its iterations, so the posture it
    /// leaves the hexapod in is known.
    fn complete_sequence(&mut self) {
        let posture = if self.current == SequenceId::Down {
            Posture::Down
        } else {
            Posture::Up
        };

        if posture != self.posture {
            info!("MovementEngine posture {:?} -> {:?}", self.posture, posture);
        }
        self.posture = posture;
    }

    fn check_front_distance(&mut self) {
        if self.orientation.is_front_clear(self.front_distance_limit_mm) {
            return;
        }

        // Both a running and a pending forward walk fall back to None, along
        // with anything requested after the running walk.
        let gated = self.current.is_forward_walk() || self.next.is_forward_walk();
        if gated && self.next != SequenceId::None {
            warn!(
                "Obstacle at {:?} mm, cancelling {:?} (running {:?})",
                self.orientation.front_distance_mm, self.next, self.current
            );
            self.next = SequenceId::None;
            self.report.distance_stop = true;
        }
    }

    fn update_report(&mut self) {
        self.report.state = self.state;
        self.report.current = self.current;
        self.report.next = self.next;
        self.report.posture = self.posture;
        self.report.iteration = self.iteration;
        self.report.stage = self.stage;
    }
}

impl Archived for MovementEngine {
    fn write(&mut self) -> Result<(), ArchiveError> {
        #[derive(Serialize)]
        struct Row {
            time_s: f64,
            state: EngineState,
            current: SequenceId,
            next: SequenceId,
            posture: Posture,
            iteration: usize,
            stage: Stage,
            distance_stop: bool,
        }

        let r = &self.report;
        self.arch_status.serialise(Row {
            time_s: session::get_elapsed_seconds(),
            state: r.state,
            current: r.current,
            next: r.next,
            posture: r.posture,
            iteration: r.iteration,
            stage: r.stage,
            distance_stop: r.distance_stop,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fault::Fault;
    use crate::movement_engine::{build_library, Iteration};

    fn seq(n: usize, main_begin: usize, finalize_begin: usize, is_looped: bool) -> Sequence {
        Sequence {
            iterations: vec![
                Iteration {
                    points: [Point3::origin(); NUM_LIMBS],
                    shapes: [PathShape::Linear; NUM_LIMBS],
                    smoothness: 5,
                };
                n
            ],
            main_begin,
            finalize_begin,
            total_count: n,
            is_looped,
        }
    }

    fn params() -> Params {
        Params {
            front_distance_low_limit_mm: Some(150),
        }
    }

    fn init_engine(library: HashMap<SequenceId, Sequence>) -> MovementEngine {
        let mut me = MovementEngine::default();
        me.init(InitData {
            params: params(),
            library,
        })
        .unwrap();
        me
    }

    fn complete() -> InputData {
        InputData {
            move_complete: true,
            orientation: Orientation::default(),
        }
    }

    /// Process with every move completing immediately until `pred` holds.
    fn proc_until<F>(me: &mut MovementEngine, input: &InputData, pred: F) -> bool
    where
        F: Fn(&MovementEngine) -> bool,
    {
        for _ in 0..500 {
            me.proc(input).unwrap();
            if pred(me) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_not_initialised() {
        let mut me = MovementEngine::default();
        let err = me.proc(&complete()).unwrap_err();
        assert_eq!(err.fault(), Fault::Internal);
    }

    #[test]
    fn test_init_validation() {
        let mut me = MovementEngine::default();
        let err = me
            .init(InitData {
                params: params(),
                library: HashMap::new(),
            })
            .unwrap_err();
        assert_eq!(err.fault(), Fault::Config);

        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(3, 2, 1, false));
        let err = MovementEngine::default()
            .init(InitData {
                params: params(),
                library,
            })
            .unwrap_err();
        assert_eq!(err.fault(), Fault::Config);

        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(1, 0, 1, false));
        let err = MovementEngine::default()
            .init(InitData {
                params: Params::default(),
                library,
            })
            .unwrap_err();
        assert_eq!(err.fault(), Fault::Config);
    }

    #[test]
    fn test_init_lowers() {
        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(1, 0, 1, false));
        let mut me = init_engine(library);

        assert_eq!(me.posture(), Posture::Down);
        assert_eq!(me.next_sequence(), SequenceId::Down);

        me.proc(&complete()).unwrap();
        assert_eq!(me.state(), EngineState::ChangeSequence);
        me.proc(&complete()).unwrap();
        assert_eq!(me.state(), EngineState::Move);
        assert_eq!(me.current_sequence(), SequenceId::Down);

        let (out, _) = me.proc(&complete()).unwrap();
        assert!(out.is_some());

        assert!(proc_until(&mut me, &complete(), |m| m.state()
            == EngineState::Idle));
        assert_eq!(me.current_sequence(), SequenceId::None);
        assert_eq!(me.posture(), Posture::Down);
    }

    #[test]
    fn test_stage_boundaries() {
        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(7, 2, 5, false));
        let mut me = init_engine(library);

        let mut moves = Vec::new();
        for _ in 0..100 {
            let (out, report) = me.proc(&complete()).unwrap();
            if out.is_some() {
                moves.push((report.iteration, report.stage));
                me.request_sequence(SequenceId::None);
            }
            if report.state == EngineState::ChangeSequence && !moves.is_empty() {
                break;
            }
        }

        assert_eq!(
            moves,
            vec![
                (0, Stage::Prepare),
                (1, Stage::Prepare),
                (2, Stage::Main),
                (3, Stage::Main),
                (4, Stage::Main),
                (5, Stage::Finalize),
                (6, Stage::Finalize),
            ]
        );
        assert_eq!(me.report().iteration, 7);

        me.proc(&complete()).unwrap();
        assert_eq!(me.state(), EngineState::Idle);
        assert_eq!(me.current_sequence(), SequenceId::None);
    }

    #[test]
    fn test_looped_main_stage() {
        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(4, 1, 3, true));
        let mut me = init_engine(library);

        let mut iterations = Vec::new();
        while iterations.len() < 6 {
            let (out, report) = me.proc(&complete()).unwrap();
            if out.is_some() {
                iterations.push(report.iteration);
            }
        }
        assert_eq!(iterations, vec![0, 1, 2, 1, 2, 1]);

        // Leaving the loop runs the finalize stage
        me.request_sequence(SequenceId::None);
        let mut iterations = Vec::new();
        while me.state() != EngineState::Idle {
            let (out, report) = me.proc(&complete()).unwrap();
            if out.is_some() {
                iterations.push(report.iteration);
            }
        }
        assert_eq!(iterations, vec![2, 3]);
    }

    #[test]
    fn test_waits_for_move_complete() {
        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(2, 0, 2, false));
        let mut me = init_engine(library);

        assert!(proc_until(&mut me, &complete(), |m| m.state()
            == EngineState::Wait));

        let busy = InputData::default();
        for _ in 0..10 {
            let (out, _) = me.proc(&busy).unwrap();
            assert!(out.is_none());
            assert_eq!(me.state(), EngineState::Wait);
        }

        me.proc(&complete()).unwrap();
        assert_eq!(me.state(), EngineState::NextIteration);
    }

    #[test]
    fn test_posture_gating() {
        let mut me = init_engine(build_library());

        assert!(!me.request_sequence(SequenceId::DirectMovement));
        assert!(!me.request_sequence(SequenceId::Down));
        assert!(me.request_sequence(SequenceId::Up));

        assert!(proc_until(&mut me, &complete(), |m| {
            m.current_sequence() == SequenceId::Up
        }));
        assert!(!me.request_sequence(SequenceId::Dance));
        assert_eq!(me.posture(), Posture::Down);

        assert!(proc_until(&mut me, &complete(), |m| m.posture()
            == Posture::Up));
        assert_eq!(me.next_sequence(), SequenceId::None);

        assert!(!me.request_sequence(SequenceId::Up));
        assert!(me.request_sequence(SequenceId::Dance));
        assert!(me.request_sequence(SequenceId::DirectMovement));
        assert!(me.request_sequence(SequenceId::Down));

        assert!(proc_until(&mut me, &complete(), |m| m.posture()
            == Posture::Down));
        assert!(!me.request_sequence(SequenceId::RotateLeft));
        assert!(me.request_sequence(SequenceId::None));
    }

    #[test]
    fn test_distance_gate() {
        let mut me = init_engine(build_library());
        me.request_sequence(SequenceId::Up);
        assert!(proc_until(&mut me, &complete(), |m| m.posture()
            == Posture::Up));

        let far = InputData {
            move_complete: true,
            orientation: Orientation {
                front_sensor_enabled: true,
                front_distance_mm: Some(500),
            },
        };
        let near = InputData {
            move_complete: true,
            orientation: Orientation {
                front_sensor_enabled: true,
                front_distance_mm: Some(100),
            },
        };

        me.set_orientation(far.orientation);
        assert!(me.request_sequence(SequenceId::DirectMovement));
        assert!(proc_until(&mut me, &far, |m| m.state() == EngineState::Wait
            && m.current_sequence() == SequenceId::DirectMovement));

        let (_, report) = me.proc(&near).unwrap();
        assert!(report.distance_stop);
        assert_eq!(me.next_sequence(), SequenceId::None);

        assert!(!me.request_sequence(SequenceId::DirectMovement));
        assert!(!me.request_sequence(SequenceId::Run));

        // The walk finishes, then backing away is allowed
        assert!(proc_until(&mut me, &near, |m| m.current_sequence()
            == SequenceId::None));
        assert!(me.request_sequence(SequenceId::ReverseMovement));
        assert!(proc_until(&mut me, &near, |m| m.current_sequence()
            == SequenceId::ReverseMovement));
        let (_, report) = me.proc(&near).unwrap();
        assert!(!report.distance_stop);
        assert_eq!(me.next_sequence(), SequenceId::ReverseMovement);

        // A disabled sensor or a missing echo never blocks
        me.set_orientation(Orientation {
            front_sensor_enabled: false,
            front_distance_mm: Some(10),
        });
        assert!(me.request_sequence(SequenceId::Run));
        me.set_orientation(Orientation {
            front_sensor_enabled: true,
            front_distance_mm: None,
        });
        assert!(me.request_sequence(SequenceId::DirectMovementSlow));
    }

    #[test]
    fn test_distance_gate_cancels_pending_after_walk() {
        let mut me = init_engine(build_library());
        me.request_sequence(SequenceId::Up);
        assert!(proc_until(&mut me, &complete(), |m| m.posture()
            == Posture::Up));

        let far = InputData {
            move_complete: true,
            orientation: Orientation {
                front_sensor_enabled: true,
                front_distance_mm: Some(500),
            },
        };
        me.set_orientation(far.orientation);
        assert!(me.request_sequence(SequenceId::DirectMovement));
        assert!(proc_until(&mut me, &far, |m| m.state() == EngineState::Wait
            && m.current_sequence() == SequenceId::DirectMovement));

        // Another request is pending behind the running walk
        assert!(me.request_sequence(SequenceId::RotateLeft));

        let near = InputData {
            move_complete: false,
            orientation: Orientation {
                front_sensor_enabled: true,
                front_distance_mm: Some(50),
            },
        };
        let (_, report) = me.proc(&near).unwrap();
        assert!(report.distance_stop);
        assert_eq!(me.current_sequence(), SequenceId::DirectMovement);
        assert_eq!(me.next_sequence(), SequenceId::None);
    }

    #[test]
    fn test_unknown_sequence_is_internal() {
        let mut library = HashMap::new();
        library.insert(SequenceId::Down, seq(1, 0, 1, false));
        let mut me = init_engine(library);
        me.posture = Posture::Up;

        assert!(me.request_sequence(SequenceId::Dance));
        me.proc(&complete()).unwrap();
        let err = me.proc(&complete()).unwrap_err();
        assert_eq!(err.fault(), Fault::Internal);
    }
}
