//! Implementations for the LimbsDriver state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// Internal
use super::{LimbsDriverError, Params};
use crate::kinematics::{self, AngleLimitPolicy, JointAngles, LimbGeometry};
use crate::trajectory::{PathDescriptor, PathShape};
use crate::{NUM_JOINTS, NUM_LIMBS};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limbs driver module state
#[derive(Default)]
pub struct LimbsDriver {
    pub(crate) geometry: [LimbGeometry; NUM_LIMBS],

    pub(crate) limbs: [LimbState; NUM_LIMBS],

    pub(crate) policy: AngleLimitPolicy,

    /// Number of steps of the current move
    pub(crate) smoothness: u32,

    /// Step computed by the next tick, in `0..=smoothness`
    pub(crate) current_step: u32,

    pub(crate) move_in_progress: bool,

    pub(crate) initialised: bool,

    pub(crate) report: StatusReport,

    pub(crate) output: OutputData,

    arch_output: Archiver,
}

/// State of one limb.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LimbState {
    /// Current foot position.
    ///
    /// Units: millimetres
    pub position: Point3<f64>,

    /// Angles solved for `position`.
    pub angles: JointAngles,

    /// Path of the current (or last) move.
    pub path: PathDescriptor,

    /// The limb takes part in the current move.
    pub moving: bool,
}

/// Input data to the limbs driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputData {
    /// Manual joint angle overrides, `None` when a joint is not overridden.
    ///
    /// Units: degrees
    pub overrides: [Option<i8>; NUM_JOINTS],
}

/// Angles published to the actuation layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// Joint angles, indexed by `limb * 3 + link`.
    ///
    /// Units: degrees
    pub angles_deg: [f64; NUM_JOINTS],
}

/// Status report for LimbsDriver processing.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct StatusReport {
    /// No move is in progress.
    pub move_complete: bool,

    /// Step of the move to be computed on the next tick.
    pub step: u32,

    /// Joints whose solved angle was outside of its limits.
    pub angle_limited: [bool; NUM_JOINTS],

    /// Joints whose published angle comes from an override.
    pub overridden: [bool; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LimbState {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            angles: JointAngles::default(),
            path: PathDescriptor::default(),
            moving: false,
        }
    }
}

impl Default for InputData {
    fn default() -> Self {
        Self {
            overrides: [None; NUM_JOINTS],
        }
    }
}

impl State for LimbsDriver {
    type InitData = Params;
    type InitError = LimbsDriverError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LimbsDriverError;

    /// Initialise the LimbsDriver module.
    ///
    /// The start position of every limb must be solvable.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let config = init_data.limbs_config()?;
        self.smoothness = init_data.smoothness()?;
        self.policy = init_data.policy()?;

        for (i, (geom, start)) in config.iter().enumerate() {
            let angles = kinematics::solve(start, geom)
                .map_err(|e| LimbsDriverError::UnreachableStart(i, e))?;

            self.geometry[i] = *geom;
            self.limbs[i] = LimbState {
                position: *start,
                angles,
                path: PathDescriptor::new(PathShape::Linear, *start, *start),
                moving: false,
            };
        }

        self.current_step = 0;
        self.move_in_progress = false;
        self.initialised = true;
        self.set_output(&InputData::default().overrides);

        info!(
            "LimbsDriver initialised, smoothness {}, angle limit policy {:?}",
            self.smoothness, self.policy
        );

        Ok(())
    }

    /// Process one synchronisation tick.
    ///
    /// Must be called exactly once per tick. Advances the current move by one
    /// step then updates the published angles.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !self.initialised {
            return Err(LimbsDriverError::NotInitialised);
        }

        self.report = StatusReport::default();

        if self.move_in_progress {
            self.step_limbs()?;
        }

        self.report.move_complete = !self.move_in_progress;
        self.report.step = self.current_step;

        self.set_output(&input_data.overrides);

        Ok((self.output, self.report))
    }
}

impl LimbsDriver {
    /// Set the number of steps used by the next move.
    pub fn set_smoothness(&mut self, smoothness: u32) -> Result<(), LimbsDriverError> {
        if smoothness == 0 {
            return Err(LimbsDriverError::ZeroSmoothness);
        }

        self.smoothness = smoothness;
        Ok(())
    }

    /// Start moving every limb towards its target along the given shape.
    ///
    /// Only limbs not already at their target get a new path, the move only
    /// starts if there is at least one of them.
    pub fn start_move(
        &mut self,
        targets: &[Point3<f64>; NUM_LIMBS],
        shapes: &[PathShape; NUM_LIMBS],
    ) -> Result<(), LimbsDriverError> {
        if !self.initialised {
            return Err(LimbsDriverError::NotInitialised);
        }
        if self.move_in_progress {
            return Err(LimbsDriverError::MoveInProgress);
        }

        for (i, limb) in self.limbs.iter_mut().enumerate() {
            limb.moving = limb.position != targets[i];

            if limb.moving {
                limb.path = PathDescriptor::new(shapes[i], limb.position, targets[i]);
                self.move_in_progress = true;
            }
        }

        if self.move_in_progress {
            self.current_step = 0;
            debug!("LimbsDriver move started over {} steps", self.smoothness);
        }

        Ok(())
    }

    /// True if no move is in progress.
    pub fn is_move_complete(&self) -> bool {
        !self.move_in_progress
    }

    /// State of every limb.
    pub fn limbs(&self) -> &[LimbState; NUM_LIMBS] {
        &self.limbs
    }

    /// Angles published on the last tick.
    pub fn output(&self) -> &OutputData {
        &self.output
    }

    /// Step of the current move to be computed on the next tick.
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn smoothness(&self) -> u32 {
        self.smoothness
    }

    /// Open the output archive in the session directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_output = Archiver::from_path(session, "limbs_driver_output.csv")?;
        Ok(())
    }

    /// Compute the next step for all limbs.
    ///
    /// Limbs are only updated once every one of them is solved, a failure
    /// leaves all angles and the step counter as they were.
    fn step_limbs(&mut self) -> Result<(), LimbsDriverError> {
        let mut next = self.limbs;
        let mut limited = [false; NUM_JOINTS];

        for (i, limb) in next.iter_mut().enumerate() {
            if !limb.moving {
                continue;
            }

            let point = limb
                .path
                .point_at(self.current_step, self.smoothness)
                .map_err(LimbsDriverError::Trajectory)?;

            let angles = kinematics::solve(&point, &self.geometry[i])
                .map_err(|e| LimbsDriverError::Kinematics(i, e))?;

            let (angles, lim) = kinematics::apply_limits(angles, &self.geometry[i], self.policy)
                .map_err(|e| LimbsDriverError::Kinematics(i, e))?;

            if lim.iter().any(|l| *l) {
                debug!("Limb {} angles outside of limits: {:?}", i, angles);
            }

            limited[i * 3..i * 3 + 3].copy_from_slice(&lim);
            limb.position = point;
            limb.angles = angles;
        }

        self.limbs = next;
        self.report.angle_limited = limited;

        trace!("LimbsDriver step {}/{}", self.current_step, self.smoothness);

        self.current_step += 1;
        if self.current_step > self.smoothness {
            self.move_in_progress = false;
            self.current_step = 0;
            for limb in self.limbs.iter_mut() {
                limb.moving = false;
            }
            debug!("LimbsDriver move complete");
        }

        Ok(())
    }

    /// Build the published angles from the solved angles and overrides.
    ///
    /// Overrides only replace the published value, the solved angles are
    /// kept so that removing an override restores them.
    fn set_output(&mut self, overrides: &[Option<i8>; NUM_JOINTS]) {
        for (limb_idx, limb) in self.limbs.iter().enumerate() {
            for (link, angle) in limb.angles.as_array().iter().enumerate() {
                let j = limb_idx * 3 + link;

                self.output.angles_deg[j] = match overrides[j] {
                    Some(o) => {
                        self.report.overridden[j] = true;
                        o as f64
                    }
                    None => *angle,
                };
            }
        }
    }
}

impl Archived for LimbsDriver {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let mut row = Vec::with_capacity(NUM_JOINTS + 2);
        row.push(session::get_elapsed_seconds());
        row.push(self.report.step as f64);
        row.extend_from_slice(&self.output.angles_deg);

        self.arch_output.serialise(row)
    }
}
