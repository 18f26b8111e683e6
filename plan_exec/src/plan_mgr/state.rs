//! Implementations for the PlanMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::sim::Telemetry;
use log::{debug, info, trace, warn};

// Internal
use super::{ContextRecord, CycleError, CycleReport, Params, PlanMgrInitError};
use crate::{
    behav_ctrl::{self, BehavInput, PlanningContext},
    ego::{objects_from_telemetry, EgoState, PriorTrajectoryRemainder},
    road::RoadwayModel,
    traj_gen::{self, Trajectory},
};
use util::{archive::Archiver, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Planning manager state
pub struct PlanMgr {
    road: RoadwayModel,

    params: Params,

    ctx: PlanningContext,

    num_cycles: u64,

    arch_context: Archiver,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanMgr {
    /// Create a new planning manager with the initial planning context.
    ///
    /// Nothing is archived until the manager is initialised with a session.
    pub fn new(road: RoadwayModel, params: Params) -> Self {
        Self {
            road,
            params,
            ctx: PlanningContext::default(),
            num_cycles: 0,
            arch_context: Archiver::default(),
        }
    }

    /// The planning context as of the last successful cycle.
    pub fn context(&self) -> &PlanningContext {
        &self.ctx
    }

    /// Overwrite the planning context, lane and speed are clamped to their bounds.
    pub fn set_context(&mut self, ctx: PlanningContext) {
        self.ctx = PlanningContext::clamped(
            ctx.lane,
            ctx.reference_speed,
            self.params.behav.speed_limit_mph,
        );
    }

    pub fn road(&self) -> &RoadwayModel {
        &self.road
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of successful cycles run so far.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }
}

impl State for PlanMgr {
    type InitData = &'static str;
    type InitError = PlanMgrInitError;

    type InputData = Telemetry;
    type OutputData = Trajectory;
    type StatusReport = CycleReport;
    type ProcError = CycleError;

    /// Initialise the PlanMgr module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(PlanMgrInitError::ParamLoadError)?;

        self.arch_context = Archiver::from_path(session, "plan_mgr/context.csv")
            .map_err(PlanMgrInitError::ArchiveError)?;

        info!("PlanMgr initialised");
        debug!("PlanMgr params: {:#?}", self.params);

        Ok(())
    }

    /// Run one planning cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        input_data
            .validate()
            .map_err(CycleError::InvalidTelemetry)?;

        let ego = EgoState::from_telemetry(input_data);
        let prior = PriorTrajectoryRemainder::from_telemetry(input_data);
        let objects = objects_from_telemetry(input_data);

        trace!(
            "PlanMgr cycle {}: ego {:?}, {} prior points, {} objects",
            self.num_cycles,
            ego,
            prior.len(),
            objects.len()
        );

        let behav_out = behav_ctrl::step(
            &self.ctx,
            &self.params.behav,
            &self.params.occupancy,
            &BehavInput {
                ego: &ego,
                num_prior_points: prior.len(),
                prior_end_s: prior.end_s,
                latency_s: prior.len() as f64 * self.params.traj.point_dt_s,
                objects: &objects,
            },
        );

        let traj = traj_gen::synthesise(
            &self.road,
            &self.params.traj,
            &ego,
            &prior,
            behav_out.lane,
            behav_out.reference_speed,
        )?;

        // Whole cycle succeeded, commit the new context
        self.ctx = behav_out.context();

        let record = ContextRecord {
            cycle: self.num_cycles,
            lane: self.ctx.lane,
            reference_speed: self.ctx.reference_speed,
            too_close: behav_out.too_close,
            lane_changed: behav_out.lane_changed,
        };
        if let Err(e) = self.arch_context.serialise(record) {
            warn!("Could not archive the planning context: {}", e);
        }

        self.num_cycles += 1;

        let report = CycleReport {
            too_close: behav_out.too_close,
            lane_changed: behav_out.lane_changed,
            lane: self.ctx.lane,
            reference_speed: self.ctx.reference_speed,
            num_reused_points: traj.num_reused,
            num_new_points: traj.num_new(),
        };

        Ok((traj, report))
    }
}
