//! Worker thread which owns the planning manager, so that planning cycles are strictly serialised.
//!
//! Jobs are passed over a bounded queue of depth one, each carrying the telemetry frame and a
//! channel for the result. Only the worker thread ever touches the planning context.

// -----------------------------------------------------------------------------------------------
// INCLUDES
// -----------------------------------------------------------------------------------------------

use std::{
    sync::mpsc::{self, Receiver, Sender, SyncSender},
    thread,
};

use comms_if::sim::Telemetry;
use log::{debug, warn};
use util::module::State;

use crate::{
    plan_mgr::{CycleError, CycleReport, PlanMgr},
    traj_gen::Trajectory,
};

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Result of a single planning cycle.
pub type CycleResult = Result<(Trajectory, CycleReport), CycleError>;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Handle to the cycle worker thread.
pub struct CycleWorker {
    sender: Option<SyncSender<WorkerSignal>>,

    join_handle: Option<thread::JoinHandle<PlanMgr>>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug)]
enum WorkerSignal {
    /// The worker should stop and hand back the planning manager
    Stop,

    /// Run one cycle on the telemetry and send the result back
    Cycle(Box<Telemetry>, Sender<CycleResult>),
}

#[derive(Debug, thiserror::Error)]
pub enum CycleWorkerError {
    #[error("Could not spawn the worker thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The worker thread has stopped")]
    WorkerStopped,

    #[error("The worker thread panicked")]
    WorkerPanicked,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl CycleWorker {
    /// Start the worker thread, which takes ownership of the planning manager.
    pub fn new(plan_mgr: PlanMgr) -> Result<Self, CycleWorkerError> {
        let (sender, receiver) = mpsc::sync_channel(1);

        let join_handle = thread::Builder::new()
            .name("cycle_worker".into())
            .spawn(move || worker_thread(plan_mgr, receiver))
            .map_err(CycleWorkerError::SpawnError)?;

        Ok(Self {
            sender: Some(sender),
            join_handle: Some(join_handle),
        })
    }

    /// Run a planning cycle, blocking until it has completed.
    pub fn run_cycle(&self, telem: Telemetry) -> Result<CycleResult, CycleWorkerError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(CycleWorkerError::WorkerStopped)?;

        let (result_sender, result_receiver) = mpsc::channel();

        sender
            .send(WorkerSignal::Cycle(Box::new(telem), result_sender))
            .map_err(|_| CycleWorkerError::WorkerStopped)?;

        result_receiver
            .recv()
            .map_err(|_| CycleWorkerError::WorkerStopped)
    }

    /// Stop the worker, returning the planning manager.
    pub fn stop(mut self) -> Result<PlanMgr, CycleWorkerError> {
        self.shutdown()?.ok_or(CycleWorkerError::WorkerStopped)
    }

    fn shutdown(&mut self) -> Result<Option<PlanMgr>, CycleWorkerError> {
        if let Some(sender) = self.sender.take() {
            // The worker may already have exited, in which case join reports why
            sender.send(WorkerSignal::Stop).ok();
        }

        match self.join_handle.take() {
            Some(jh) => jh
                .join()
                .map(Some)
                .map_err(|_| CycleWorkerError::WorkerPanicked),
            None => Ok(None),
        }
    }
}

impl Drop for CycleWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Error stopping the cycle worker: {}", e);
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn worker_thread(mut plan_mgr: PlanMgr, receiver: Receiver<WorkerSignal>) -> PlanMgr {
    while let Ok(signal) = receiver.recv() {
        match signal {
            WorkerSignal::Stop => break,
            WorkerSignal::Cycle(telem, result_sender) => {
                let result = plan_mgr.proc(&telem);

                // Caller may have given up waiting
                if result_sender.send(result).is_err() {
                    debug!("Cycle result dropped, caller no longer waiting");
                }
            }
        }
    }

    plan_mgr
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        behav_ctrl::{PlanningContext, DEFAULT_ACCEL_STEP_MPH},
        plan_mgr::Params,
        road::RoadwayModel,
    };

    fn worker() -> CycleWorker {
        let road = RoadwayModel::circle((0.0, 1006.0), 1000.0, 2000).unwrap();
        CycleWorker::new(PlanMgr::new(road, Params::default())).unwrap()
    }

    #[test]
    fn test_cycles_run_in_order() {
        let worker = worker();
        let telem = Telemetry {
            d: 6.0,
            ..Default::default()
        };

        for _ in 0..3 {
            let (traj, _) = worker.run_cycle(telem.clone()).unwrap().unwrap();
            assert_eq!(traj.len(), 50);
        }

        let mgr = worker.stop().unwrap();
        assert_eq!(mgr.num_cycles(), 3);
        assert!((mgr.context().reference_speed - 3.0 * DEFAULT_ACCEL_STEP_MPH).abs() < 1e-9);
    }

    #[test]
    fn test_failed_cycle_reported() {
        let worker = worker();
        let telem = Telemetry {
            d: 6.0,
            previous_path_x: vec![1.0],
            ..Default::default()
        };

        assert!(matches!(
            worker.run_cycle(telem),
            Ok(Err(CycleError::InvalidTelemetry(_)))
        ));

        let mgr = worker.stop().unwrap();
        assert_eq!(*mgr.context(), PlanningContext::default());
    }

    #[test]
    fn test_shared_between_threads() {
        let worker = std::sync::Arc::new(worker());
        let telem = Telemetry {
            d: 6.0,
            ..Default::default()
        };

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let worker = worker.clone();
                let telem = telem.clone();
                thread::spawn(move || worker.run_cycle(telem).unwrap().is_ok())
            })
            .collect();

        for h in handles {
            assert!(h.join().unwrap());
        }

        let worker = std::sync::Arc::try_unwrap(worker).ok().unwrap();
        assert_eq!(worker.stop().unwrap().num_cycles(), 4);
    }
}
