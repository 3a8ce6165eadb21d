//! Coordinates wallet and sync state changes into a single maintenance advisory decision.
//!
//! All transitions happen on one task. The evaluation runs on its own task and its result is
//! delivered back to the coordinator task, so at most one evaluation is ever in flight and the
//! tasks delivering state changes are never blocked by key derivation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use getset::CopyGetters;
use tokio::sync::{watch, Notify};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use zingo_status::sync_state::SyncState;
use zingoconfig::MaintenanceConfig;

use crate::error::{CoordinatorError, EvaluationError};
use crate::evaluator::{MaintenanceEvaluator, MaintenanceOutcome};
use crate::gate::NotificationGate;
use crate::observable::StateSubscription;
use crate::presenter::{Advisory, AdvisoryPresenter};
use crate::traits::MaintainableWallet;

/// Lifecycle of a coordinator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No evaluation in flight
    Idle,
    /// An evaluation is outstanding
    Evaluating,
    /// The advisory was shown. Terminal.
    Done,
    /// An evaluation failed. Terminal.
    Defunct,
    /// Torn down by the host, or the sources closed. Terminal.
    Stopped,
}

impl CoordinatorState {
    /// No further evaluations will happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CoordinatorState::Done | CoordinatorState::Defunct | CoordinatorState::Stopped
        )
    }
}

/// Why a session ended without error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The advisory was shown
    Done,
    /// The host tore the session down, or maintenance checks are disabled
    Stopped,
    /// Both state sources closed with no evaluation in flight
    SourcesClosed,
}

/// Returned by a coordinator that ended without error
#[derive(Clone, Copy, Debug, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SessionSummary {
    /// Evaluations launched during the session
    evaluations: usize,
    /// Whether the advisory was presented
    advisory_shown: bool,
    /// How the session ended
    end: SessionEnd,
}

/// Host side of a running coordinator
#[derive(Debug)]
pub struct CoordinatorHandle {
    state: watch::Receiver<CoordinatorState>,
    gate: Arc<NotificationGate>,
    shutdown: Arc<Notify>,
    task: JoinHandle<Result<SessionSummary, CoordinatorError>>,
}

impl CoordinatorHandle {
    /// Current state
    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Receiver of state transitions
    pub fn watch_state(&self) -> watch::Receiver<CoordinatorState> {
        self.state.clone()
    }

    /// Whether the advisory has been shown this session
    pub fn advisory_shown(&self) -> bool {
        !self.gate.is_open()
    }

    /// Whether the coordinator task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the coordinator to stop. An evaluation in flight runs to completion and its
    /// result is discarded. Calling this more than once is harmless. Dropping the handle
    /// does the same.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Wait for the coordinator to end. Evaluation failures surface here.
    pub async fn join(mut self) -> Result<SessionSummary, CoordinatorError> {
        (&mut self.task)
            .await
            .map_err(|e| CoordinatorError::Aborted(e.to_string()))?
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("Coordinator handle dropped, stopping coordinator");
            self.shutdown.notify_one();
        }
    }
}

/// Turns wallet and sync state changes into at most one advisory per session.
pub struct Coordinator<W, P>
where
    W: MaintainableWallet,
    P: AdvisoryPresenter,
{
    wallet: StateSubscription<Arc<W>>,
    sync: StateSubscription<SyncState>,
    wallet_open: bool,
    sync_open: bool,
    evaluator: MaintenanceEvaluator,
    presenter: P,
    gate: Arc<NotificationGate>,
    state: watch::Sender<CoordinatorState>,
    in_flight: Option<JoinHandle<MaintenanceOutcome>>,
    // inputs changed while an evaluation was in flight
    dirty: bool,
    evaluations: usize,
}

impl<W, P> Coordinator<W, P>
where
    W: MaintainableWallet,
    P: AdvisoryPresenter,
{
    /// Start a coordinator on the current tokio runtime.
    ///
    /// The current values of both subscriptions are checked right away; afterwards every
    /// change of either one triggers a re-check.
    pub fn spawn(
        config: &MaintenanceConfig,
        wallet: StateSubscription<Arc<W>>,
        sync: StateSubscription<SyncState>,
        presenter: P,
    ) -> CoordinatorHandle {
        let gate = Arc::new(NotificationGate::new());
        let shutdown = Arc::new(Notify::new());
        let (state, state_receiver) = watch::channel(CoordinatorState::Idle);

        let coordinator = Coordinator {
            wallet,
            sync,
            wallet_open: true,
            sync_open: true,
            evaluator: MaintenanceEvaluator,
            presenter,
            gate: gate.clone(),
            state,
            in_flight: None,
            dirty: false,
            evaluations: 0,
        };
        let enabled = config.enabled;
        let task = tokio::spawn(coordinator.run(enabled, shutdown.clone()));

        CoordinatorHandle {
            state: state_receiver,
            gate,
            shutdown,
            task,
        }
    }

    async fn run(
        mut self,
        enabled: bool,
        shutdown: Arc<Notify>,
    ) -> Result<SessionSummary, CoordinatorError> {
        if !enabled {
            info!("Maintenance checks disabled");
            return Ok(self.finish(SessionEnd::Stopped));
        }

        self.maybe_evaluate();

        loop {
            if !self.wallet_open && !self.sync_open && self.in_flight.is_none() {
                debug!("State sources closed, ending maintenance session");
                return Ok(self.finish(SessionEnd::SourcesClosed));
            }

            tokio::select! {
                biased;

                _ = shutdown.notified() => {
                    if self.in_flight.is_some() {
                        debug!("Teardown during evaluation, its result will be discarded");
                    }
                    return Ok(self.finish(SessionEnd::Stopped));
                }
                result = wait_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    if let Some(end) = self.on_outcome(result)? {
                        return Ok(self.finish(end));
                    }
                }
                changed = self.wallet.changed(), if self.wallet_open => {
                    if changed.is_err() {
                        debug!("Wallet source closed");
                        self.wallet_open = false;
                    } else {
                        self.on_input_changed();
                    }
                }
                changed = self.sync.changed(), if self.sync_open => {
                    if changed.is_err() {
                        debug!("Sync source closed");
                        self.sync_open = false;
                    } else {
                        self.on_input_changed();
                    }
                }
            }
        }
    }

    fn current_state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    fn set_state(&self, state: CoordinatorState) {
        self.state.send_replace(state);
    }

    fn on_input_changed(&mut self) {
        match self.current_state() {
            CoordinatorState::Idle => self.maybe_evaluate(),
            CoordinatorState::Evaluating => {
                debug!("State changed during evaluation, re-checking afterwards");
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn maybe_evaluate(&mut self) {
        if !self.gate.is_open() {
            return;
        }

        let wallet = self.wallet.latest();
        let sync = self.sync.latest();
        match (wallet, sync) {
            (_, None) => debug!("Sync state unknown, deferring maintenance check"),
            (_, Some(sync)) if !sync.is_caught_up() => {
                debug!("{} Deferring maintenance check", sync)
            }
            (None, Some(_)) => debug!("No wallet loaded, deferring maintenance check"),
            (Some(wallet), Some(sync)) => {
                self.dirty = false;
                self.evaluations += 1;
                info!(
                    "{} Checking whether wallet maintenance is recommended (evaluation {})",
                    sync, self.evaluations
                );
                self.in_flight = Some(self.evaluator.spawn(wallet));
                self.set_state(CoordinatorState::Evaluating);
            }
        }
    }

    fn on_outcome(
        &mut self,
        result: Result<MaintenanceOutcome, JoinError>,
    ) -> Result<Option<SessionEnd>, CoordinatorError> {
        let outcome = result.unwrap_or_else(|e| {
            MaintenanceOutcome::Failed(EvaluationError::Panicked(e.to_string()))
        });
        info!("Evaluation {} finished: {}", self.evaluations, outcome);

        let reason = outcome.advisory_reason();
        let pending_actions = outcome.pending_actions();
        let recommended = match outcome.recommends_advisory() {
            Ok(recommended) => recommended,
            Err(e) => {
                error!("{}", e);
                self.set_state(CoordinatorState::Defunct);
                return Err(e.into());
            }
        };

        if let (true, Some(reason)) = (recommended, reason) {
            if self.gate.try_consume() {
                let advisory = Advisory::new(reason, pending_actions);
                info!("Presenting maintenance advisory: {}", advisory);
                let presenter = &self.presenter;
                if std::panic::catch_unwind(AssertUnwindSafe(|| presenter.present(advisory)))
                    .is_err()
                {
                    error!("Advisory presenter panicked, the advisory counts as shown");
                }
                return Ok(Some(SessionEnd::Done));
            }
            debug!("Maintenance advisory already shown, not presenting again");
        }

        self.set_state(CoordinatorState::Idle);
        if self.dirty {
            self.maybe_evaluate();
        }
        Ok(None)
    }

    fn finish(self, end: SessionEnd) -> SessionSummary {
        let state = match end {
            SessionEnd::Done => CoordinatorState::Done,
            SessionEnd::Stopped | SessionEnd::SourcesClosed => CoordinatorState::Stopped,
        };
        self.set_state(state);
        SessionSummary {
            evaluations: self.evaluations,
            advisory_shown: !self.gate.is_open(),
            end,
        }
    }
}

async fn wait_in_flight(
    in_flight: &mut Option<JoinHandle<MaintenanceOutcome>>,
) -> Result<MaintenanceOutcome, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => futures::future::pending().await,
    }
}
