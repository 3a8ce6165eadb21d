//! Host-owned slot holding the one coordinator of a session

use std::sync::Arc;

use zingo_status::sync_state::SyncState;
use zingoconfig::MaintenanceConfig;

use crate::coordinator::{Coordinator, CoordinatorHandle, SessionSummary};
use crate::error::CoordinatorError;
use crate::observable::StateSubscription;
use crate::presenter::AdvisoryPresenter;
use crate::traits::MaintainableWallet;

enum Slot<W, P> {
    Pending {
        wallet: StateSubscription<Arc<W>>,
        sync: StateSubscription<SyncState>,
        presenter: P,
    },
    Running(CoordinatorHandle),
    TornDown,
}

/// Owns at most one coordinator for the lifetime of a host session.
///
/// The coordinator is created on the first [`MaintenanceSession::ensure_started`] call. Later
/// calls find the running one. A torn down session can not be restarted.
pub struct MaintenanceSession<W, P>
where
    W: MaintainableWallet,
    P: AdvisoryPresenter,
{
    config: MaintenanceConfig,
    slot: Slot<W, P>,
}

impl<W, P> MaintenanceSession<W, P>
where
    W: MaintainableWallet,
    P: AdvisoryPresenter,
{
    /// Prepare a session. Nothing runs until [`MaintenanceSession::ensure_started`].
    pub fn new(
        config: MaintenanceConfig,
        wallet: StateSubscription<Arc<W>>,
        sync: StateSubscription<SyncState>,
        presenter: P,
    ) -> Self {
        MaintenanceSession {
            config,
            slot: Slot::Pending {
                wallet,
                sync,
                presenter,
            },
        }
    }

    /// Start the coordinator unless it is already running.
    ///
    /// Returns whether this call started it. Must be called on a tokio runtime.
    pub fn ensure_started(&mut self) -> Result<bool, CoordinatorError> {
        match std::mem::replace(&mut self.slot, Slot::TornDown) {
            Slot::Pending {
                wallet,
                sync,
                presenter,
            } => {
                tracing::debug!("Starting maintenance coordinator");
                self.slot = Slot::Running(Coordinator::spawn(
                    &self.config,
                    wallet,
                    sync,
                    presenter,
                ));
                Ok(true)
            }
            running @ Slot::Running(_) => {
                self.slot = running;
                Ok(false)
            }
            Slot::TornDown => Err(CoordinatorError::SessionTornDown),
        }
    }

    /// Whether the coordinator has been started and not torn down
    pub fn is_started(&self) -> bool {
        matches!(self.slot, Slot::Running(_))
    }

    /// The running coordinator, if any
    pub fn handle(&self) -> Option<&CoordinatorHandle> {
        match &self.slot {
            Slot::Running(handle) => Some(handle),
            _ => None,
        }
    }

    /// Stop the coordinator and wait for it. `None` when it never started.
    ///
    /// A fatal evaluation failure that already happened is returned here.
    pub async fn teardown(&mut self) -> Result<Option<SessionSummary>, CoordinatorError> {
        match std::mem::replace(&mut self.slot, Slot::TornDown) {
            Slot::Running(handle) => {
                handle.shutdown();
                tracing::debug!("Maintenance session torn down");
                handle.join().await.map(Some)
            }
            Slot::Pending { .. } | Slot::TornDown => Ok(None),
        }
    }
}
