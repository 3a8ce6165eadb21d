#![forbid(unsafe_code)]
//! Scenario harness for the maintenance coordinator integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use zingo_maintenance::coordinator::{
    Coordinator, CoordinatorHandle, CoordinatorState, SessionSummary,
};
use zingo_maintenance::error::CoordinatorError;
use zingo_maintenance::observable::StateObservable;
use zingo_maintenance::testutils::{wait_for_state, MockWallet, RecordingPresenter, ScriptedResult};
use zingo_status::sync_state::SyncState;
use zingoconfig::MaintenanceConfig;

pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Both state sources, a recording presenter and the coordinator wired to them.
pub struct Harness {
    pub wallet_source: StateObservable<Arc<MockWallet>>,
    pub sync_source: StateObservable<SyncState>,
    pub presenter: RecordingPresenter,
    pub handle: CoordinatorHandle,
}

impl Harness {
    pub fn start() -> Self {
        Self::start_with(&MaintenanceConfig::default())
    }

    pub fn start_with(config: &MaintenanceConfig) -> Self {
        let wallet_source = StateObservable::new();
        let sync_source = StateObservable::new();
        let presenter = RecordingPresenter::new();
        let handle = Coordinator::spawn(
            config,
            wallet_source.subscribe(),
            sync_source.subscribe(),
            presenter.clone(),
        );
        Harness {
            wallet_source,
            sync_source,
            presenter,
            handle,
        }
    }

    /// Start with a wallet loaded and sync caught up, so the first evaluation begins on
    /// startup with no change pending.
    pub fn start_loaded(wallet: &Arc<MockWallet>) -> Self {
        let wallet_source = StateObservable::with_value(wallet.clone());
        let sync_source = StateObservable::with_value(SyncState::caught_up());
        let presenter = RecordingPresenter::new();
        let handle = Coordinator::spawn(
            &MaintenanceConfig::default(),
            wallet_source.subscribe(),
            sync_source.subscribe(),
            presenter.clone(),
        );
        Harness {
            wallet_source,
            sync_source,
            presenter,
            handle,
        }
    }

    pub fn load_wallet(&self, wallet: &Arc<MockWallet>) {
        self.wallet_source.publish(wallet.clone());
    }

    pub fn sync(&self, state: SyncState) {
        self.sync_source.publish(state);
    }

    pub async fn wait_for(&self, state: CoordinatorState) {
        tokio::time::timeout(JOIN_TIMEOUT, wait_for_state(&self.handle, state))
            .await
            .expect("coordinator did not reach the wanted state");
    }

    /// Close both sources, as the host does on teardown of the wallet and sync subsystems,
    /// and wait for the coordinator to drain and end.
    pub async fn close_and_join(self) -> (Result<SessionSummary, CoordinatorError>, RecordingPresenter) {
        let Harness {
            wallet_source,
            sync_source,
            presenter,
            handle,
        } = self;
        drop(wallet_source);
        drop(sync_source);
        (join(handle).await, presenter)
    }
}

pub async fn join(handle: CoordinatorHandle) -> Result<SessionSummary, CoordinatorError> {
    tokio::time::timeout(JOIN_TIMEOUT, handle.join())
        .await
        .expect("coordinator did not end")
}

/// A wallet whose routine answers `results` in order
pub fn scripted_wallet(results: impl IntoIterator<Item = ScriptedResult>) -> Arc<MockWallet> {
    let wallet = MockWallet::builder().build();
    wallet.extend_script(results);
    Arc::new(wallet)
}

/// A wallet whose every routine call waits for a permit on the returned [`Notify`]
pub fn held_wallet(results: impl IntoIterator<Item = ScriptedResult>) -> (Arc<MockWallet>, Arc<Notify>) {
    let hold = Arc::new(Notify::new());
    let wallet = MockWallet::builder().hold(hold.clone()).build();
    wallet.extend_script(results);
    (Arc::new(wallet), hold)
}
