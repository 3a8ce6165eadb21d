//! Tools to facilitate mocks for testing
//! do not compile test-elevation feature for production.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::{watch, Notify};

use crate::coordinator::{CoordinatorHandle, CoordinatorState};
use crate::error::RoutineError;
use crate::presenter::{Advisory, AdvisoryPresenter};
use crate::traits::{Credential, MaintainableWallet};

macro_rules! build_method {
    ($name:ident, $localtype:ty) => {
        #[doc = concat!("Set the ", stringify!($name), " field of the builder.")]
        pub fn $name(mut self, $name: $localtype) -> Self {
            self.$name = Some($name);
            self
        }
    };
}
macro_rules! build_method_push {
    ($name:ident, $localtype:ty) => {
        #[doc = concat!("Push to the ", stringify!($name), " field of the builder.")]
        pub fn $name(mut self, $name: $localtype) -> Self {
            self.$name.push($name);
            self
        }
    };
}

/// What one call of the mock maintenance routine returns
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedResult {
    /// That many pending actions
    Actions(usize),
    /// [`RoutineError::CredentialRequired`]
    CredentialRequired,
    /// [`RoutineError::Failed`] with this message
    Fail(String),
}

impl ScriptedResult {
    fn into_routine(self) -> Result<Vec<MockAction>, RoutineError> {
        match self {
            ScriptedResult::Actions(n) => Ok((0..n).map(MockAction).collect()),
            ScriptedResult::CredentialRequired => Err(RoutineError::CredentialRequired),
            ScriptedResult::Fail(message) => Err(RoutineError::failed(message)),
        }
    }
}

/// Action returned by [`MockWallet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockAction(pub usize);

/// Arguments of the latest maintenance call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaintenanceCall {
    /// A credential was passed
    pub credential_supplied: bool,
    /// The commit flag
    pub commit: bool,
}

/// A wallet whose maintenance routine follows a script.
///
/// Once the script runs out every call reports nothing to do.
#[derive(Debug)]
pub struct MockWallet {
    script: Mutex<VecDeque<ScriptedResult>>,
    hold: Option<Arc<Notify>>,
    calls: watch::Sender<usize>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_call: Mutex<Option<MaintenanceCall>>,
}

impl MockWallet {
    /// Instantiate an empty builder.
    pub fn builder() -> MockWalletBuilder {
        MockWalletBuilder::new()
    }

    /// Number of routine calls started so far
    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Highest number of calls ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Arguments of the latest call
    pub fn last_call(&self) -> Option<MaintenanceCall> {
        *self.last_call.lock().unwrap()
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.calls.subscribe();
        calls.wait_for(|started| *started >= n).await.unwrap();
    }

    /// Add results to the end of the script
    pub fn extend_script(&self, results: impl IntoIterator<Item = ScriptedResult>) {
        self.script.lock().unwrap().extend(results);
    }
}

impl MaintainableWallet for MockWallet {
    type Action = MockAction;

    fn do_maintenance(
        &self,
        credential: Option<Credential>,
        commit: bool,
    ) -> BoxFuture<'_, Result<Vec<MockAction>, RoutineError>> {
        Box::pin(async move {
            *self.last_call.lock().unwrap() = Some(MaintenanceCall {
                credential_supplied: credential.is_some(),
                commit,
            });
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
            self.calls.send_modify(|calls| *calls += 1);

            if let Some(hold) = &self.hold {
                hold.notified().await;
            }

            let result = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ScriptedResult::Actions(0));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result.into_routine()
        })
    }
}

/// A struct to build a [`MockWallet`] from scratch.
#[derive(Clone, Debug, Default)]
pub struct MockWalletBuilder {
    script: Vec<ScriptedResult>,
    hold: Option<Arc<Notify>>,
}

impl MockWalletBuilder {
    /// Instantiate an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    // Methods to set each field
    build_method_push!(script, ScriptedResult);
    build_method!(hold, Arc<Notify>);

    /// Build the wallet.
    pub fn build(self) -> MockWallet {
        let (calls, _) = watch::channel(0);
        MockWallet {
            script: Mutex::new(self.script.into()),
            hold: self.hold,
            calls,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }
}

/// Presenter that records every advisory
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    presented: Arc<Mutex<Vec<Advisory>>>,
}

impl RecordingPresenter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything presented so far
    pub fn presented(&self) -> Vec<Advisory> {
        self.presented.lock().unwrap().clone()
    }

    /// Number of presentations
    pub fn count(&self) -> usize {
        self.presented.lock().unwrap().len()
    }
}

impl AdvisoryPresenter for RecordingPresenter {
    fn present(&self, advisory: Advisory) {
        self.presented.lock().unwrap().push(advisory);
    }
}

/// Wait until the coordinator reaches `wanted`
pub async fn wait_for_state(handle: &CoordinatorHandle, wanted: CoordinatorState) {
    let mut state = handle.watch_state();
    state
        .wait_for(|current| *current == wanted)
        .await
        .expect("coordinator ended before reaching the wanted state");
}
