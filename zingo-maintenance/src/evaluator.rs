//! Dry-run maintenance check and classification of its result

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{EvaluationError, RoutineError};
use crate::presenter::AdvisoryReason;
use crate::traits::MaintainableWallet;

/// Result of one evaluation. Produced fresh per evaluation and never persisted.
#[derive(Debug)]
pub enum MaintenanceOutcome {
    /// The routine would perform `pending_actions` actions
    Necessary {
        /// Number of actions reported by the dry run
        pending_actions: usize,
    },
    /// The routine reported nothing to do
    NotNecessary,
    /// The routine can not tell without the user's credential. Treated as necessary.
    RequiresCredential,
    /// Any other failure. Fatal to the session.
    Failed(EvaluationError),
}

impl MaintenanceOutcome {
    /// Classify a routine result
    pub fn from_routine<A>(result: Result<Vec<A>, RoutineError>) -> Self {
        match result {
            Ok(actions) if actions.is_empty() => MaintenanceOutcome::NotNecessary,
            Ok(actions) => MaintenanceOutcome::Necessary {
                pending_actions: actions.len(),
            },
            Err(RoutineError::CredentialRequired) => MaintenanceOutcome::RequiresCredential,
            Err(RoutineError::Failed(cause)) => {
                MaintenanceOutcome::Failed(EvaluationError::Routine(cause))
            }
        }
    }

    /// Reason to show for this outcome, if it recommends an advisory
    pub fn advisory_reason(&self) -> Option<AdvisoryReason> {
        match self {
            MaintenanceOutcome::Necessary { .. } => Some(AdvisoryReason::MaintenanceNecessary),
            MaintenanceOutcome::RequiresCredential => Some(AdvisoryReason::CredentialRequired),
            MaintenanceOutcome::NotNecessary | MaintenanceOutcome::Failed(_) => None,
        }
    }

    /// Number of pending actions, when the dry run reported them
    pub fn pending_actions(&self) -> Option<usize> {
        match self {
            MaintenanceOutcome::Necessary { pending_actions } => Some(*pending_actions),
            _ => None,
        }
    }

    /// The boolean necessity signal. Failures are returned, not absorbed.
    pub fn recommends_advisory(self) -> Result<bool, EvaluationError> {
        match self {
            MaintenanceOutcome::Necessary { .. } | MaintenanceOutcome::RequiresCredential => {
                Ok(true)
            }
            MaintenanceOutcome::NotNecessary => Ok(false),
            MaintenanceOutcome::Failed(error) => Err(error),
        }
    }
}

impl std::fmt::Display for MaintenanceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceOutcome::Necessary { pending_actions } => {
                write!(f, "maintenance necessary, {} pending", pending_actions)
            }
            MaintenanceOutcome::NotNecessary => write!(f, "maintenance not necessary"),
            MaintenanceOutcome::RequiresCredential => {
                write!(f, "maintenance requires a credential")
            }
            MaintenanceOutcome::Failed(error) => write!(f, "{}", error),
        }
    }
}

/// Runs the wallet's maintenance routine in dry-run mode and classifies the result.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaintenanceEvaluator;

impl MaintenanceEvaluator {
    /// Evaluate `wallet` without supplying a credential and without committing anything.
    pub async fn evaluate<W>(&self, wallet: &W) -> MaintenanceOutcome
    where
        W: MaintainableWallet + ?Sized,
    {
        MaintenanceOutcome::from_routine(wallet.do_maintenance(None, false).await)
    }

    /// Evaluate on its own task so the caller's context never waits on key derivation.
    ///
    /// The task holds the wallet handle until the routine completes. Dropping the returned
    /// handle detaches the task; its result is then discarded.
    pub fn spawn<W>(&self, wallet: Arc<W>) -> JoinHandle<MaintenanceOutcome>
    where
        W: MaintainableWallet,
    {
        let evaluator = *self;
        tokio::spawn(async move { evaluator.evaluate(wallet.as_ref()).await })
    }
}
