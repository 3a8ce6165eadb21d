//! The user facing advisory and the seam through which hosts display it

use getset::CopyGetters;

/// Why maintenance is being advised
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisoryReason {
    /// The dry run found work to do
    MaintenanceNecessary,
    /// The routine needs the user's credential before it can tell
    CredentialRequired,
}

/// Advisory handed to the presenter
#[derive(Clone, Copy, Debug, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Advisory {
    /// Why maintenance is being advised
    reason: AdvisoryReason,
    /// Number of actions the dry run reported, when known
    pending_actions: Option<usize>,
}

impl Advisory {
    /// Create an advisory
    pub fn new(reason: AdvisoryReason, pending_actions: Option<usize>) -> Self {
        Advisory {
            reason,
            pending_actions,
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.reason, self.pending_actions) {
            (AdvisoryReason::MaintenanceNecessary, Some(n)) => write!(
                f,
                "Your wallet needs maintenance ({} pending action{}).",
                n,
                if n == 1 { "" } else { "s" }
            ),
            (AdvisoryReason::MaintenanceNecessary, None) => {
                write!(f, "Your wallet needs maintenance.")
            }
            (AdvisoryReason::CredentialRequired, _) => write!(
                f,
                "Your wallet needs maintenance. Your password is required to perform it."
            ),
        }
    }
}

/// Displays the advisory. Fire and forget: presentation failures are the presenter's concern.
///
/// A panic in [`AdvisoryPresenter::present`] is caught and logged by the coordinator. The
/// advisory still counts as shown.
pub trait AdvisoryPresenter: Send + Sync + 'static {
    /// Show `advisory` to the user
    fn present(&self, advisory: Advisory);
}

impl<F> AdvisoryPresenter for F
where
    F: Fn(Advisory) + Send + Sync + 'static,
{
    fn present(&self, advisory: Advisory) {
        self(advisory)
    }
}

/// Writes the advisory to the log, for hosts without a UI.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPresenter;

impl AdvisoryPresenter for LogPresenter {
    fn present(&self, advisory: Advisory) {
        tracing::warn!("{}", advisory);
    }
}
