//! Top level error module for the crate

/// Boxed cause carried by routine failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a wallet's maintenance routine
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    /// Keys are encrypted and the routine can not proceed without the user's credential
    #[error("Maintenance requires a credential.")]
    CredentialRequired,
    /// Any other failure of the routine
    #[error("Maintenance routine failed. {0}")]
    Failed(#[source] BoxError),
}

impl RoutineError {
    /// Wrap any error as a routine failure
    pub fn failed<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        RoutineError::Failed(cause.into())
    }
}

/// Fatal failure of a maintenance evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The wallet's maintenance routine failed for a reason other than a missing credential
    #[error("Maintenance evaluation failed. {0}")]
    Routine(#[source] BoxError),
    /// The evaluation task ended without producing an outcome
    #[error("Maintenance evaluation failed. Evaluation task panicked: {0}")]
    Panicked(String),
}

/// Top level error enum for a maintenance session
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Errors associated with evaluating the wallet
    #[error("Coordinator error. {0}")]
    Evaluation(#[from] EvaluationError),
    /// The coordinator task itself ended abnormally
    #[error("Coordinator task ended abnormally: {0}")]
    Aborted(String),
    /// The session was torn down and can not be started again
    #[error("Maintenance session has been torn down.")]
    SessionTornDown,
}

/// The publishing side of a state source was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("State source closed.")]
pub struct SourceClosed;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn evaluation_errors_are_tagged() {
        let error = CoordinatorError::from(EvaluationError::Routine("corrupt key chain".into()));
        assert_eq!(
            error.to_string(),
            "Coordinator error. Maintenance evaluation failed. corrupt key chain"
        );
    }

    #[test]
    fn routine_cause_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let error = EvaluationError::Routine(Box::new(io));
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "disk gone");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }
}
