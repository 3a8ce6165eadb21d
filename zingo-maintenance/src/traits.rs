//! Traits for interfacing a wallet with the maintenance evaluator

use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};

use crate::error::RoutineError;

/// User-supplied secret material unlocking a wallet's encrypted keys
#[derive(Debug)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a password or passphrase
    pub fn new(secret: impl Into<String>) -> Self {
        Credential(SecretString::new(secret.into()))
    }

    /// Access the secret. Callers must not log or persist it.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// A wallet able to run its structural maintenance, e.g. deterministic key chain upgrades.
pub trait MaintainableWallet: Send + Sync + 'static {
    /// Unit of work the routine performs, e.g. a rotation transaction
    type Action: Send + 'static;

    /// Run the maintenance routine.
    ///
    /// With `commit == false` nothing is committed and the returned actions are the ones the
    /// routine would perform. An empty list means no maintenance is needed.
    /// Must return [`RoutineError::CredentialRequired`] when the work needs keys that are
    /// encrypted and `credential` is `None`.
    fn do_maintenance(
        &self,
        credential: Option<Credential>,
        commit: bool,
    ) -> BoxFuture<'_, Result<Vec<Self::Action>, RoutineError>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn credential_is_redacted_in_debug() {
        let credential = Credential::new("hunter2");
        assert_eq!(credential.expose(), "hunter2");
        assert!(!format!("{:?}", credential).contains("hunter2"));
    }
}
