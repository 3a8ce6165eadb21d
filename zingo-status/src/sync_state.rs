//! The blockchain sync state observed by wallet-side consumers.

use std::collections::BTreeSet;

use getset::{CopyGetters, Getters};

/// Conditions keeping the sync subsystem from making progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Impediment {
    /// Local storage is unavailable or full.
    Storage,
    /// No usable network connection.
    Network,
}

impl std::fmt::Display for Impediment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impediment::Storage => write!(f, "storage"),
            Impediment::Network => write!(f, "network"),
        }
    }
}

/// Snapshot of blockchain synchronization.
///
/// While `replaying` is set, historical blocks are still being reprocessed and wallet
/// state can not be considered current.
#[derive(Clone, Debug, PartialEq, Eq, CopyGetters, Getters)]
pub struct SyncState {
    /// Historical blocks are still being reprocessed
    #[getset(get_copy = "pub")]
    replaying: bool,
    /// Height of the best known chain tip
    #[getset(get_copy = "pub")]
    best_chain_height: Option<u32>,
    /// What currently keeps sync from progressing
    #[getset(get = "pub")]
    impediments: BTreeSet<Impediment>,
}

impl SyncState {
    /// A state that is still catching up with the chain.
    pub fn catching_up() -> Self {
        SyncState {
            replaying: true,
            best_chain_height: None,
            impediments: BTreeSet::new(),
        }
    }

    /// A state that has caught up with the chain.
    pub fn caught_up() -> Self {
        SyncState {
            replaying: false,
            best_chain_height: None,
            impediments: BTreeSet::new(),
        }
    }

    /// Record the height of the best known chain tip.
    pub fn with_best_chain_height(mut self, height: u32) -> Self {
        self.best_chain_height = Some(height);
        self
    }

    /// Record an impediment.
    pub fn with_impediment(mut self, impediment: Impediment) -> Self {
        self.impediments.insert(impediment);
        self
    }

    /// True once replay has finished and wallet state may be trusted.
    pub fn is_caught_up(&self) -> bool {
        !self.replaying
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::catching_up()
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.replaying {
            write!(f, "Replaying blockchain")?;
        } else {
            write!(f, "Caught up with blockchain")?;
        }
        if let Some(height) = self.best_chain_height {
            write!(f, " at height {}", height)?;
        }
        if !self.impediments.is_empty() {
            let names: Vec<String> = self.impediments.iter().map(|i| i.to_string()).collect();
            write!(f, " (impeded by {})", names.join(", "))?;
        }
        write!(f, ".")
    }
}

impl From<SyncState> for String {
    fn from(value: SyncState) -> Self {
        format!("{value}")
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    #[test]
    fn default_is_replaying() {
        let state = SyncState::default();
        assert!(state.replaying());
        assert!(!state.is_caught_up());
    }

    #[test_case(SyncState::catching_up(), "Replaying blockchain." ; "bare replay")]
    #[test_case(SyncState::caught_up().with_best_chain_height(2_500_000), "Caught up with blockchain at height 2500000." ; "with height")]
    #[test_case(
        SyncState::catching_up()
            .with_impediment(Impediment::Network)
            .with_impediment(Impediment::Storage),
        "Replaying blockchain (impeded by storage, network)." ;
        "impediments are ordered"
    )]
    fn display(state: SyncState, expected: &str) {
        assert_eq!(state.to_string(), expected);
    }

    #[test]
    fn impediments_do_not_affect_replay_flag() {
        let state = SyncState::caught_up().with_impediment(Impediment::Network);
        assert!(state.is_caught_up());
        assert_eq!(state.impediments().len(), 1);
    }
}
