#![warn(missing_docs)]
//! Zingo wallet maintenance advisory
//!
//! Watches wallet and blockchain sync state, checks once the chain has caught up whether the
//! wallet needs maintenance, and surfaces the advisory to the user at most once per session.
//!
//! Entrypoint: [`crate::session::MaintenanceSession`], or [`crate::coordinator::Coordinator::spawn`] directly

pub mod coordinator;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod observable;
pub mod presenter;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "test-elevation"))]
pub mod testutils;

pub use zingo_status::sync_state::SyncState;
pub use zingoconfig::MaintenanceConfig;
