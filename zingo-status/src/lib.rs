#![warn(missing_docs)]
//! Status primitives reported by the blockchain sync subsystem.

pub mod sync_state;
