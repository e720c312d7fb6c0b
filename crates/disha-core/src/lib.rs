//! Domain layer for the Disha placement-guidance portal client.
//!
//! This crate is pure state and decisions: the session model, the
//! navigation guard, the chat transcript state machine, and the
//! notification feed. It performs no I/O; persistence lives in
//! `disha-infrastructure` and networking in `disha-client`.

pub mod error;
pub mod feed;
pub mod guard;
pub mod session;
pub mod transcript;

// Re-export common error type
pub use error::DishaError;
