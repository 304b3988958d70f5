//! Shared domain types for waking a machine and waiting for it.
//!
//! Everything in here is pure data plus validation: no sockets, no timers.
//! The [`error::WakeError`] taxonomy is shared by every other crate in the
//! workspace.

pub mod config;
pub mod error;
pub mod network;

pub use error::WakeError;
