//! # wolagent core
//!
//! Wakes a sleeping machine, waits for it to come up and then hands over to
//! a delegate connector; on teardown, optionally runs a command (such as a
//! suspend) on the remote machine first.
//!
//! * [`wake`]: magic packet transmission.
//! * [`inference`]: target host and broadcast address discovery.
//! * [`reachability`]: the bounded poll loop.
//! * [`remote`]: pre-disconnect remote commands.
//! * [`orchestrator`]: the state machine tying it all together.

pub mod delegate;
pub mod inference;
pub mod network;
pub mod orchestrator;
pub mod progress;
pub mod reachability;
pub mod remote;
pub mod wake;

pub use delegate::{Delegate, HostSource, Launcher, RemoteChannel};
pub use orchestrator::{CycleState, WakeOrchestrator};
