//! Concrete delegate connectors and the registry that builds them from
//! configuration.

pub mod exec;
pub mod process;
pub mod registry;
pub mod ssh;

pub use registry::ConnectorRegistry;
