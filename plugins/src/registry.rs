use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::{Map, Value};
use wolagent_common::config::ConnectorConfig;
use wolagent_core::Launcher;

use crate::{exec::ExecConnector, ssh::SshConnector};

pub type ConnectorFactory = fn(&Map<String, Value>) -> anyhow::Result<Arc<dyn Launcher>>;

/// Maps a connector `kind` from configuration to its constructor.
///
/// Built once at startup and passed to whoever needs it.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    factories: BTreeMap<String, ConnectorFactory>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ssh` and `exec`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("ssh", SshConnector::from_options);
        registry.register("exec", ExecConnector::from_options);
        registry
    }

    pub fn register(&mut self, kind: &str, factory: ConnectorFactory) {
        self.factories.insert(kind.to_ascii_lowercase(), factory);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, config: &ConnectorConfig) -> anyhow::Result<Arc<dyn Launcher>> {
        let factory = self
            .factories
            .get(&config.kind.to_ascii_lowercase())
            .ok_or_else(|| {
                anyhow!(
                    "unknown connector kind '{}' (known: {})",
                    config.kind,
                    self.kinds().collect::<Vec<_>>().join(", ")
                )
            })?;
        factory(&config.options)
    }
}
