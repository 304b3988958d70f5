//! # Target Configuration
//!
//! The on-disk description of one machine to wake, the way to wait for it and
//! what to do with it before disconnecting. Files are JSON:
//!
//! ```json
//! {
//!   "mac_address": "DE-AD-BE-EF-12-34",
//!   "broadcast_address": "192.168.1.255",
//!   "poll_interval_millis": 2000,
//!   "timeout_millis": 60000,
//!   "disconnect_action": { "type": "suspend", "as_superuser": true, "ignore_active_sessions": false },
//!   "connector": { "kind": "ssh", "host": "build-box.lan", "command": "./agent.sh" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WakeError;
use crate::network::target::WakeTarget;

pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 2_000;
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 60_000;

const SUSPEND_COMMAND: &str = "systemctl suspend";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WakeConfig {
    pub mac_address: String,
    #[serde(default)]
    pub broadcast_address: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_millis: u64,
    #[serde(default = "default_timeout")]
    pub timeout_millis: u64,
    #[serde(default)]
    pub disconnect_action: DisconnectAction,
    #[serde(default)]
    pub connector: Option<ConnectorConfig>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MILLIS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MILLIS
}

impl WakeConfig {
    pub fn new(mac_address: impl Into<String>) -> Self {
        Self {
            mac_address: mac_address.into(),
            broadcast_address: None,
            poll_interval_millis: DEFAULT_POLL_INTERVAL_MILLIS,
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
            disconnect_action: DisconnectAction::None,
            connector: None,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field without touching the network.
    pub fn validate(&self) -> Result<(), WakeError> {
        self.target()?;
        self.wait_policy()?;
        Ok(())
    }

    pub fn target(&self) -> Result<WakeTarget, WakeError> {
        WakeTarget::parse(&self.mac_address, self.broadcast_address.as_deref())
    }

    pub fn wait_policy(&self) -> Result<WaitPolicy, WakeError> {
        WaitPolicy::from_millis(self.poll_interval_millis, self.timeout_millis)
    }
}

/// How often to probe a waking machine and how long to keep trying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    poll_interval: Duration,
    timeout: Duration,
}

impl WaitPolicy {
    pub fn from_millis(poll_interval_millis: u64, timeout_millis: u64) -> Result<Self, WakeError> {
        if poll_interval_millis == 0 {
            return Err(WakeError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        if timeout_millis == 0 {
            return Err(WakeError::InvalidConfig(
                "timeout must be greater than zero".into(),
            ));
        }
        if poll_interval_millis > timeout_millis {
            tracing::warn!(
                "Poll interval ({poll_interval_millis}ms) is longer than the timeout ({timeout_millis}ms)"
            );
        }
        Ok(Self {
            poll_interval: Duration::from_millis(poll_interval_millis),
            timeout: Duration::from_millis(timeout_millis),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MILLIS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MILLIS),
        }
    }
}

/// What to run on the remote machine right before disconnecting from it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisconnectAction {
    #[default]
    None,
    RunCommand { command: String },
    Suspend {
        #[serde(default)]
        as_superuser: bool,
        #[serde(default)]
        ignore_active_sessions: bool,
    },
}

impl DisconnectAction {
    /// The command line to execute remotely, if any.
    pub fn command(&self) -> Option<String> {
        match self {
            DisconnectAction::None => None,
            DisconnectAction::RunCommand { command } => {
                let command = command.trim();
                (!command.is_empty()).then(|| command.to_string())
            }
            DisconnectAction::Suspend {
                as_superuser,
                ignore_active_sessions,
            } => {
                let mut command = String::from(SUSPEND_COMMAND);
                if *as_superuser {
                    command.insert_str(0, "sudo ");
                }
                if *ignore_active_sessions {
                    command.push_str(" -i");
                }
                Some(command)
            }
        }
    }
}

/// Which delegate connector to build, plus its connector-specific options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub kind: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}
