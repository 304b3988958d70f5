use std::time::Duration;

/// Failures a wake/launch/teardown cycle can run into.
///
/// Which of these are fatal depends on the phase they happen in; the
/// orchestrator recovers from `UnresolvableHost` and from everything raised
/// during teardown.
#[derive(Debug, thiserror::Error)]
pub enum WakeError {
    #[error("invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to transmit magic packet to {destination}: {source}")]
    Transmission {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to resolve '{host}' to an IPv4 address: {reason}")]
    UnresolvableHost { host: String, reason: String },

    #[error("{host} did not become reachable within {}ms", .timeout.as_millis())]
    Timeout { host: String, timeout: Duration },

    #[error("no established channel to the remote machine")]
    ChannelUnavailable,

    #[error("remote command failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("reachability wait was interrupted")]
    Interrupted,

    #[error(transparent)]
    Delegate(anyhow::Error),
}

impl WakeError {
    pub fn invalid_address(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidAddress {
            value: value.into(),
            reason,
        }
    }
}
