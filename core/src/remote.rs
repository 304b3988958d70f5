use tracing::{info, warn};
use wolagent_common::WakeError;

use crate::delegate::RemoteChannel;

/// Dispatches a single command over an established channel.
///
/// A non-zero exit status is only logged; disconnecting must not depend on
/// what the remote command did.
pub async fn run_command(
    channel: Option<&dyn RemoteChannel>,
    command: &str,
) -> Result<(), WakeError> {
    let channel = channel.ok_or(WakeError::ChannelUnavailable)?;

    info!("Executing remote command: {command}");
    match channel.execute(command).await? {
        Some(0) | None => {}
        Some(code) => warn!("Remote command '{command}' exited with status {code}"),
    }
    Ok(())
}
