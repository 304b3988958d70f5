use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use wolagent_common::WakeError;
use wolagent_common::config::WakeConfig;
use wolagent_core::{Launcher, WakeOrchestrator};
use wolagent_plugins::ConnectorRegistry;

use crate::commands::RunArgs;
use crate::terminal::print::{self, TerminalProgress};

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load(&args)?;
    let connector = config
        .connector
        .as_ref()
        .context("config has no \"connector\" to launch")?;

    let registry = ConnectorRegistry::with_builtin();
    let launcher = registry.build(connector)?;

    let mut orchestrator = WakeOrchestrator::from_config(&config, launcher)?
        .with_progress(Arc::new(TerminalProgress));
    print::aligned_line("Target", orchestrator.target().to_string(), 9);
    print::aligned_line("Connector", orchestrator.launcher().name(), 9);
    print::fat_separator();

    let launched: Result<(), WakeError> = tokio::select! {
        result = orchestrator.launch() => result,
        _ = tokio::signal::ctrl_c() => Err(WakeError::Interrupted),
    };

    if matches!(launched, Err(WakeError::Interrupted)) {
        orchestrator.interrupt();
    }

    if launched.is_ok() {
        let launcher = Arc::clone(orchestrator.launcher());
        tokio::select! {
            _ = launcher.finished() => info!("{} finished", launcher.name()),
            _ = tokio::signal::ctrl_c() => info!("Interrupted, disconnecting"),
        }
    }

    if let Err(e) = orchestrator.disconnect().await {
        warn!("Disconnect failed: {e}");
    }
    print::print_status(format!("Cycle ended in state {}", orchestrator.state()));

    launched.map_err(|e| {
        error!("Launch failed: {e}");
        e.into()
    })
}

/// The config file with command-line overrides applied on top.
fn load(args: &RunArgs) -> anyhow::Result<WakeConfig> {
    let mut config = WakeConfig::load(&args.config)?;
    if let Some(mac) = &args.mac {
        config.mac_address = mac.clone();
    }
    if let Some(broadcast) = &args.broadcast {
        config.broadcast_address = Some(broadcast.clone());
    }
    if let Some(interval) = args.timing.interval_ms {
        config.poll_interval_millis = interval;
    }
    if let Some(timeout) = args.timing.timeout_ms {
        config.timeout_millis = timeout;
    }
    config.validate()?;
    Ok(config)
}
