#![cfg(test)]
use std::time::Duration;

use wolagent_common::config::WakeConfig;
use wolagent_core::{CycleState, Launcher, WakeOrchestrator};
use wolagent_plugins::ConnectorRegistry;

use crate::utils::{self, CapturedPackets, Journal};

fn exec_config(script: &str) -> WakeConfig {
    let json = format!(
        r#"{{
            "mac_address": "de:ad:be:ef:12:34",
            "broadcast_address": "10.0.0.255",
            "poll_interval_millis": 50,
            "timeout_millis": 1000,
            "disconnect_action": {{ "type": "run_command", "command": "poweroff" }},
            "connector": {{
                "kind": "exec",
                "program": "sh",
                "args": ["-c", "{script}"],
                "host": "127.0.0.1",
                "startup_grace_millis": 500
            }}
        }}"#
    );
    WakeConfig::from_json(&json).unwrap()
}

/// A config file all the way to a running local process and back.
#[cfg(unix)]
#[tokio::test]
async fn registry_built_exec_connector_runs_full_cycle() {
    let config = exec_config("sleep 30");
    let launcher = ConnectorRegistry::with_builtin()
        .build(config.connector.as_ref().unwrap())
        .unwrap();
    assert_eq!(launcher.name(), "exec");

    let journal = Journal::default();
    let packets = CapturedPackets::default();
    let mut orchestrator = WakeOrchestrator::from_config(&config, launcher.clone())
        .unwrap()
        .with_sender(utils::sender(&journal, &packets))
        .with_waiter(utils::waiter(&journal, true));

    orchestrator.launch().await.unwrap();
    assert_eq!(journal.entries(), ["send 10.0.0.255:9", "probe 127.0.0.1"]);
    assert_eq!(*orchestrator.state(), CycleState::Active);

    let still_running =
        tokio::time::timeout(Duration::from_millis(100), launcher.finished()).await;
    assert!(still_running.is_err(), "the session ended on its own");

    // exec offers no remote channel: the command is skipped, not fatal.
    orchestrator.disconnect().await.unwrap();
    assert_eq!(*orchestrator.state(), CycleState::Done);

    tokio::time::timeout(Duration::from_secs(5), launcher.finished())
        .await
        .unwrap_or_else(|_| panic!("finished() should not hang after disconnect"));
}

#[cfg(unix)]
#[tokio::test]
async fn failing_exec_command_fails_the_launch() {
    let config = exec_config("exit 3");
    let launcher = ConnectorRegistry::with_builtin()
        .build(config.connector.as_ref().unwrap())
        .unwrap();

    let journal = Journal::default();
    let mut orchestrator = WakeOrchestrator::from_config(&config, launcher)
        .unwrap()
        .with_sender(utils::sender(&journal, &CapturedPackets::default()))
        .with_waiter(utils::waiter(&journal, true));

    let result = orchestrator.launch().await;
    assert!(result.is_err());
    assert!(matches!(orchestrator.state(), CycleState::Failed(_)));
}

#[test]
fn unknown_connector_kind_is_rejected() {
    let config = WakeConfig::from_json(
        r#"{ "mac_address": "de:ad:be:ef:12:34", "connector": { "kind": "telnet" } }"#,
    )
    .unwrap();
    let err = ConnectorRegistry::with_builtin()
        .build(config.connector.as_ref().unwrap())
        .err()
        .unwrap();
    assert!(err.to_string().contains("exec, ssh"), "{err}");
}
