#![cfg(test)]
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use pnet::util::MacAddr;
use tokio::time::Instant;
use wolagent_common::WakeError;
use wolagent_common::config::{DisconnectAction, WaitPolicy};
use wolagent_common::network::target::WakeTarget;
use wolagent_core::progress::RecordingProgress;
use wolagent_core::reachability::COOLDOWN;
use wolagent_core::{CycleState, Launcher, WakeOrchestrator};
use wolagent_protocols::magic;

use crate::utils::{self, CapturedPackets, FakeLauncher, Journal};

struct Rig {
    journal: Journal,
    packets: CapturedPackets,
    progress: Arc<RecordingProgress>,
}

impl Rig {
    fn new() -> Self {
        Self {
            journal: Journal::default(),
            packets: CapturedPackets::default(),
            progress: Arc::new(RecordingProgress::default()),
        }
    }

    fn orchestrator(
        &self,
        broadcast: Option<&str>,
        action: DisconnectAction,
        launcher: Arc<dyn Launcher>,
        reachable: bool,
    ) -> WakeOrchestrator {
        let target = WakeTarget::parse("DE-AD-BE-EF-12-34", broadcast).unwrap();
        let policy = WaitPolicy::from_millis(50, 200).unwrap();
        WakeOrchestrator::new(target, policy, action, launcher)
            .with_sender(utils::sender(&self.journal, &self.packets))
            .with_waiter(utils::waiter(&self.journal, reachable))
            .with_progress(self.progress.clone())
    }
}

/// This test walks one full cycle against a known host: the exact magic
/// packet goes out, the host is probed, and only then the delegate runs.
#[tokio::test(start_paused = true)]
async fn wakes_probes_then_launches() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal).with_host("10.20.30.40").shared();
    let mut orchestrator =
        rig.orchestrator(Some("123.234.123.0"), DisconnectAction::None, launcher, true);

    orchestrator.launch().await.unwrap();

    assert_eq!(
        rig.journal.entries(),
        ["send 123.234.123.0:9", "probe 10.20.30.40", "launch"]
    );
    assert_eq!(*orchestrator.state(), CycleState::Active);

    let packets = rig.packets.all();
    assert_eq!(packets.len(), 1);
    let (destination, payload) = &packets[0];
    assert_eq!(*destination, SocketAddrV4::new(Ipv4Addr::new(123, 234, 123, 0), 9));

    let mut expected = vec![0xFF; 6];
    for _ in 0..16 {
        expected.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x12, 0x34]);
    }
    assert_eq!(*payload, expected);

    let mac = MacAddr::new(0xDE, 0xAD, 0xBE, 0xEF, 0x12, 0x34);
    assert_eq!(payload.as_slice(), magic::create_packet(mac).as_slice());

    let lines = rig.progress.lines();
    assert!(lines.contains(&"Inferred host name: 10.20.30.40".to_string()), "{lines:?}");
    assert!(lines.contains(&"Launching agent via fake".to_string()), "{lines:?}");
}

#[tokio::test(start_paused = true)]
async fn guesses_broadcast_from_inferred_host() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal).with_host("10.20.30.40").shared();
    let mut orchestrator = rig.orchestrator(None, DisconnectAction::None, launcher, true);

    orchestrator.launch().await.unwrap();

    assert_eq!(rig.journal.entries()[0], "send 10.20.30.255:9");
    assert_eq!(
        orchestrator.target().broadcast,
        Some(Ipv4Addr::new(10, 20, 30, 255))
    );
}

/// Without a host there is nothing to ping: the default broadcast is used
/// and the fixed cooldown replaces the reachability wait.
#[tokio::test(start_paused = true)]
async fn unknown_host_uses_default_broadcast_and_cooldown() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal).shared();
    let mut orchestrator = rig.orchestrator(None, DisconnectAction::None, launcher, true);

    let start = Instant::now();
    orchestrator.launch().await.unwrap();

    assert!(start.elapsed() >= COOLDOWN);
    assert_eq!(rig.journal.entries(), ["send 192.168.0.255:9", "launch"]);
    assert!(
        rig.progress
            .lines()
            .contains(&"Using static cooldown instead of pinging".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn transmission_failure_stops_the_cycle() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal).with_host("10.20.30.40").shared();
    let mut orchestrator = rig
        .orchestrator(Some("10.20.30.255"), DisconnectAction::None, launcher, true)
        .with_sender(utils::failing_sender(&rig.journal));

    let result = orchestrator.launch().await;

    assert!(matches!(result, Err(WakeError::Transmission { .. })), "{result:?}");
    assert!(!rig.journal.contains("probe"));
    assert!(!rig.journal.contains("launch"));
    assert!(matches!(orchestrator.state(), CycleState::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn timeout_never_reaches_the_delegate() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal)
        .with_host("10.20.30.40")
        .with_channel()
        .shared();
    let action = DisconnectAction::RunCommand {
        command: "poweroff".into(),
    };
    let mut orchestrator = rig.orchestrator(Some("10.20.30.255"), action, launcher, false);

    let start = Instant::now();
    let result = orchestrator.launch().await;

    assert!(matches!(result, Err(WakeError::Timeout { .. })), "{result:?}");
    assert!(start.elapsed() >= std::time::Duration::from_millis(200));
    assert!(!rig.journal.contains("launch"));

    // The delegate was never handed control, so there is nothing to run
    // remotely, but it is still told to disconnect.
    orchestrator.disconnect().await.unwrap();
    assert!(!rig.journal.contains("exec"));
    assert_eq!(rig.journal.entries().last().map(String::as_str), Some("disconnect"));
}

#[tokio::test(start_paused = true)]
async fn delegate_failure_propagates_unchanged() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal)
        .with_host("10.20.30.40")
        .failing()
        .shared();
    let mut orchestrator =
        rig.orchestrator(Some("10.20.30.255"), DisconnectAction::None, launcher, true);

    match orchestrator.launch().await {
        Err(WakeError::Delegate(e)) => assert_eq!(e.to_string(), "agent refused to start"),
        other => panic!("expected delegate error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn suspends_remote_before_disconnecting() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal)
        .with_host("10.20.30.40")
        .with_channel()
        .shared();
    let action = DisconnectAction::Suspend {
        as_superuser: true,
        ignore_active_sessions: true,
    };
    let mut orchestrator = rig.orchestrator(Some("10.20.30.255"), action, launcher, true);

    orchestrator.launch().await.unwrap();
    orchestrator.disconnect().await.unwrap();

    let entries = rig.journal.entries();
    assert_eq!(
        entries[entries.len() - 2..],
        ["exec sudo systemctl suspend -i", "disconnect"]
    );
    assert_eq!(*orchestrator.state(), CycleState::Done);
}

#[tokio::test(start_paused = true)]
async fn suspend_without_channel_still_disconnects() {
    let rig = Rig::new();
    let launcher = FakeLauncher::new(&rig.journal).with_host("10.20.30.40").shared();
    let action = DisconnectAction::Suspend {
        as_superuser: false,
        ignore_active_sessions: false,
    };
    let mut orchestrator = rig.orchestrator(Some("10.20.30.255"), action, launcher, true);

    orchestrator.launch().await.unwrap();
    orchestrator.disconnect().await.unwrap();

    assert!(!rig.journal.contains("exec"));
    assert!(rig.journal.contains("disconnect"));
    assert_eq!(*orchestrator.state(), CycleState::Done);
}
