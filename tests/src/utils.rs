//! Fakes shared by the integration tests. Every fake writes to the same
//! journal so tests can assert on the order things happened in.

use std::io;
use std::net::{IpAddr, SocketAddrV4};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wolagent_core::reachability::{Prober, ReachabilityWaiter};
use wolagent_core::wake::{DatagramTransport, MagicPacketSender, TransportFactory};
use wolagent_core::{HostSource, Launcher, RemoteChannel};

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries().iter().any(|e| e.starts_with(prefix))
    }
}

/// Records every datagram instead of sending it.
#[derive(Clone, Default)]
pub struct CapturedPackets(Arc<Mutex<Vec<(SocketAddrV4, Vec<u8>)>>>);

impl CapturedPackets {
    pub fn all(&self) -> Vec<(SocketAddrV4, Vec<u8>)> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeFactory {
    journal: Journal,
    packets: CapturedPackets,
    fail: bool,
}

struct FakeTransport {
    journal: Journal,
    packets: CapturedPackets,
    fail: bool,
}

#[async_trait]
impl DatagramTransport for FakeTransport {
    async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV4) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "broadcast refused"));
        }
        self.journal.push(format!("send {destination}"));
        self.packets.0.lock().unwrap().push((destination, payload.to_vec()));
        Ok(payload.len())
    }
}

#[async_trait]
impl TransportFactory for FakeFactory {
    async fn open(&self) -> io::Result<Box<dyn DatagramTransport>> {
        Ok(Box::new(FakeTransport {
            journal: self.journal.clone(),
            packets: self.packets.clone(),
            fail: self.fail,
        }))
    }
}

pub fn sender(journal: &Journal, packets: &CapturedPackets) -> MagicPacketSender {
    MagicPacketSender::new(Arc::new(FakeFactory {
        journal: journal.clone(),
        packets: packets.clone(),
        fail: false,
    }))
}

pub fn failing_sender(journal: &Journal) -> MagicPacketSender {
    MagicPacketSender::new(Arc::new(FakeFactory {
        journal: journal.clone(),
        packets: CapturedPackets::default(),
        fail: true,
    }))
}

/// Answers every probe with `reachable`.
pub struct FixedProber {
    journal: Journal,
    reachable: bool,
}

#[async_trait]
impl Prober for FixedProber {
    async fn probe(&self, addr: IpAddr, _timeout: Duration) -> anyhow::Result<bool> {
        self.journal.push(format!("probe {addr}"));
        Ok(self.reachable)
    }
}

pub fn waiter(journal: &Journal, reachable: bool) -> ReachabilityWaiter {
    ReachabilityWaiter::new(Arc::new(FixedProber {
        journal: journal.clone(),
        reachable,
    }))
}

pub struct FakeChannel(Journal);

#[async_trait]
impl RemoteChannel for FakeChannel {
    async fn execute(&self, command: &str) -> io::Result<Option<i32>> {
        self.0.push(format!("exec {command}"));
        Ok(Some(0))
    }
}

/// A delegate whose capabilities are switched on per test.
pub struct FakeLauncher {
    pub journal: Journal,
    pub host: Option<String>,
    pub with_channel: bool,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            host: None,
            with_channel: false,
            fail_launch: false,
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn with_channel(mut self) -> Self {
        self.with_channel = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn shared(self) -> Arc<dyn Launcher> {
        Arc::new(self)
    }
}

impl HostSource for FakeLauncher {
    fn host(&self) -> anyhow::Result<Option<String>> {
        Ok(self.host.clone())
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    fn name(&self) -> &str {
        "fake"
    }

    async fn launch(&self) -> anyhow::Result<()> {
        self.journal.push("launch");
        if self.fail_launch {
            anyhow::bail!("agent refused to start");
        }
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        self.journal.push("disconnect");
        Ok(())
    }

    fn host_source(&self) -> Option<&dyn HostSource> {
        Some(self)
    }

    fn channel(&self) -> Option<Arc<dyn RemoteChannel>> {
        self.with_channel
            .then(|| Arc::new(FakeChannel(self.journal.clone())) as Arc<dyn RemoteChannel>)
    }
}
