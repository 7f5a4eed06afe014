//! Shared fakes for the agent integration tests.
//!
//! Every fake counts the calls that reach it, so tests can assert that a
//! path did (or did not) touch a piece of hardware.

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jig_agent::error::HardwareError;
use jig_agent::ethernet::EthernetModule;
use jig_agent::hardware::{
    AddressSource, BandwidthTool, EthernetHardware, LinkPort, MacAllocator, OtpMemory,
};
use jig_core::config::EthernetConfig;
use jig_core::retry::RetryPolicy;
use jig_core::types::Mbps;

pub const GOOD_RECORD: &str = "6b1c5a2e-1f3d-4a7b-9c0d-001e06a1b2c3";
pub const GOOD_SUFFIX: &str = "A1B2C3";
pub const OTP_LEN: usize = 64;

/// A complete `iperf3 -c` run reporting `sender` / `receiver` rates.
pub fn iperf_output(sender: Mbps, receiver: Mbps) -> String {
    format!(
        "Connecting to host 192.168.20.45, port 5201\n\
         [ ID] Interval           Transfer     Bitrate         Retr\n\
         [  5]   0.00-1.00   sec   112 MBytes   {sender} Mbits/sec    0             sender\n\
         [  5]   0.00-1.04   sec   110 MBytes   {receiver} Mbits/sec                  receiver\n\
         \n\
         iperf Done.\n"
    )
}

pub const BUSY_OUTPUT: &str =
    "iperf3: error - the server is busy running a test. try again later\n";

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

struct LinkInner {
    speed: Mbps,
    pending: Option<Mbps>,
    polls_left: u32,
}

/// Link whose forced speed takes effect after a fixed number of polls.
pub struct FakeLink {
    inner: Mutex<LinkInner>,
    /// `None` never settles.
    settle_polls: Option<u32>,
    forces: AtomicUsize,
    polls: AtomicUsize,
}

impl FakeLink {
    fn build(speed: Mbps, settle_polls: Option<u32>) -> Self {
        Self {
            inner: Mutex::new(LinkInner {
                speed,
                pending: None,
                polls_left: 0,
            }),
            settle_polls,
            forces: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
        }
    }

    /// Forced speeds are visible on the first poll.
    pub fn at(speed: Mbps) -> Self {
        Self::build(speed, Some(1))
    }

    /// Forced speeds are visible from poll number `polls` onwards.
    pub fn settling(speed: Mbps, polls: u32) -> Self {
        Self::build(speed, Some(polls))
    }

    /// Ignores every force command.
    pub fn stuck(speed: Mbps) -> Self {
        Self::build(speed, None)
    }

    pub fn force_count(&self) -> usize {
        self.forces.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkPort for FakeLink {
    fn speed(&self) -> Mbps {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        if let Some(target) = inner.pending {
            if inner.polls_left <= 1 {
                inner.speed = target;
                inner.pending = None;
            } else {
                inner.polls_left -= 1;
            }
        }
        inner.speed
    }

    async fn force_speed(&self, mbps: Mbps) -> Result<(), HardwareError> {
        self.forces.fetch_add(1, Ordering::SeqCst);
        if let Some(polls) = self.settle_polls {
            let mut inner = self.inner.lock().unwrap();
            inner.pending = Some(mbps);
            inner.polls_left = polls;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

pub struct FakeAddress {
    ip: Mutex<Option<Ipv4Addr>>,
}

impl FakeAddress {
    pub fn new(ip: Option<Ipv4Addr>) -> Self {
        Self { ip: Mutex::new(ip) }
    }

    pub fn set(&self, ip: Option<Ipv4Addr>) {
        *self.ip.lock().unwrap() = ip;
    }
}

impl AddressSource for FakeAddress {
    fn ipv4(&self) -> Option<Ipv4Addr> {
        *self.ip.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// OTP
// ---------------------------------------------------------------------------

/// In-memory OTP region. `corrupt_writes` flips the last byte of every
/// record on its way in, so the read-back never verifies. The first
/// `failing_reads` reads return an I/O error.
pub struct FakeOtp {
    memory: Mutex<Vec<u8>>,
    corrupt_writes: bool,
    failing_reads: AtomicUsize,
    writes: AtomicUsize,
    erases: AtomicUsize,
}

impl FakeOtp {
    pub fn blank() -> Self {
        Self {
            memory: Mutex::new(vec![0; OTP_LEN]),
            corrupt_writes: false,
            failing_reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            erases: AtomicUsize::new(0),
        }
    }

    pub fn with_record(record: &str) -> Self {
        let otp = Self::blank();
        otp.memory.lock().unwrap()[..record.len()].copy_from_slice(record.as_bytes());
        otp
    }

    pub fn corrupting() -> Self {
        Self {
            corrupt_writes: true,
            ..Self::blank()
        }
    }

    pub fn failing_first_reads(self, reads: usize) -> Self {
        self.failing_reads.store(reads, Ordering::SeqCst);
        self
    }

    pub fn contents(&self) -> Vec<u8> {
        self.memory.lock().unwrap().clone()
    }

    pub fn is_blank(&self) -> bool {
        self.contents().iter().all(|&b| b == 0)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn erase_count(&self) -> usize {
        self.erases.load(Ordering::SeqCst)
    }
}

impl OtpMemory for FakeOtp {
    fn read(&self) -> Result<Vec<u8>, HardwareError> {
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HardwareError::Io(std::io::Error::other("nvmem read failed")));
        }
        Ok(self.contents())
    }

    fn write(&self, record: &[u8]) -> Result<(), HardwareError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut memory = self.memory.lock().unwrap();
        memory[..record.len()].copy_from_slice(record);
        if self.corrupt_writes {
            memory[record.len() - 1] = b'Z';
        }
        Ok(())
    }

    fn erase(&self) -> Result<(), HardwareError> {
        self.erases.fetch_add(1, Ordering::SeqCst);
        self.memory.lock().unwrap().fill(0);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bandwidth tool
// ---------------------------------------------------------------------------

/// Reports "server busy" for the first `busy_runs` runs, then `output`.
pub struct FakeBandwidth {
    busy_runs: usize,
    output: String,
    runs: AtomicUsize,
}

impl FakeBandwidth {
    pub fn new(busy_runs: usize, output: String) -> Self {
        Self {
            busy_runs,
            output,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BandwidthTool for FakeBandwidth {
    async fn run(&self, _peer: &str) -> Result<String, HardwareError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst);
        if run < self.busy_runs {
            Ok(BUSY_OUTPUT.to_string())
        } else {
            Ok(self.output.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// MAC allocator
// ---------------------------------------------------------------------------

/// Hands out a fixed record, or fails like an unreachable service.
pub struct FakeAllocator {
    record: Option<String>,
    calls: AtomicUsize,
}

impl FakeAllocator {
    pub fn returning(record: &str) -> Self {
        Self {
            record: Some(record.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            record: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MacAllocator for FakeAllocator {
    async fn allocate(&self, _model: &str) -> Result<String, HardwareError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record.clone().ok_or(HardwareError::AllocatorStatus {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

/// Fakes plus the hardware bundle built from them. The fakes stay
/// reachable for assertions after the bundle moves into a module.
pub struct Rig {
    pub link: Arc<FakeLink>,
    pub address: Arc<FakeAddress>,
    pub otp: Arc<FakeOtp>,
    pub bandwidth: Arc<FakeBandwidth>,
    pub allocator: Arc<FakeAllocator>,
}

impl Rig {
    /// A healthy unit: gigabit link, address 192.168.20.77, blank OTP, a
    /// peer that measures 941/887 Mbit/s and a working allocator.
    pub fn healthy() -> Self {
        Self {
            link: Arc::new(FakeLink::at(1000)),
            address: Arc::new(FakeAddress::new(Some(Ipv4Addr::new(192, 168, 20, 77)))),
            otp: Arc::new(FakeOtp::blank()),
            bandwidth: Arc::new(FakeBandwidth::new(0, iperf_output(941, 887))),
            allocator: Arc::new(FakeAllocator::returning(GOOD_RECORD)),
        }
    }

    pub fn hardware(&self) -> EthernetHardware {
        EthernetHardware {
            link: self.link.clone(),
            address: self.address.clone(),
            otp: self.otp.clone(),
            bandwidth: self.bandwidth.clone(),
            allocator: self.allocator.clone(),
        }
    }

    /// An initialised module with the default config and retry policy.
    pub async fn module(&self) -> EthernetModule {
        self.module_with(EthernetConfig::default()).await
    }

    pub async fn module_with(&self, config: EthernetConfig) -> EthernetModule {
        let mut module =
            EthernetModule::new(self.hardware(), config, RetryPolicy::default(), "m1s");
        module.init().await;
        module
    }
}
