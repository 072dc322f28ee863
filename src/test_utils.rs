/*
 * Test utilities and fakes for nctmon
 *
 * This module provides a register-level Super I/O emulator and recording
 * fakes for the bus collaborators, shared by the unit tests of every module.
 */

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::bus::{BusMutex, Delay, Platform, PortIo};
use crate::error::{NctError, Result};
use crate::profile::Addressing;

/// One raw port access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    Read(u16),
    Write(u16, u8),
}

/// PortIo that returns scripted bytes and records every access
pub struct RecordingPortIo {
    reads: Mutex<VecDeque<u8>>,
    ops: Mutex<Vec<PortOp>>,
}

impl RecordingPortIo {
    pub fn with_reads(bytes: &[u8]) -> Self {
        Self {
            reads: Mutex::new(bytes.iter().copied().collect()),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn ops(&self) -> Vec<PortOp> {
        self.ops.lock().clone()
    }
}

impl PortIo for RecordingPortIo {
    fn read_port(&self, port: u16) -> Result<u8> {
        self.ops.lock().push(PortOp::Read(port));
        Ok(self.reads.lock().pop_front().unwrap_or(0xFF))
    }

    fn write_port(&self, port: u16, value: u8) -> Result<()> {
        self.ops.lock().push(PortOp::Write(port, value));
        Ok(())
    }
}

#[derive(Default)]
struct FakeState {
    registers: HashMap<u16, u8>,
    // banked protocol latches
    bank: u8,
    index: u8,
    // paged protocol latches
    page: u8,
    page_select_pending: bool,
    ec_index: u8,
    writes: Vec<(u16, u8)>,
    reads: usize,
    failing: HashSet<u16>,
}

/// Emulates the hardware-monitor register file behind either handshake
pub struct FakeSuperIo {
    base: u16,
    addressing: Addressing,
    state: Mutex<FakeState>,
}

impl FakeSuperIo {
    pub fn banked(base: u16) -> Self {
        Self { base, addressing: Addressing::Banked, state: Mutex::new(FakeState::default()) }
    }

    pub fn paged(base: u16) -> Self {
        Self { base, addressing: Addressing::EcPaged, state: Mutex::new(FakeState::default()) }
    }

    /// Banked chip answering the vendor probe at 0x804F/0x004F
    pub fn nuvoton(base: u16) -> Self {
        let fake = Self::banked(base);
        fake.set_vendor_id(0x804F, 0x004F);
        fake
    }

    pub fn set_vendor_id(&self, high: u16, low: u16) {
        self.set(high, 0x5C);
        self.set(low, 0xA3);
    }

    pub fn set(&self, address: u16, value: u8) {
        self.state.lock().registers.insert(address, value);
    }

    pub fn set_word(&self, address: u16, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.set(address, high);
        self.set(address + 1, low);
    }

    pub fn get(&self, address: u16) -> u8 {
        self.state.lock().registers.get(&address).copied().unwrap_or(0)
    }

    /// Logical register writes seen so far, in order
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.state.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Number of data-port reads seen so far
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    /// Make every read of `address` fail
    pub fn fail_reads_at(&self, address: u16) {
        self.state.lock().failing.insert(address);
    }

    fn latched(&self, state: &FakeState) -> u16 {
        match self.addressing {
            Addressing::Banked => u16::from_be_bytes([state.bank, state.index]),
            Addressing::EcPaged => u16::from_be_bytes([state.page, state.ec_index]),
        }
    }
}

impl PortIo for FakeSuperIo {
    fn read_port(&self, port: u16) -> Result<u8> {
        let mut state = self.state.lock();
        if port != self.base + 0x06 {
            return Ok(0xFF);
        }
        if self.addressing == Addressing::Banked && state.index == 0x4E {
            return Ok(state.bank);
        }
        let address = self.latched(&state);
        if state.failing.contains(&address) {
            return Err(NctError::port(port, io::Error::new(io::ErrorKind::Other, "injected")));
        }
        state.reads += 1;
        Ok(state.registers.get(&address).copied().unwrap_or(0))
    }

    fn write_port(&self, port: u16, value: u8) -> Result<()> {
        let mut state = self.state.lock();
        let offset = port.wrapping_sub(self.base);
        match (self.addressing, offset) {
            (Addressing::Banked, 0x05) => state.index = value,
            (Addressing::Banked, 0x06) if state.index == 0x4E => state.bank = value,
            (Addressing::EcPaged, 0x04) => {
                if state.page_select_pending {
                    state.page = value;
                    state.page_select_pending = false;
                } else if value == 0xFF {
                    state.page_select_pending = true;
                }
            }
            (Addressing::EcPaged, 0x05) => state.ec_index = value,
            (_, 0x06) => {
                let address = self.latched(&state);
                state.registers.insert(address, value);
                state.writes.push((address, value));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Bus mutex that can be forced into contention
#[derive(Default)]
pub struct FakeBusMutex {
    held: AtomicBool,
    contended: AtomicBool,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl FakeBusMutex {
    pub fn available() -> Self {
        Self::default()
    }

    pub fn contended() -> Self {
        let mutex = Self::default();
        mutex.set_contended(true);
        mutex
    }

    pub fn set_contended(&self, contended: bool) {
        self.contended.store(contended, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl BusMutex for FakeBusMutex {
    fn try_acquire(&self, _timeout: Duration) -> bool {
        if self.contended.load(Ordering::SeqCst) || self.held.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Delay that records requested sleeps instead of sleeping
#[derive(Default)]
pub struct RecordingDelay {
    calls: Mutex<Vec<u64>>,
}

impl RecordingDelay {
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().clone()
    }
}

impl Delay for RecordingDelay {
    fn delay_ms(&self, ms: u64) {
        self.calls.lock().push(ms);
    }
}

/// Handles to the fakes behind a test platform
pub struct TestRig {
    pub io: Arc<FakeSuperIo>,
    pub bus: Arc<FakeBusMutex>,
    pub delay: Arc<RecordingDelay>,
}

impl TestRig {
    pub fn new(io: FakeSuperIo) -> Self {
        Self {
            io: Arc::new(io),
            bus: Arc::new(FakeBusMutex::available()),
            delay: Arc::new(RecordingDelay::default()),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform::new(self.io.clone(), self.bus.clone()).with_delay(self.delay.clone())
    }
}

/// Asserts that two optional readings are approximately equal
pub fn assert_reading(actual: Option<f32>, expected: f32, tolerance: f32) {
    match actual {
        Some(value) => assert!(
            (value - expected).abs() <= tolerance,
            "Values {} and {} are not approximately equal (tolerance: {})",
            value,
            expected,
            tolerance
        ),
        None => panic!("expected reading {} but sensor was empty", expected),
    }
}
