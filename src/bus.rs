/*
 * This file is part of nctmon.
 *
 * Copyright (C) 2025 nctmon contributors
 *
 * nctmon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * nctmon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with nctmon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Bus access
//!
//! The driver never touches ports directly. It is handed four collaborators:
//!
//! - `PortIo`: raw byte read/write on the 16-bit I/O port space
//! - `BusMutex`: the host-wide ISA bus lock with a bounded wait
//! - `Delay`: millisecond sleep for handshake settle times
//! - `ConfigSpace`: Super I/O configuration port entry/exit
//!
//! `RegisterBus` layers the banked or paged addressing handshake on top of
//! `PortIo`. It can only be built from a live `BusGuard`, so every register
//! access happens with the bus lock held.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::constants::ports;
use crate::error::Result;
use crate::profile::Addressing;

/// Raw byte access to the I/O port space
pub trait PortIo: Send + Sync {
    fn read_port(&self, port: u16) -> Result<u8>;
    fn write_port(&self, port: u16, value: u8) -> Result<()>;
}

/// Host-wide mutual exclusion for the ISA/LPC bus
pub trait BusMutex: Send + Sync {
    /// Wait at most `timeout` for the bus. Returns false on timeout.
    fn try_acquire(&self, timeout: Duration) -> bool;
    /// Release a bus previously acquired by this caller
    fn release(&self);
}

/// Blocking millisecond delay
pub trait Delay: Send + Sync {
    fn delay_ms(&self, ms: u64);
}

/// Super I/O configuration port, used to clear the hardware-monitor
/// IO-space lock on chips that set it.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSpace: Send + Sync {
    fn enter(&self) -> Result<()>;
    fn disable_io_space_lock(&self) -> Result<()>;
    fn exit(&self) -> Result<()>;
}

/// `Delay` backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Collaborators handed to a driver instance
#[derive(Clone)]
pub struct Platform {
    pub io: Arc<dyn PortIo>,
    pub bus: Arc<dyn BusMutex>,
    pub delay: Arc<dyn Delay>,
    /// Only needed by chips with an IO-space lock
    pub config_space: Option<Arc<dyn ConfigSpace>>,
}

impl Platform {
    pub fn new(io: Arc<dyn PortIo>, bus: Arc<dyn BusMutex>) -> Self {
        Self { io, bus, delay: Arc::new(ThreadDelay), config_space: None }
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_config_space(mut self, config_space: Arc<dyn ConfigSpace>) -> Self {
        self.config_space = Some(config_space);
        self
    }
}

/// Held bus lock; released when dropped
pub struct BusGuard {
    mutex: Arc<dyn BusMutex>,
}

impl BusGuard {
    /// Wait up to `timeout` for the bus. `None` means another holder kept it.
    pub fn acquire(mutex: &Arc<dyn BusMutex>, timeout: Duration) -> Option<Self> {
        if mutex.try_acquire(timeout) {
            Some(Self { mutex: Arc::clone(mutex) })
        } else {
            trace!(timeout_ms = timeout.as_millis() as u64, "ISA bus busy");
            None
        }
    }
}

impl Drop for BusGuard {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

/// Register-level access to the hardware monitor at `base`
pub struct RegisterBus<'a> {
    io: &'a dyn PortIo,
    base: u16,
    addressing: Addressing,
    _guard: &'a BusGuard,
}

impl<'a> RegisterBus<'a> {
    pub fn new(io: &'a dyn PortIo, base: u16, addressing: Addressing, guard: &'a BusGuard) -> Self {
        Self { io, base, addressing, _guard: guard }
    }

    /// Latch bank/page and register index for `address`
    fn select(&self, address: u16) -> Result<u16> {
        let [high, low] = address.to_be_bytes();
        match self.addressing {
            Addressing::Banked => {
                let address_port = self.base + ports::ADDRESS_OFFSET;
                let data_port = self.base + ports::DATA_OFFSET;
                self.io.write_port(address_port, ports::BANK_SELECT)?;
                self.io.write_port(data_port, high)?;
                self.io.write_port(address_port, low)?;
                Ok(data_port)
            }
            Addressing::EcPaged => {
                let page_port = self.base + ports::EC_PAGE_OFFSET;
                self.io.write_port(page_port, ports::EC_PAGE_SELECT)?;
                self.io.write_port(page_port, high)?;
                self.io.write_port(self.base + ports::EC_INDEX_OFFSET, low)?;
                Ok(self.base + ports::EC_DATA_OFFSET)
            }
        }
    }

    pub fn read(&self, address: u16) -> Result<u8> {
        let data_port = self.select(address)?;
        self.io.read_port(data_port)
    }

    pub fn write(&self, address: u16, value: u8) -> Result<()> {
        let data_port = self.select(address)?;
        self.io.write_port(data_port, value)
    }

    /// Big-endian 16-bit value from `address` and `address + 1`
    pub fn read_word(&self, address: u16) -> Result<u16> {
        let high = self.read(address)?;
        let low = self.read(address.wrapping_add(1))?;
        Ok(u16::from_be_bytes([high, low]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeBusMutex, PortOp, RecordingPortIo};

    fn locked(mutex: &Arc<dyn BusMutex>) -> BusGuard {
        BusGuard::acquire(mutex, Duration::from_millis(1)).expect("bus free")
    }

    #[test]
    fn test_banked_read_handshake_order() {
        let io = RecordingPortIo::with_reads(&[0x5C]);
        let mutex: Arc<dyn BusMutex> = Arc::new(FakeBusMutex::available());
        let guard = locked(&mutex);
        let bus = RegisterBus::new(&io, 0x290, Addressing::Banked, &guard);

        assert_eq!(bus.read(0x804F).unwrap(), 0x5C);
        assert_eq!(
            io.ops(),
            vec![
                PortOp::Write(0x295, 0x4E),
                PortOp::Write(0x296, 0x80),
                PortOp::Write(0x295, 0x4F),
                PortOp::Read(0x296),
            ]
        );
    }

    #[test]
    fn test_paged_write_handshake_order() {
        let io = RecordingPortIo::with_reads(&[]);
        let mutex: Arc<dyn BusMutex> = Arc::new(FakeBusMutex::available());
        let guard = locked(&mutex);
        let bus = RegisterBus::new(&io, 0xA20, Addressing::EcPaged, &guard);

        bus.write(0x0A28, 0x99).unwrap();
        assert_eq!(
            io.ops(),
            vec![
                PortOp::Write(0xA24, 0xFF),
                PortOp::Write(0xA24, 0x0A),
                PortOp::Write(0xA25, 0x28),
                PortOp::Write(0xA26, 0x99),
            ]
        );
    }

    #[test]
    fn test_read_word_is_big_endian() {
        let io = RecordingPortIo::with_reads(&[0x03, 0xE8]);
        let mutex: Arc<dyn BusMutex> = Arc::new(FakeBusMutex::available());
        let guard = locked(&mutex);
        let bus = RegisterBus::new(&io, 0xA20, Addressing::EcPaged, &guard);

        assert_eq!(bus.read_word(0x140).unwrap(), 1000);
        let reads: Vec<_> = io.ops().into_iter().filter(|op| matches!(op, PortOp::Read(_))).collect();
        assert_eq!(reads.len(), 2);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let fake = Arc::new(FakeBusMutex::available());
        let mutex: Arc<dyn BusMutex> = fake.clone();
        {
            let _guard = locked(&mutex);
            assert!(fake.is_held());
            assert!(BusGuard::acquire(&mutex, Duration::from_millis(1)).is_none());
        }
        assert!(!fake.is_held());
        assert_eq!(fake.releases(), 1);
    }

    #[test]
    fn test_contended_bus_yields_no_guard() {
        let mutex: Arc<dyn BusMutex> = Arc::new(FakeBusMutex::contended());
        assert!(BusGuard::acquire(&mutex, Duration::from_millis(1)).is_none());
    }
}
