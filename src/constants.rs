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

//! Constants and protocol values for the Nuvoton driver
//!
//! Port offsets, handshake codes, scaling constants and default timings.
//! Register maps that differ per chip live in `profile`, not here.

/// Hardware-monitor port offsets and handshake codes, relative to the
/// base address read from logical device 0x0B.
pub mod ports {
    /// Bank-switched protocol: index (address) port offset
    pub const ADDRESS_OFFSET: u16 = 0x05;
    /// Bank-switched protocol: data port offset
    pub const DATA_OFFSET: u16 = 0x06;
    /// Index written to the address port to latch a bank
    pub const BANK_SELECT: u8 = 0x4E;

    /// Paged EC protocol: page port offset
    pub const EC_PAGE_OFFSET: u16 = 0x04;
    /// Paged EC protocol: index port offset
    pub const EC_INDEX_OFFSET: u16 = 0x05;
    /// Paged EC protocol: data port offset
    pub const EC_DATA_OFFSET: u16 = 0x06;
    /// Written to the page port before the page byte
    pub const EC_PAGE_SELECT: u8 = 0xFF;
}

/// Super I/O configuration port (LPC) values
pub mod lpc {
    /// Primary configuration register port
    pub const PRIMARY_PORT: u16 = 0x2E;
    /// Secondary configuration register port
    pub const SECONDARY_PORT: u16 = 0x4E;
    /// Written twice to enter extended function mode
    pub const ENTER_KEY: u8 = 0x87;
    /// Written once to leave extended function mode
    pub const EXIT_KEY: u8 = 0xAA;
    /// Global control register holding the hardware-monitor IO-space lock
    pub const IO_SPACE_LOCK_REGISTER: u8 = 0x28;
    /// Lock bit inside `IO_SPACE_LOCK_REGISTER`
    pub const IO_SPACE_LOCK_BIT: u8 = 0x10;
}

/// Chip identification
pub mod vendor {
    /// Value read back from the vendor-ID register pair on genuine parts
    pub const NUVOTON_ID: u16 = 0x5CA3;
}

/// Sensor scaling constants
pub mod scaling {
    /// Volts per LSB on the 8-bit voltage inputs
    pub const VOLTAGE_STEP: f32 = 0.008;
    /// Volts per LSB on the EC 12-bit voltage inputs
    pub const EC_VOLTAGE_STEP: f32 = 0.001;
    /// Tachometer reference clock: RPM = clock / count
    pub const FAN_CLOCK: f32 = 1.35e6;
    /// Raw PWM byte per percent of duty
    pub const PWM_PER_PERCENT: f32 = 2.55;
    /// Lowest temperature accepted as a real reading (Celsius)
    pub const TEMPERATURE_MIN: f32 = -55.0;
    /// Highest temperature accepted as a real reading (Celsius)
    pub const TEMPERATURE_MAX: f32 = 125.0;
}

/// EC fan-control handshake codes
pub mod ec_control {
    /// Request register value asking the EC to accept a new duty
    pub const REQUEST_LOAD: u8 = 0x80;
    /// Request register value asking the EC to apply the written duty
    pub const REQUEST_APPLY: u8 = 0x40;
}

/// Default timings, overridable through `DriverConfig`
pub mod timing {
    /// Bus lock wait for a sensor refresh
    pub const UPDATE_LOCK_TIMEOUT_MS: u64 = 10;
    /// Bus lock wait for a fan-control write
    pub const CONTROL_LOCK_TIMEOUT_MS: u64 = 10;
    /// Bus lock wait for a full register dump
    pub const REPORT_LOCK_TIMEOUT_MS: u64 = 100;
    /// Settle time after each EC request write
    pub const EC_SETTLE_DELAY_MS: u64 = 50;
    /// Upper bound accepted for any configured wait
    pub const MAX_TIMEOUT_MS: u64 = 10_000;
    /// Poll interval used by the lock-file bus mutex while waiting
    pub const LOCK_POLL_INTERVAL_MS: u64 = 1;
}

/// Platform paths
pub mod paths {
    /// Character device exposing raw I/O ports on Linux
    pub const DEV_PORT: &str = "/dev/port";
    /// Default lock file shared by every process touching the ISA bus
    pub const ISA_BUS_LOCK: &str = "/run/lock/nctmon-isa-bus.lock";
}
