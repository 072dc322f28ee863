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

//! nctmon - Nuvoton NCT67xx Super I/O hardware monitor driver
//!
//! This library reads voltages, temperatures and fan speeds from Nuvoton
//! NCT610x/NCT677x/NCT679x Super I/O chips and the NCT6687D embedded
//! controller, and drives their PWM outputs manually with save/restore of
//! the firmware settings.
//!
//! Chip detection and the refresh schedule belong to the host. The host
//! hands each driver a `Platform` with port access, the ISA bus mutex and a
//! delay source; `DevPort`, `FileBusMutex`, `LocalBusMutex` and
//! `LpcConfigPort` are ready-made implementations for Linux.

pub mod bus;
pub mod chip;
pub mod config;
pub mod constants;
pub mod control;
pub mod decode;
pub mod driver;
pub mod dump;
pub mod error;
pub mod lock;
pub mod logging;
pub mod lpc;
pub mod port;
pub mod profile;
pub mod sensors;
pub mod vendor;

pub use bus::{BusMutex, ConfigSpace, Delay, Platform, PortIo, ThreadDelay};
pub use chip::{Chip, ChipFamily};
pub use config::DriverConfig;
pub use driver::Nct677x;
pub use error::{NctError, Result};
pub use lock::{FileBusMutex, LocalBusMutex};
pub use lpc::LpcConfigPort;
pub use port::DevPort;
pub use sensors::{snapshot_to_json, SensorSnapshot, SensorState};
pub use vendor::Identity;

#[cfg(test)]
pub mod test_utils;
