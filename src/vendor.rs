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

//! Vendor identity probe
//!
//! Nothing is written to a chip before its vendor id has been read back as
//! Nuvoton's. The EC variant has no id registers and is trusted.

use serde::Serialize;
use tracing::{debug, warn};

use crate::bus::{ConfigSpace, RegisterBus};
use crate::constants::vendor::NUVOTON_ID;
use crate::error::Result;
use crate::profile::{ChipProfile, VendorId};

/// Identity state of a driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// Not probed yet because the bus was busy
    Pending,
    Confirmed,
    /// Wrong or unreadable vendor id; the instance stays inert
    Mismatch,
}

impl Identity {
    pub fn is_confirmed(self) -> bool {
        self == Identity::Confirmed
    }
}

/// Read the vendor id register pair
pub fn read_vendor_id(bus: &RegisterBus<'_>, high: u16, low: u16) -> Result<u16> {
    let high = bus.read(high)?;
    let low = bus.read(low)?;
    Ok(u16::from_be_bytes([high, low]))
}

/// True when the chip identifies as Nuvoton (or needs no identification)
pub fn probe(bus: &RegisterBus<'_>, vendor: VendorId) -> Result<bool> {
    match vendor {
        VendorId::Registers { high, low } => {
            let id = read_vendor_id(bus, high, low)?;
            debug!(vendor_id = format_args!("0x{:04X}", id), "Vendor probe");
            Ok(id == NUVOTON_ID)
        }
        VendorId::Assumed => Ok(true),
        VendorId::Absent => Ok(false),
    }
}

/// Clear the hardware-monitor IO-space lock through the configuration port.
/// Extended function mode is always left again, even when clearing fails.
pub fn unlock_io_space(config: &dyn ConfigSpace) -> Result<()> {
    config.enter()?;
    let result = config.disable_io_space_lock();
    config.exit()?;
    result
}

/// Clear the IO-space lock again if firmware re-armed it. The lock is
/// considered clear whenever the vendor id reads back correctly.
pub fn ensure_unlocked(
    bus: &RegisterBus<'_>,
    profile: &ChipProfile,
    config_space: Option<&dyn ConfigSpace>,
) -> Result<()> {
    let config = match config_space {
        Some(config) if profile.io_space_lock => config,
        _ => return Ok(()),
    };
    if probe(bus, profile.vendor_id)? {
        return Ok(());
    }
    debug!(chip = %profile.chip, "IO-space lock re-armed, clearing");
    unlock_io_space(config)
}

/// Run the initial probe, with one unlock attempt for chips whose
/// IO-space lock may hide the id.
pub fn identify(
    bus: &RegisterBus<'_>,
    profile: &ChipProfile,
    config_space: Option<&dyn ConfigSpace>,
) -> Result<Identity> {
    if probe(bus, profile.vendor_id)? {
        return Ok(Identity::Confirmed);
    }

    if profile.io_space_lock {
        if let Some(config) = config_space {
            debug!(chip = %profile.chip, "Vendor id hidden, clearing IO-space lock");
            unlock_io_space(config)?;
            if probe(bus, profile.vendor_id)? {
                return Ok(Identity::Confirmed);
            }
        }
    }

    if profile.vendor_id != VendorId::Absent {
        warn!(chip = %profile.chip, "Vendor id mismatch, hardware access disabled");
    }
    Ok(Identity::Mismatch)
}
