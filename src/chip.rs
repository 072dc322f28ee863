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

//! Chip variant tags
//!
//! A `Chip` is decided once by the external detection step and never
//! changes for the lifetime of a driver instance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Silicon variant handled by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chip {
    Nct610xD,
    Nct6771F,
    Nct6776F,
    Nct6779D,
    Nct6791D,
    Nct6792D,
    Nct6792DA,
    Nct6793D,
    Nct6795D,
    Nct6796D,
    Nct6796DR,
    Nct6797D,
    Nct6798D,
    Nct6687D,
    /// Any chip id outside this family
    Unsupported(u16),
}

/// Register-map family a chip belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipFamily {
    /// NCT6771F / NCT6776F: 4-5 fans, 16-bit RPM registers
    Classic,
    /// NCT6779D through NCT6798D: 5-7 fans, 13-bit counters
    Extended,
    /// NCT610xD low pin count parts
    LowPinCount,
    /// NCT6687D embedded controller, paged addressing
    EmbeddedController,
    Unsupported,
}

const KNOWN_CHIPS: &[Chip] = &[
    Chip::Nct610xD,
    Chip::Nct6771F,
    Chip::Nct6776F,
    Chip::Nct6779D,
    Chip::Nct6791D,
    Chip::Nct6792D,
    Chip::Nct6792DA,
    Chip::Nct6793D,
    Chip::Nct6795D,
    Chip::Nct6796D,
    Chip::Nct6796DR,
    Chip::Nct6797D,
    Chip::Nct6798D,
    Chip::Nct6687D,
];

impl Chip {
    /// Every supported chip, in device-id table order
    pub fn all() -> &'static [Chip] {
        KNOWN_CHIPS
    }

    /// Device id as read from configuration registers 0x20/0x21
    pub fn id(self) -> u16 {
        match self {
            Chip::Nct610xD => 0xC452,
            Chip::Nct6771F => 0xB470,
            Chip::Nct6776F => 0xC330,
            Chip::Nct6779D => 0xC560,
            Chip::Nct6791D => 0xC803,
            Chip::Nct6792D => 0xC911,
            Chip::Nct6792DA => 0xC913,
            Chip::Nct6793D => 0xD121,
            Chip::Nct6795D => 0xD352,
            Chip::Nct6796D => 0xD423,
            Chip::Nct6796DR => 0xD42A,
            Chip::Nct6797D => 0xD451,
            Chip::Nct6798D => 0xD428,
            Chip::Nct6687D => 0xD592,
            Chip::Unsupported(id) => id,
        }
    }

    /// Map a device id to a chip tag. Unknown ids become `Unsupported`.
    pub fn from_id(id: u16) -> Chip {
        KNOWN_CHIPS
            .iter()
            .copied()
            .find(|chip| chip.id() == id)
            .unwrap_or(Chip::Unsupported(id))
    }

    /// Map the raw CR 0x20/0x21 bytes to a chip tag. The older parts carry
    /// a stepping in the low nibble of the revision byte, so only its high
    /// nibble identifies them.
    pub fn from_device_id(id: u8, revision: u8) -> Chip {
        let raw = u16::from_be_bytes([id, revision]);
        KNOWN_CHIPS
            .iter()
            .copied()
            .find(|chip| {
                let [chip_id, chip_revision] = chip.id().to_be_bytes();
                let mask = chip.revision_mask();
                chip_id == id && chip_revision & mask == revision & mask
            })
            .unwrap_or(Chip::Unsupported(raw))
    }

    fn revision_mask(self) -> u8 {
        match self {
            Chip::Nct610xD | Chip::Nct6771F | Chip::Nct6776F | Chip::Nct6779D => 0xF0,
            _ => 0xFF,
        }
    }

    pub fn family(self) -> ChipFamily {
        match self {
            Chip::Nct6771F | Chip::Nct6776F => ChipFamily::Classic,
            Chip::Nct6779D
            | Chip::Nct6791D
            | Chip::Nct6792D
            | Chip::Nct6792DA
            | Chip::Nct6793D
            | Chip::Nct6795D
            | Chip::Nct6796D
            | Chip::Nct6796DR
            | Chip::Nct6797D
            | Chip::Nct6798D => ChipFamily::Extended,
            Chip::Nct610xD => ChipFamily::LowPinCount,
            Chip::Nct6687D => ChipFamily::EmbeddedController,
            Chip::Unsupported(_) => ChipFamily::Unsupported,
        }
    }

    /// Revisions from NCT6791D on can lock the hardware-monitor IO space,
    /// which hides the vendor id until the lock is cleared.
    pub fn has_io_space_lock(self) -> bool {
        self.family() == ChipFamily::Extended && self != Chip::Nct6779D
    }

    pub fn name(self) -> &'static str {
        match self {
            Chip::Nct610xD => "NCT610XD",
            Chip::Nct6771F => "NCT6771F",
            Chip::Nct6776F => "NCT6776F",
            Chip::Nct6779D => "NCT6779D",
            Chip::Nct6791D => "NCT6791D",
            Chip::Nct6792D => "NCT6792D",
            Chip::Nct6792DA => "NCT6792DA",
            Chip::Nct6793D => "NCT6793D",
            Chip::Nct6795D => "NCT6795D",
            Chip::Nct6796D => "NCT6796D",
            Chip::Nct6796DR => "NCT6796DR",
            Chip::Nct6797D => "NCT6797D",
            Chip::Nct6798D => "NCT6798D",
            Chip::Nct6687D => "NCT6687D",
            Chip::Unsupported(_) => "Unsupported",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chip::Unsupported(id) => write!(f, "Unsupported (0x{:04X})", id),
            chip => f.write_str(chip.name()),
        }
    }
}
