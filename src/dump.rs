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

//! Diagnostic register dump

use crate::bus::RegisterBus;
use crate::chip::Chip;
use crate::error::Result;
use crate::profile::Addressing;

/// 16-byte windows worth dumping on banked chips
const BANKED_WINDOWS: &[u16] = &[
    0x000, 0x010, 0x020, 0x030, 0x040, 0x050, 0x060, 0x070, 0x0F0, 0x100, 0x110, 0x120, 0x130,
    0x140, 0x150, 0x200, 0x210, 0x220, 0x230, 0x240, 0x250, 0x260, 0x300, 0x320, 0x330, 0x340,
    0x360, 0x400, 0x410, 0x420, 0x440, 0x450, 0x460, 0x480, 0x490, 0x4B0, 0x4C0, 0x4F0, 0x500,
    0x550, 0x560, 0x600, 0x610, 0x620, 0x630, 0x640, 0x650, 0x660, 0x670, 0x700, 0x710, 0x720,
    0x730, 0x800, 0x820, 0x830, 0x840, 0x900, 0x920, 0x930, 0x940, 0x960, 0xA00, 0xA10, 0xA20,
    0xA30, 0xA40, 0xA50, 0xA60, 0xA70, 0xB00, 0xB10, 0xB20, 0xB30, 0xB50, 0xB60, 0xB70, 0xC00,
    0xC10, 0xC20, 0xC30, 0xC50, 0xC60, 0xC70, 0xD00, 0xD10, 0xD20, 0xD30, 0xD50, 0xD60, 0xE00,
    0xE10, 0xE20, 0xE30, 0xF00, 0xF10, 0xF20, 0xF30, 0x8040, 0x80F0,
];

/// Number of 16-byte rows in the EC space (0x000-0xFFF)
const EC_ROWS: u16 = 0x100;

const COLUMN_HEADER: &str = "        00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F";

/// Identification block printed ahead of the register table
pub fn header(chip: Chip, revision: u8, base_address: u16) -> String {
    let mut out = String::from("LPC Nct677x\n\n");
    out.push_str(&format!("Chip Id: 0x{:X}\n", chip.id()));
    out.push_str(&format!("Chip Revision: 0x{:X}\n", revision));
    out.push_str(&format!("Base Address: 0x{:04X}\n", base_address));
    out.push('\n');
    out
}

/// Row start addresses dumped for an addressing mode
pub fn windows(addressing: Addressing) -> Vec<u16> {
    match addressing {
        Addressing::Banked => BANKED_WINDOWS.to_vec(),
        Addressing::EcPaged => (0..EC_ROWS).map(|row| row << 4).collect(),
    }
}

/// Hex table of every dumped window. Reads only.
pub fn register_table(bus: &RegisterBus<'_>, addressing: Addressing) -> Result<String> {
    let mut out = String::from("Hardware Monitor Registers\n\n");
    out.push_str(COLUMN_HEADER);
    out.push_str("\n\n");

    for window in windows(addressing) {
        out.push_str(&format!(" {:04X}  ", window));
        for offset in 0..0x10u16 {
            out.push_str(&format!(" {:02X}", bus.read(window | offset)?));
        }
        out.push('\n');
    }
    out.push('\n');
    Ok(out)
}
