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

//! Per-chip register maps
//!
//! Every chip tag resolves to one immutable `ChipProfile` built from the
//! static tables below. Addresses are 16-bit logical register addresses:
//! the high byte is the bank (or EC page), the low byte the register index.
//!
//! # Invariants
//!
//! - `voltages.registers`, `fans.registers` and every `controls` table have
//!   exactly as many entries as the matching sensor array.
//! - For sourced temperatures, `sources` and `alternates` have one entry per
//!   logical temperature; `slots` may be longer (several physical slots can
//!   report the same logical sensor).

use crate::chip::{Chip, ChipFamily};

/// Which handshake reaches the register file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Latch the bank through index 0x4E, then index/data
    Banked,
    /// Select an EC page through the page port, then index/data
    EcPaged,
}

/// Where the vendor identity comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorId {
    /// Read high and low bytes and compare against the Nuvoton id
    Registers { high: u16, low: u16 },
    /// No identity registers exist; the chip is trusted
    Assumed,
    /// Nothing is known about this chip; never touch the bus
    Absent,
}

/// Battery voltage channel gated by a monitor-enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VbatMonitor {
    pub register: u16,
    pub control_register: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoltageScaling {
    /// One byte, 8 mV per step
    Step,
    /// Two bytes forming a 12-bit millivolt value, then a per-channel divider
    /// ratio
    EcTwelveBit { multipliers: &'static [f32] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageMap {
    pub registers: &'static [u16],
    pub vbat: Option<VbatMonitor>,
    pub scaling: VoltageScaling,
}

/// One physical temperature slot on the sourced path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureSlot {
    pub register: u16,
    pub half_register: u16,
    /// Bit inside `half_register` carrying the 0.5 degree fraction; only
    /// positions above zero are latched.
    pub half_bit: i8,
    /// Register naming which logical sensor this slot currently reports
    pub source_register: u16,
}

impl TemperatureSlot {
    const fn new(register: u16, half_register: u16, half_bit: i8, source_register: u16) -> Self {
        Self { register, half_register, half_bit, source_register }
    }

    /// Register and bit position of the half-degree fraction, if latched
    pub fn half_source(&self) -> Option<(u16, u8)> {
        if self.half_bit > 0 {
            Some((self.half_register, self.half_bit as u8))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureMap {
    /// Slots report through a source table into logical sensors, with
    /// optional fallback registers per logical sensor
    Sourced {
        slots: &'static [TemperatureSlot],
        sources: &'static [u8],
        alternates: &'static [Option<u16>],
    },
    /// One register per sensor; the following byte's top bit is the half degree
    Direct { registers: &'static [u16] },
    None,
}

impl TemperatureMap {
    /// Number of logical temperatures exposed
    pub fn count(&self) -> usize {
        match self {
            TemperatureMap::Sourced { sources, .. } => sources.len(),
            TemperatureMap::Direct { registers } => registers.len(),
            TemperatureMap::None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDecode {
    /// 13-bit tachometer count split 8/5 over two registers
    Counter13 { max_count: u16, min_count: u16 },
    /// 16-bit RPM register; values at or below the floor read as 0
    RpmFloor { min_rpm: u16 },
    /// 16-bit RPM register used verbatim
    Rpm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanMap {
    pub registers: &'static [u16],
    pub decode: FanDecode,
}

/// How a manual duty reaches the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWrite {
    /// Mode register to 0 (manual), then the command register
    Direct,
    /// Mode bitmask plus load/apply requests with settle delays
    EcHandshake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMap {
    /// Current output duty, read back during refresh
    pub pwm_out: &'static [u16],
    /// Duty command written in manual mode
    pub command: &'static [u16],
    /// Control mode (classic) or shared manual bitmask (EC)
    pub mode: &'static [u16],
    /// EC request register, empty on banked chips
    pub request: &'static [u16],
    pub write: ControlWrite,
}

impl ControlMap {
    pub fn count(&self) -> usize {
        self.pwm_out.len()
    }

    /// Report duty as whole percent
    pub fn rounds_duty(&self) -> bool {
        self.write == ControlWrite::EcHandshake
    }
}

/// One-time register setup applied once the chip is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Read-modify-write, only writing when any bit of `mask` is clear
    SetBits { register: u16, mask: u8 },
    Write { register: u16, value: u8 },
}

/// Display names; channels past the end of a table get numbered names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorLabels {
    pub voltages: &'static [&'static str],
    pub temperatures: &'static [&'static str],
    pub fans: &'static [&'static str],
    pub controls: &'static [&'static str],
}

/// Sensor array a label or length refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Voltage,
    Temperature,
    Fan,
    Control,
}

/// Immutable register map for one chip
#[derive(Debug, Clone, PartialEq)]
pub struct ChipProfile {
    pub chip: Chip,
    pub addressing: Addressing,
    pub vendor_id: VendorId,
    pub io_space_lock: bool,
    pub voltages: VoltageMap,
    pub temperatures: TemperatureMap,
    pub fans: FanMap,
    pub controls: ControlMap,
    pub init: &'static [InitStep],
    pub labels: SensorLabels,
}

// ============================================================================
// Shared tables
// ============================================================================

const VENDOR_ID_DEFAULT: VendorId = VendorId::Registers { high: 0x804F, low: 0x004F };
const VENDOR_ID_610X: VendorId = VendorId::Registers { high: 0x80FE, low: 0x00FE };

const VBAT_CONTROL_DEFAULT: u16 = 0x005D;
const VBAT_CONTROL_610X: u16 = 0x0318;

static PWM_OUT_DEFAULT: [u16; 7] = [0x001, 0x003, 0x011, 0x013, 0x015, 0x017, 0x029];
static PWM_OUT_6797: [u16; 7] = [0x001, 0x003, 0x011, 0x013, 0x015, 0xA09, 0xB09];
static PWM_COMMAND_DEFAULT: [u16; 7] = [0x109, 0x209, 0x309, 0x809, 0x909, 0xA09, 0xB09];
static CONTROL_MODE_DEFAULT: [u16; 7] = [0x102, 0x202, 0x302, 0x802, 0x902, 0xA02, 0xB02];

const NO_REGISTERS: &[u16] = &[];

// ============================================================================
// NCT6771F / NCT6776F
// ============================================================================

static CLASSIC_VOLTAGES: [u16; 9] = [0x020, 0x021, 0x022, 0x023, 0x024, 0x025, 0x026, 0x550, 0x551];
static CLASSIC_FAN_RPM: [u16; 5] = [0x656, 0x658, 0x65A, 0x65C, 0x65E];

static CLASSIC_TEMPERATURE_SLOTS: [TemperatureSlot; 9] = [
    TemperatureSlot::new(0x027, 0x000, -1, 0x621),
    TemperatureSlot::new(0x073, 0x074, 7, 0x100),
    TemperatureSlot::new(0x075, 0x076, 7, 0x200),
    TemperatureSlot::new(0x077, 0x078, 7, 0x300),
    TemperatureSlot::new(0x150, 0x151, 7, 0x622),
    TemperatureSlot::new(0x250, 0x251, 7, 0x623),
    TemperatureSlot::new(0x62B, 0x62E, 0, 0x624),
    TemperatureSlot::new(0x62C, 0x62E, 1, 0x625),
    TemperatureSlot::new(0x62D, 0x62E, 2, 0x626),
];

// PECI 0, CPUTIN, AUXTIN, SYSTIN
static SOURCES_6771F: [u8; 4] = [5, 2, 3, 1];
static SOURCES_6776F: [u8; 4] = [12, 2, 3, 1];
static CLASSIC_ALTERNATES: [Option<u16>; 4] = [None, None, None, None];
static CLASSIC_TEMPERATURE_LABELS: [&str; 4] = ["PECI 0", "CPUTIN", "AUXTIN", "SYSTIN"];

// ============================================================================
// NCT6779D .. NCT6798D
// ============================================================================

static EXTENDED_VOLTAGES: [u16; 15] = [
    0x480, 0x481, 0x482, 0x483, 0x484, 0x485, 0x486, 0x487, 0x488, 0x489, 0x48A, 0x48B, 0x48C,
    0x48D, 0x48E,
];
static EXTENDED_FAN_COUNT: [u16; 7] = [0x4B0, 0x4B2, 0x4B4, 0x4B6, 0x4B8, 0x4BA, 0x4CC];

static EXTENDED_TEMPERATURE_SLOTS: [TemperatureSlot; 7] = [
    TemperatureSlot::new(0x027, 0x000, -1, 0x621),
    TemperatureSlot::new(0x073, 0x074, 7, 0x100),
    TemperatureSlot::new(0x075, 0x076, 7, 0x200),
    TemperatureSlot::new(0x077, 0x078, 7, 0x300),
    TemperatureSlot::new(0x079, 0x07A, 7, 0x800),
    TemperatureSlot::new(0x07B, 0x07C, 7, 0x900),
    TemperatureSlot::new(0x150, 0x151, 7, 0x622),
];

// PECI 0, CPUTIN, SYSTIN, AUXTIN0..3
static EXTENDED_SOURCES: [u8; 7] = [16, 2, 1, 3, 4, 5, 6];
static EXTENDED_ALTERNATES: [Option<u16>; 7] =
    [None, Some(0x491), Some(0x490), Some(0x492), Some(0x493), Some(0x494), Some(0x495)];
static EXTENDED_TEMPERATURE_LABELS: [&str; 7] =
    ["PECI 0", "CPUTIN", "SYSTIN", "AUXTIN0", "AUXTIN1", "AUXTIN2", "AUXTIN3"];

// ============================================================================
// NCT610xD
// ============================================================================

static LPC_VOLTAGES: [u16; 9] = [0x300, 0x301, 0x302, 0x303, 0x304, 0x305, 0x307, 0x308, 0x309];
static LPC_FAN_RPM: [u16; 3] = [0x030, 0x032, 0x034];
static LPC_PWM_OUT: [u16; 3] = [0x04A, 0x04B, 0x04C];
static LPC_PWM_COMMAND: [u16; 3] = [0x119, 0x129, 0x139];
static LPC_CONTROL_MODE: [u16; 3] = [0x113, 0x123, 0x133];

static LPC_TEMPERATURE_SLOTS: [TemperatureSlot; 4] = [
    TemperatureSlot::new(0x027, 0x000, -1, 0x621),
    TemperatureSlot::new(0x018, 0x01B, 7, 0x100),
    TemperatureSlot::new(0x019, 0x11B, 7, 0x200),
    TemperatureSlot::new(0x01A, 0x21B, 7, 0x300),
];

// PECI 0, SYSTIN, CPUTIN, AUXTIN
static LPC_SOURCES: [u8; 4] = [12, 1, 2, 3];
static LPC_ALTERNATES: [Option<u16>; 4] = [None, Some(0x018), Some(0x019), Some(0x01A)];
static LPC_TEMPERATURE_LABELS: [&str; 4] = ["PECI 0", "SYSTIN", "CPUTIN", "AUXTIN"];

// ============================================================================
// NCT6687D
// ============================================================================

static EC_VOLTAGES: [u16; 14] = [
    0x120, 0x122, 0x124, 0x126, 0x128, 0x12A, 0x12C, 0x12E, 0x130, 0x13A, 0x13E, 0x136, 0x138,
    0x13C,
];
static EC_VOLTAGE_MULTIPLIERS: [f32; 14] =
    [12.0, 5.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
static EC_TEMPERATURES: [u16; 7] = [0x100, 0x102, 0x104, 0x106, 0x108, 0x10A, 0x10C];
static EC_FAN_RPM: [u16; 8] = [0x140, 0x142, 0x144, 0x146, 0x148, 0x14A, 0x14C, 0x14E];
static EC_PWM_OUT: [u16; 8] = [0x160, 0x161, 0x162, 0x163, 0x164, 0x165, 0x166, 0x167];
static EC_PWM_COMMAND: [u16; 8] = [0xA28, 0xA29, 0xA2A, 0xA2B, 0xA2C, 0xA2D, 0xA2E, 0xA2F];
static EC_CONTROL_MODE: [u16; 8] = [0xA00; 8];
static EC_PWM_REQUEST: [u16; 8] = [0xA01; 8];

static EC_INIT: [InitStep; 6] = [
    InitStep::SetBits { register: 0x180, mask: 0x80 },
    // SIO voltage monitoring
    InitStep::Write { register: 0x1BB, value: 0x61 },
    InitStep::Write { register: 0x1BC, value: 0x62 },
    InitStep::Write { register: 0x1BD, value: 0x63 },
    InitStep::Write { register: 0x1BE, value: 0x64 },
    InitStep::Write { register: 0x1BF, value: 0x65 },
];

static EC_VOLTAGE_LABELS: [&str; 14] = [
    "+12V", "+5V", "Vcore", "SIO", "DRAM", "CPU I/O", "CPU SA", "SIO", "+3.3V", "SIO VTT",
    "SIO VREF", "SIO VSB", "SIO AVSB", "SIO VBAT",
];
static EC_TEMPERATURE_LABELS: [&str; 7] =
    ["CPU", "System", "MOS", "PCH", "CPU Socket", "PCIE_1", "M2_1"];
static EC_FAN_LABELS: [&str; 8] = [
    "CPU Fan", "Pump Fan", "System Fan #1", "System Fan #2", "System Fan #3", "System Fan #4",
    "System Fan #5", "System Fan #6",
];

// ============================================================================
// Resolution
// ============================================================================

impl ChipProfile {
    /// Build the register map for a chip. Unsupported chips get an empty
    /// profile that never touches the bus.
    pub fn resolve(chip: Chip) -> Self {
        match chip.family() {
            ChipFamily::Classic => classic(chip),
            ChipFamily::Extended => extended(chip),
            ChipFamily::LowPinCount => low_pin_count(chip),
            ChipFamily::EmbeddedController => embedded_controller(chip),
            ChipFamily::Unsupported => empty(chip),
        }
    }

    pub fn family(&self) -> ChipFamily {
        self.chip.family()
    }

    /// Length of the exposed sensor array of the given kind
    pub fn len(&self, kind: SensorKind) -> usize {
        match kind {
            SensorKind::Voltage => self.voltages.registers.len(),
            SensorKind::Temperature => self.temperatures.count(),
            SensorKind::Fan => self.fans.registers.len(),
            SensorKind::Control => self.controls.count(),
        }
    }

    /// True when the profile exposes no sensors at all
    pub fn is_empty(&self) -> bool {
        [SensorKind::Voltage, SensorKind::Temperature, SensorKind::Fan, SensorKind::Control]
            .iter()
            .all(|&kind| self.len(kind) == 0)
    }

    /// Display name of one channel
    pub fn label(&self, kind: SensorKind, index: usize) -> String {
        let (table, prefix) = match kind {
            SensorKind::Voltage => (self.labels.voltages, "Voltage"),
            SensorKind::Temperature => (self.labels.temperatures, "Temperature"),
            SensorKind::Fan => (self.labels.fans, "Fan"),
            SensorKind::Control => (self.labels.controls, "Fan Control"),
        };
        match table.get(index) {
            Some(name) => (*name).to_string(),
            None => format!("{} #{}", prefix, index + 1),
        }
    }
}

fn banked_controls(pwm_out: &'static [u16], count: usize) -> ControlMap {
    ControlMap {
        pwm_out: &pwm_out[..count],
        command: &PWM_COMMAND_DEFAULT[..count],
        mode: &CONTROL_MODE_DEFAULT[..count],
        request: NO_REGISTERS,
        write: ControlWrite::Direct,
    }
}

fn classic(chip: Chip) -> ChipProfile {
    // 16-bit RPM registers on the 6771F, 13-bit counters behind them on the 6776F
    let (fan_count, min_rpm, sources) = if chip == Chip::Nct6771F {
        (4, (1.35e6 / 0xFFFF as f64) as u16, &SOURCES_6771F)
    } else {
        (5, (1.35e6 / 0x1FFF as f64) as u16, &SOURCES_6776F)
    };

    ChipProfile {
        chip,
        addressing: Addressing::Banked,
        vendor_id: VENDOR_ID_DEFAULT,
        io_space_lock: false,
        voltages: VoltageMap {
            registers: &CLASSIC_VOLTAGES,
            vbat: Some(VbatMonitor { register: 0x551, control_register: VBAT_CONTROL_DEFAULT }),
            scaling: VoltageScaling::Step,
        },
        temperatures: TemperatureMap::Sourced {
            slots: &CLASSIC_TEMPERATURE_SLOTS,
            sources,
            alternates: &CLASSIC_ALTERNATES,
        },
        fans: FanMap {
            registers: &CLASSIC_FAN_RPM[..fan_count],
            decode: FanDecode::RpmFloor { min_rpm },
        },
        controls: banked_controls(&PWM_OUT_DEFAULT, 3),
        init: &[],
        labels: SensorLabels { temperatures: &CLASSIC_TEMPERATURE_LABELS, ..SensorLabels::default() },
    }
}

fn extended(chip: Chip) -> ChipProfile {
    let channels = match chip {
        Chip::Nct6779D => 5,
        Chip::Nct6797D | Chip::Nct6798D => 7,
        _ => 6,
    };
    let pwm_out: &'static [u16] = match chip {
        Chip::Nct6797D | Chip::Nct6798D => &PWM_OUT_6797,
        _ => &PWM_OUT_DEFAULT,
    };

    ChipProfile {
        chip,
        addressing: Addressing::Banked,
        vendor_id: VENDOR_ID_DEFAULT,
        io_space_lock: chip.has_io_space_lock(),
        voltages: VoltageMap {
            registers: &EXTENDED_VOLTAGES,
            vbat: Some(VbatMonitor { register: 0x488, control_register: VBAT_CONTROL_DEFAULT }),
            scaling: VoltageScaling::Step,
        },
        temperatures: TemperatureMap::Sourced {
            slots: &EXTENDED_TEMPERATURE_SLOTS,
            sources: &EXTENDED_SOURCES,
            alternates: &EXTENDED_ALTERNATES,
        },
        fans: FanMap {
            registers: &EXTENDED_FAN_COUNT[..channels],
            // 0x15 is the smallest count the chip still transfers to its RPM registers
            decode: FanDecode::Counter13 { max_count: 0x1FFF, min_count: 0x15 },
        },
        controls: banked_controls(pwm_out, channels),
        init: &[],
        labels: SensorLabels { temperatures: &EXTENDED_TEMPERATURE_LABELS, ..SensorLabels::default() },
    }
}

fn low_pin_count(chip: Chip) -> ChipProfile {
    ChipProfile {
        chip,
        addressing: Addressing::Banked,
        vendor_id: VENDOR_ID_610X,
        io_space_lock: false,
        voltages: VoltageMap {
            registers: &LPC_VOLTAGES,
            vbat: Some(VbatMonitor { register: 0x308, control_register: VBAT_CONTROL_610X }),
            scaling: VoltageScaling::Step,
        },
        temperatures: TemperatureMap::Sourced {
            slots: &LPC_TEMPERATURE_SLOTS,
            sources: &LPC_SOURCES,
            alternates: &LPC_ALTERNATES,
        },
        fans: FanMap {
            registers: &LPC_FAN_RPM,
            decode: FanDecode::RpmFloor { min_rpm: (1.35e6 / 0x1FFF as f64) as u16 },
        },
        controls: ControlMap {
            pwm_out: &LPC_PWM_OUT,
            command: &LPC_PWM_COMMAND,
            mode: &LPC_CONTROL_MODE,
            request: NO_REGISTERS,
            write: ControlWrite::Direct,
        },
        init: &[],
        labels: SensorLabels { temperatures: &LPC_TEMPERATURE_LABELS, ..SensorLabels::default() },
    }
}

fn embedded_controller(chip: Chip) -> ChipProfile {
    ChipProfile {
        chip,
        addressing: Addressing::EcPaged,
        vendor_id: VendorId::Assumed,
        io_space_lock: false,
        voltages: VoltageMap {
            registers: &EC_VOLTAGES,
            vbat: None,
            scaling: VoltageScaling::EcTwelveBit { multipliers: &EC_VOLTAGE_MULTIPLIERS },
        },
        temperatures: TemperatureMap::Direct { registers: &EC_TEMPERATURES },
        fans: FanMap { registers: &EC_FAN_RPM, decode: FanDecode::Rpm },
        controls: ControlMap {
            pwm_out: &EC_PWM_OUT,
            command: &EC_PWM_COMMAND,
            mode: &EC_CONTROL_MODE,
            request: &EC_PWM_REQUEST,
            write: ControlWrite::EcHandshake,
        },
        init: &EC_INIT,
        labels: SensorLabels {
            voltages: &EC_VOLTAGE_LABELS,
            temperatures: &EC_TEMPERATURE_LABELS,
            fans: &EC_FAN_LABELS,
            controls: &EC_FAN_LABELS,
        },
    }
}

fn empty(chip: Chip) -> ChipProfile {
    ChipProfile {
        chip,
        addressing: Addressing::Banked,
        vendor_id: VendorId::Absent,
        io_space_lock: false,
        voltages: VoltageMap { registers: NO_REGISTERS, vbat: None, scaling: VoltageScaling::Step },
        temperatures: TemperatureMap::None,
        fans: FanMap { registers: NO_REGISTERS, decode: FanDecode::Rpm },
        controls: ControlMap {
            pwm_out: NO_REGISTERS,
            command: NO_REGISTERS,
            mode: NO_REGISTERS,
            request: NO_REGISTERS,
            write: ControlWrite::Direct,
        },
        init: &[],
        labels: SensorLabels::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(profile: &ChipProfile) {
        let controls = profile.controls;
        assert_eq!(controls.command.len(), controls.count(), "{}", profile.chip);
        assert_eq!(controls.mode.len(), controls.count(), "{}", profile.chip);
        if controls.write == ControlWrite::EcHandshake {
            assert_eq!(controls.request.len(), controls.count(), "{}", profile.chip);
        }
        if let TemperatureMap::Sourced { sources, alternates, slots } = profile.temperatures {
            assert_eq!(sources.len(), alternates.len(), "{}", profile.chip);
            assert!(slots.len() >= sources.len(), "{}", profile.chip);
        }
        if let VoltageScaling::EcTwelveBit { multipliers } = profile.voltages.scaling {
            assert_eq!(multipliers.len(), profile.voltages.registers.len());
        }
        if let Some(vbat) = profile.voltages.vbat {
            assert!(profile.voltages.registers.contains(&vbat.register), "{}", profile.chip);
        }
    }

    #[test]
    fn test_all_profiles_consistent() {
        for &chip in Chip::all() {
            assert_consistent(&ChipProfile::resolve(chip));
        }
    }

    #[test]
    fn test_fan_and_control_counts() {
        let expected = [
            (Chip::Nct6771F, 4, 3),
            (Chip::Nct6776F, 5, 3),
            (Chip::Nct6779D, 5, 5),
            (Chip::Nct6791D, 6, 6),
            (Chip::Nct6796DR, 6, 6),
            (Chip::Nct6797D, 7, 7),
            (Chip::Nct6798D, 7, 7),
            (Chip::Nct610xD, 3, 3),
            (Chip::Nct6687D, 8, 8),
        ];
        for (chip, fans, controls) in expected {
            let profile = ChipProfile::resolve(chip);
            assert_eq!(profile.len(SensorKind::Fan), fans, "{}", chip);
            assert_eq!(profile.len(SensorKind::Control), controls, "{}", chip);
        }
    }

    #[test]
    fn test_embedded_controller_sizes() {
        let profile = ChipProfile::resolve(Chip::Nct6687D);
        assert_eq!(profile.len(SensorKind::Voltage), 14);
        assert_eq!(profile.len(SensorKind::Temperature), 7);
        assert_eq!(profile.len(SensorKind::Fan), 8);
        assert_eq!(profile.len(SensorKind::Control), 8);
        assert_eq!(profile.addressing, Addressing::EcPaged);
        assert_eq!(profile.vendor_id, VendorId::Assumed);
        assert!(!profile.init.is_empty());
    }

    #[test]
    fn test_extended_sizes() {
        let profile = ChipProfile::resolve(Chip::Nct6798D);
        assert_eq!(profile.len(SensorKind::Voltage), 15);
        assert_eq!(profile.len(SensorKind::Temperature), 7);
        assert_eq!(profile.controls.pwm_out[5], 0xA09);
        assert!(profile.io_space_lock);

        let profile = ChipProfile::resolve(Chip::Nct6795D);
        assert_eq!(profile.controls.pwm_out[5], 0x017);
    }

    #[test]
    fn test_unsupported_profile_is_empty() {
        let profile = ChipProfile::resolve(Chip::Unsupported(0x1234));
        assert!(profile.is_empty());
        assert_eq!(profile.vendor_id, VendorId::Absent);
        assert!(profile.init.is_empty());
    }

    #[test]
    fn test_rpm_floor_constants() {
        let floor = |chip| match ChipProfile::resolve(chip).fans.decode {
            FanDecode::RpmFloor { min_rpm } => min_rpm,
            other => panic!("unexpected decode {:?}", other),
        };
        assert_eq!(floor(Chip::Nct6771F), 20);
        assert_eq!(floor(Chip::Nct6776F), 164);
        assert_eq!(floor(Chip::Nct610xD), 164);
    }

    #[test]
    fn test_half_bit_zero_is_not_latched() {
        assert_eq!(CLASSIC_TEMPERATURE_SLOTS[0].half_source(), None);
        assert_eq!(CLASSIC_TEMPERATURE_SLOTS[6].half_source(), None);
        assert_eq!(CLASSIC_TEMPERATURE_SLOTS[7].half_source(), Some((0x62E, 1)));
        assert_eq!(EXTENDED_TEMPERATURE_SLOTS[1].half_source(), Some((0x074, 7)));
    }

    #[test]
    fn test_labels_fall_back_to_numbers() {
        let profile = ChipProfile::resolve(Chip::Nct6687D);
        assert_eq!(profile.label(SensorKind::Fan, 1), "Pump Fan");
        assert_eq!(profile.label(SensorKind::Voltage, 0), "+12V");

        let profile = ChipProfile::resolve(Chip::Nct6779D);
        assert_eq!(profile.label(SensorKind::Temperature, 2), "SYSTIN");
        assert_eq!(profile.label(SensorKind::Fan, 0), "Fan #1");
        assert_eq!(profile.label(SensorKind::Control, 4), "Fan Control #5");
    }
}
