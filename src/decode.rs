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

//! Raw register decoding
//!
//! The scaling helpers are pure functions over register bytes. `refresh`
//! walks a profile and produces a complete new `SensorState`, starting from
//! the previous one so that logical temperatures no slot reports this cycle
//! keep their last value.

use tracing::trace;

use crate::bus::RegisterBus;
use crate::constants::scaling;
use crate::error::Result;
use crate::profile::{ChipProfile, FanDecode, FanMap, TemperatureMap, VoltageMap, VoltageScaling};
use crate::sensors::SensorState;

// ============================================================================
// Scaling
// ============================================================================

/// Single-byte voltage, 8 mV per step
pub fn step_voltage(raw: u8) -> f32 {
    scaling::VOLTAGE_STEP * raw as f32
}

/// EC voltage: 12-bit millivolt value spread over two bytes, times the
/// channel's divider ratio
pub fn ec_voltage(high: u8, low: u8, multiplier: f32) -> f32 {
    let millivolts = 16 * high as u32 + (low >> 4) as u32;
    scaling::EC_VOLTAGE_STEP * millivolts as f32 * multiplier
}

/// Zero and negative voltages are unconnected inputs
pub fn gate_voltage(value: f32) -> Option<f32> {
    if value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Half-degree temperature from a signed byte and an optional half bit
pub fn sourced_temperature(primary: u8, half: Option<u8>) -> f32 {
    let mut value = ((primary as i8) as i32) << 1;
    if let Some(bit) = half {
        value |= (bit & 0x01) as i32;
    }
    0.5 * value as f32
}

/// EC temperature: signed byte plus the top bit of the following byte
pub fn ec_temperature(primary: u8, next: u8) -> f32 {
    (primary as i8) as f32 + 0.5 * (next >> 7) as f32
}

/// Readings outside the sensor's physical range are discarded
pub fn gate_temperature(value: f32) -> Option<f32> {
    if value > scaling::TEMPERATURE_MAX || value < scaling::TEMPERATURE_MIN {
        None
    } else {
        Some(value)
    }
}

/// 13-bit tachometer count: 8 bits from `high`, 5 from `low`
pub fn fan_count(high: u8, low: u8) -> u16 {
    ((high as u16) << 5) | (low & 0x1F) as u16
}

/// RPM from a tachometer count; saturated and too-small counts are absent
pub fn fan_rpm_from_count(count: u16, max_count: u16, min_count: u16) -> Option<f32> {
    if count >= max_count || count < min_count {
        None
    } else {
        Some(scaling::FAN_CLOCK / count as f32)
    }
}

/// RPM register value, reported as 0 at or below the floor
pub fn fan_rpm_with_floor(rpm: u16, min_rpm: u16) -> f32 {
    if rpm > min_rpm {
        rpm as f32
    } else {
        0.0
    }
}

/// PWM output byte as percent duty
pub fn duty_percent(raw: u8, round: bool) -> f32 {
    let percent = raw as f32 / scaling::PWM_PER_PERCENT;
    if round {
        percent.round()
    } else {
        percent
    }
}

/// Bit for a temperature source id; ids past the mask width never match
fn source_bit(source: u8) -> u64 {
    1u64.checked_shl(source as u32).unwrap_or(0)
}

// ============================================================================
// Refresh
// ============================================================================

/// Read every sensor register once and decode a new state. Any failed read
/// aborts the whole cycle.
pub fn refresh(
    profile: &ChipProfile,
    bus: &RegisterBus<'_>,
    previous: &SensorState,
) -> Result<SensorState> {
    let mut state = previous.clone();

    read_voltages(&profile.voltages, bus, &mut state.voltages)?;
    read_temperatures(&profile.temperatures, bus, &mut state.temperatures)?;
    read_fans(&profile.fans, bus, &mut state.fans)?;

    let round = profile.controls.rounds_duty();
    for (slot, &register) in state.controls.iter_mut().zip(profile.controls.pwm_out) {
        *slot = Some(duty_percent(bus.read(register)?, round));
    }

    trace!(chip = %profile.chip, "Refresh decoded");
    Ok(state)
}

fn read_voltages(map: &VoltageMap, bus: &RegisterBus<'_>, out: &mut [Option<f32>]) -> Result<()> {
    for (i, (slot, &register)) in out.iter_mut().zip(map.registers).enumerate() {
        *slot = match map.scaling {
            VoltageScaling::Step => {
                let mut value = gate_voltage(step_voltage(bus.read(register)?));
                if let Some(vbat) = map.vbat {
                    // battery monitor disabled means the reading is stale
                    if value.is_some()
                        && vbat.register == register
                        && bus.read(vbat.control_register)? & 0x01 == 0
                    {
                        value = None;
                    }
                }
                value
            }
            VoltageScaling::EcTwelveBit { multipliers } => {
                let high = bus.read(register)?;
                let low = bus.read(register.wrapping_add(1))?;
                let multiplier = multipliers.get(i).copied().unwrap_or(1.0);
                gate_voltage(ec_voltage(high, low, multiplier))
            }
        };
    }
    Ok(())
}

fn read_temperatures(
    map: &TemperatureMap,
    bus: &RegisterBus<'_>,
    out: &mut [Option<f32>],
) -> Result<()> {
    match *map {
        TemperatureMap::Sourced { slots, sources, alternates } => {
            let mut seen: u64 = 0;
            for slot in slots.iter().rev() {
                let primary = bus.read(slot.register)?;
                let half = match slot.half_source() {
                    Some((register, bit)) => Some(bus.read(register)? >> bit),
                    None => None,
                };
                let source = bus.read(slot.source_register)?;
                seen |= source_bit(source);

                let temperature = gate_temperature(sourced_temperature(primary, half));
                for (value, &id) in out.iter_mut().zip(sources) {
                    if id == source {
                        *value = temperature;
                    }
                }
            }

            for (i, (value, alternate)) in out.iter_mut().zip(alternates).enumerate() {
                let register = match alternate {
                    Some(register) => *register,
                    None => continue,
                };
                if seen & source_bit(sources[i]) != 0 {
                    continue;
                }
                let raw = bus.read(register)? as i8;
                *value = gate_temperature(raw as f32);
            }
        }
        TemperatureMap::Direct { registers } => {
            for (value, &register) in out.iter_mut().zip(registers) {
                let primary = bus.read(register)?;
                let next = bus.read(register.wrapping_add(1))?;
                *value = gate_temperature(ec_temperature(primary, next));
            }
        }
        TemperatureMap::None => {}
    }
    Ok(())
}

fn read_fans(map: &FanMap, bus: &RegisterBus<'_>, out: &mut [Option<f32>]) -> Result<()> {
    for (value, &register) in out.iter_mut().zip(map.registers) {
        *value = match map.decode {
            FanDecode::Counter13 { max_count, min_count } => {
                let high = bus.read(register)?;
                let low = bus.read(register.wrapping_add(1))?;
                fan_rpm_from_count(fan_count(high, low), max_count, min_count)
            }
            FanDecode::RpmFloor { min_rpm } => {
                Some(fan_rpm_with_floor(bus.read_word(register)?, min_rpm))
            }
            FanDecode::Rpm => Some(bus.read_word(register)? as f32),
        };
    }
    Ok(())
}
