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

//! Manual fan control
//!
//! A channel under manual control remembers the firmware's mode and duty
//! bytes as they were before the first override. Clearing the override
//! writes exactly those bytes back.
//!
//! Banked chips switch a channel to manual by zeroing its mode register.
//! The EC keeps one manual bitmask for all channels and latches new duties
//! through a load/apply request register, each step followed by a settle
//! delay.

use tracing::{debug, info};

use crate::bus::{Delay, RegisterBus};
use crate::constants::ec_control;
use crate::error::{NctError, Result};
use crate::profile::{ControlMap, ControlWrite};

/// Firmware state captured before the first manual write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOverride {
    /// Classic: the whole mode byte. EC: only this channel's manual bit.
    pub saved_mode: u8,
    pub saved_command: u8,
}

/// Per-channel override slots for one driver instance
#[derive(Debug, Clone)]
pub struct FanControlManager {
    overrides: Vec<Option<FanOverride>>,
    settle_ms: u64,
}

impl FanControlManager {
    pub fn new(channels: usize, settle_ms: u64) -> Self {
        Self { overrides: vec![None; channels], settle_ms }
    }

    pub fn check_channel(&self, channel: usize) -> Result<()> {
        if channel < self.overrides.len() {
            Ok(())
        } else {
            Err(NctError::ChannelOutOfRange { index: channel, count: self.overrides.len() })
        }
    }

    pub fn override_for(&self, channel: usize) -> Option<FanOverride> {
        self.overrides.get(channel).copied().flatten()
    }

    /// Channels currently under manual control
    pub fn active_channels(&self) -> Vec<usize> {
        self.overrides
            .iter()
            .enumerate()
            .filter_map(|(channel, slot)| slot.map(|_| channel))
            .collect()
    }

    /// Put `channel` under manual control at raw `duty` (0-255)
    pub fn set(
        &mut self,
        map: &ControlMap,
        bus: &RegisterBus<'_>,
        delay: &dyn Delay,
        channel: usize,
        duty: u8,
    ) -> Result<()> {
        self.check_channel(channel)?;

        if self.overrides[channel].is_none() {
            let saved = snapshot(map, bus, channel)?;
            debug!(
                channel,
                saved_mode = saved.saved_mode,
                saved_command = saved.saved_command,
                "Saved firmware fan control"
            );
            self.overrides[channel] = Some(saved);
        }

        match map.write {
            ControlWrite::Direct => {
                bus.write(map.mode[channel], 0)?;
                bus.write(map.command[channel], duty)?;
            }
            ControlWrite::EcHandshake => {
                let mode = bus.read(map.mode[channel])?;
                bus.write(map.mode[channel], mode | channel_bit(channel))?;
                self.latch(map, bus, delay, channel, duty)?;
            }
        }
        Ok(())
    }

    /// Hand `channel` back to the firmware. No-op without an active override.
    pub fn clear(
        &mut self,
        map: &ControlMap,
        bus: &RegisterBus<'_>,
        delay: &dyn Delay,
        channel: usize,
    ) -> Result<()> {
        self.check_channel(channel)?;

        let saved = match self.overrides[channel] {
            Some(saved) => saved,
            None => return Ok(()),
        };

        match map.write {
            ControlWrite::Direct => {
                bus.write(map.mode[channel], saved.saved_mode)?;
                bus.write(map.command[channel], saved.saved_command)?;
            }
            ControlWrite::EcHandshake => {
                let mode = bus.read(map.mode[channel])?;
                let restored = (mode & !channel_bit(channel)) | saved.saved_mode;
                bus.write(map.mode[channel], restored)?;
                self.latch(map, bus, delay, channel, saved.saved_command)?;
            }
        }

        self.overrides[channel] = None;
        info!(channel, "Restored firmware fan control");
        Ok(())
    }

    /// EC load/apply handshake for a new duty
    fn latch(
        &self,
        map: &ControlMap,
        bus: &RegisterBus<'_>,
        delay: &dyn Delay,
        channel: usize,
        duty: u8,
    ) -> Result<()> {
        let request = map.request[channel];
        bus.write(request, ec_control::REQUEST_LOAD)?;
        delay.delay_ms(self.settle_ms);
        bus.write(map.command[channel], duty)?;
        bus.write(request, ec_control::REQUEST_APPLY)?;
        delay.delay_ms(self.settle_ms);
        Ok(())
    }
}

fn channel_bit(channel: usize) -> u8 {
    1u8.checked_shl(channel as u32).unwrap_or(0)
}

fn snapshot(map: &ControlMap, bus: &RegisterBus<'_>, channel: usize) -> Result<FanOverride> {
    let mode = bus.read(map.mode[channel])?;
    let saved_mode = match map.write {
        ControlWrite::Direct => mode,
        ControlWrite::EcHandshake => mode & channel_bit(channel),
    };
    let saved_command = bus.read(map.command[channel])?;
    Ok(FanOverride { saved_mode, saved_command })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusGuard, BusMutex};
    use crate::chip::Chip;
    use crate::profile::ChipProfile;
    use crate::test_utils::{FakeBusMutex, FakeSuperIo, RecordingDelay};
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: u16 = 0x290;

    struct Harness {
        io: FakeSuperIo,
        delay: RecordingDelay,
        profile: ChipProfile,
        manager: FanControlManager,
        mutex: Arc<dyn BusMutex>,
    }

    impl Harness {
        fn new(chip: Chip) -> Self {
            let profile = ChipProfile::resolve(chip);
            let io = match chip {
                Chip::Nct6687D => FakeSuperIo::paged(BASE),
                _ => FakeSuperIo::nuvoton(BASE),
            };
            Self {
                io,
                delay: RecordingDelay::default(),
                manager: FanControlManager::new(profile.controls.count(), 50),
                profile,
                mutex: Arc::new(FakeBusMutex::available()),
            }
        }

        fn set(&mut self, channel: usize, duty: u8) -> Result<()> {
            let guard = BusGuard::acquire(&self.mutex, Duration::from_millis(1)).unwrap();
            let bus = RegisterBus::new(&self.io, BASE, self.profile.addressing, &guard);
            self.manager.set(&self.profile.controls, &bus, &self.delay, channel, duty)
        }

        fn clear(&mut self, channel: usize) -> Result<()> {
            let guard = BusGuard::acquire(&self.mutex, Duration::from_millis(1)).unwrap();
            let bus = RegisterBus::new(&self.io, BASE, self.profile.addressing, &guard);
            self.manager.clear(&self.profile.controls, &bus, &self.delay, channel)
        }
    }

    #[test]
    fn test_classic_set_writes_mode_then_command() {
        let mut h = Harness::new(Chip::Nct6779D);
        h.io.set(0x102, 0x05);
        h.io.set(0x109, 0x80);

        h.set(0, 0xC0).unwrap();
        assert_eq!(h.io.writes(), vec![(0x102, 0x00), (0x109, 0xC0)]);
        assert_eq!(
            h.manager.override_for(0),
            Some(FanOverride { saved_mode: 0x05, saved_command: 0x80 })
        );
        assert!(h.delay.calls().is_empty());
    }

    #[test]
    fn test_snapshot_taken_once() {
        let mut h = Harness::new(Chip::Nct6779D);
        h.io.set(0x102, 0x05);
        h.io.set(0x109, 0x80);

        h.set(0, 0xC0).unwrap();
        h.set(0, 0x40).unwrap();
        h.io.clear_writes();
        h.clear(0).unwrap();
        assert_eq!(h.io.writes(), vec![(0x102, 0x05), (0x109, 0x80)]);
    }

    #[test]
    fn test_second_clear_is_silent() {
        let mut h = Harness::new(Chip::Nct6779D);
        h.set(2, 0x10).unwrap();
        h.clear(2).unwrap();
        h.io.clear_writes();

        h.clear(2).unwrap();
        assert!(h.io.writes().is_empty());
        assert!(h.manager.active_channels().is_empty());
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut h = Harness::new(Chip::Nct6779D);
        match h.set(5, 0x10) {
            Err(NctError::ChannelOutOfRange { index, count }) => {
                assert_eq!(index, 5);
                assert_eq!(count, 5);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(h.io.writes().is_empty());
    }

    #[test]
    fn test_ec_set_handshake() {
        let mut h = Harness::new(Chip::Nct6687D);
        h.io.set(0xA00, 0b0000_0001);
        h.io.set(0xA2A, 0x33);

        h.set(2, 0x99).unwrap();
        assert_eq!(
            h.io.writes(),
            vec![(0xA00, 0b0000_0101), (0xA01, 0x80), (0xA2A, 0x99), (0xA01, 0x40)]
        );
        assert_eq!(h.delay.calls(), vec![50, 50]);
        assert_eq!(
            h.manager.override_for(2),
            Some(FanOverride { saved_mode: 0, saved_command: 0x33 })
        );
    }

    #[test]
    fn test_ec_restore_returns_channel_bit_to_saved_state() {
        let mut h = Harness::new(Chip::Nct6687D);
        // channel 2 was in automatic mode, channel 0 manual
        h.io.set(0xA00, 0b0000_0001);
        h.io.set(0xA2A, 0x33);
        h.set(2, 0x99).unwrap();
        h.io.clear_writes();

        h.clear(2).unwrap();
        assert_eq!(
            h.io.writes(),
            vec![(0xA00, 0b0000_0001), (0xA01, 0x80), (0xA2A, 0x33), (0xA01, 0x40)]
        );
        assert_eq!(h.delay.calls(), vec![50, 50, 50, 50]);
    }

    #[test]
    fn test_ec_restore_keeps_bit_that_was_already_manual() {
        let mut h = Harness::new(Chip::Nct6687D);
        h.io.set(0xA00, 0b0000_0010);
        h.set(1, 0x20).unwrap();
        h.io.clear_writes();

        h.clear(1).unwrap();
        assert_eq!(h.io.writes()[0], (0xA00, 0b0000_0010));
    }

    #[test]
    fn test_failed_snapshot_records_nothing() {
        let mut h = Harness::new(Chip::Nct6779D);
        h.io.fail_reads_at(0x109);
        assert!(h.set(0, 0x10).is_err());
        assert_eq!(h.manager.override_for(0), None);
        assert!(h.io.writes().is_empty());
    }
}
