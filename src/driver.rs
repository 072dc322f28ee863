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

//! Driver instance
//!
//! `Nct677x` owns the sensor arrays and fan overrides of one chip. Every
//! operation that touches the chip takes the ISA bus with a bounded wait
//! and gives up silently when another holder keeps it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bus::{BusGuard, Platform, RegisterBus};
use crate::chip::Chip;
use crate::config::DriverConfig;
use crate::control::FanControlManager;
use crate::decode;
use crate::dump;
use crate::error::Result;
use crate::profile::{ChipProfile, InitStep, VendorId};
use crate::sensors::{SensorSnapshot, SensorState};
use crate::vendor::{self, Identity};

pub struct Nct677x {
    profile: ChipProfile,
    revision: u8,
    base_address: u16,
    platform: Platform,
    config: DriverConfig,
    identity: Identity,
    /// One-time register setup has been applied
    initialized: bool,
    state: SensorState,
    fan_control: FanControlManager,
}

impl Nct677x {
    /// Create a driver for a detected chip. The vendor id is probed right
    /// away when the bus is free, otherwise on the first refresh.
    pub fn new(
        chip: Chip,
        revision: u8,
        base_address: u16,
        platform: Platform,
        config: DriverConfig,
    ) -> Self {
        let profile = ChipProfile::resolve(chip);
        let identity = if profile.vendor_id == VendorId::Absent {
            debug!(%chip, "No register map for chip, driver inert");
            Identity::Mismatch
        } else {
            Identity::Pending
        };

        let mut driver = Self {
            state: SensorState::for_profile(&profile),
            fan_control: FanControlManager::new(profile.controls.count(), config.ec_settle_delay_ms),
            profile,
            revision,
            base_address,
            platform,
            config,
            identity,
            initialized: false,
        };

        if driver.identity == Identity::Pending {
            let mutex = Arc::clone(&driver.platform.bus);
            match BusGuard::acquire(&mutex, driver.config.update_lock_timeout()) {
                Some(guard) => {
                    driver.ensure_identity(&guard);
                }
                None => debug!(%chip, "Bus busy, vendor probe deferred"),
            }
        }

        info!(
            %chip,
            revision,
            base = format_args!("0x{:04X}", base_address),
            identity = ?driver.identity,
            "Hardware monitor attached"
        );
        driver
    }

    /// Driver with default tuning
    pub fn with_defaults(chip: Chip, revision: u8, base_address: u16, platform: Platform) -> Self {
        Self::new(chip, revision, base_address, platform, DriverConfig::default())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn chip(&self) -> Chip {
        self.profile.chip
    }

    pub fn revision(&self) -> u8 {
        self.revision
    }

    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    pub fn profile(&self) -> &ChipProfile {
        &self.profile
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn is_identified(&self) -> bool {
        self.identity.is_confirmed()
    }

    pub fn voltages(&self) -> &[Option<f32>] {
        &self.state.voltages
    }

    pub fn temperatures(&self) -> &[Option<f32>] {
        &self.state.temperatures
    }

    pub fn fans(&self) -> &[Option<f32>] {
        &self.state.fans
    }

    pub fn controls(&self) -> &[Option<f32>] {
        &self.state.controls
    }

    pub fn sensors(&self) -> &SensorState {
        &self.state
    }

    /// Channels currently under manual control
    pub fn overridden_channels(&self) -> Vec<usize> {
        self.fan_control.active_channels()
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot::capture(
            &self.profile,
            self.revision,
            self.base_address,
            self.identity,
            &self.state,
        )
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Refresh every sensor. The arrays change only when the whole cycle
    /// read cleanly.
    pub fn update(&mut self) {
        if self.identity == Identity::Mismatch {
            return;
        }

        let mutex = Arc::clone(&self.platform.bus);
        let guard = match BusGuard::acquire(&mutex, self.config.update_lock_timeout()) {
            Some(guard) => guard,
            None => {
                debug!(chip = %self.profile.chip, "Bus busy, refresh skipped");
                return;
            }
        };
        if !self.ensure_identity(&guard) {
            return;
        }

        let io = Arc::clone(&self.platform.io);
        let bus = RegisterBus::new(io.as_ref(), self.base_address, self.profile.addressing, &guard);
        let config_space = self.platform.config_space.clone();

        if let Err(e) = vendor::ensure_unlocked(&bus, &self.profile, config_space.as_deref()) {
            warn!(chip = %self.profile.chip, error = %e, "Failed to clear IO-space lock");
        }
        match decode::refresh(&self.profile, &bus, &self.state) {
            Ok(state) => self.state = state,
            Err(e) => warn!(chip = %self.profile.chip, error = %e, "Refresh failed, keeping last readings"),
        }
    }

    /// Set a manual duty (`Some`, raw 0-255) or hand the channel back to
    /// the firmware (`None`).
    ///
    /// Does nothing on a vendor mismatch. While identification is still
    /// pending the channel is validated but nothing is written. A busy bus
    /// skips the request and still returns `Ok`.
    pub fn set_control(&mut self, channel: usize, duty: Option<u8>) -> Result<()> {
        if self.identity == Identity::Mismatch {
            return Ok(());
        }
        self.fan_control.check_channel(channel)?;
        if !self.identity.is_confirmed() {
            return Ok(());
        }

        let mutex = Arc::clone(&self.platform.bus);
        let guard = match BusGuard::acquire(&mutex, self.config.control_lock_timeout()) {
            Some(guard) => guard,
            None => {
                debug!(chip = %self.profile.chip, channel, "Bus busy, control request skipped");
                return Ok(());
            }
        };

        let io = Arc::clone(&self.platform.io);
        let delay = Arc::clone(&self.platform.delay);
        let bus = RegisterBus::new(io.as_ref(), self.base_address, self.profile.addressing, &guard);
        match duty {
            Some(duty) => {
                debug!(channel, duty, "Manual fan duty");
                self.fan_control.set(&self.profile.controls, &bus, delay.as_ref(), channel, duty)
            }
            None => self.fan_control.clear(&self.profile.controls, &bus, delay.as_ref(), channel),
        }
    }

    /// Hand every overridden channel back to the firmware. Channels that
    /// fail keep their override; the first error is returned.
    pub fn restore_all_controls(&mut self) -> Result<()> {
        let active = self.fan_control.active_channels();
        if active.is_empty() {
            return Ok(());
        }

        let mutex = Arc::clone(&self.platform.bus);
        let guard = match BusGuard::acquire(&mutex, self.config.control_lock_timeout()) {
            Some(guard) => guard,
            None => {
                warn!(chip = %self.profile.chip, channels = ?active, "Bus busy, fan control not restored");
                return Ok(());
            }
        };

        let io = Arc::clone(&self.platform.io);
        let delay = Arc::clone(&self.platform.delay);
        let bus = RegisterBus::new(io.as_ref(), self.base_address, self.profile.addressing, &guard);

        let mut first_error = None;
        for channel in active {
            if let Err(e) =
                self.fan_control.clear(&self.profile.controls, &bus, delay.as_ref(), channel)
            {
                warn!(channel, error = %e, "Failed to restore fan control");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Human-readable identification block and register dump. Only the
    /// header is returned when the bus is busy or the chip is not identified.
    pub fn report(&mut self) -> String {
        let mut out = dump::header(self.profile.chip, self.revision, self.base_address);
        if self.identity == Identity::Mismatch {
            return out;
        }

        let mutex = Arc::clone(&self.platform.bus);
        let guard = match BusGuard::acquire(&mutex, self.config.report_lock_timeout()) {
            Some(guard) => guard,
            None => return out,
        };
        if !self.ensure_identity(&guard) {
            return out;
        }

        let io = Arc::clone(&self.platform.io);
        let bus = RegisterBus::new(io.as_ref(), self.base_address, self.profile.addressing, &guard);
        match dump::register_table(&bus, self.profile.addressing) {
            Ok(table) => out.push_str(&table),
            Err(e) => warn!(chip = %self.profile.chip, error = %e, "Register dump failed"),
        }
        out
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Resolve a pending identity and apply one-time setup. Returns true
    /// when the chip may be accessed.
    fn ensure_identity(&mut self, guard: &BusGuard) -> bool {
        let io = Arc::clone(&self.platform.io);
        let bus = RegisterBus::new(io.as_ref(), self.base_address, self.profile.addressing, guard);

        if self.identity == Identity::Pending {
            let config_space = self.platform.config_space.clone();
            match vendor::identify(&bus, &self.profile, config_space.as_deref()) {
                Ok(identity) => self.identity = identity,
                Err(e) => {
                    warn!(chip = %self.profile.chip, error = %e, "Vendor probe failed");
                    return false;
                }
            }
        }

        if self.identity.is_confirmed() && !self.initialized {
            match apply_init(&bus, self.profile.init) {
                Ok(()) => self.initialized = true,
                Err(e) => warn!(chip = %self.profile.chip, error = %e, "Chip setup failed"),
            }
        }

        self.identity.is_confirmed()
    }
}

impl Drop for Nct677x {
    fn drop(&mut self) {
        if !self.config.restore_on_drop || self.fan_control.active_channels().is_empty() {
            return;
        }
        if let Err(e) = self.restore_all_controls() {
            warn!(chip = %self.profile.chip, error = %e, "Fan control restore on drop failed");
        }
    }
}

fn apply_init(bus: &RegisterBus<'_>, steps: &[InitStep]) -> Result<()> {
    for step in steps {
        match *step {
            InitStep::SetBits { register, mask } => {
                let value = bus.read(register)?;
                if value & mask != mask {
                    bus.write(register, value | mask)?;
                }
            }
            InitStep::Write { register, value } => bus.write(register, value)?,
        }
    }
    Ok(())
}
