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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::timing;
use crate::error::{NctError, Result};

fn default_update_lock_timeout() -> u64 { timing::UPDATE_LOCK_TIMEOUT_MS }
fn default_control_lock_timeout() -> u64 { timing::CONTROL_LOCK_TIMEOUT_MS }
fn default_report_lock_timeout() -> u64 { timing::REPORT_LOCK_TIMEOUT_MS }
fn default_settle_delay() -> u64 { timing::EC_SETTLE_DELAY_MS }
fn default_restore_on_drop() -> bool { true }

/// Driver tuning knobs. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Bus wait for a refresh cycle
    #[serde(default = "default_update_lock_timeout")]
    pub update_lock_timeout_ms: u64,
    /// Bus wait for a manual control change
    #[serde(default = "default_control_lock_timeout")]
    pub control_lock_timeout_ms: u64,
    /// Bus wait for the diagnostic dump
    #[serde(default = "default_report_lock_timeout")]
    pub report_lock_timeout_ms: u64,
    /// Settle time after each EC load/apply request
    #[serde(default = "default_settle_delay")]
    pub ec_settle_delay_ms: u64,
    /// Hand every overridden channel back to the firmware when the driver is dropped
    #[serde(default = "default_restore_on_drop")]
    pub restore_on_drop: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            update_lock_timeout_ms: default_update_lock_timeout(),
            control_lock_timeout_ms: default_control_lock_timeout(),
            report_lock_timeout_ms: default_report_lock_timeout(),
            ec_settle_delay_ms: default_settle_delay(),
            restore_on_drop: default_restore_on_drop(),
        }
    }
}

impl DriverConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: DriverConfig = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded driver config");
        Ok(config)
    }

    /// Load from `config_path()`, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self> {
        let path = config_path();
        match Self::load(&path) {
            Err(NctError::Io(ref e)) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("update_lock_timeout_ms", self.update_lock_timeout_ms),
            ("control_lock_timeout_ms", self.control_lock_timeout_ms),
            ("report_lock_timeout_ms", self.report_lock_timeout_ms),
        ] {
            if value == 0 {
                return Err(NctError::invalid_config(field, "must be non-zero"));
            }
            if value > timing::MAX_TIMEOUT_MS {
                return Err(NctError::invalid_config(
                    field,
                    format!("must not exceed {} ms", timing::MAX_TIMEOUT_MS),
                ));
            }
        }
        if self.ec_settle_delay_ms == 0 {
            return Err(NctError::invalid_config("ec_settle_delay_ms", "must be non-zero"));
        }
        if self.ec_settle_delay_ms > timing::MAX_TIMEOUT_MS {
            return Err(NctError::invalid_config(
                "ec_settle_delay_ms",
                format!("must not exceed {} ms", timing::MAX_TIMEOUT_MS),
            ));
        }
        Ok(())
    }

    pub fn update_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.update_lock_timeout_ms)
    }

    pub fn control_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.control_lock_timeout_ms)
    }

    pub fn report_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.report_lock_timeout_ms)
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("nctmon").join("driver.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".config").join("nctmon").join("driver.json");
    }
    PathBuf::from("/etc/nctmon/driver.json")
}
