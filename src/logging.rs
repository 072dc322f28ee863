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

//! Subscriber setup for hosts embedding the driver
//!
//! The library itself only emits `tracing` events. A host that has no
//! subscriber of its own can call `init_logging` once at startup.

use tracing_subscriber::EnvFilter;

use crate::error::{NctError, Result};

/// Environment variable that overrides the level passed to `init_logging`
pub const LOG_ENV: &str = "NCTMON_LOG";

/// Install a stdout fmt subscriber filtered by `NCTMON_LOG`, or by `level`
/// when the variable is unset.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| NctError::invalid_config("log level", e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| NctError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_invalid_level_rejected() {
        std::env::remove_var(LOG_ENV);
        assert!(matches!(
            init_logging("nctmon=notalevel"),
            Err(NctError::InvalidConfig { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_second_init_fails_cleanly() {
        std::env::remove_var(LOG_ENV);
        let _ = init_logging("debug");
        assert!(matches!(init_logging("info"), Err(NctError::Logging(_))));
    }
}
