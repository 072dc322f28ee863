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

//! `/dev/port` backend
//!
//! The file offset of `/dev/port` is the I/O port number, so a positional
//! one-byte read or write is exactly one `inb`/`outb`.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bus::PortIo;
use crate::constants::paths;
use crate::error::{NctError, Result};

pub struct DevPort {
    file: File,
    path: PathBuf,
}

impl DevPort {
    /// Open `/dev/port`. Requires root.
    pub fn open() -> Result<Self> {
        // SAFETY: geteuid has no preconditions and cannot fail.
        if unsafe { libc::geteuid() } != 0 {
            return Err(NctError::PermissionDenied(format!(
                "{} requires root privileges",
                paths::DEV_PORT
            )));
        }
        Self::open_path(Path::new(paths::DEV_PORT))
    }

    /// Open any file laid out like `/dev/port`
    pub fn open_path(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| NctError::DeviceOpen { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "Opened port device");
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PortIo for DevPort {
    fn read_port(&self, port: u16) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file
            .read_exact_at(&mut buf, port as u64)
            .map_err(|e| NctError::port(port, e))?;
        Ok(buf[0])
    }

    fn write_port(&self, port: u16, value: u8) -> Result<()> {
        self.file
            .write_all_at(&[value], port as u64)
            .map_err(|e| NctError::port(port, e))
    }
}
