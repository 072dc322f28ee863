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

//! ISA bus mutex implementations
//!
//! `LocalBusMutex` serialises threads of one process. `FileBusMutex` adds an
//! advisory `flock` on a shared lock file so that separate processes probing
//! the same Super I/O chip take turns.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::bus::BusMutex;
use crate::constants::{paths, timing};
use crate::error::{NctError, Result};

lazy_static! {
    static ref ISA_BUS: Arc<LocalBusMutex> = Arc::new(LocalBusMutex::new());
}

/// Process-wide bus mutex with a bounded wait
#[derive(Default)]
pub struct LocalBusMutex {
    held: Mutex<bool>,
    released: Condvar,
}

impl LocalBusMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex shared by every driver instance in this process
    pub fn global() -> Arc<LocalBusMutex> {
        Arc::clone(&ISA_BUS)
    }
}

impl BusMutex for LocalBusMutex {
    fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock();
        while *held {
            if self.released.wait_until(&mut held, deadline).timed_out() && *held {
                return false;
            }
        }
        *held = true;
        true
    }

    fn release(&self) {
        *self.held.lock() = false;
        self.released.notify_one();
    }
}

/// Host-wide bus mutex backed by `flock` on a lock file
pub struct FileBusMutex {
    file: File,
    path: PathBuf,
    local: LocalBusMutex,
}

impl FileBusMutex {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|source| NctError::BusLock { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "Opened bus lock file");
        Ok(Self { file, path: path.to_path_buf(), local: LocalBusMutex::new() })
    }

    /// Lock file under `/run/lock`
    pub fn open_default() -> Result<Self> {
        Self::open(Path::new(paths::ISA_BUS_LOCK))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_flock(&self) -> io::Result<bool> {
        // SAFETY: the descriptor stays open for the lifetime of `self.file`.
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            Ok(false)
        } else {
            Err(err)
        }
    }
}

impl BusMutex for FileBusMutex {
    fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        if !self.local.try_acquire(timeout) {
            return false;
        }

        loop {
            match self.try_flock() {
                Ok(true) => return true,
                Ok(false) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(timing::LOCK_POLL_INTERVAL_MS));
                }
                Ok(false) => break,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "flock failed");
                    break;
                }
            }
        }

        self.local.release();
        false
    }

    fn release(&self) {
        // SAFETY: the descriptor stays open for the lifetime of `self.file`.
        unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        self.local.release();
    }
}
