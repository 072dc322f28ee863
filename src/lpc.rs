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

//! Super I/O configuration port
//!
//! Index/data pair at 0x2E/0x2F (or 0x4E/0x4F). Extended function mode is
//! entered by writing 0x87 twice to the index port and left with 0xAA.

use std::sync::Arc;

use tracing::debug;

use crate::bus::{ConfigSpace, PortIo};
use crate::chip::Chip;
use crate::constants::lpc;
use crate::error::Result;

const CHIP_ID_REGISTER: u8 = 0x20;
const CHIP_REVISION_REGISTER: u8 = 0x21;

pub struct LpcConfigPort {
    io: Arc<dyn PortIo>,
    register_port: u16,
    value_port: u16,
}

impl LpcConfigPort {
    pub fn new(io: Arc<dyn PortIo>, register_port: u16) -> Self {
        Self { io, register_port, value_port: register_port + 1 }
    }

    pub fn primary(io: Arc<dyn PortIo>) -> Self {
        Self::new(io, lpc::PRIMARY_PORT)
    }

    pub fn secondary(io: Arc<dyn PortIo>) -> Self {
        Self::new(io, lpc::SECONDARY_PORT)
    }

    fn read_register(&self, register: u8) -> Result<u8> {
        self.io.write_port(self.register_port, register)?;
        self.io.read_port(self.value_port)
    }

    fn write_register(&self, register: u8, value: u8) -> Result<()> {
        self.io.write_port(self.register_port, register)?;
        self.io.write_port(self.value_port, value)
    }

    /// Device id and revision from CR 0x20/0x21, resolved to a chip tag.
    /// Enters and leaves extended function mode itself.
    pub fn detect(&self) -> Result<(Chip, u8)> {
        self.enter()?;
        let id = self.read_register(CHIP_ID_REGISTER);
        let revision = self.read_register(CHIP_REVISION_REGISTER);
        self.exit()?;

        let (id, revision) = (id?, revision?);
        let chip = Chip::from_device_id(id, revision);
        debug!(port = self.register_port, %chip, revision, "Configuration port probed");
        Ok((chip, revision))
    }
}

impl ConfigSpace for LpcConfigPort {
    fn enter(&self) -> Result<()> {
        self.io.write_port(self.register_port, lpc::ENTER_KEY)?;
        self.io.write_port(self.register_port, lpc::ENTER_KEY)
    }

    fn disable_io_space_lock(&self) -> Result<()> {
        let options = self.read_register(lpc::IO_SPACE_LOCK_REGISTER)?;
        if options & lpc::IO_SPACE_LOCK_BIT != 0 {
            self.write_register(lpc::IO_SPACE_LOCK_REGISTER, options & !lpc::IO_SPACE_LOCK_BIT)?;
            debug!(port = self.register_port, "Cleared hardware monitor IO-space lock");
        }
        Ok(())
    }

    fn exit(&self) -> Result<()> {
        self.io.write_port(self.register_port, lpc::EXIT_KEY)
    }
}
