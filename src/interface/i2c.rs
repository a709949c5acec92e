// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! SMBus register access through `/dev/i2c-N`.

use std::{io, path::Path};

use i2cdev::{
    core::I2CDevice,
    linux::{LinuxI2CDevice, LinuxI2CError},
};
use log::trace;

use super::RegisterInterface;

/// One slave address on a Linux I2C bus
pub struct I2cRegisters {
    dev: LinuxI2CDevice,
    address: u16,
}

impl I2cRegisters {
    pub fn new<P: AsRef<Path>>(bus: P, address: u16) -> io::Result<Self> {
        trace!("opening {} @ 0x{:02x}", bus.as_ref().display(), address);
        let dev = LinuxI2CDevice::new(bus, address).map_err(i2c_error)?;
        Ok(Self { dev, address })
    }

    pub fn address(&self) -> u16 {
        self.address
    }
}

fn i2c_error(err: LinuxI2CError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl RegisterInterface for I2cRegisters {
    fn read_byte(&mut self, register: u8) -> io::Result<u8> {
        self.dev.smbus_read_byte_data(register).map_err(i2c_error)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> io::Result<()> {
        self.dev
            .smbus_write_byte_data(register, value)
            .map_err(i2c_error)
    }

    fn read_word(&mut self, register: u8) -> io::Result<u16> {
        self.dev.smbus_read_word_data(register).map_err(i2c_error)
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> io::Result<()> {
        let block = self
            .dev
            .smbus_read_i2c_block_data(register, buf.len() as u8)
            .map_err(i2c_error)?;
        if block.len() < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short block read: {} of {} bytes", block.len(), buf.len()),
            ));
        }
        buf.copy_from_slice(&block[..buf.len()]);
        Ok(())
    }
}
