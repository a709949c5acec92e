// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Device interfaces.
//!
//! The traits here are the seams between the Sense HAT logic and the
//! operating system. Each has one Linux implementation in a submodule; tests
//! plug in their own.

pub mod delay;
pub mod discovery;
pub mod evdev;
pub mod framebuffer;
pub mod i2c;

use std::{io, time::Duration};

use crate::constants::GAMMA_LEN;

pub use delay::{Delay, ThreadDelay};
pub use discovery::{DeviceDiscovery, SysfsDiscovery};
pub use evdev::EvdevDevice;
pub use framebuffer::FbDevice;
pub use i2c::I2cRegisters;

/// Access to the LED matrix framebuffer memory and its gamma control
pub trait FrameBufferInterface {
    /// Write RGB565 words at the given pixel offsets in one device session
    fn write_words(&mut self, words: &[(usize, u16)]) -> io::Result<()>;

    /// Read the RGB565 words at the given pixel offsets in one device session
    fn read_words(&mut self, offsets: &[usize]) -> io::Result<Vec<u16>>;

    /// Read the gamma table
    fn gamma(&mut self) -> io::Result<[u8; GAMMA_LEN]>;

    /// Write the gamma table
    fn set_gamma(&mut self, table: &[u8; GAMMA_LEN]) -> io::Result<()>;

    /// Reset the gamma table to one of the driver presets
    fn reset_gamma(&mut self, preset: u32) -> io::Result<()>;
}

/// A stream of fixed size input event records
pub trait EventSource {
    /// Fill `buf` with exactly one record, blocking until one is available
    fn read_record(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Wait up to `timeout` for a record to become readable, without
    /// consuming it. `None` waits forever.
    fn poll_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;
}

/// 8-bit register access on a bus device
pub trait RegisterInterface {
    fn read_byte(&mut self, register: u8) -> io::Result<u8>;

    fn write_byte(&mut self, register: u8, value: u8) -> io::Result<()>;

    /// Read a little-endian 16-bit word starting at `register`
    fn read_word(&mut self, register: u8) -> io::Result<u16>;

    /// Read `buf.len()` consecutive registers starting at `register`
    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> io::Result<()>;
}
