// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Driver for the Raspberry Pi Sense HAT.
//!
//! The LED matrix is driven through its Linux framebuffer, the joystick
//! through its evdev input device, and the sensors through I2C or an
//! external fusion library plugged in behind [`sensors::imu::ImuBackend`].

pub mod constants;
pub mod driver;
pub mod interface;
pub mod matrix;
pub mod pixel;
pub mod sensors;
pub mod stick;
pub mod text;

use std::{fmt, io};

pub use driver::{Config, SenseHat};
pub use matrix::{LedMatrix, Rotation};
pub use pixel::{pack_rgb565, unpack_rgb565, Frame, Pixel};
pub use stick::{Action, Direction, JoystickEvent, SenseStick};
pub use text::Font;

/// Errors in this crate
#[derive(Debug)]
pub enum Error {
    /// A frame did not contain exactly 64 pixels
    InvalidFrameLength(usize),
    /// A pixel channel was outside 0..=255
    InvalidChannelValue { index: usize, value: i32 },
    /// x or y outside 0..=7
    CoordinateOutOfRange { x: usize, y: usize },
    /// Rotation other than 0, 90, 180 or 270 degrees
    InvalidRotation(u16),
    /// Gamma table was not 32 entries long
    InvalidGammaLength(usize),
    /// Gamma entry above 31
    InvalidGammaValue { index: usize, value: u8 },
    /// Colour sensor gain other than 1, 4, 16 or 60
    InvalidGain(u16),
    /// Colour sensor integration cycles outside 1..=256
    InvalidIntegrationCycles(u16),
    /// A device could not be located
    DeviceNotFound(String),
    /// A sensor failed to initialise
    SensorInit(String),
    /// Image asset could not be decoded
    Image(image::ImageError),
    /// Device communication error
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFrameLength(len) => {
                write!(f, "frame must have 64 pixels, got {}", len)
            }
            Error::InvalidChannelValue { index, value } => write!(
                f,
                "pixel at index {} is invalid: channel value {} not in 0..=255",
                index, value
            ),
            Error::CoordinateOutOfRange { x, y } => {
                write!(f, "coordinate ({}, {}) outside 0..=7", x, y)
            }
            Error::InvalidRotation(r) => {
                write!(f, "rotation must be 0, 90, 180 or 270 degrees, got {}", r)
            }
            Error::InvalidGammaLength(len) => {
                write!(f, "gamma table must have 32 entries, got {}", len)
            }
            Error::InvalidGammaValue { index, value } => write!(
                f,
                "gamma entry {} is {}, values must be between 0 and 31",
                index, value
            ),
            Error::InvalidGain(gain) => {
                write!(f, "cannot set gain to {}, values: (1, 4, 16, 60)", gain)
            }
            Error::InvalidIntegrationCycles(cycles) => {
                write!(f, "cannot set integration cycles to {} (1-256)", cycles)
            }
            Error::DeviceNotFound(what) => write!(f, "cannot detect {}", what),
            Error::SensorInit(what) => write!(f, "{}", what),
            Error::Image(e) => write!(f, "image error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Image(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err)
    }
}
