// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Constants for the Sense HAT driver.
//!
//! This module contains device names, framebuffer control codes, input event
//! codes and I2C register maps used to talk to the Sense HAT.

// =============================================================================
// LED Matrix
// =============================================================================

/// Width and height of the LED matrix
pub const MATRIX_SIZE: usize = 8;
/// Number of pixels in one frame
pub const FRAME_LEN: usize = MATRIX_SIZE * MATRIX_SIZE;
/// Bytes per pixel in framebuffer memory (RGB565)
pub const BYTES_PER_PIXEL: usize = 2;

/// Name the LED matrix framebuffer advertises in sysfs
pub const SENSE_HAT_FB_NAME: &str = "RPi-Sense FB";

/// Framebuffer ioctl: read the 32 entry gamma table
pub const SENSE_HAT_FB_FBIOGET_GAMMA: u32 = 0xF100;
/// Framebuffer ioctl: write the 32 entry gamma table
pub const SENSE_HAT_FB_FBIOSET_GAMMA: u32 = 0xF101;
/// Framebuffer ioctl: reset the gamma table to a preset
pub const SENSE_HAT_FB_FBIORESET_GAMMA: u32 = 0xF102;

/// Gamma preset: default
pub const SENSE_HAT_FB_GAMMA_DEFAULT: u32 = 0;
/// Gamma preset: low light
pub const SENSE_HAT_FB_GAMMA_LOW: u32 = 1;

/// Number of gamma table entries
pub const GAMMA_LEN: usize = 32;
/// Largest value a gamma entry may hold
pub const GAMMA_MAX: u8 = 31;

/// Gamma table the framebuffer driver loads for the low light preset
pub const GAMMA_LOW_LIGHT: [u8; GAMMA_LEN] = [
    0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 10,
    10,
];

// =============================================================================
// Text
// =============================================================================

/// Columns in one glyph
pub const GLYPH_COLUMNS: usize = 5;
/// Pixels in one glyph (5 columns of 8 pixels)
pub const GLYPH_LEN: usize = GLYPH_COLUMNS * MATRIX_SIZE;
/// Glyph used for characters missing from the font
pub const FALLBACK_CHAR: char = '?';

// =============================================================================
// Joystick
// =============================================================================

/// Name the joystick advertises in sysfs
pub const SENSE_HAT_EVDEV_NAME: &str = "Raspberry Pi Sense HAT Joystick";

/// Event type for key events
pub const EV_KEY: u16 = 0x01;

/// Key released
pub const STATE_RELEASE: u32 = 0;
/// Key pressed
pub const STATE_PRESS: u32 = 1;
/// Key held (auto repeat)
pub const STATE_HOLD: u32 = 2;

pub const KEY_UP: u16 = 103;
pub const KEY_LEFT: u16 = 105;
pub const KEY_RIGHT: u16 = 106;
pub const KEY_DOWN: u16 = 108;
pub const KEY_ENTER: u16 = 28;

// =============================================================================
// Sensors
// =============================================================================

/// I2C bus the Sense HAT sensors sit on
pub const I2C_BUS: &str = "/dev/i2c-1";

/// Number of attempts for sensor init and IMU reads
pub const SENSOR_RETRIES: u32 = 3;

// LPS25H pressure sensor
pub const LPS25H_ADDR: u16 = 0x5c;
pub const LPS25H_RES_CONF: u8 = 0x10;
pub const LPS25H_CTRL_REG_1: u8 = 0x20;
pub const LPS25H_CTRL_REG_2: u8 = 0x21;
pub const LPS25H_STATUS_REG: u8 = 0x27;
pub const LPS25H_PRESS_OUT_XL: u8 = 0x28;
pub const LPS25H_PRESS_OUT_L: u8 = 0x29;
pub const LPS25H_PRESS_OUT_H: u8 = 0x2a;
pub const LPS25H_TEMP_OUT_L: u8 = 0x2b;
pub const LPS25H_TEMP_OUT_H: u8 = 0x2c;
pub const LPS25H_FIFO_CTRL: u8 = 0x2e;
/// WHO_AM_I register and the value it reads back
pub const LPS25H_WHO_AM_I: u8 = 0x0f;
pub const LPS25H_ID: u8 = 0xbd;

// HTS221 humidity sensor
pub const HTS221_ADDR: u16 = 0x5f;
pub const HTS221_AV_CONF: u8 = 0x10;
pub const HTS221_CTRL1: u8 = 0x20;
pub const HTS221_STATUS: u8 = 0x27;
pub const HTS221_HUMIDITY_OUT_L: u8 = 0x28;
pub const HTS221_HUMIDITY_OUT_H: u8 = 0x29;
pub const HTS221_TEMP_OUT_L: u8 = 0x2a;
pub const HTS221_TEMP_OUT_H: u8 = 0x2b;
pub const HTS221_H0_H_2: u8 = 0x30;
pub const HTS221_H1_H_2: u8 = 0x31;
pub const HTS221_T0_C_8: u8 = 0x32;
pub const HTS221_T1_C_8: u8 = 0x33;
pub const HTS221_T1_T0: u8 = 0x35;
pub const HTS221_H0_T0_OUT: u8 = 0x36;
pub const HTS221_H1_T0_OUT: u8 = 0x3a;
pub const HTS221_T0_OUT: u8 = 0x3c;
pub const HTS221_T1_OUT: u8 = 0x3e;
pub const HTS221_WHO_AM_I: u8 = 0x0f;
pub const HTS221_ID: u8 = 0xbc;

// =============================================================================
// TCS34725 Colour Sensor
// =============================================================================

/// Primary I2C address
pub const TCS34725_ADDR: u16 = 0x29;
/// Address used by some board revisions
pub const TCS34725_ADDR_FALLBACK: u16 = 0x39;
/// Expected contents of the ID register
pub const TCS34725_ID: u8 = 0x44;

/// Set on every register address
pub const TCS34725_COMMAND_BIT: u8 = 0x80;

pub const TCS34725_ENABLE: u8 = 0x00 | TCS34725_COMMAND_BIT;
pub const TCS34725_ATIME: u8 = 0x01 | TCS34725_COMMAND_BIT;
pub const TCS34725_CONTROL: u8 = 0x0f | TCS34725_COMMAND_BIT;
pub const TCS34725_ID_REG: u8 = 0x12 | TCS34725_COMMAND_BIT;

pub const TCS34725_CDATA: u8 = 0x14 | TCS34725_COMMAND_BIT;
pub const TCS34725_RDATA: u8 = 0x16 | TCS34725_COMMAND_BIT;
pub const TCS34725_GDATA: u8 = 0x18 | TCS34725_COMMAND_BIT;
pub const TCS34725_BDATA: u8 = 0x1a | TCS34725_COMMAND_BIT;

/// Power off
pub const TCS34725_OFF: u8 = 0x00;
/// Power on
pub const TCS34725_PON: u8 = 0x01;
/// RGBC enable
pub const TCS34725_AEN: u8 = 0x02;
pub const TCS34725_ON: u8 = TCS34725_PON | TCS34725_AEN;

/// Supported gains, indexed by CONTROL register value
pub const TCS34725_GAIN_VALUES: [u16; 4] = [1, 4, 16, 60];

/// One integration cycle, in microseconds (2.4 ms)
pub const TCS34725_CLOCK_STEP_US: u64 = 2400;

/// Maximum raw channel value for the given integration cycles
#[inline]
pub fn tcs34725_max_value(integration_cycles: u16) -> u32 {
    if integration_cycles >= 64 {
        1 << 16
    } else {
        1024 * integration_cycles as u32
    }
}
