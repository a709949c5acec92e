// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sense HAT sensors.
//!
//! - [`imu`]: orientation and raw motion data from an external fusion backend
//! - [`environment`]: pressure, humidity and temperature (LPS25H, HTS221)
//! - [`colour`]: TCS34725 light and colour sensor on v2 boards

pub mod colour;
pub mod environment;
pub mod imu;

pub use colour::{ColourSensor, Rgbc};
pub use environment::{
    Environment, HumidityReading, HumiditySensor, Hts221, Lps25h, PressureReading,
    PressureSensor,
};
pub use imu::{Imu, ImuBackend, ImuConfig, ImuData, Orientation};
