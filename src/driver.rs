// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sense HAT board driver.
//!
//! [`SenseHat`] finds the LED matrix framebuffer and the joystick by name,
//! opens the I2C sensors and loads a font. Each part is also usable on its
//! own through [`LedMatrix`], [`SenseStick`] and the [`crate::sensors`]
//! types.

use std::{path::PathBuf, time::Duration};

use log::{debug, warn};

use crate::{
    constants::{
        HTS221_ADDR, I2C_BUS, LPS25H_ADDR, SENSE_HAT_EVDEV_NAME, SENSE_HAT_FB_NAME,
    },
    interface::{DeviceDiscovery, EvdevDevice, FbDevice, I2cRegisters, SysfsDiscovery, ThreadDelay},
    matrix::LedMatrix,
    pixel::Pixel,
    sensors::{ColourSensor, Environment, Hts221, Imu, ImuBackend, Lps25h},
    stick::SenseStick,
    text::Font,
    Error, Result,
};

pub type BoardEnvironment = Environment<Lps25h<I2cRegisters>, Hts221<I2cRegisters>>;
pub type BoardImu = Imu<Box<dyn ImuBackend>, ThreadDelay>;

/// Where to find the board and its assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the sysfs tree scanned for device names
    pub sys_root: PathBuf,
    /// Directory holding the device nodes
    pub dev_root: PathBuf,
    /// Name the LED matrix framebuffer driver advertises
    pub framebuffer_name: String,
    /// Name the joystick input device advertises
    pub joystick_name: String,
    /// I2C bus the sensors are on
    pub i2c_bus: PathBuf,
    /// Font image; the builtin font is used unless both asset paths are set
    pub font_image: Option<PathBuf>,
    /// Characters of the font image, in order
    pub font_text: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sys_root: PathBuf::from("/sys"),
            dev_root: PathBuf::from("/dev"),
            framebuffer_name: SENSE_HAT_FB_NAME.to_string(),
            joystick_name: SENSE_HAT_EVDEV_NAME.to_string(),
            i2c_bus: PathBuf::from(I2C_BUS),
            font_image: None,
            font_text: None,
        }
    }
}

/// Sense HAT board
pub struct SenseHat {
    matrix: LedMatrix<FbDevice>,
    stick: SenseStick<EvdevDevice>,
    font: Font,
    delay: ThreadDelay,
    environment: Option<BoardEnvironment>,
    colour: Option<ColourSensor<I2cRegisters>>,
    imu: Option<BoardImu>,
}

impl SenseHat {
    /// Find the board through sysfs
    pub fn new(config: Config) -> Result<Self> {
        let discovery = SysfsDiscovery::new(&config.sys_root, &config.dev_root);
        Self::with_discovery(&discovery, config)
    }

    /// Find the board through `discovery`.
    ///
    /// Fails when the framebuffer or joystick cannot be found or no I2C bus
    /// exists. Sensors that fail to open are left out and reported when used.
    pub fn with_discovery(discovery: &dyn DeviceDiscovery, config: Config) -> Result<Self> {
        let fb_path = discovery
            .find_framebuffer(&config.framebuffer_name)?
            .ok_or_else(|| Error::DeviceNotFound(format!("{} device", config.framebuffer_name)))?;
        debug!("LED matrix at {}", fb_path.display());

        if !discovery.i2c_available() {
            return Err(Error::DeviceNotFound(
                "I2C bus, ensure I2C is enabled".to_string(),
            ));
        }

        let font = match (&config.font_image, &config.font_text) {
            (Some(image), Some(text)) => Font::load(image, text)?,
            _ => Font::builtin(),
        };

        let stick = SenseStick::open(discovery, &config.joystick_name)?;

        let environment = Self::open_environment(&config);

        let colour = match ColourSensor::open_i2c(&config.i2c_bus) {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                warn!("no colour sensor: {}", e);
                None
            }
        };

        Ok(Self {
            matrix: LedMatrix::new(FbDevice::new(fb_path)),
            stick,
            font,
            delay: ThreadDelay,
            environment,
            colour,
            imu: None,
        })
    }

    fn open_environment(config: &Config) -> Option<BoardEnvironment> {
        let opened = I2cRegisters::new(&config.i2c_bus, LPS25H_ADDR).and_then(|pressure| {
            let humidity = I2cRegisters::new(&config.i2c_bus, HTS221_ADDR)?;
            Ok((pressure, humidity))
        });
        match opened {
            Ok((pressure, humidity)) => Some(Environment::new(
                Lps25h::new(pressure),
                Hts221::new(humidity),
            )),
            Err(e) => {
                warn!("cannot open environment sensors on {}: {}", config.i2c_bus.display(), e);
                None
            }
        }
    }

    pub fn matrix(&mut self) -> &mut LedMatrix<FbDevice> {
        &mut self.matrix
    }

    pub fn stick(&mut self) -> &mut SenseStick<EvdevDevice> {
        &mut self.stick
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    /// Scroll `text` across the matrix
    pub fn show_message(&mut self, text: &str, speed: Duration, fg: Pixel, bg: Pixel) -> Result<()> {
        self.matrix
            .show_message(&self.font, text, speed, fg, bg, &mut self.delay)
    }

    /// Show a single character
    pub fn show_letter(&mut self, c: char, fg: Pixel, bg: Pixel) -> Result<()> {
        self.matrix.show_letter(&self.font, c, fg, bg)
    }

    pub fn environment(&mut self) -> Result<&mut BoardEnvironment> {
        self.environment
            .as_mut()
            .ok_or_else(|| Error::DeviceNotFound("pressure and humidity sensors".to_string()))
    }

    /// Pressure in millibars
    pub fn pressure(&mut self) -> Result<f64> {
        self.environment()?.pressure()
    }

    /// Relative humidity in percent
    pub fn humidity(&mut self) -> Result<f64> {
        self.environment()?.humidity()
    }

    /// Temperature in Celsius from the humidity sensor
    pub fn temperature(&mut self) -> Result<f64> {
        self.environment()?.temperature()
    }

    pub fn has_colour_sensor(&self) -> bool {
        self.colour.is_some()
    }

    /// The colour sensor, present on v2 boards
    pub fn colour(&mut self) -> Option<&mut ColourSensor<I2cRegisters>> {
        self.colour.as_mut()
    }

    /// Attach the sensor fusion backend that drives the IMU
    pub fn set_imu_backend(&mut self, backend: Box<dyn ImuBackend>) {
        self.imu = Some(Imu::new(backend, ThreadDelay));
    }

    pub fn imu(&mut self) -> Result<&mut BoardImu> {
        self.imu
            .as_mut()
            .ok_or_else(|| Error::DeviceNotFound("IMU backend".to_string()))
    }
}
