// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pressure, humidity and temperature.
//!
//! [`Environment`] initializes each sensor on first use and turns invalid
//! readings into 0.0. [`Lps25h`] and [`Hts221`] are the register level
//! drivers for the two chips fitted to the Sense HAT.

use std::io;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::{
    constants::{
        HTS221_AV_CONF, HTS221_CTRL1, HTS221_H0_H_2, HTS221_H0_T0_OUT, HTS221_H1_H_2,
        HTS221_H1_T0_OUT, HTS221_HUMIDITY_OUT_H, HTS221_HUMIDITY_OUT_L, HTS221_ID, HTS221_STATUS,
        HTS221_T0_C_8, HTS221_T0_OUT, HTS221_T1_C_8, HTS221_T1_OUT, HTS221_T1_T0,
        HTS221_TEMP_OUT_H, HTS221_TEMP_OUT_L, HTS221_WHO_AM_I, LPS25H_CTRL_REG_1,
        LPS25H_CTRL_REG_2, LPS25H_FIFO_CTRL, LPS25H_ID, LPS25H_PRESS_OUT_H, LPS25H_PRESS_OUT_L,
        LPS25H_PRESS_OUT_XL, LPS25H_RES_CONF, LPS25H_STATUS_REG, LPS25H_TEMP_OUT_H,
        LPS25H_TEMP_OUT_L, LPS25H_WHO_AM_I, SENSOR_RETRIES,
    },
    interface::RegisterInterface,
    Error, Result,
};

/// One pressure sensor reading, `None` where the sensor had no new data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PressureReading {
    /// Millibars
    pub pressure: Option<f64>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
}

/// One humidity sensor reading, `None` where the sensor had no new data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HumidityReading {
    /// Percent relative humidity
    pub humidity: Option<f64>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
}

pub trait PressureSensor {
    fn init(&mut self) -> io::Result<()>;

    fn read(&mut self) -> io::Result<PressureReading>;
}

pub trait HumiditySensor {
    fn init(&mut self) -> io::Result<()>;

    fn read(&mut self) -> io::Result<HumidityReading>;
}

fn init_with_retries(name: &str, mut init: impl FnMut() -> io::Result<()>) -> Result<()> {
    for attempt in 1..=SENSOR_RETRIES {
        match init() {
            Ok(()) => {
                debug!("{} sensor initialized", name);
                return Ok(());
            }
            Err(e) => warn!("{} init attempt {} failed: {}", name, attempt, e),
        }
    }
    Err(Error::SensorInit(format!("{} Init Failed", name)))
}

/// Pressure and humidity sensors with lazy initialization
pub struct Environment<P, H> {
    pressure: P,
    humidity: H,
    pressure_init: bool,
    humidity_init: bool,
}

impl<P: PressureSensor, H: HumiditySensor> Environment<P, H> {
    pub fn new(pressure: P, humidity: H) -> Self {
        Self {
            pressure,
            humidity,
            pressure_init: false,
            humidity_init: false,
        }
    }

    fn read_pressure(&mut self) -> Result<PressureReading> {
        if !self.pressure_init {
            let sensor = &mut self.pressure;
            init_with_retries("Pressure", || sensor.init())?;
            self.pressure_init = true;
        }
        Ok(self.pressure.read()?)
    }

    fn read_humidity(&mut self) -> Result<HumidityReading> {
        if !self.humidity_init {
            let sensor = &mut self.humidity;
            init_with_retries("Humidity", || sensor.init())?;
            self.humidity_init = true;
        }
        Ok(self.humidity.read()?)
    }

    /// Pressure in millibars, 0.0 when no valid reading
    pub fn pressure(&mut self) -> Result<f64> {
        Ok(self.read_pressure()?.pressure.unwrap_or(0.0))
    }

    /// Relative humidity in percent, 0.0 when no valid reading
    pub fn humidity(&mut self) -> Result<f64> {
        Ok(self.read_humidity()?.humidity.unwrap_or(0.0))
    }

    /// Temperature in Celsius from the pressure sensor
    pub fn temperature_from_pressure(&mut self) -> Result<f64> {
        Ok(self.read_pressure()?.temperature.unwrap_or(0.0))
    }

    /// Temperature in Celsius from the humidity sensor
    pub fn temperature_from_humidity(&mut self) -> Result<f64> {
        Ok(self.read_humidity()?.temperature.unwrap_or(0.0))
    }

    /// Temperature in Celsius, taken from the humidity sensor
    pub fn temperature(&mut self) -> Result<f64> {
        self.temperature_from_humidity()
    }
}

fn read_i16<I: RegisterInterface>(dev: &mut I, low: u8, high: u8) -> io::Result<i16> {
    let buf = [dev.read_byte(low)?, dev.read_byte(high)?];
    Ok(LittleEndian::read_i16(&buf))
}

fn check_id<I: RegisterInterface>(dev: &mut I, register: u8, expected: u8) -> io::Result<()> {
    let id = dev.read_byte(register)?;
    if id != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected WHO_AM_I 0x{:02x}, wanted 0x{:02x}", id, expected),
        ));
    }
    Ok(())
}

/// LPS25H barometer
pub struct Lps25h<I> {
    dev: I,
}

impl<I: RegisterInterface> Lps25h<I> {
    pub fn new(dev: I) -> Self {
        Self { dev }
    }
}

impl<I: RegisterInterface> PressureSensor for Lps25h<I> {
    fn init(&mut self) -> io::Result<()> {
        check_id(&mut self.dev, LPS25H_WHO_AM_I, LPS25H_ID)?;
        // Power on, 25 Hz output, block data update
        self.dev.write_byte(LPS25H_CTRL_REG_1, 0xc4)?;
        self.dev.write_byte(LPS25H_RES_CONF, 0x05)?;
        self.dev.write_byte(LPS25H_FIFO_CTRL, 0xc0)?;
        self.dev.write_byte(LPS25H_CTRL_REG_2, 0x40)?;
        Ok(())
    }

    fn read(&mut self) -> io::Result<PressureReading> {
        let status = self.dev.read_byte(LPS25H_STATUS_REG)?;
        let mut reading = PressureReading::default();
        if status & 0x02 != 0 {
            let buf = [
                self.dev.read_byte(LPS25H_PRESS_OUT_XL)?,
                self.dev.read_byte(LPS25H_PRESS_OUT_L)?,
                self.dev.read_byte(LPS25H_PRESS_OUT_H)?,
                0,
            ];
            reading.pressure = Some(LittleEndian::read_u32(&buf) as f64 / 4096.0);
        }
        if status & 0x01 != 0 {
            let raw = read_i16(&mut self.dev, LPS25H_TEMP_OUT_L, LPS25H_TEMP_OUT_H)?;
            reading.temperature = Some(raw as f64 / 480.0 + 42.5);
        }
        Ok(reading)
    }
}

/// Linear fit from raw counts to physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Calibration {
    temp_m: f64,
    temp_c: f64,
    hum_m: f64,
    hum_c: f64,
}

/// HTS221 humidity sensor
pub struct Hts221<I> {
    dev: I,
    calibration: Calibration,
}

impl<I: RegisterInterface> Hts221<I> {
    pub fn new(dev: I) -> Self {
        Self {
            dev,
            calibration: Calibration::default(),
        }
    }

    fn read_calibration(&mut self) -> io::Result<Calibration> {
        let t1_t0 = self.dev.read_byte(HTS221_T1_T0)?;
        let t0 = LittleEndian::read_i16(&[self.dev.read_byte(HTS221_T0_C_8)?, t1_t0 & 0x03]) as f64
            / 8.0;
        let t1 = LittleEndian::read_i16(&[self.dev.read_byte(HTS221_T1_C_8)?, (t1_t0 & 0x0c) >> 2])
            as f64
            / 8.0;
        let t0_out = read_i16(&mut self.dev, HTS221_T0_OUT, HTS221_T0_OUT + 1)? as f64;
        let t1_out = read_i16(&mut self.dev, HTS221_T1_OUT, HTS221_T1_OUT + 1)? as f64;

        let h0 = self.dev.read_byte(HTS221_H0_H_2)? as f64 / 2.0;
        let h1 = self.dev.read_byte(HTS221_H1_H_2)? as f64 / 2.0;
        let h0_t0_out = read_i16(&mut self.dev, HTS221_H0_T0_OUT, HTS221_H0_T0_OUT + 1)? as f64;
        let h1_t0_out = read_i16(&mut self.dev, HTS221_H1_T0_OUT, HTS221_H1_T0_OUT + 1)? as f64;

        if t1_out == t0_out || h1_t0_out == h0_t0_out {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "degenerate HTS221 calibration",
            ));
        }
        let temp_m = (t1 - t0) / (t1_out - t0_out);
        let hum_m = (h1 - h0) / (h1_t0_out - h0_t0_out);
        Ok(Calibration {
            temp_m,
            temp_c: t0 - temp_m * t0_out,
            hum_m,
            hum_c: h0 - hum_m * h0_t0_out,
        })
    }
}

impl<I: RegisterInterface> HumiditySensor for Hts221<I> {
    fn init(&mut self) -> io::Result<()> {
        check_id(&mut self.dev, HTS221_WHO_AM_I, HTS221_ID)?;
        // Power on, 12.5 Hz output, block data update
        self.dev.write_byte(HTS221_CTRL1, 0x87)?;
        self.dev.write_byte(HTS221_AV_CONF, 0x1b)?;
        self.calibration = self.read_calibration()?;
        Ok(())
    }

    fn read(&mut self) -> io::Result<HumidityReading> {
        let status = self.dev.read_byte(HTS221_STATUS)?;
        let cal = self.calibration;
        let mut reading = HumidityReading::default();
        if status & 0x02 != 0 {
            let raw = read_i16(&mut self.dev, HTS221_HUMIDITY_OUT_L, HTS221_HUMIDITY_OUT_H)?;
            reading.humidity = Some(raw as f64 * cal.hum_m + cal.hum_c);
        }
        if status & 0x01 != 0 {
            let raw = read_i16(&mut self.dev, HTS221_TEMP_OUT_L, HTS221_TEMP_OUT_H)?;
            reading.temperature = Some(raw as f64 * cal.temp_m + cal.temp_c);
        }
        Ok(reading)
    }
}
