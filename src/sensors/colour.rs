// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! TCS34725 colour sensor, fitted to Sense HAT v2.
//!
//! Raw channel values run up to [`tcs34725_max_value`] for the current
//! integration cycles; the scaled accessors divide them down to roughly
//! 0..=255.

use std::{path::Path, time::Duration};

use log::{debug, trace, warn};

use crate::{
    constants::{
        tcs34725_max_value, TCS34725_ADDR, TCS34725_ADDR_FALLBACK, TCS34725_ATIME,
        TCS34725_BDATA, TCS34725_CDATA, TCS34725_CLOCK_STEP_US, TCS34725_CONTROL,
        TCS34725_ENABLE, TCS34725_GAIN_VALUES, TCS34725_GDATA, TCS34725_ID, TCS34725_ID_REG,
        TCS34725_OFF, TCS34725_ON, TCS34725_PON, TCS34725_RDATA,
    },
    interface::{Delay, I2cRegisters, RegisterInterface, ThreadDelay},
    Error, Result,
};

const INIT_ERROR: &str = "Failed to initialise TCS34725 colour sensor.";

/// Red, green, blue and clear channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgbc<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
    pub clear: T,
}

impl<T: Copy> Rgbc<T> {
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Rgbc<U> {
        Rgbc {
            red: f(self.red),
            green: f(self.green),
            blue: f(self.blue),
            clear: f(self.clear),
        }
    }
}

fn clock_step() -> Duration {
    Duration::from_micros(TCS34725_CLOCK_STEP_US)
}

pub struct ColourSensor<I, D = ThreadDelay> {
    dev: I,
    delay: D,
    integration_cycles: u16,
    max_raw: u32,
    scaling: u32,
}

impl ColourSensor<I2cRegisters, ThreadDelay> {
    /// Open the sensor on `bus`, trying the primary address then the
    /// fallback one
    pub fn open_i2c<P: AsRef<Path>>(bus: P) -> Result<Self> {
        let mut last_error = None;
        for address in [TCS34725_ADDR, TCS34725_ADDR_FALLBACK] {
            let mut dev = I2cRegisters::new(bus.as_ref(), address).map_err(|e| {
                Error::SensorInit(format!("{} (I2C is not enabled: {})", INIT_ERROR, e))
            })?;
            match dev.read_byte(TCS34725_ID_REG) {
                Ok(TCS34725_ID) => {
                    debug!("TCS34725 found at 0x{:02x}", address);
                    return Self::new(dev, ThreadDelay);
                }
                Ok(id) => {
                    warn!("0x{:02x}: unexpected id 0x{:02x}", address, id);
                    last_error = Some(format!("different device id detected: {}", id));
                }
                Err(e) => {
                    trace!("0x{:02x}: {}", address, e);
                    last_error = Some("sensor not present".to_string());
                }
            }
        }
        Err(Error::SensorInit(format!(
            "{} ({})",
            INIT_ERROR,
            last_error.unwrap_or_default()
        )))
    }
}

impl<I: RegisterInterface, D: Delay> ColourSensor<I, D> {
    /// Verify the device id, then set gain 1, one integration cycle and
    /// enable the sensor
    pub fn new(dev: I, delay: D) -> Result<Self> {
        Self::with_settings(dev, delay, 1, 1)
    }

    pub fn with_settings(dev: I, delay: D, gain: u16, integration_cycles: u16) -> Result<Self> {
        let mut sensor = Self {
            dev,
            delay,
            integration_cycles: 1,
            max_raw: tcs34725_max_value(1),
            scaling: tcs34725_max_value(1) / 256,
        };
        let id = sensor
            .dev
            .read_byte(TCS34725_ID_REG)
            .map_err(|_| Error::SensorInit(format!("{} (sensor not present)", INIT_ERROR)))?;
        if id != TCS34725_ID {
            return Err(Error::SensorInit(format!(
                "{} (different device id detected: {})",
                INIT_ERROR, id
            )));
        }
        sensor.set_gain(gain)?;
        sensor.set_integration_cycles(integration_cycles)?;
        sensor.set_enabled(true)?;
        Ok(sensor)
    }

    pub fn enabled(&mut self) -> Result<bool> {
        Ok(self.dev.read_byte(TCS34725_ENABLE)? == TCS34725_ON)
    }

    /// Power the sensor up (with its warm-up delay) or down
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.dev.write_byte(TCS34725_ENABLE, TCS34725_PON)?;
            self.delay.delay(clock_step());
            self.dev.write_byte(TCS34725_ENABLE, TCS34725_ON)?;
        } else {
            self.dev.write_byte(TCS34725_ENABLE, TCS34725_OFF)?;
        }
        self.delay.delay(clock_step());
        Ok(())
    }

    pub fn gain(&mut self) -> Result<u16> {
        let reg = self.dev.read_byte(TCS34725_CONTROL)?;
        Ok(TCS34725_GAIN_VALUES[(reg & 0x03) as usize])
    }

    /// Set the gain: 1, 4, 16 or 60
    pub fn set_gain(&mut self, gain: u16) -> Result<()> {
        let reg = TCS34725_GAIN_VALUES
            .iter()
            .position(|&g| g == gain)
            .ok_or(Error::InvalidGain(gain))?;
        self.dev.write_byte(TCS34725_CONTROL, reg as u8)?;
        Ok(())
    }

    pub fn integration_cycles(&mut self) -> Result<u16> {
        Ok(256 - self.dev.read_byte(TCS34725_ATIME)? as u16)
    }

    /// Set the integration cycles, 1..=256; each cycle takes 2.4 ms
    pub fn set_integration_cycles(&mut self, cycles: u16) -> Result<()> {
        if !(1..=256).contains(&cycles) {
            return Err(Error::InvalidIntegrationCycles(cycles));
        }
        self.dev.write_byte(TCS34725_ATIME, (256 - cycles) as u8)?;
        self.integration_cycles = cycles;
        self.max_raw = tcs34725_max_value(cycles);
        self.scaling = self.max_raw / 256;
        self.delay.delay(clock_step());
        Ok(())
    }

    /// Time needed for a new reading
    pub fn integration_time(&self) -> Duration {
        clock_step() * self.integration_cycles as u32
    }

    /// Largest raw value a channel can report
    pub fn max_raw(&self) -> u32 {
        self.max_raw
    }

    /// All four channels from one block read
    pub fn colour_raw(&mut self) -> Result<Rgbc<u16>> {
        let mut block = [0u8; 8];
        self.dev.read_block(TCS34725_CDATA, &mut block)?;
        let word = |i: usize| u16::from_le_bytes([block[i], block[i + 1]]);
        Ok(Rgbc {
            red: word(2),
            green: word(4),
            blue: word(6),
            clear: word(0),
        })
    }

    fn scale(&self, raw: u16) -> u16 {
        (raw as u32 / self.scaling) as u16
    }

    /// All four channels scaled to 0..=255
    pub fn colour(&mut self) -> Result<Rgbc<u16>> {
        let raw = self.colour_raw()?;
        Ok(raw.map(|v| self.scale(v)))
    }

    pub fn red_raw(&mut self) -> Result<u16> {
        Ok(self.dev.read_word(TCS34725_RDATA)?)
    }

    pub fn green_raw(&mut self) -> Result<u16> {
        Ok(self.dev.read_word(TCS34725_GDATA)?)
    }

    pub fn blue_raw(&mut self) -> Result<u16> {
        Ok(self.dev.read_word(TCS34725_BDATA)?)
    }

    pub fn clear_raw(&mut self) -> Result<u16> {
        Ok(self.dev.read_word(TCS34725_CDATA)?)
    }

    pub fn red(&mut self) -> Result<u16> {
        let raw = self.red_raw()?;
        Ok(self.scale(raw))
    }

    pub fn green(&mut self) -> Result<u16> {
        let raw = self.green_raw()?;
        Ok(self.scale(raw))
    }

    pub fn blue(&mut self) -> Result<u16> {
        let raw = self.blue_raw()?;
        Ok(self.scale(raw))
    }

    pub fn clear(&mut self) -> Result<u16> {
        let raw = self.clear_raw()?;
        Ok(self.scale(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::environment::tests::MockRegisters;

    #[derive(Default)]
    struct CountingDelay(Vec<Duration>);

    impl Delay for CountingDelay {
        fn delay(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    fn registers() -> MockRegisters {
        let mut regs = MockRegisters::with(&[(TCS34725_ID_REG, TCS34725_ID)]);
        // C = 0x0400, R = 0x0200, G = 0x0100, B = 0x03ff
        for (i, b) in [0x00, 0x04, 0x00, 0x02, 0x00, 0x01, 0xff, 0x03]
            .into_iter()
            .enumerate()
        {
            regs.regs.insert(TCS34725_CDATA + i as u8, b);
        }
        regs
    }

    fn sensor() -> ColourSensor<MockRegisters, CountingDelay> {
        ColourSensor::new(registers(), CountingDelay::default()).unwrap()
    }

    #[test]
    fn test_new_configures_and_enables() {
        let sensor = sensor();
        assert_eq!(
            sensor.dev.writes,
            vec![
                (TCS34725_CONTROL, 0x00),
                (TCS34725_ATIME, 255),
                (TCS34725_ENABLE, TCS34725_PON),
                (TCS34725_ENABLE, TCS34725_ON)
            ]
        );
        // ATIME settle, PON warm-up, enable settle
        assert_eq!(sensor.delay.0, vec![clock_step(); 3]);
    }

    #[test]
    fn test_wrong_id() {
        let mut regs = registers();
        regs.regs.insert(TCS34725_ID_REG, 0x10);
        let err = ColourSensor::new(regs, CountingDelay::default()).err().unwrap();
        assert!(matches!(err, Error::SensorInit(ref m) if m.contains("16")));

        let mut regs = registers();
        regs.fail_reads = 1;
        let err = ColourSensor::new(regs, CountingDelay::default()).err().unwrap();
        assert!(matches!(err, Error::SensorInit(ref m) if m.contains("not present")));
    }

    #[test]
    fn test_enabled_round_trip() {
        let mut sensor = sensor();
        assert!(sensor.enabled().unwrap());
        sensor.set_enabled(false).unwrap();
        assert!(!sensor.enabled().unwrap());
    }

    #[test]
    fn test_gain() {
        let mut sensor = sensor();
        for gain in [1, 4, 16, 60] {
            sensor.set_gain(gain).unwrap();
            assert_eq!(sensor.gain().unwrap(), gain);
        }
        assert!(matches!(sensor.set_gain(8), Err(Error::InvalidGain(8))));
        assert_eq!(sensor.gain().unwrap(), 60);
    }

    #[test]
    fn test_integration_cycles() {
        let mut sensor = sensor();
        sensor.set_integration_cycles(64).unwrap();
        assert_eq!(sensor.integration_cycles().unwrap(), 64);
        assert_eq!(sensor.max_raw(), 65536);
        assert_eq!(sensor.integration_time(), Duration::from_micros(64 * 2400));

        sensor.set_integration_cycles(256).unwrap();
        assert_eq!(sensor.dev.regs[&TCS34725_ATIME], 0);
        assert_eq!(sensor.integration_cycles().unwrap(), 256);

        assert!(matches!(
            sensor.set_integration_cycles(0),
            Err(Error::InvalidIntegrationCycles(0))
        ));
        assert!(matches!(
            sensor.set_integration_cycles(257),
            Err(Error::InvalidIntegrationCycles(257))
        ));
        assert_eq!(sensor.integration_cycles().unwrap(), 256);
    }

    #[test]
    fn test_colour_raw_block_order() {
        let mut sensor = sensor();
        let raw = sensor.colour_raw().unwrap();
        assert_eq!(
            raw,
            Rgbc {
                red: 0x0200,
                green: 0x0100,
                blue: 0x03ff,
                clear: 0x0400
            }
        );
        assert_eq!(sensor.red_raw().unwrap(), 0x0200);
        assert_eq!(sensor.clear_raw().unwrap(), 0x0400);
    }

    #[test]
    fn test_colour_scaled() {
        let mut sensor = sensor();
        // One cycle: max 1024, scaling 4
        let scaled = sensor.colour().unwrap();
        assert_eq!(
            scaled,
            Rgbc {
                red: 128,
                green: 64,
                blue: 255,
                clear: 256
            }
        );
        assert_eq!(sensor.blue().unwrap(), 255);

        sensor.set_integration_cycles(100).unwrap();
        // Scaling 256
        assert_eq!(sensor.clear().unwrap(), 4);
        assert_eq!(sensor.green().unwrap(), 1);
    }
}
