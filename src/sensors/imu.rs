// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! IMU orientation and raw sensor data.
//!
//! Sensor fusion is done by an external library, reached through
//! [`ImuBackend`]. [`Imu`] adds lazy initialization, idempotent sensor
//! enables, read retries and last-good-value fallback on top of it.

use std::time::Duration;

use log::{debug, trace, warn};

use crate::{
    constants::SENSOR_RETRIES,
    interface::{Delay, ThreadDelay},
    Error, Result,
};

/// Aircraft principal axes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Orientation {
    /// Convert from radians to degrees in [0, 360)
    pub fn to_degrees(self) -> Self {
        Self {
            roll: normalize_degrees(self.roll.to_degrees()),
            pitch: normalize_degrees(self.pitch.to_degrees()),
            yaw: normalize_degrees(self.yaw.to_degrees()),
        }
    }
}

fn normalize_degrees(deg: f64) -> f64 {
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// One snapshot from the fusion backend. `None` marks an invalid field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuData {
    /// Fused (roll, pitch, yaw) in radians
    pub fusion_pose: Option<[f64; 3]>,
    /// Magnetometer, microteslas
    pub compass: Option<[f64; 3]>,
    /// Gyroscope, radians per second
    pub gyro: Option<[f64; 3]>,
    /// Accelerometer, Gs
    pub accel: Option<[f64; 3]>,
}

/// Sensor fusion library
pub trait ImuBackend {
    /// Initialize the IMU, returning false on failure
    fn init(&mut self) -> bool;

    /// Recommended time between reads
    fn poll_interval(&self) -> Duration;

    fn set_compass_enabled(&mut self, enabled: bool);

    fn set_gyro_enabled(&mut self, enabled: bool);

    fn set_accel_enabled(&mut self, enabled: bool);

    /// Take a new reading, returning false if none was available
    fn read(&mut self) -> bool;

    /// Data from the last successful read
    fn data(&self) -> ImuData;
}

impl<B: ImuBackend + ?Sized> ImuBackend for Box<B> {
    fn init(&mut self) -> bool {
        (**self).init()
    }

    fn poll_interval(&self) -> Duration {
        (**self).poll_interval()
    }

    fn set_compass_enabled(&mut self, enabled: bool) {
        (**self).set_compass_enabled(enabled)
    }

    fn set_gyro_enabled(&mut self, enabled: bool) {
        (**self).set_gyro_enabled(enabled)
    }

    fn set_accel_enabled(&mut self, enabled: bool) {
        (**self).set_accel_enabled(enabled)
    }

    fn read(&mut self) -> bool {
        (**self).read()
    }

    fn data(&self) -> ImuData {
        (**self).data()
    }
}

/// Which sensors feed the fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImuConfig {
    pub compass: bool,
    pub gyro: bool,
    pub accel: bool,
}

impl ImuConfig {
    pub const ALL: ImuConfig = ImuConfig {
        compass: true,
        gyro: true,
        accel: true,
    };

    pub const fn new(compass: bool, gyro: bool, accel: bool) -> Self {
        Self {
            compass,
            gyro,
            accel,
        }
    }
}

pub struct Imu<B, D = ThreadDelay> {
    backend: B,
    delay: D,
    initialized: bool,
    poll_interval: Duration,
    /// Last configuration pushed to the backend
    config: ImuConfig,

    last_orientation: Orientation,
    last_compass_raw: [f64; 3],
    last_gyro_raw: [f64; 3],
    last_accel_raw: [f64; 3],
}

impl<B: ImuBackend, D: Delay> Imu<B, D> {
    /// Wrap a backend. Nothing is sent to it until first use.
    pub fn new(backend: B, delay: D) -> Self {
        Self {
            backend,
            delay,
            initialized: false,
            poll_interval: Duration::ZERO,
            config: ImuConfig::default(),
            last_orientation: Orientation::default(),
            last_compass_raw: [0.0; 3],
            last_gyro_raw: [0.0; 3],
            last_accel_raw: [0.0; 3],
        }
    }

    fn ensure_init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        for attempt in 1..=SENSOR_RETRIES {
            if self.backend.init() {
                self.initialized = true;
                self.poll_interval = self.backend.poll_interval();
                debug!("IMU initialized, poll interval {:?}", self.poll_interval);
                self.apply_config(ImuConfig::ALL);
                return Ok(());
            }
            warn!("IMU init attempt {} failed", attempt);
        }
        Err(Error::SensorInit("IMU Init Failed".to_string()))
    }

    fn apply_config(&mut self, requested: ImuConfig) {
        if self.config.compass != requested.compass {
            self.backend.set_compass_enabled(requested.compass);
        }
        if self.config.gyro != requested.gyro {
            self.backend.set_gyro_enabled(requested.gyro);
        }
        if self.config.accel != requested.accel {
            self.backend.set_accel_enabled(requested.accel);
        }
        self.config = requested;
    }

    /// Choose the sensors that feed the fusion. Only sensors whose state
    /// changes are reconfigured, since reconfiguring right before a read
    /// makes reads fail.
    pub fn set_imu_config(&mut self, compass: bool, gyro: bool, accel: bool) -> Result<()> {
        self.ensure_init()?;
        self.apply_config(ImuConfig::new(compass, gyro, accel));
        Ok(())
    }

    pub fn config(&self) -> ImuConfig {
        self.config
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Try up to three reads, sleeping one poll interval after each attempt
    pub fn read_imu(&mut self) -> Result<bool> {
        self.ensure_init()?;
        for _ in 0..SENSOR_RETRIES {
            let ok = self.backend.read();
            self.delay.delay(self.poll_interval);
            if ok {
                return Ok(true);
            }
        }
        trace!("IMU read failed after {} attempts", SENSOR_RETRIES);
        Ok(false)
    }

    fn raw_data(&mut self, field: fn(&ImuData) -> Option<[f64; 3]>) -> Result<Option<[f64; 3]>> {
        if self.read_imu()? {
            Ok(field(&self.backend.data()))
        } else {
            Ok(None)
        }
    }

    /// Current orientation in radians, or the last good one
    pub fn orientation_radians(&mut self) -> Result<Orientation> {
        if let Some([roll, pitch, yaw]) = self.raw_data(|d| d.fusion_pose)? {
            self.last_orientation = Orientation { roll, pitch, yaw };
        }
        Ok(self.last_orientation)
    }

    /// Current orientation in degrees, each axis in [0, 360)
    pub fn orientation_degrees(&mut self) -> Result<Orientation> {
        Ok(self.orientation_radians()?.to_degrees())
    }

    /// Direction of North in degrees, from the magnetometer alone
    pub fn heading_from_compass_only(&mut self) -> Result<f64> {
        self.set_imu_config(true, false, false)?;
        Ok(self.orientation_degrees()?.yaw)
    }

    /// Orientation in degrees from the gyroscope alone
    pub fn orientation_from_gyro_only(&mut self) -> Result<Orientation> {
        self.set_imu_config(false, true, false)?;
        self.orientation_degrees()
    }

    /// Orientation in degrees from the accelerometer alone
    pub fn orientation_from_accel_only(&mut self) -> Result<Orientation> {
        self.set_imu_config(false, false, true)?;
        self.orientation_degrees()
    }

    /// Raw magnetometer reading in microteslas
    pub fn compass_raw(&mut self) -> Result<[f64; 3]> {
        if let Some(raw) = self.raw_data(|d| d.compass)? {
            self.last_compass_raw = raw;
        }
        Ok(self.last_compass_raw)
    }

    /// Raw gyroscope reading in radians per second
    pub fn gyroscope_raw(&mut self) -> Result<[f64; 3]> {
        if let Some(raw) = self.raw_data(|d| d.gyro)? {
            self.last_gyro_raw = raw;
        }
        Ok(self.last_gyro_raw)
    }

    /// Raw accelerometer reading in Gs
    pub fn accelerometer_raw(&mut self) -> Result<[f64; 3]> {
        if let Some(raw) = self.raw_data(|d| d.accel)? {
            self.last_accel_raw = raw;
        }
        Ok(self.last_accel_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[derive(Default)]
    struct NoDelay(Vec<Duration>);

    impl Delay for NoDelay {
        fn delay(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init,
        Compass(bool),
        Gyro(bool),
        Accel(bool),
        Read,
    }

    #[derive(Default)]
    struct MockBackend {
        calls: Vec<Call>,
        init_failures: usize,
        /// Results for successive reads; empty means success
        reads: Vec<bool>,
        data: ImuData,
    }

    impl ImuBackend for MockBackend {
        fn init(&mut self) -> bool {
            self.calls.push(Call::Init);
            if self.init_failures > 0 {
                self.init_failures -= 1;
                return false;
            }
            true
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_millis(3)
        }

        fn set_compass_enabled(&mut self, enabled: bool) {
            self.calls.push(Call::Compass(enabled));
        }

        fn set_gyro_enabled(&mut self, enabled: bool) {
            self.calls.push(Call::Gyro(enabled));
        }

        fn set_accel_enabled(&mut self, enabled: bool) {
            self.calls.push(Call::Accel(enabled));
        }

        fn read(&mut self) -> bool {
            self.calls.push(Call::Read);
            if self.reads.is_empty() {
                true
            } else {
                self.reads.remove(0)
            }
        }

        fn data(&self) -> ImuData {
            self.data
        }
    }

    fn imu(backend: MockBackend) -> Imu<MockBackend, NoDelay> {
        Imu::new(backend, NoDelay::default())
    }

    #[test]
    fn test_init_enables_everything_once() {
        let mut imu = imu(MockBackend::default());
        imu.set_imu_config(true, true, true).unwrap();
        assert_eq!(
            imu.backend.calls,
            vec![
                Call::Init,
                Call::Compass(true),
                Call::Gyro(true),
                Call::Accel(true)
            ]
        );
        assert_eq!(imu.config(), ImuConfig::ALL);
        assert_eq!(imu.poll_interval(), Duration::from_millis(3));
    }

    #[test]
    fn test_config_changes_only_differing_sensors() {
        let mut imu = imu(MockBackend::default());
        imu.set_imu_config(true, false, true).unwrap();
        imu.backend.calls.clear();
        imu.set_imu_config(true, false, true).unwrap();
        assert!(imu.backend.calls.is_empty());
        imu.set_imu_config(false, false, true).unwrap();
        assert_eq!(imu.backend.calls, vec![Call::Compass(false)]);
    }

    #[test]
    fn test_init_retries_then_fails() {
        let mut imu = imu(MockBackend {
            init_failures: 3,
            ..Default::default()
        });
        assert!(matches!(imu.read_imu(), Err(Error::SensorInit(_))));
        assert_eq!(imu.backend.calls, vec![Call::Init; 3]);

        let mut imu2 = self::imu(MockBackend {
            init_failures: 2,
            ..Default::default()
        });
        assert!(imu2.read_imu().unwrap());
    }

    #[test]
    fn test_read_retries_with_poll_interval() {
        let mut imu = imu(MockBackend {
            reads: vec![false, false, false, false, true],
            ..Default::default()
        });
        assert!(!imu.read_imu().unwrap());
        let reads = imu.backend.calls.iter().filter(|c| **c == Call::Read).count();
        assert_eq!(reads, 3);
        assert_eq!(imu.delay.0, vec![Duration::from_millis(3); 3]);

        // Fourth fails, fifth succeeds
        assert!(imu.read_imu().unwrap());
        assert_eq!(imu.delay.0.len(), 5);
    }

    #[test]
    fn test_orientation_degrees_normalized() {
        let mut imu = imu(MockBackend {
            data: ImuData {
                fusion_pose: Some([-PI / 2.0, PI / 4.0, 0.0]),
                ..Default::default()
            },
            ..Default::default()
        });
        let o = imu.orientation_degrees().unwrap();
        assert!((o.roll - 270.0).abs() < 1e-9);
        assert!((o.pitch - 45.0).abs() < 1e-9);
        assert_eq!(o.yaw, 0.0);
    }

    #[test]
    fn test_orientation_falls_back_to_last_good() {
        let mut imu = imu(MockBackend {
            data: ImuData {
                fusion_pose: Some([0.1, 0.2, 0.3]),
                ..Default::default()
            },
            ..Default::default()
        });
        let first = imu.orientation_radians().unwrap();
        assert_eq!(first.yaw, 0.3);

        imu.backend.reads = vec![false; 3];
        imu.backend.data.fusion_pose = Some([1.0, 1.0, 1.0]);
        assert_eq!(imu.orientation_radians().unwrap(), first);

        // Invalid fusion data also keeps the last value
        imu.backend.data.fusion_pose = None;
        assert_eq!(imu.orientation_radians().unwrap(), first);
    }

    #[test]
    fn test_raw_getters() {
        let mut imu = imu(MockBackend {
            data: ImuData {
                fusion_pose: None,
                compass: Some([1.0, 2.0, 3.0]),
                gyro: Some([0.5, 0.0, -0.5]),
                accel: None,
            },
            ..Default::default()
        });
        assert_eq!(imu.compass_raw().unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(imu.gyroscope_raw().unwrap(), [0.5, 0.0, -0.5]);
        assert_eq!(imu.accelerometer_raw().unwrap(), [0.0; 3]);
    }

    #[test]
    fn test_heading_from_compass_only_reconfigures() {
        let mut imu = imu(MockBackend {
            data: ImuData {
                fusion_pose: Some([0.0, 0.0, -PI]),
                ..Default::default()
            },
            ..Default::default()
        });
        let heading = imu.heading_from_compass_only().unwrap();
        assert!((heading - 180.0).abs() < 1e-9);
        assert_eq!(imu.config(), ImuConfig::new(true, false, false));

        imu.orientation_from_accel_only().unwrap();
        assert_eq!(imu.config(), ImuConfig::new(false, false, true));
        imu.orientation_from_gyro_only().unwrap();
        assert_eq!(imu.config(), ImuConfig::new(false, true, false));
    }

    #[test]
    fn test_boxed_backend() {
        let backend: Box<dyn ImuBackend> = Box::new(MockBackend::default());
        let mut imu = Imu::new(backend, NoDelay::default());
        assert!(imu.read_imu().unwrap());
    }
}
