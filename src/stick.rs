// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sense HAT joystick.
//!
//! The joystick is a five key evdev device. Every record the kernel delivers
//! is a `struct input_event`: two native `long`s of timestamp followed by
//! type, code and value. Only key records are surfaced.

use std::{io, mem::size_of, path::PathBuf, time::Duration};

use byteorder::{ByteOrder, NativeEndian};
use log::{debug, trace};

use crate::{
    constants::{
        EV_KEY, KEY_DOWN, KEY_ENTER, KEY_LEFT, KEY_RIGHT, KEY_UP, STATE_HOLD,
        STATE_PRESS, STATE_RELEASE,
    },
    interface::{DeviceDiscovery, EvdevDevice, EventSource},
    Error, Result,
};

const LONG_SIZE: usize = size_of::<libc::c_long>();

/// Size of one input event record on this platform
pub const EVENT_SIZE: usize = 2 * LONG_SIZE + 2 + 2 + 4;

/// What happened to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Release,
    Press,
    Hold,
}

impl Action {
    pub fn from_state(state: u32) -> Option<Self> {
        match state {
            STATE_RELEASE => Some(Action::Release),
            STATE_PRESS => Some(Action::Press),
            STATE_HOLD => Some(Action::Hold),
            _ => None,
        }
    }

    pub fn state(self) -> u32 {
        match self {
            Action::Release => STATE_RELEASE,
            Action::Press => STATE_PRESS,
            Action::Hold => STATE_HOLD,
        }
    }
}

/// Joystick key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Middle,
}

impl Direction {
    pub fn from_key(key: u16) -> Option<Self> {
        match key {
            KEY_UP => Some(Direction::Up),
            KEY_DOWN => Some(Direction::Down),
            KEY_LEFT => Some(Direction::Left),
            KEY_RIGHT => Some(Direction::Right),
            KEY_ENTER => Some(Direction::Middle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickEvent {
    /// Seconds since the epoch, microsecond resolution
    pub timestamp: f64,
    /// Linux key code
    pub key: u16,
    pub action: Action,
}

impl JoystickEvent {
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_key(self.key)
    }
}

fn read_long(buf: &[u8]) -> i64 {
    if LONG_SIZE == 8 {
        NativeEndian::read_i64(buf)
    } else {
        NativeEndian::read_i32(buf) as i64
    }
}

/// Decode one raw input event record. Returns `None` for records that are
/// not key events or are too short.
pub fn parse_event(record: &[u8]) -> Option<JoystickEvent> {
    if record.len() < EVENT_SIZE {
        return None;
    }
    let sec = read_long(&record[..LONG_SIZE]);
    let usec = read_long(&record[LONG_SIZE..2 * LONG_SIZE]);
    let tail = &record[2 * LONG_SIZE..EVENT_SIZE];
    let kind = NativeEndian::read_u16(&tail[0..2]);
    let code = NativeEndian::read_u16(&tail[2..4]);
    let value = NativeEndian::read_u32(&tail[4..8]);

    if kind != EV_KEY {
        return None;
    }
    let Some(action) = Action::from_state(value) else {
        trace!("ignoring key {} with state {}", code, value);
        return None;
    };
    Some(JoystickEvent {
        timestamp: sec as f64 + usec as f64 / 1_000_000.0,
        key: code,
        action,
    })
}

/// Reader for the joystick event stream
pub struct SenseStick<S = EvdevDevice> {
    source: S,
}

impl SenseStick<EvdevDevice> {
    /// Find the input device advertising `name` and open it
    pub fn open(discovery: &dyn DeviceDiscovery, name: &str) -> Result<Self> {
        let path = Self::find_device(discovery, name)?;
        debug!("joystick at {}", path.display());
        Ok(Self::new(EvdevDevice::open(path)?))
    }

    pub fn find_device(discovery: &dyn DeviceDiscovery, name: &str) -> Result<PathBuf> {
        discovery
            .find_input_device(name)?
            .ok_or_else(|| Error::DeviceNotFound(format!("{} device", name)))
    }
}

impl<S: EventSource> SenseStick<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Block until the next key event
    pub fn read(&mut self) -> Result<JoystickEvent> {
        let mut buf = [0u8; EVENT_SIZE];
        loop {
            self.source.read_record(&mut buf)?;
            if let Some(event) = parse_event(&buf) {
                trace!("{:?}", event);
                return Ok(event);
            }
        }
    }

    /// Wait up to `timeout` for an event to be available; `None` blocks. Does
    /// not consume anything.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<bool> {
        Ok(self.source.poll_readable(timeout)?)
    }

    /// Every key event already queued, without blocking
    pub fn get_events(&mut self) -> Result<Vec<JoystickEvent>> {
        let mut events = Vec::new();
        let mut buf = [0u8; EVENT_SIZE];
        while self.source.poll_readable(Some(Duration::ZERO))? {
            match self.source.read_record(&mut buf) {
                Ok(()) => events.extend(parse_event(&buf)),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(events)
    }

    pub fn free(self) -> S {
        self.source
    }
}
