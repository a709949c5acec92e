// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Blocking delays
//!
//! Sensor retries, text scrolling and colour sensor warm-up all sleep. They
//! take a [`Delay`] so tests can run without waiting.

use std::{thread, time::Duration};

pub trait Delay {
    /// Pauses execution for `duration`
    fn delay(&mut self, duration: Duration);
}

/// Delay backed by `thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
