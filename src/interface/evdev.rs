// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linux evdev character device.

use std::{
    fs::File,
    io::{self, Read},
    mem,
    os::unix::io::AsRawFd,
    path::Path,
    ptr,
    time::Duration,
};

use log::trace;

use super::EventSource;

/// An open `/dev/input/eventN` node
#[derive(Debug)]
pub struct EvdevDevice {
    file: File,
}

impl EvdevDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        trace!("opening input device {}", path.as_ref().display());
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl EventSource for EvdevDevice {
    fn read_record(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buf)
    }

    fn poll_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        let timeout = timeout.map(|t| {
            // SAFETY: timespec is plain old data, all zero is valid
            let mut ts: libc::timespec = unsafe { mem::zeroed() };
            ts.tv_sec = t.as_secs().min(libc::time_t::MAX as u64) as libc::time_t;
            ts.tv_nsec = t.subsec_nanos() as _;
            ts
        });
        let timeout_ptr = timeout
            .as_ref()
            .map_or(ptr::null(), |ts| ts as *const libc::timespec);
        let mut fds = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            // SAFETY: `fds` and the timeout outlive the call, a null sigmask
            // keeps the current signal mask
            let rc = unsafe { libc::ppoll(&mut fds, 1, timeout_ptr, ptr::null()) };
            if rc >= 0 {
                return Ok(rc > 0 && fds.revents & libc::POLLIN != 0);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}
