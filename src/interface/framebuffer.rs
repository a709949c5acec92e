// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linux framebuffer device backing the LED matrix.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
};

use log::trace;

use super::FrameBufferInterface;
use crate::constants::{
    BYTES_PER_PIXEL, GAMMA_LEN, SENSE_HAT_FB_FBIOGET_GAMMA, SENSE_HAT_FB_FBIORESET_GAMMA,
    SENSE_HAT_FB_FBIOSET_GAMMA,
};

/// The `/dev/fbN` node of the LED matrix.
///
/// No handle is kept: every call opens the device, seeks and transfers, then
/// closes it again. Writes from other processes may interleave between calls.
#[derive(Debug, Clone)]
pub struct FbDevice {
    path: PathBuf,
}

impl FbDevice {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_rw(&self) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(&self.path)
    }

    fn ioctl(&self, request: u32, arg: libc::c_ulong) -> io::Result<()> {
        let file = File::open(&self.path)?;
        // SAFETY: fd is valid for the lifetime of `file`; the framebuffer
        // driver reads or writes at most GAMMA_LEN bytes through `arg`.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), request as _, arg) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl FrameBufferInterface for FbDevice {
    fn write_words(&mut self, words: &[(usize, u16)]) -> io::Result<()> {
        trace!("fb write {} words to {}", words.len(), self.path.display());
        let mut file = self.open_rw()?;
        for &(offset, word) in words {
            file.seek(SeekFrom::Start((offset * BYTES_PER_PIXEL) as u64))?;
            file.write_all(&word.to_ne_bytes())?;
        }
        file.flush()
    }

    fn read_words(&mut self, offsets: &[usize]) -> io::Result<Vec<u16>> {
        trace!("fb read {} words from {}", offsets.len(), self.path.display());
        let mut file = File::open(&self.path)?;
        let mut words = Vec::with_capacity(offsets.len());
        let mut buf = [0u8; BYTES_PER_PIXEL];
        for &offset in offsets {
            file.seek(SeekFrom::Start((offset * BYTES_PER_PIXEL) as u64))?;
            file.read_exact(&mut buf)?;
            words.push(u16::from_ne_bytes(buf));
        }
        Ok(words)
    }

    fn gamma(&mut self) -> io::Result<[u8; GAMMA_LEN]> {
        let mut table = [0u8; GAMMA_LEN];
        self.ioctl(
            SENSE_HAT_FB_FBIOGET_GAMMA,
            table.as_mut_ptr() as libc::c_ulong,
        )?;
        Ok(table)
    }

    fn set_gamma(&mut self, table: &[u8; GAMMA_LEN]) -> io::Result<()> {
        let mut copy = *table;
        self.ioctl(
            SENSE_HAT_FB_FBIOSET_GAMMA,
            copy.as_mut_ptr() as libc::c_ulong,
        )
    }

    fn reset_gamma(&mut self, preset: u32) -> io::Result<()> {
        self.ioctl(SENSE_HAT_FB_FBIORESET_GAMMA, preset as libc::c_ulong)
    }
}
