// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Locating Sense HAT devices by the names their drivers advertise.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use log::{debug, trace};

/// Finds device nodes by advertised name
pub trait DeviceDiscovery {
    /// Path of the framebuffer device whose driver name is `name`
    fn find_framebuffer(&self, name: &str) -> io::Result<Option<PathBuf>>;

    /// Path of the input event device whose device name is `name`
    fn find_input_device(&self, name: &str) -> io::Result<Option<PathBuf>>;

    /// Whether any I2C bus device node exists
    fn i2c_available(&self) -> bool;
}

/// Discovery through sysfs, the way udev names the nodes
#[derive(Debug, Clone)]
pub struct SysfsDiscovery {
    sys_root: PathBuf,
    dev_root: PathBuf,
}

impl Default for SysfsDiscovery {
    fn default() -> Self {
        Self::new("/sys", "/dev")
    }
}

impl SysfsDiscovery {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(sys_root: P, dev_root: Q) -> Self {
        Self {
            sys_root: sys_root.as_ref().to_path_buf(),
            dev_root: dev_root.as_ref().to_path_buf(),
        }
    }

    /// Entries of `class_dir` whose file name starts with `prefix`, sorted
    fn class_entries(class_dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
        let read_dir = match fs::read_dir(class_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(prefix) {
                entries.push(entry.path());
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Contents of a sysfs name file, or None when it does not exist
    fn read_name(path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl DeviceDiscovery for SysfsDiscovery {
    fn find_framebuffer(&self, name: &str) -> io::Result<Option<PathBuf>> {
        let class_dir = self.sys_root.join("class").join("graphics");
        for fb in Self::class_entries(&class_dir, "fb")? {
            let found = Self::read_name(&fb.join("name"))?;
            trace!("--- {} : {:?} ---", fb.display(), found);
            if found.as_deref() == Some(name) {
                if let Some(node) = fb.file_name() {
                    let dev = self.dev_root.join(node);
                    if dev.exists() {
                        debug!("found framebuffer \"{}\" at {}", name, dev.display());
                        return Ok(Some(dev));
                    }
                }
            }
        }
        Ok(None)
    }

    fn find_input_device(&self, name: &str) -> io::Result<Option<PathBuf>> {
        let class_dir = self.sys_root.join("class").join("input");
        for evdev in Self::class_entries(&class_dir, "event")? {
            let found = Self::read_name(&evdev.join("device").join("name"))?;
            trace!("--- {} : {:?} ---", evdev.display(), found);
            if found.as_deref() == Some(name) {
                if let Some(node) = evdev.file_name() {
                    let dev = self.dev_root.join("input").join(node);
                    debug!("found input device \"{}\" at {}", name, dev.display());
                    return Ok(Some(dev));
                }
            }
        }
        Ok(None)
    }

    fn i2c_available(&self) -> bool {
        Self::class_entries(&self.dev_root, "i2c-")
            .map(|entries| !entries.is_empty())
            .unwrap_or(false)
    }
}
