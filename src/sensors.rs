/*
 * This file is part of Thermcap.
 *
 * Copyright (C) 2025 Thermcap contributors
 *
 * Thermcap is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Thermcap is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Thermcap. If not, see <https://www.gnu.org/licenses/>.
 */

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tc_error::{Result, ThermcapError};
use tracing::debug;

use crate::constants::sensor;

/// One temperature input discovered at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorHandle {
    /// Chip identifier like "coretemp@hwmon2"
    pub chip: String,
    pub path: PathBuf,
}

impl fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.path.file_name().and_then(|s| s.to_str()).unwrap_or("?");
        write!(f, "{}:{}", self.chip, file)
    }
}

/// Enumerate every temperature input under the hwmon root.
///
/// Only file names carrying both the temperature and the input marker are
/// kept, so `temp1_crit` or `temp1_label` never show up. The result is
/// sorted by path. An empty set is an error: the daemon cannot run blind.
pub fn discover_sensors(root: &Path) -> Result<Vec<SensorHandle>> {
    let mut out: Vec<SensorHandle> = Vec::new();

    let entries = match fs::read_dir(root) {
        Ok(it) => it,
        Err(e) => {
            debug!("Cannot list {}: {}", root.display(), e);
            return Err(ThermcapError::NoSensorsFound { root: root.to_path_buf() });
        }
    };

    for ent in entries.flatten() {
        let path = ent.path();
        if !path.is_dir() { continue; }

        // hwmonN entries are usually symlinks into /sys/devices
        let dir = fs::canonicalize(&path).unwrap_or(path);
        let base_name = read_trimmed(dir.join(sensor::CHIP_NAME_FILE)).unwrap_or_else(|_| "unknown".into());
        let hwmon_tag = ent.file_name().to_string_lossy().into_owned();
        let chip = format!("{}@{}", base_name, hwmon_tag);

        let Ok(dir_iter) = fs::read_dir(&dir) else { continue };
        for file in dir_iter.flatten() {
            let fname = file.file_name();
            let fname = fname.to_string_lossy();
            if is_temperature_input(&fname) {
                out.push(SensorHandle { chip: chip.clone(), path: file.path() });
            }
        }
    }

    if out.is_empty() {
        return Err(ThermcapError::NoSensorsFound { root: root.to_path_buf() });
    }

    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

pub fn is_temperature_input(fname: &str) -> bool {
    fname.contains(sensor::TEMP_MARKER) && fname.contains(sensor::INPUT_MARKER)
}

/// Read one sensor in whole degrees Celsius.
pub fn read_temperature(handle: &SensorHandle) -> Result<i32> {
    let raw = read_trimmed(&handle.path)
        .map_err(|e| ThermcapError::sensor_unreadable(&handle.path, format!("Failed to read: {}", e)))?;

    let millidegrees = raw
        .parse::<i32>()
        .map_err(|e| ThermcapError::sensor_unreadable(&handle.path, format!("Failed to parse '{}': {}", raw, e)))?;

    Ok(millidegrees_to_celsius(millidegrees))
}

/// Truncating conversion; 45231 becomes 45.
pub fn millidegrees_to_celsius(millidegrees: i32) -> i32 {
    millidegrees / sensor::MILLIDEGREES_PER_DEGREE
}

pub(crate) fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}
