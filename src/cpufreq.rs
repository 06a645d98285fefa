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

//! CPU frequency control port
//!
//! Reads and writes the cpufreq sysfs files that cap the CPU clock.
//!
//! # Handles
//!
//! - `cpu0/cpufreq/scaling_max_freq` stands for the whole CPU. Writes and
//!   read-backs go through this single file.
//! - `cpuN/cpufreq/scaling_governor` exists per core. A governor change only
//!   takes effect once every core has been written, so each core is written
//!   and reported separately.

use std::fs;
use std::path::{Path, PathBuf};

use tc_error::{Result, ThermcapError};
use tracing::{debug, warn};

use crate::constants::cpufreq;
use crate::sensors::read_trimmed;

/// Outcome of writing the governor to one core
#[derive(Debug)]
pub struct CoreWrite {
    pub path: PathBuf,
    pub result: Result<()>,
}

impl CoreWrite {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Number of failed core writes in a governor report
pub fn failed_writes(writes: &[CoreWrite]) -> usize {
    writes.iter().filter(|w| !w.is_ok()).count()
}

#[cfg_attr(test, mockall::automock)]
pub trait FrequencyControl {
    /// Currently configured max frequency, as the raw token the kernel reports
    fn read_max_frequency(&self) -> Result<String>;

    fn write_max_frequency(&self, value: &str) -> Result<()>;

    /// Governor of the representative core
    fn read_governor(&self) -> Result<String>;

    /// Write `governor` to every core. Never stops at the first failure.
    fn write_governor(&self, governor: &str) -> Vec<CoreWrite>;
}

/// cpufreq handles discovered under the cpu root
#[derive(Debug, Clone)]
pub struct SysfsFrequencyControl {
    max_freq_path: PathBuf,
    governor_paths: Vec<PathBuf>,
}

impl SysfsFrequencyControl {
    /// Locate the representative max-frequency file and all governor files.
    pub fn discover(cpu_root: &Path) -> Result<Self> {
        let max_freq_path = cpu_root
            .join(cpufreq::REPRESENTATIVE_CORE)
            .join(cpufreq::CPUFREQ_DIR)
            .join(cpufreq::MAX_FREQ_FILE);
        if !max_freq_path.is_file() {
            return Err(ThermcapError::NoFrequencyControl { path: max_freq_path });
        }

        let governor_paths = discover_governors(cpu_root);
        if governor_paths.is_empty() {
            warn!("No scaling_governor files under {}; governor changes disabled", cpu_root.display());
        }
        debug!("cpufreq: {} with {} governor handle(s)", max_freq_path.display(), governor_paths.len());

        Ok(Self { max_freq_path, governor_paths })
    }

    pub fn max_freq_path(&self) -> &Path {
        &self.max_freq_path
    }

    pub fn governor_paths(&self) -> &[PathBuf] {
        &self.governor_paths
    }
}

/// Governor files of every `cpuN` directory, ordered by core number.
fn discover_governors(cpu_root: &Path) -> Vec<PathBuf> {
    let mut cores: Vec<(usize, PathBuf)> = Vec::new();
    let Ok(entries) = fs::read_dir(cpu_root) else { return Vec::new() };
    for ent in entries.flatten() {
        let fname = ent.file_name();
        let fname = fname.to_string_lossy();
        let Some(idx) = core_index(&fname) else { continue };
        let path = ent.path().join(cpufreq::CPUFREQ_DIR).join(cpufreq::GOVERNOR_FILE);
        if path.is_file() {
            cores.push((idx, path));
        }
    }
    cores.sort_by_key(|(idx, _)| *idx);
    cores.into_iter().map(|(_, p)| p).collect()
}

/// "cpu12" -> 12; "cpufreq" and "cpuidle" are not cores.
pub fn core_index(fname: &str) -> Option<usize> {
    let digits = fname.strip_prefix(cpufreq::CPU_DIR_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn write_file(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value).map_err(|e| ThermcapError::FileWrite { path: path.to_path_buf(), source: e })
}

fn read_file(path: &Path) -> Result<String> {
    read_trimmed(path).map_err(|e| ThermcapError::FileRead { path: path.to_path_buf(), source: e })
}

impl FrequencyControl for SysfsFrequencyControl {
    fn read_max_frequency(&self) -> Result<String> {
        read_file(&self.max_freq_path)
    }

    fn write_max_frequency(&self, value: &str) -> Result<()> {
        write_file(&self.max_freq_path, value)
    }

    fn read_governor(&self) -> Result<String> {
        match self.governor_paths.first() {
            Some(path) => read_file(path),
            None => Err(ThermcapError::NoGovernorControl {
                path: self.max_freq_path.with_file_name(cpufreq::GOVERNOR_FILE),
            }),
        }
    }

    fn write_governor(&self, governor: &str) -> Vec<CoreWrite> {
        self.governor_paths
            .iter()
            .map(|path| CoreWrite { path: path.clone(), result: write_file(path, governor) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSysfs;

    #[test]
    fn test_core_index() {
        assert_eq!(core_index("cpu0"), Some(0));
        assert_eq!(core_index("cpu15"), Some(15));
        assert_eq!(core_index("cpufreq"), None);
        assert_eq!(core_index("cpuidle"), None);
        assert_eq!(core_index("cpu"), None);
        assert_eq!(core_index("online"), None);
    }

    #[test]
    fn test_discover_requires_representative_handle() {
        let fake = FakeSysfs::new();
        match SysfsFrequencyControl::discover(&fake.cpu_root()) {
            Err(ThermcapError::NoFrequencyControl { path }) => {
                assert!(path.ends_with("cpu0/cpufreq/scaling_max_freq"))
            }
            other => panic!("expected NoFrequencyControl, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_orders_governors_by_core() {
        let fake = FakeSysfs::new();
        fake.add_cpus(12, "3400000", "schedutil");
        fake.add_cpu_noise();

        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();
        assert_eq!(port.governor_paths().len(), 12);
        assert!(port.governor_paths()[2].ends_with("cpu2/cpufreq/scaling_governor"));
        assert!(port.governor_paths()[10].ends_with("cpu10/cpufreq/scaling_governor"));
    }

    #[test]
    fn test_read_write_max_frequency() {
        let fake = FakeSysfs::new();
        fake.add_cpus(2, "3400000", "powersave");
        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();

        assert_eq!(port.read_max_frequency().unwrap(), "3400000");
        port.write_max_frequency("2000000").unwrap();
        assert_eq!(port.read_max_frequency().unwrap(), "2000000");
    }

    #[test]
    fn test_write_max_frequency_failure_names_path() {
        let fake = FakeSysfs::new();
        fake.add_cpus(1, "3400000", "powersave");
        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();
        fake.break_max_freq();

        match port.write_max_frequency("2000000") {
            Err(ThermcapError::FileWrite { path, .. }) => assert_eq!(path, port.max_freq_path()),
            other => panic!("expected FileWrite, got {:?}", other),
        }
    }

    #[test]
    fn test_write_governor_reaches_every_core() {
        let fake = FakeSysfs::new();
        fake.add_cpus(4, "3400000", "powersave");
        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();

        let writes = port.write_governor("performance");
        assert_eq!(writes.len(), 4);
        assert_eq!(failed_writes(&writes), 0);
        for core in 0..4 {
            assert_eq!(fake.governor(core), "performance");
        }
        assert_eq!(port.read_governor().unwrap(), "performance");
    }

    #[test]
    fn test_failed_core_does_not_stop_the_others() {
        let fake = FakeSysfs::new();
        fake.add_cpus(4, "3400000", "powersave");
        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();
        fake.break_governor(1);

        let writes = port.write_governor("performance");
        assert_eq!(writes.len(), 4);
        assert_eq!(failed_writes(&writes), 1);
        assert!(!writes[1].is_ok());
        assert_eq!(fake.governor(0), "performance");
        assert_eq!(fake.governor(2), "performance");
        assert_eq!(fake.governor(3), "performance");
    }

    #[test]
    fn test_no_governors_is_tolerated() {
        let fake = FakeSysfs::new();
        fake.add_max_freq_only("3400000");
        let port = SysfsFrequencyControl::discover(&fake.cpu_root()).unwrap();
        assert!(port.governor_paths().is_empty());
        assert!(port.write_governor("performance").is_empty());
        match port.read_governor() {
            Err(ThermcapError::NoGovernorControl { path }) => {
                assert!(path.ends_with("cpu0/cpufreq/scaling_governor"))
            }
            other => panic!("expected NoGovernorControl, got {:?}", other),
        }
    }
}
