/*
 * Test utilities for Thermcap
 *
 * Builds throwaway sysfs-shaped trees (hwmon chips and cpufreq cores) inside
 * a temporary directory so discovery, reads and writes can be exercised
 * without touching real hardware.
 */

use std::fs;
use std::io;
use std::path::PathBuf;

use tc_error::ThermcapError;
use tempfile::TempDir;

/// Write failure as the sysfs port reports it
pub fn write_error(path: &str, errno: i32) -> ThermcapError {
    ThermcapError::FileWrite { path: PathBuf::from(path), source: io::Error::from_raw_os_error(errno) }
}

pub fn read_error(path: &str, errno: i32) -> ThermcapError {
    ThermcapError::FileRead { path: PathBuf::from(path), source: io::Error::from_raw_os_error(errno) }
}

pub struct FakeSysfs {
    dir: TempDir,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("hwmon")).unwrap();
        fs::create_dir_all(dir.path().join("cpu")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn hwmon_root(&self) -> PathBuf {
        self.dir.path().join("hwmon")
    }

    pub fn cpu_root(&self) -> PathBuf {
        self.dir.path().join("cpu")
    }

    /// Creates hwmon/<tag> with a name file and one tempN_input per sensor
    pub fn add_chip(&self, tag: &str, name: &str, sensors: &[(&str, &str)]) {
        let chip = self.hwmon_root().join(tag);
        fs::create_dir_all(&chip).unwrap();
        fs::write(chip.join("name"), format!("{}\n", name)).unwrap();
        for (sensor, millidegrees) in sensors {
            fs::write(chip.join(format!("{}_input", sensor)), format!("{}\n", millidegrees)).unwrap();
        }
    }

    pub fn write_chip_file(&self, tag: &str, file: &str, content: &str) {
        fs::write(self.hwmon_root().join(tag).join(file), format!("{}\n", content)).unwrap();
    }

    pub fn set_sensor(&self, tag: &str, sensor: &str, millidegrees: &str) {
        self.write_chip_file(tag, &format!("{}_input", sensor), millidegrees);
    }

    pub fn remove_sensor(&self, tag: &str, sensor: &str) {
        fs::remove_file(self.hwmon_root().join(tag).join(format!("{}_input", sensor))).unwrap();
    }

    fn cpufreq_dir(&self, core: usize) -> PathBuf {
        self.cpu_root().join(format!("cpu{}", core)).join("cpufreq")
    }

    /// Creates cpu0..cpuN-1, each with scaling_max_freq and scaling_governor
    pub fn add_cpus(&self, count: usize, max_freq: &str, governor: &str) {
        for core in 0..count {
            let dir = self.cpufreq_dir(core);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("scaling_max_freq"), format!("{}\n", max_freq)).unwrap();
            fs::write(dir.join("scaling_governor"), format!("{}\n", governor)).unwrap();
        }
    }

    /// Non-core siblings that live next to cpuN in the real tree
    pub fn add_cpu_noise(&self) {
        fs::create_dir_all(self.cpu_root().join("cpufreq")).unwrap();
        fs::create_dir_all(self.cpu_root().join("cpuidle")).unwrap();
        fs::write(self.cpu_root().join("online"), "0-3\n").unwrap();
    }

    pub fn add_max_freq_only(&self, max_freq: &str) {
        let dir = self.cpufreq_dir(0);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("scaling_max_freq"), format!("{}\n", max_freq)).unwrap();
    }

    pub fn max_freq(&self) -> String {
        fs::read_to_string(self.cpufreq_dir(0).join("scaling_max_freq")).unwrap().trim().to_string()
    }

    pub fn governor(&self, core: usize) -> String {
        fs::read_to_string(self.cpufreq_dir(core).join("scaling_governor")).unwrap().trim().to_string()
    }

    /// Swaps the governor file for a directory so writes to it fail even as root
    pub fn break_governor(&self, core: usize) {
        let path = self.cpufreq_dir(core).join("scaling_governor");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
    }

    pub fn break_max_freq(&self) {
        let path = self.cpufreq_dir(0).join("scaling_max_freq");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
    }
}

impl Default for FakeSysfs {
    fn default() -> Self {
        Self::new()
    }
}
