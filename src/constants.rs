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

//! Constants and configuration defaults for thermcap
//!
//! Paths, file name patterns and built-in policy values live here so the
//! rest of the crate never carries magic numbers.

/// System paths
pub mod paths {
    /// Base path for hwmon devices
    pub const HWMON_BASE: &str = "/sys/class/hwmon";

    /// Base path for per-core cpufreq directories
    pub const CPU_BASE: &str = "/sys/devices/system/cpu";

    /// Default configuration file
    pub const CONFIG_FILE: &str = "/etc/thermcap/config.json";

    /// Environment variable overriding the configuration file path
    pub const CONFIG_ENV: &str = "THERMCAP_CONFIG";

    /// Present on hosts where journald accepts native log records
    pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";
}

/// Sensor file naming
pub mod sensor {
    /// Marker every temperature file name contains
    pub const TEMP_MARKER: &str = "temp";

    /// Marker for the raw input value (as opposed to _max, _crit, _label)
    pub const INPUT_MARKER: &str = "_input";

    /// Chip name file inside each hwmon directory
    pub const CHIP_NAME_FILE: &str = "name";

    /// hwmon reports millidegrees Celsius
    pub const MILLIDEGREES_PER_DEGREE: i32 = 1000;
}

/// cpufreq file naming
pub mod cpufreq {
    /// Core whose max-frequency handle represents the whole CPU
    pub const REPRESENTATIVE_CORE: &str = "cpu0";

    pub const CPU_DIR_PREFIX: &str = "cpu";

    pub const CPUFREQ_DIR: &str = "cpufreq";

    pub const MAX_FREQ_FILE: &str = "scaling_max_freq";

    pub const GOVERNOR_FILE: &str = "scaling_governor";

    /// Longest governor name accepted from configuration
    pub const MAX_GOVERNOR_LEN: usize = 32;
}

/// Built-in control policy
pub mod policy {
    /// At or below this temperature the HIGH tier applies
    pub const HIGH_MAX_C: i32 = 50;

    /// At or above this temperature the LOW tier applies
    pub const LOW_MIN_C: i32 = 70;

    pub const HIGH_FREQ_KHZ: u64 = 3_000_000;
    pub const MID_FREQ_KHZ: u64 = 2_000_000;
    pub const LOW_FREQ_KHZ: u64 = 1_200_000;
}

/// Control loop timing
pub mod timing {
    /// Sleep between control cycles
    pub const POLL_INTERVAL_MS: u64 = 3000;

    /// Shortest interval accepted from configuration
    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
}

/// Logging
pub mod logging {
    /// Environment variable holding the tracing filter
    pub const LOG_ENV: &str = "THERMCAP_LOG";

    pub const DEFAULT_LEVEL: &str = "info";
}
