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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tc_error::{Result, ThermcapError};
use tracing::info;

use crate::constants::{cpufreq, paths, timing};
use crate::policy::{Policy, Thresholds, TierTable};

fn default_poll_interval_ms() -> u64 { timing::POLL_INTERVAL_MS }
fn default_hwmon_root() -> PathBuf { PathBuf::from(paths::HWMON_BASE) }
fn default_cpufreq_root() -> PathBuf { PathBuf::from(paths::CPU_BASE) }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThermcapConfig {
    /// Sleep between control cycles
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub tiers: TierTable,
    #[serde(default = "default_hwmon_root")]
    pub hwmon_root: PathBuf,
    #[serde(default = "default_cpufreq_root")]
    pub cpufreq_root: PathBuf,
    /// Optional JSON-lines event log
    #[serde(default)]
    pub event_log: Option<PathBuf>,
}

impl Default for ThermcapConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            thresholds: Thresholds::default(),
            tiers: TierTable::default(),
            hwmon_root: default_hwmon_root(),
            cpufreq_root: default_cpufreq_root(),
            event_log: None,
        }
    }
}

impl ThermcapConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn policy(&self) -> Policy {
        Policy { thresholds: self.thresholds, tiers: self.tiers.clone() }
    }
}

pub fn config_path() -> PathBuf {
    match env::var(paths::CONFIG_ENV) {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(paths::CONFIG_FILE),
    }
}

/// Governor names are written verbatim into sysfs
fn is_safe_governor(s: &str) -> bool {
    if s.is_empty() || s.len() > cpufreq::MAX_GOVERNOR_LEN { return false; }
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

pub fn validate_config(cfg: &ThermcapConfig) -> Result<()> {
    if cfg.poll_interval_ms < timing::MIN_POLL_INTERVAL_MS {
        return Err(ThermcapError::invalid_config(
            "poll_interval_ms",
            format!("must be at least {} ms", timing::MIN_POLL_INTERVAL_MS),
        ));
    }
    if cfg.thresholds.high_max_c >= cfg.thresholds.low_min_c {
        return Err(ThermcapError::invalid_config(
            "thresholds",
            format!(
                "high_max_c ({}) must be below low_min_c ({})",
                cfg.thresholds.high_max_c, cfg.thresholds.low_min_c
            ),
        ));
    }
    for (tier, setting) in cfg.tiers.iter() {
        let name = format!("{:?}", tier).to_lowercase();
        if setting.max_frequency_khz == 0 {
            return Err(ThermcapError::invalid_config(
                format!("tiers.{}.max_frequency_khz", name),
                "must be greater than zero",
            ));
        }
        if let Some(gov) = &setting.governor {
            if !is_safe_governor(gov) {
                return Err(ThermcapError::invalid_config(
                    format!("tiers.{}.governor", name),
                    format!("invalid governor name '{}'", gov),
                ));
            }
        }
    }
    Ok(())
}

/// Parse and validate a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<ThermcapConfig> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No config at {}; using built-in defaults", path.display());
            return Ok(ThermcapConfig::default());
        }
        Err(e) => return Err(ThermcapError::FileRead { path: path.to_path_buf(), source: e }),
    };
    let cfg: ThermcapConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    info!("Loaded config from {}", path.display());
    Ok(cfg)
}

pub fn load_config() -> Result<ThermcapConfig> {
    load_config_from(&config_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FrequencyTier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ThermcapConfig::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.thresholds.high_max_c, 50);
        assert_eq!(cfg.thresholds.low_min_c, 70);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg, ThermcapConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let f = write_config(r#"{
            "poll_interval_ms": 1500,
            "tiers": { "low": { "max_frequency_khz": 800000, "governor": "powersave" } }
        }"#);
        let cfg = load_config_from(f.path()).unwrap();
        assert_eq!(cfg.poll_interval_ms, 1500);
        assert_eq!(cfg.tiers.low.max_frequency_khz, 800000);
        assert_eq!(cfg.tiers.low.governor.as_deref(), Some("powersave"));
        assert_eq!(cfg.tiers.high, ThermcapConfig::default().tiers.high);

        let policy = cfg.policy();
        assert_eq!(policy.evaluate(90).0, FrequencyTier::Low);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let f = write_config(r#"{ "poll_interval": 1500 }"#);
        let err = load_config_from(f.path()).unwrap_err();
        assert!(matches!(err, ThermcapError::JsonParse(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let f = write_config("{ not json");
        assert!(load_config_from(f.path()).is_err());
    }

    #[test]
    fn test_thresholds_out_of_order() {
        let mut cfg = ThermcapConfig::default();
        cfg.thresholds = Thresholds { high_max_c: 70, low_min_c: 70 };
        match validate_config(&cfg) {
            Err(ThermcapError::InvalidConfig { field, .. }) => assert_eq!(field, "thresholds"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let mut cfg = ThermcapConfig::default();
        cfg.tiers.mid.max_frequency_khz = 0;
        match validate_config(&cfg) {
            Err(ThermcapError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "tiers.mid.max_frequency_khz")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_interval_rejected() {
        let mut cfg = ThermcapConfig::default();
        cfg.poll_interval_ms = 10;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_governor_names() {
        assert!(is_safe_governor("schedutil"));
        assert!(is_safe_governor("intel_pstate"));
        assert!(!is_safe_governor(""));
        assert!(!is_safe_governor("power save"));
        assert!(!is_safe_governor("../../etc"));
        assert!(!is_safe_governor(&"x".repeat(64)));

        let mut cfg = ThermcapConfig::default();
        cfg.tiers.high.governor = Some("perf\nformance".into());
        assert!(validate_config(&cfg).is_err());
    }
}
