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

//! Thermal control loop
//!
//! Every cycle reads all sensors, keeps the hottest readable value, maps it
//! to a tier and writes that tier's frequency cap. The value logged is the
//! one read back from the control file, since the kernel clamps requests to
//! the hardware range.
//!
//! Failures never stop the loop: an unreadable sensor is skipped for the
//! cycle, a failed write is logged. Nothing is retried before the next cycle.
//!
//! A tier without a governor runs under the governor captured at startup. If
//! the loop changed it for a previous tier, the original is written back.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::cpufreq::{failed_writes, FrequencyControl};
use crate::logger;
use crate::policy::{hottest, FrequencyTier, Policy};
use crate::sensors::{read_temperature, SensorHandle};
use crate::snapshot::HardwareSnapshot;

/// What one cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No sensor was readable; nothing evaluated, nothing written
    NoReadings,
    Applied {
        hottest_c: i32,
        tier: FrequencyTier,
        requested_khz: u64,
        /// Read back after the write; `None` if the read-back failed
        applied: Option<String>,
    },
    WriteFailed {
        hottest_c: i32,
        tier: FrequencyTier,
        requested_khz: u64,
    },
}

pub struct ControlLoop<'a> {
    sensors: &'a [SensorHandle],
    port: &'a dyn FrequencyControl,
    policy: &'a Policy,
    snapshot: &'a HardwareSnapshot,
    /// Governor this loop last pushed to the cores; `None` while the
    /// startup governor is in effect
    active_governor: Option<String>,
}

impl<'a> ControlLoop<'a> {
    pub fn new(
        sensors: &'a [SensorHandle],
        port: &'a dyn FrequencyControl,
        policy: &'a Policy,
        snapshot: &'a HardwareSnapshot,
    ) -> Self {
        Self { sensors, port, policy, snapshot, active_governor: None }
    }

    /// Sample every sensor once; unreadable ones are dropped.
    fn sample(&self) -> Vec<i32> {
        let mut samples = Vec::with_capacity(self.sensors.len());
        for handle in self.sensors {
            match read_temperature(handle) {
                Ok(temp_c) => {
                    info!("sensor: {} | temperature: {}°C", handle.path.display(), temp_c);
                    samples.push(temp_c);
                }
                Err(e) => warn!("Skipping sensor {}: {}", handle, e),
            }
        }
        samples
    }

    pub fn run_cycle(&mut self) -> CycleOutcome {
        let Some(hottest_c) = hottest(self.sample()) else {
            warn!("No readable sensors this cycle; leaving frequency unchanged");
            return CycleOutcome::NoReadings;
        };

        let policy = self.policy;
        let (tier, setting) = policy.evaluate(hottest_c);
        let requested_khz = setting.max_frequency_khz;

        let outcome = match self.port.write_max_frequency(&requested_khz.to_string()) {
            Ok(()) => {
                let applied = match self.port.read_max_frequency() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Could not read back max frequency: {}", e);
                        None
                    }
                };
                info!(
                    "hottest {}°C -> tier {} | max frequency applied: {} kHz",
                    hottest_c,
                    tier,
                    applied.as_deref().unwrap_or("?")
                );
                if applied.as_deref().is_some_and(|a| a != requested_khz.to_string()) {
                    debug!("Requested {} kHz was clamped by the hardware", requested_khz);
                }
                logger::log_event(
                    "tier_applied",
                    json!({
                        "hottest_c": hottest_c,
                        "tier": tier,
                        "requested_khz": requested_khz,
                        "applied": applied,
                    }),
                );
                CycleOutcome::Applied { hottest_c, tier, requested_khz, applied }
            }
            Err(e) => {
                warn!("Failed to apply tier {} ({} kHz): {}", tier, requested_khz, e);
                CycleOutcome::WriteFailed { hottest_c, tier, requested_khz }
            }
        };

        match &setting.governor {
            Some(governor) => {
                if self.active_governor.as_deref() != Some(governor.as_str()) {
                    self.apply_governor(governor);
                }
            }
            None if self.active_governor.is_some() => self.revert_governor(tier),
            None => {}
        }

        outcome
    }

    fn apply_governor(&mut self, governor: &str) {
        let writes = self.port.write_governor(governor);
        for w in writes.iter().filter(|w| !w.is_ok()) {
            if let Err(e) = &w.result {
                warn!("Governor write to {} failed: {}", w.path.display(), e);
            }
        }
        let failed = failed_writes(&writes);
        info!("Governor '{}' applied to {}/{} core(s)", governor, writes.len() - failed, writes.len());
        logger::log_event(
            "governor_applied",
            json!({ "governor": governor, "cores": writes.len(), "failed": failed }),
        );
        // partial application is final until the tier changes again
        self.active_governor = Some(governor.to_string());
    }

    /// Put the startup governor back on every core.
    fn revert_governor(&mut self, tier: FrequencyTier) {
        let snapshot = self.snapshot;
        match snapshot.original_governor() {
            Some(original) => {
                debug!("Tier {} has no governor; reverting to '{}'", tier, original);
                self.apply_governor(original);
            }
            None => warn!("Tier {} has no governor and none was captured at startup; leaving cores as they are", tier),
        }
        self.active_governor = None;
    }

    /// Cycle forever, sleeping `interval` between cycles.
    pub async fn run(mut self, interval: Duration) {
        info!(
            "Control loop running: {} sensor(s), {} ms interval",
            self.sensors.len(),
            interval.as_millis()
        );
        loop {
            self.run_cycle();
            tokio::time::sleep(interval).await;
        }
    }
}
