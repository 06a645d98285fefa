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

use serde::Serialize;
use tracing::{info, warn};

use crate::cpufreq::FrequencyControl;

/// Hardware state as found at startup, before thermcap wrote anything.
///
/// Fields are private and there is no setter: once captured the snapshot is
/// the restoration target for the whole process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HardwareSnapshot {
    original_max_frequency: Option<String>,
    original_governor: Option<String>,
}

impl HardwareSnapshot {
    /// Read the current max frequency and governor. Must run before the
    /// first write to `port`.
    pub fn capture(port: &dyn FrequencyControl) -> Self {
        let original_max_frequency = match port.read_max_frequency() {
            Ok(v) if !v.is_empty() => Some(v),
            Ok(_) => {
                warn!("Max frequency handle is empty; it will not be restored");
                None
            }
            Err(e) => {
                warn!("Could not read original max frequency: {}", e);
                None
            }
        };
        let original_governor = match port.read_governor() {
            Ok(v) if !v.is_empty() => Some(v),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read original governor: {}", e);
                None
            }
        };

        let snapshot = Self { original_max_frequency, original_governor };
        info!(
            "Captured hardware snapshot: max_freq={} governor={}",
            snapshot.original_max_frequency.as_deref().unwrap_or("-"),
            snapshot.original_governor.as_deref().unwrap_or("-"),
        );
        snapshot
    }

    #[cfg(test)]
    pub(crate) fn from_parts(max_frequency: Option<&str>, governor: Option<&str>) -> Self {
        Self {
            original_max_frequency: max_frequency.map(str::to_string),
            original_governor: governor.map(str::to_string),
        }
    }

    pub fn original_max_frequency(&self) -> Option<&str> {
        self.original_max_frequency.as_deref()
    }

    pub fn original_governor(&self) -> Option<&str> {
        self.original_governor.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.original_max_frequency.is_none() && self.original_governor.is_none()
    }
}
