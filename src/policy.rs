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

//! Temperature to frequency tier mapping.
//!
//! The evaluator is a pure function of the hottest reading of a cycle. Tier
//! frequencies and governors are configuration; the mapping itself only
//! compares against two thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::policy;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyTier {
    High,
    Mid,
    Low,
}

impl fmt::Display for FrequencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrequencyTier::High => "HIGH",
            FrequencyTier::Mid => "MID",
            FrequencyTier::Low => "LOW",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    /// Readings at or below this select HIGH
    #[serde(default = "default_high_max_c")]
    pub high_max_c: i32,
    /// Readings at or above this select LOW
    #[serde(default = "default_low_min_c")]
    pub low_min_c: i32,
}

fn default_high_max_c() -> i32 { policy::HIGH_MAX_C }
fn default_low_min_c() -> i32 { policy::LOW_MIN_C }

impl Default for Thresholds {
    fn default() -> Self {
        Self { high_max_c: policy::HIGH_MAX_C, low_min_c: policy::LOW_MIN_C }
    }
}

impl Thresholds {
    pub fn evaluate(&self, temp_c: i32) -> FrequencyTier {
        if temp_c <= self.high_max_c {
            FrequencyTier::High
        } else if temp_c < self.low_min_c {
            FrequencyTier::Mid
        } else {
            FrequencyTier::Low
        }
    }
}

/// What a tier writes to the frequency control port
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TierSetting {
    pub max_frequency_khz: u64,
    /// Governor written to every core when this tier becomes active
    #[serde(default)]
    pub governor: Option<String>,
}

impl TierSetting {
    pub fn khz(max_frequency_khz: u64) -> Self {
        Self { max_frequency_khz, governor: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TierTable {
    #[serde(default = "default_high")]
    pub high: TierSetting,
    #[serde(default = "default_mid")]
    pub mid: TierSetting,
    #[serde(default = "default_low")]
    pub low: TierSetting,
}

fn default_high() -> TierSetting { TierSetting::khz(policy::HIGH_FREQ_KHZ) }
fn default_mid() -> TierSetting { TierSetting::khz(policy::MID_FREQ_KHZ) }
fn default_low() -> TierSetting { TierSetting::khz(policy::LOW_FREQ_KHZ) }

impl Default for TierTable {
    fn default() -> Self {
        Self { high: default_high(), mid: default_mid(), low: default_low() }
    }
}

impl TierTable {
    pub fn setting(&self, tier: FrequencyTier) -> &TierSetting {
        match tier {
            FrequencyTier::High => &self.high,
            FrequencyTier::Mid => &self.mid,
            FrequencyTier::Low => &self.low,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrequencyTier, &TierSetting)> {
        [
            (FrequencyTier::High, &self.high),
            (FrequencyTier::Mid, &self.mid),
            (FrequencyTier::Low, &self.low),
        ]
        .into_iter()
    }
}

/// Thresholds plus the tier bindings they select between
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    pub thresholds: Thresholds,
    pub tiers: TierTable,
}

impl Policy {
    pub fn evaluate(&self, temp_c: i32) -> (FrequencyTier, &TierSetting) {
        let tier = self.thresholds.evaluate(temp_c);
        (tier, self.tiers.setting(tier))
    }
}

/// Hottest successfully read sample of a cycle, `None` when nothing was readable.
pub fn hottest<I>(samples: I) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    samples.into_iter().max()
}
