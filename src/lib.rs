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

//! Thermcap - thermal CPU frequency capping for Linux
//!
//! Reads hwmon temperature sensors, picks a frequency tier from the hottest
//! reading and writes it to cpufreq. The settings found at startup are put
//! back when the daemon is stopped.

pub mod config;
pub mod constants;
pub mod control_loop;
pub mod cpufreq;
pub mod logger;
pub mod policy;
pub mod sensors;
pub mod shutdown;
pub mod snapshot;
pub mod system;

pub use tc_error::{Result, ThermcapError};

#[cfg(test)]
pub mod test_utils;
