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

use std::fs;

use tc_error::{Result, ThermcapError};
use tracing::{info, warn};

/// cpufreq and hwmon writes need root; checked once at startup.
pub fn verify_privileges() -> Result<()> {
    // SAFETY: geteuid and getuid only return the process's user IDs.
    let euid = unsafe { libc::geteuid() };
    let uid = unsafe { libc::getuid() };
    check_euid(euid)?;

    if uid != 0 {
        warn!("Running as setuid root - this is not recommended");
    }
    info!("Running as root (uid={}, euid={})", uid, euid);
    Ok(())
}

fn check_euid(euid: u32) -> Result<()> {
    if euid != 0 {
        return Err(ThermcapError::InsufficientPrivilege(format!(
            "thermcap must run as root to change CPU frequency limits (euid={})",
            euid
        )));
    }
    Ok(())
}

/// CPU model from /proc/cpuinfo, falling back to the device-tree model.
pub fn read_cpu_model() -> Option<String> {
    if let Ok(s) = fs::read_to_string("/proc/cpuinfo") {
        if let Some(model) = parse_cpu_model(&s) {
            return Some(model);
        }
    }
    let mut s = fs::read_to_string("/proc/device-tree/model").ok()?;
    s.retain(|c| c != '\u{0}');
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    let mut hardware: Option<String> = None;
    for line in cpuinfo.lines() {
        let Some((k, v)) = line.split_once(':') else { continue };
        let val = v.trim();
        if val.is_empty() { continue; }
        match k.trim().to_ascii_lowercase().as_str() {
            "model name" => return Some(val.to_string()),
            // arm boards
            "hardware" if hardware.is_none() => hardware = Some(val.to_string()),
            _ => {}
        }
    }
    hardware
}
