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

use serde_json::json;
use tracing::{error, info, warn};

use thermcap::config::load_config;
use thermcap::control_loop::ControlLoop;
use thermcap::cpufreq::SysfsFrequencyControl;
use thermcap::logger::{self, LogSink};
use thermcap::sensors::discover_sensors;
use thermcap::shutdown::{run_until_signal, SignalListener};
use thermcap::snapshot::HardwareSnapshot;
use thermcap::{system, ThermcapError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn fatal(err: ThermcapError) -> ! {
    error!("{}", err);
    std::process::exit(err.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let sink = logger::init_tracing();
    info!("STARTUP: thermcapd {} starting", VERSION);
    info!("STARTUP: Logging to {}", if sink == LogSink::Journald { "systemd journal" } else { "stdout" });

    // PHASE 1: privilege check, before anything touches hardware
    if let Err(e) = system::verify_privileges() {
        fatal(e);
    }

    // PHASE 2: configuration
    let cfg = load_config().unwrap_or_else(|e| fatal(e));
    if let Some(path) = &cfg.event_log {
        if let Err(e) = logger::init_event_log(path) {
            warn!("Event log {} unavailable: {}", path.display(), e);
        }
    }

    // PHASE 3: discovery
    let sensors = discover_sensors(&cfg.hwmon_root).unwrap_or_else(|e| fatal(e));
    for s in &sensors {
        info!("STARTUP: sensor {} ({})", s, s.path.display());
    }
    let port = SysfsFrequencyControl::discover(&cfg.cpufreq_root).unwrap_or_else(|e| fatal(e));
    info!(
        "STARTUP: frequency control {} ({} core governor handle(s))",
        port.max_freq_path().display(),
        port.governor_paths().len()
    );
    if let Some(model) = system::read_cpu_model() {
        info!("STARTUP: CPU {}", model);
    }

    // PHASE 4: snapshot, immutable from here on
    let snapshot = HardwareSnapshot::capture(&port);
    let policy = cfg.policy();

    logger::log_event(
        "startup",
        json!({
            "version": VERSION,
            "sensors": sensors.len(),
            "cores": port.governor_paths().len(),
            "snapshot": &snapshot,
        }),
    );

    // PHASE 5: signals are registered before the first write
    let mut signals = SignalListener::new()?;

    // PHASE 6: run until SIGINT/SIGTERM
    let control = ControlLoop::new(&sensors, &port, &policy, &snapshot);
    let code = run_until_signal(control, cfg.poll_interval(), &mut signals, &snapshot, &port).await;
    logger::close_event_log();
    std::process::exit(code);
}
