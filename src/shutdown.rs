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

//! Signal-driven shutdown and hardware restoration
//!
//! SIGINT and SIGTERM are observed through tokio's signal streams, so the
//! restoration code runs as ordinary async code rather than inside a signal
//! handler. It only reads the snapshot captured before the loop started.

use std::fmt;
use std::io;
use std::time::Duration;

use serde_json::json;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{error, info, warn};

use crate::control_loop::ControlLoop;
use crate::cpufreq::{failed_writes, FrequencyControl};
use crate::logger;
use crate::snapshot::HardwareSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    pub fn signo(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => libc::SIGINT,
            ShutdownSignal::Terminate => libc::SIGTERM,
        }
    }

    /// Shell convention for death-by-signal: 128 + signal number
    pub fn exit_code(self) -> i32 {
        128 + self.signo()
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered SIGINT/SIGTERM streams. Create before the loop starts so an
/// early signal is not lost.
pub struct SignalListener {
    interrupt: Signal,
    terminate: Signal,
}

impl SignalListener {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(&mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// `None` when the snapshot had no max frequency to restore
    pub max_frequency_restored: Option<bool>,
    pub governor_cores_written: usize,
    pub governor_cores_failed: usize,
}

/// Write the snapshot back: max frequency first, then the governor on every
/// core. Errors are logged and counted, never returned. Safe to call again;
/// it simply re-issues the same writes.
pub fn restore(snapshot: &HardwareSnapshot, port: &dyn FrequencyControl) -> RestoreReport {
    let mut report = RestoreReport::default();

    if let Some(max) = snapshot.original_max_frequency() {
        match port.write_max_frequency(max) {
            Ok(()) => {
                info!("Restored max frequency to {} kHz", max);
                report.max_frequency_restored = Some(true);
            }
            Err(e) => {
                error!("Failed to restore max frequency {}: {}", max, e);
                report.max_frequency_restored = Some(false);
            }
        }
    }

    if let Some(governor) = snapshot.original_governor() {
        let writes = port.write_governor(governor);
        for w in &writes {
            if let Err(e) = &w.result {
                error!("Failed to restore governor on {}: {}", w.path.display(), e);
            }
        }
        report.governor_cores_failed = failed_writes(&writes);
        report.governor_cores_written = writes.len() - report.governor_cores_failed;
        info!(
            "Restored governor '{}' on {}/{} core(s)",
            governor,
            report.governor_cores_written,
            writes.len()
        );
    }

    if snapshot.is_empty() {
        warn!("Hardware snapshot is empty; nothing to restore");
    }

    logger::log_event(
        "restore",
        json!({
            "snapshot": snapshot,
            "max_frequency_restored": report.max_frequency_restored,
            "governor_cores_written": report.governor_cores_written,
            "governor_cores_failed": report.governor_cores_failed,
        }),
    );
    report
}

/// Restore hardware for a received signal and return the exit status to use.
pub fn handle_signal(sig: ShutdownSignal, snapshot: &HardwareSnapshot, port: &dyn FrequencyControl) -> i32 {
    info!("SIGNAL: Received {} - restoring hardware state", sig);
    restore(snapshot, port);
    info!("SHUTDOWN: thermcap terminated");
    sig.exit_code()
}

/// Drive `control` until SIGINT or SIGTERM arrives, then restore the snapshot.
/// Returns the exit status for the received signal.
pub async fn run_until_signal(
    control: ControlLoop<'_>,
    interval: Duration,
    signals: &mut SignalListener,
    snapshot: &HardwareSnapshot,
    port: &dyn FrequencyControl,
) -> i32 {
    let sig = tokio::select! {
        () = control.run(interval) => {
            warn!("Control loop ended without a signal; restoring hardware state");
            restore(snapshot, port);
            return 0;
        }
        sig = signals.recv() => sig,
    };
    handle_signal(sig, snapshot, port)
}
