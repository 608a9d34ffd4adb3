// SPDX-License-Identifier: MIT

use std::sync::{Condvar, Mutex, MutexGuard};

/// What a worker is told once it gets past the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    /// Every worker was launched; start computing.
    Go,
    /// Launch failed part way; exit without touching shared state.
    Abort,
}

/// One-shot start gate held closed while worker threads are being created.
///
/// Workers park here right after they start, so a launch that fails part way
/// never leaves a worker stuck on a reduction barrier that can no longer
/// fill up.
pub struct LaunchGate {
    signal: Mutex<Option<GateSignal>>,
    changed: Condvar,
}

impl LaunchGate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        LaunchGate {
            signal: Mutex::new(None),
            changed: Condvar::new(),
        }
    }

    /// Releases every waiting and future worker with [`GateSignal::Go`].
    pub fn open(&self) {
        self.settle(GateSignal::Go);
    }

    /// Releases every waiting and future worker with [`GateSignal::Abort`].
    pub fn abort(&self) {
        self.settle(GateSignal::Abort);
    }

    /// Blocks until the gate is opened or aborted.
    pub fn wait(&self) -> GateSignal {
        let mut signal_guard = self.lock_signal();
        loop {
            if let Some(signal) = *signal_guard {
                return signal;
            }
            signal_guard = self
                .changed
                .wait(signal_guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    // The first decision sticks.
    fn settle(&self, signal: GateSignal) {
        let mut signal_guard = self.lock_signal();
        if signal_guard.is_none() {
            *signal_guard = Some(signal);
        }
        self.changed.notify_all();
    }

    fn lock_signal(&self) -> MutexGuard<'_, Option<GateSignal>> {
        match self.signal.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.signal.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl Default for LaunchGate {
    fn default() -> Self {
        Self::new()
    }
}
