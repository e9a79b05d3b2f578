// What happens when a blink is detected.
// The detector only reports "blink number N"; whatever reacts to it
// (a shell script, a counter, a test probe) plugs in here.

use log::{info, warn};
use std::process::Command;

pub trait BlinkNotifier {
    /// Called synchronously once per detected blink; `count` starts at 1.
    fn blinked(&mut self, count: u64);
}

/// Any `FnMut(u64)` closure is a notifier.
impl<F: FnMut(u64)> BlinkNotifier for F {
    fn blinked(&mut self, count: u64) {
        self(count)
    }
}

/// Runs `/bin/bash <script>` and waits for it.
/// The script gets no arguments; its exit status is only logged.
pub struct ScriptNotifier {
    script: String,
}

impl ScriptNotifier {
    pub fn new(script: impl Into<String>) -> Self {
        Self { script: script.into() }
    }
}

impl BlinkNotifier for ScriptNotifier {
    fn blinked(&mut self, count: u64) {
        match Command::new("/bin/bash").arg(&self.script).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("{} exited with {status} (blink #{count})", self.script),
            Err(e) => warn!("cannot run {}: {e}", self.script),
        }
    }
}

/// Only logs; used with `--no-notify`.
pub struct SilentNotifier;

impl BlinkNotifier for SilentNotifier {
    fn blinked(&mut self, count: u64) {
        info!("blink #{count} (no script)");
    }
}
