//! Diagnostics reporter.
//!
//! Recoverable composition conflicts are never swallowed; they are surfaced
//! to the operator through [`Reporter`]. Fatal structural errors do not go
//! through the reporter; they abort the build as error returns.

use std::sync::Mutex;

use tracing::warn;

/// Sink for operator-facing warnings.
pub trait Reporter: Send + Sync {
    /// Reports a non-fatal conflict.
    fn warn(&self, message: &str);
}

/// Default reporter, logging through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Reporter that captures warnings in memory, for tests and tooling.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Creates an empty recording reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all warnings recorded so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns `true` if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

impl Reporter for RecordingReporter {
    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}
