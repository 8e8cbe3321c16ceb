//! Leveled, instance-tagged log sink for admin operations.
//!
//! Admin operations report advisories and swallowed failures through
//! [`AdminLog`] rather than calling `tracing` directly, so a host can surface
//! them in its own UI and tests can count them.

use std::fmt;

use tracing::{error, info, warn};

/// Severity of an admin log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for admin log entries.
pub trait AdminLog: Send + Sync {
    /// Record a message, optionally tagged with an instance name.
    fn raise(&self, severity: Severity, message: &str, instance: Option<&str>);
}

/// Forwards entries to `tracing`.
///
/// `tracing` has no notice level; notices are emitted at `info` with a
/// `severity` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl AdminLog for TracingLog {
    fn raise(&self, severity: Severity, message: &str, instance: Option<&str>) {
        let instance = instance.unwrap_or("-");
        match severity {
            Severity::Notice => info!(instance = %instance, severity = "notice", "{}", message),
            Severity::Warning => warn!(instance = %instance, "{}", message),
            Severity::Error => error!(instance = %instance, "{}", message),
        }
    }
}
