use std::fmt;

use tracing::warn;

/// Non-fatal findings raised while building a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The task list and the date range disagree in length. Tasks are
    /// assigned cyclically anyway.
    TaskCountMismatch { task_count: usize, day_count: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TaskCountMismatch {
                task_count,
                day_count,
            } if task_count < day_count => write!(
                f,
                "{task_count} tasks for {day_count} days; tasks repeat from the start"
            ),
            Diagnostic::TaskCountMismatch {
                task_count,
                day_count,
            } => write!(
                f,
                "{task_count} tasks for {day_count} days; the last {} tasks are never shown",
                task_count - day_count
            ),
        }
    }
}

/// Receiver for diagnostics. The generator only talks to this trait, so it
/// never depends on how warnings end up being reported.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::TaskCountMismatch {
                task_count,
                day_count,
            } => warn!(task_count, day_count, "{diagnostic}"),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
