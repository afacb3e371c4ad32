use std::fmt::Display;

use serde::Serialize;

/// Per-run counters returned to the trigger (CLI or scheduler).
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct JobSummary {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Appointment has no surrogate id yet, so tracking cannot address it.
    MissingId,
    /// The relevant tracking flag is already set.
    AlreadySent,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingId => "missing surrogate id",
            SkipReason::AlreadySent => "Already sent",
        }
    }
}

/// Outcome of dispatching a single candidate. Failures are values, not raised
/// errors, so the engine can aggregate and keep going.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(anyhow::Error),
}

/// Context attached to per-item failure reports for operator alerts.
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub appointment_id: Option<i64>,
    pub customer_email: String,
    pub email_kind: String,
}

impl Display for FailureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.appointment_id {
            Some(id) => write!(
                f,
                "appointment_id={}, customer_email={}, email_kind={}",
                id, self.customer_email, self.email_kind
            ),
            None => write!(
                f,
                "appointment_id=unknown, customer_email={}, email_kind={}",
                self.customer_email, self.email_kind
            ),
        }
    }
}
