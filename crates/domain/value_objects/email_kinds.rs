use std::fmt::Display;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Daily trigger point for thank-you emails. Each slot is tracked
/// independently, so a customer gets at most one email per slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeSlot {
    Noon,
    Evening,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Noon => "noon",
            TimeSlot::Evening => "evening",
        }
    }
}

impl Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of lifecycle emails the dispatcher knows how to send.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmailKind {
    ThankYou(TimeSlot),
    Followup,
}

impl EmailKind {
    /// Stable label used in `email_logs.email_kind` and metrics breakdowns.
    pub fn label(&self) -> &'static str {
        match self {
            EmailKind::ThankYou(TimeSlot::Noon) => "thank_you_noon",
            EmailKind::ThankYou(TimeSlot::Evening) => "thank_you_evening",
            EmailKind::Followup => "followup_7day",
        }
    }

    /// Human-readable name used in alert subjects and log messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            EmailKind::ThankYou(_) => "Thank-You Email",
            EmailKind::Followup => "Follow-Up Email",
        }
    }

    /// Appointment calendar date targeted by this job: today for thank-you
    /// emails, exactly seven days back for follow-ups.
    pub fn target_date(&self, today: NaiveDate) -> NaiveDate {
        match self {
            EmailKind::ThankYou(_) => today,
            EmailKind::Followup => today - Duration::days(7),
        }
    }
}

impl Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
