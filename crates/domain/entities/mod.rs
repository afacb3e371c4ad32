pub mod appointments;
pub mod email_logs;
pub mod email_tracking;
