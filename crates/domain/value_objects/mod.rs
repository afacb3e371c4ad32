pub mod appointments;
pub mod dispatch;
pub mod email_kinds;
pub mod enums;
pub mod health;
pub mod metrics;
