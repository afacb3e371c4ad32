pub mod delivery_statuses;
pub mod health_statuses;
