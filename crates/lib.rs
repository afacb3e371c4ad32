pub mod alerts;
pub mod application;
pub mod domain;
pub mod infra;
pub mod observability;
