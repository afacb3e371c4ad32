use anyhow::{Context, Result};

use crates::alerts::{DEFAULT_COOLDOWN_SECS, DEFAULT_FAILURE_THRESHOLD};

use super::config_model::{Alerts, Database, DotEnvyConfig, Smtp};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let smtp = Smtp {
        host: std::env::var("SMTP_HOST").context("SMTP_HOST is invalid")?,
        port: std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()?,
        user: std::env::var("SMTP_USER").context("SMTP_USER is invalid")?,
        password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is invalid")?,
        from_name: std::env::var("SMTP_FROM_NAME").context("SMTP_FROM_NAME is invalid")?,
        from_email: std::env::var("SMTP_FROM_EMAIL").context("SMTP_FROM_EMAIL is invalid")?,
    };

    let alerts = Alerts {
        alert_email: std::env::var("ALERT_EMAIL").ok(),
        webhook_url: std::env::var("ALERT_WEBHOOK_URL").ok(),
        failure_threshold: match std::env::var("ALERT_FAILURE_THRESHOLD") {
            Ok(value) => value.parse()?,
            Err(_) => DEFAULT_FAILURE_THRESHOLD,
        },
        cooldown_secs: match std::env::var("ALERT_COOLDOWN_SECS") {
            Ok(value) => value.parse()?,
            Err(_) => DEFAULT_COOLDOWN_SECS,
        },
    };

    Ok(DotEnvyConfig {
        database,
        smtp,
        alerts,
    })
}
