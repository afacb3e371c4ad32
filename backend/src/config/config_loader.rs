use anyhow::{Context, Result};

use super::config_model::{Database, DotEnvyConfig, Server, Smtp};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .context("SERVER_PORT is invalid")?
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .context("SERVER_BODY_LIMIT is invalid")?
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .context("SERVER_TIMEOUT is invalid")?
            .parse()?,
    };

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

    Ok(DotEnvyConfig {
        server,
        database,
        smtp,
    })
}
