#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub smtp: Smtp,
    pub alerts: Alerts,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct Alerts {
    /// Operator mailbox for failure alerts; unset disables the SMTP sink.
    pub alert_email: Option<String>,
    /// Discord-compatible webhook; unset disables the webhook sink.
    pub webhook_url: Option<String>,
    pub failure_threshold: u32,
    pub cooldown_secs: i64,
}
