use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use url::Url;

use crate::alerts::AlertSink;
use crate::infra::smtp::mailer::SmtpMailer;

/// Sends alerts to the configured operator mailbox through the same SMTP
/// transport used for customer email.
pub struct SmtpAlertSink {
    mailer: Arc<SmtpMailer>,
    alert_to: String,
}

impl SmtpAlertSink {
    pub fn new(mailer: Arc<SmtpMailer>, alert_to: String) -> Self {
        Self { mailer, alert_to }
    }
}

#[async_trait]
impl AlertSink for SmtpAlertSink {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        self.mailer.send_alert(&self.alert_to, subject, body).await
    }

    fn sink_name(&self) -> &'static str {
        "smtp"
    }
}

/// Posts alerts to a Discord-compatible webhook.
pub struct DiscordWebhookSink {
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhookSink {
    pub fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl AlertSink for DiscordWebhookSink {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let content = truncate_for_discord(format!("**[ALERT]** {}\n{}", subject, body));

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "discord webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn sink_name(&self) -> &'static str {
        "discord"
    }
}

fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("discord webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("discord webhook connection failed");
    }
    // Webhook URLs contain secrets, so never include the error's URL detail.
    anyhow!("discord webhook request failed")
}

fn truncate_for_discord(mut content: String) -> String {
    const LIMIT: usize = 2000;
    const SUFFIX: &str = "\n… (truncated)";

    if content.chars().count() <= LIMIT {
        return content;
    }

    let allowed = LIMIT.saturating_sub(SUFFIX.chars().count());
    let truncated: String = content.chars().take(allowed).collect();
    content.clear();
    content.push_str(&truncated);
    content.push_str(SUFFIX);
    content
}
