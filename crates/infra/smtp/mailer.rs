use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::application::usecases::dispatch::EmailNotifier;
use crate::application::usecases::health::SmtpProbe;
use crate::domain::value_objects::appointments::AppointmentModel;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user, config.password))
            .build();

        let from = Mailbox::new(Some(config.from_name), config.from_email.parse()?);

        Ok(Self { transport, from })
    }

    async fn send_plain(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(message).await?;
        info!(%to, %subject, "smtp_mailer: message accepted by relay");

        Ok(())
    }

    /// Operational alert, distinct from customer-facing mail.
    pub async fn send_alert(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let subject = format!("[ALERT] {}", subject);
        self.send_plain(to, &subject, body.to_string()).await
    }
}

#[async_trait]
impl SmtpProbe for SmtpMailer {
    async fn verify_connection(&self) -> Result<bool> {
        let connected = self.transport.test_connection().await?;
        Ok(connected)
    }
}

#[async_trait]
impl EmailNotifier for SmtpMailer {
    async fn send_thank_you(&self, appointment: &AppointmentModel) -> Result<()> {
        let service_line = match appointment.service_type.as_deref() {
            Some(service) => format!("We hope you enjoyed your {} with us today.", service),
            None => "We hope you enjoyed your visit with us today.".to_string(),
        };

        let body = format!(
            "Hi {customer_name},\n\n\
             Thank you for visiting us today! {service_line}\n\n\
             If anything was not to your liking, just reply to this email and \
             we will make it right.\n\n\
             See you next time,\n\
             {from_name}",
            customer_name = appointment.customer_name,
            from_name = self.from.name.as_deref().unwrap_or("The team"),
        );

        self.send_plain(&appointment.customer_email, "Thank you for your visit!", body)
            .await
    }

    async fn send_followup(&self, appointment: &AppointmentModel) -> Result<()> {
        let body = format!(
            "Hi {customer_name},\n\n\
             It has been a week since your last visit and we would love to \
             see you again. Book your next appointment whenever it suits you.\n\n\
             Warm regards,\n\
             {from_name}",
            customer_name = appointment.customer_name,
            from_name = self.from.name.as_deref().unwrap_or("The team"),
        );

        self.send_plain(&appointment.customer_email, "We'd love to see you again", body)
            .await
    }
}
