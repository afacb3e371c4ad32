use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

use cli::config::{config_loader, config_model::DotEnvyConfig};
use crates::alerts::{
    AlertSink, FailureAlerter,
    sinks::{DiscordWebhookSink, SmtpAlertSink},
};
use crates::application::usecases::{
    dispatch::DispatchUseCase, health::HealthUseCase, metrics::MetricsUseCase,
};
use crates::domain::entities::appointments::InsertAppointmentEntity;
use crates::domain::repositories::appointments::AppointmentRepository;
use crates::domain::value_objects::email_kinds::{EmailKind, TimeSlot};
use crates::domain::value_objects::enums::health_statuses::HealthStatus;
use crates::infra::db::postgres::postgres_connection::{self, PgPoolSquad};
use crates::infra::db::repositories::{
    appointments::AppointmentPostgres, email_logs::EmailLogPostgres,
    email_tracking::EmailTrackingPostgres, metrics::MetricsPostgres,
};
use crates::infra::smtp::mailer::{SmtpConfig, SmtpMailer};

#[derive(Debug, Parser)]
#[command(name = "lifecycle-mailer", about = "Customer lifecycle email dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SlotArg {
    Noon,
    Evening,
}

impl From<SlotArg> for TimeSlot {
    fn from(value: SlotArg) -> Self {
        match value {
            SlotArg::Noon => TimeSlot::Noon,
            SlotArg::Evening => TimeSlot::Evening,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send thank-you emails for today's appointments.
    SendThankYou {
        #[arg(long, value_enum, default_value_t = SlotArg::Noon)]
        time_slot: SlotArg,
    },
    /// Send follow-up emails for appointments exactly seven days back.
    SendFollowup,
    /// Print delivery and appointment statistics.
    Stats,
    /// Print the full health report; exits non-zero when unhealthy.
    Health,
    /// Import appointments from a JSON file exported from the booking platform.
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("CLI exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("cli")?;

    let cli = Cli::parse();
    let config = config_loader::load()?;

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &config.database.url,
    )?);

    match cli.command {
        Command::SendThankYou { time_slot } => {
            run_dispatch_job(&config, db_pool, EmailKind::ThankYou(time_slot.into())).await
        }
        Command::SendFollowup => run_dispatch_job(&config, db_pool, EmailKind::Followup).await,
        Command::Stats => print_stats(db_pool).await,
        Command::Health => print_health(&config, db_pool).await,
        Command::Import { file } => import_appointments(db_pool, &file).await,
    }
}

fn build_mailer(config: &DotEnvyConfig) -> Result<Arc<SmtpMailer>> {
    Ok(Arc::new(SmtpMailer::new(SmtpConfig {
        host: config.smtp.host.clone(),
        port: config.smtp.port,
        user: config.smtp.user.clone(),
        password: config.smtp.password.clone(),
        from_name: config.smtp.from_name.clone(),
        from_email: config.smtp.from_email.clone(),
    })?))
}

async fn run_dispatch_job(
    config: &DotEnvyConfig,
    db_pool: Arc<PgPoolSquad>,
    kind: EmailKind,
) -> Result<()> {
    let mailer = build_mailer(config)?;

    let alerter = Arc::new(FailureAlerter::new(
        config.alerts.failure_threshold,
        chrono::Duration::seconds(config.alerts.cooldown_secs),
        build_sinks(config, Arc::clone(&mailer))?,
    ));

    let usecase = DispatchUseCase::new(
        Arc::new(AppointmentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(EmailTrackingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(EmailLogPostgres::new(Arc::clone(&db_pool))),
        mailer,
        alerter,
    );

    let summary = usecase.run_job(kind).await?;
    println!(
        "{}: sent={} skipped={} failed={}",
        kind.display_name(),
        summary.sent,
        summary.skipped,
        summary.failed
    );

    if summary.failed > 0 {
        bail!("{} deliveries failed", summary.failed);
    }

    Ok(())
}

fn build_sinks(
    config: &DotEnvyConfig,
    mailer: Arc<SmtpMailer>,
) -> Result<Vec<Arc<dyn AlertSink>>> {
    let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::new();

    if let Some(alert_email) = &config.alerts.alert_email {
        sinks.push(Arc::new(SmtpAlertSink::new(mailer, alert_email.clone())));
    }

    if let Some(webhook_url) = &config.alerts.webhook_url {
        let url = Url::parse(webhook_url).context("ALERT_WEBHOOK_URL is invalid")?;
        sinks.push(Arc::new(DiscordWebhookSink::new(url)?));
    }

    if sinks.is_empty() {
        warn!("No alert sinks configured; failure alerts will only be logged");
    }

    Ok(sinks)
}

async fn print_stats(db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let usecase = MetricsUseCase::new(Arc::new(MetricsPostgres::new(db_pool)));
    let summary = usecase.stats_summary().await?;

    println!("=== Statistics ===");
    println!("Total appointments:  {}", summary.total_appointments);
    println!("Appointments today:  {}", summary.appointments_today);
    println!("Emails sent:         {}", summary.emails_sent);
    println!("Emails failed:       {}", summary.emails_failed);
    println!("Emails last 24h:     {}", summary.recent_emails_24h);
    println!("Success rate:        {:.1}%", summary.success_rate);

    Ok(())
}

async fn print_health(config: &DotEnvyConfig, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let usecase = HealthUseCase::new(
        Arc::new(MetricsPostgres::new(db_pool)),
        build_mailer(config)?,
    );
    let report = usecase.full().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.overall == HealthStatus::Unhealthy {
        bail!("service is unhealthy");
    }

    Ok(())
}

async fn import_appointments(db_pool: Arc<PgPoolSquad>, file: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let appointments: Vec<InsertAppointmentEntity> =
        serde_json::from_str(&contents).context("import file is not a JSON appointment array")?;

    let repository = AppointmentPostgres::new(db_pool);
    let summary = import_rows(&repository, appointments).await;

    println!(
        "Imported {} appointments ({} skipped, {} failed)",
        summary.imported, summary.skipped, summary.failed
    );

    if summary.failed > 0 {
        bail!("{} rows failed to import", summary.failed);
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ImportSummary {
    imported: u32,
    skipped: u32,
    failed: u32,
}

/// One bad row never aborts the import; it is logged, counted, and the rest
/// of the batch still lands.
async fn import_rows<R>(
    repository: &R,
    appointments: Vec<InsertAppointmentEntity>,
) -> ImportSummary
where
    R: AppointmentRepository + Send + Sync,
{
    let mut summary = ImportSummary::default();

    for appointment in appointments {
        if appointment.customer_email.trim().is_empty() {
            warn!(
                platform_id = %appointment.platform_id,
                "Skipping appointment without customer email"
            );
            summary.skipped += 1;
            continue;
        }

        let platform_id = appointment.platform_id.clone();
        match repository.upsert(appointment).await {
            Ok(id) => {
                info!(appointment_id = id, "Appointment imported");
                summary.imported += 1;
            }
            Err(error) => {
                error!(
                    platform_id = %platform_id,
                    %error,
                    "Failed to import appointment"
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crates::domain::repositories::appointments::MockAppointmentRepository;

    fn row(platform_id: &str, email: &str) -> InsertAppointmentEntity {
        InsertAppointmentEntity {
            platform_id: platform_id.to_string(),
            customer_name: "Ann Example".to_string(),
            customer_email: email.to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap(),
            service_type: None,
        }
    }

    #[tokio::test]
    async fn failing_row_does_not_abort_the_import() {
        let mut repository = MockAppointmentRepository::new();
        repository
            .expect_upsert()
            .withf(|appointment| appointment.platform_id == "booking-1")
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("unique violation")) }));
        repository
            .expect_upsert()
            .withf(|appointment| appointment.platform_id == "booking-2")
            .times(1)
            .returning(|_| Box::pin(async { Ok(2) }));

        let summary = import_rows(
            &repository,
            vec![
                row("booking-1", "a@example.com"),
                row("booking-2", "b@example.com"),
            ],
        )
        .await;

        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                skipped: 0,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn rows_without_email_are_skipped_before_the_store() {
        let mut repository = MockAppointmentRepository::new();
        repository
            .expect_upsert()
            .withf(|appointment| appointment.platform_id == "booking-2")
            .times(1)
            .returning(|_| Box::pin(async { Ok(2) }));

        let summary = import_rows(
            &repository,
            vec![row("booking-1", "  "), row("booking-2", "b@example.com")],
        )
        .await;

        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                skipped: 1,
                failed: 0
            }
        );
    }
}
