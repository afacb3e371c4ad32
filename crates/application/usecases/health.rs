use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::automock;
use std::sync::Arc;

use crate::domain::{
    repositories::metrics::MetricsRepository,
    value_objects::{
        enums::health_statuses::HealthStatus,
        health::{DatabaseHealth, HealthReport, RecentErrorsHealth, SmtpHealth},
    },
};

/// Failed sends in the last hour before the recent-errors check degrades.
const RECENT_ERROR_WARNING_THRESHOLD: i64 = 10;

/// Connectivity check against the mail relay. Implemented by the SMTP
/// mailer; mocked in tests.
#[async_trait]
#[automock]
pub trait SmtpProbe {
    /// True when the relay accepts a connection and the handshake succeeds.
    async fn verify_connection(&self) -> Result<bool>;
}

/// Health checks never return Err: a probe failure is itself a health signal
/// and is folded into the report.
pub struct HealthUseCase<M, S>
where
    M: MetricsRepository + Send + Sync + 'static,
    S: SmtpProbe + Send + Sync + 'static,
{
    metrics_repo: Arc<M>,
    smtp_probe: Arc<S>,
}

impl<M, S> HealthUseCase<M, S>
where
    M: MetricsRepository + Send + Sync + 'static,
    S: SmtpProbe + Send + Sync + 'static,
{
    pub fn new(metrics_repo: Arc<M>, smtp_probe: Arc<S>) -> Self {
        Self {
            metrics_repo,
            smtp_probe,
        }
    }

    pub async fn database(&self) -> DatabaseHealth {
        let counts = async {
            let appointments = self.metrics_repo.count_appointments().await?;
            let email_logs = self.metrics_repo.count_logs().await?;
            anyhow::Ok((appointments, email_logs))
        };

        match counts.await {
            Ok((appointments, email_logs)) => DatabaseHealth {
                status: HealthStatus::Healthy,
                appointments: Some(appointments),
                email_logs: Some(email_logs),
                error: None,
            },
            Err(error) => DatabaseHealth {
                status: HealthStatus::Unhealthy,
                appointments: None,
                email_logs: None,
                error: Some(error.to_string()),
            },
        }
    }

    pub async fn smtp(&self) -> SmtpHealth {
        match self.smtp_probe.verify_connection().await {
            Ok(true) => SmtpHealth {
                status: HealthStatus::Healthy,
                error: None,
            },
            Ok(false) => SmtpHealth {
                status: HealthStatus::Unhealthy,
                error: Some("SMTP connection verification failed".to_string()),
            },
            Err(error) => SmtpHealth {
                status: HealthStatus::Unhealthy,
                error: Some(error.to_string()),
            },
        }
    }

    pub async fn recent_errors(&self) -> RecentErrorsHealth {
        let since = Utc::now() - Duration::hours(1);

        match self.metrics_repo.count_failed_since(since).await {
            Ok(failed_last_hour) => {
                let status = if failed_last_hour >= RECENT_ERROR_WARNING_THRESHOLD {
                    HealthStatus::Warning
                } else {
                    HealthStatus::Healthy
                };
                RecentErrorsHealth {
                    status,
                    failed_last_hour: Some(failed_last_hour),
                    error: None,
                }
            }
            Err(error) => RecentErrorsHealth {
                status: HealthStatus::Unhealthy,
                failed_last_hour: None,
                error: Some(error.to_string()),
            },
        }
    }

    pub async fn full(&self) -> HealthReport {
        let database = self.database().await;
        let smtp = self.smtp().await;
        let recent_errors = self.recent_errors().await;
        let overall = database
            .status
            .max(smtp.status)
            .max(recent_errors.status);

        HealthReport {
            overall,
            database,
            smtp,
            recent_errors,
            timestamp: Utc::now(),
        }
    }
}
