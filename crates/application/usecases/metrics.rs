use anyhow::Result;
use chrono::{Duration, Local, Utc};
use std::sync::Arc;

use crate::domain::{
    repositories::metrics::MetricsRepository,
    value_objects::{
        enums::delivery_statuses::DeliveryStatus,
        metrics::{AppointmentStats, EmailStats, MetricsReport, StatsSummary},
    },
};

pub struct MetricsUseCase<M>
where
    M: MetricsRepository + Send + Sync + 'static,
{
    metrics_repo: Arc<M>,
}

impl<M> MetricsUseCase<M>
where
    M: MetricsRepository + Send + Sync + 'static,
{
    pub fn new(metrics_repo: Arc<M>) -> Self {
        Self { metrics_repo }
    }

    pub async fn email_stats(&self, hours: i64) -> Result<EmailStats> {
        let since = Utc::now() - Duration::hours(hours);
        let rows = self.metrics_repo.email_counts_since(since).await?;
        Ok(EmailStats::from_rows(&rows))
    }

    pub async fn appointment_stats(&self) -> Result<AppointmentStats> {
        let today = Local::now().date_naive();

        Ok(AppointmentStats {
            total: self.metrics_repo.count_appointments().await?,
            today: self.metrics_repo.count_appointments_on(today).await?,
            last_7_days: self
                .metrics_repo
                .count_appointments_since(today - Duration::days(7))
                .await?,
        })
    }

    /// Dashboard payload: 24-hour and 7-day email windows plus appointment
    /// volume.
    pub async fn report(&self) -> Result<MetricsReport> {
        let email_stats_24h = self.email_stats(24).await?;
        let email_stats_7d = self.email_stats(24 * 7).await?;
        let appointment_stats = self.appointment_stats().await?;

        Ok(MetricsReport {
            timestamp: Utc::now(),
            success_rate_24h: email_stats_24h.success_rate(),
            success_rate_7d: email_stats_7d.success_rate(),
            email_stats_24h,
            email_stats_7d,
            appointment_stats,
        })
    }

    /// Compact all-time counters for the stats card and CLI. Success rate here
    /// ignores skips: skipped attempts are neither wins nor losses.
    pub async fn stats_summary(&self) -> Result<StatsSummary> {
        let today = Local::now().date_naive();

        let emails_sent = self
            .metrics_repo
            .count_logs_with_status(DeliveryStatus::Sent)
            .await?;
        let emails_failed = self
            .metrics_repo
            .count_logs_with_status(DeliveryStatus::Failed)
            .await?;

        let attempts = emails_sent + emails_failed;
        let success_rate = if attempts == 0 {
            0.0
        } else {
            (emails_sent as f64 / attempts as f64) * 100.0
        };

        Ok(StatsSummary {
            total_appointments: self.metrics_repo.count_appointments().await?,
            appointments_today: self.metrics_repo.count_appointments_on(today).await?,
            emails_sent,
            emails_failed,
            recent_emails_24h: self
                .metrics_repo
                .count_logs_since(Utc::now() - Duration::hours(24))
                .await?,
            success_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::metrics::MockMetricsRepository;
    use crate::domain::value_objects::metrics::EmailCountRow;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn email_stats_aggregates_repository_rows() {
        let mut metrics_repo = MockMetricsRepository::new();
        metrics_repo.expect_email_counts_since().times(1).returning(|_| {
            Box::pin(async {
                Ok(vec![
                    EmailCountRow {
                        status: "sent".to_string(),
                        email_kind: "thank_you_noon".to_string(),
                        count: 8,
                    },
                    EmailCountRow {
                        status: "failed".to_string(),
                        email_kind: "followup_7day".to_string(),
                        count: 2,
                    },
                ])
            })
        });

        let usecase = MetricsUseCase::new(Arc::new(metrics_repo));
        let stats = usecase.email_stats(24).await.unwrap();

        assert_eq!(stats.total, 10);
        assert_eq!(stats.sent, 8);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.success_rate(), 80.0);
    }

    #[tokio::test]
    async fn stats_summary_ignores_skips_in_success_rate() {
        let mut metrics_repo = MockMetricsRepository::new();
        metrics_repo
            .expect_count_logs_with_status()
            .with(eq(DeliveryStatus::Sent))
            .times(1)
            .returning(|_| Box::pin(async { Ok(9) }));
        metrics_repo
            .expect_count_logs_with_status()
            .with(eq(DeliveryStatus::Failed))
            .times(1)
            .returning(|_| Box::pin(async { Ok(1) }));
        metrics_repo
            .expect_count_appointments()
            .times(1)
            .returning(|| Box::pin(async { Ok(40) }));
        metrics_repo
            .expect_count_appointments_on()
            .times(1)
            .returning(|_| Box::pin(async { Ok(3) }));
        metrics_repo
            .expect_count_logs_since()
            .times(1)
            .returning(|_| Box::pin(async { Ok(12) }));

        let usecase = MetricsUseCase::new(Arc::new(metrics_repo));
        let summary = usecase.stats_summary().await.unwrap();

        assert_eq!(summary.total_appointments, 40);
        assert_eq!(summary.appointments_today, 3);
        assert_eq!(summary.emails_sent, 9);
        assert_eq!(summary.emails_failed, 1);
        assert_eq!(summary.recent_emails_24h, 12);
        assert_eq!(summary.success_rate, 90.0);
    }

    #[tokio::test]
    async fn stats_summary_success_rate_is_zero_without_attempts() {
        let mut metrics_repo = MockMetricsRepository::new();
        metrics_repo
            .expect_count_logs_with_status()
            .times(2)
            .returning(|_| Box::pin(async { Ok(0) }));
        metrics_repo
            .expect_count_appointments()
            .times(1)
            .returning(|| Box::pin(async { Ok(0) }));
        metrics_repo
            .expect_count_appointments_on()
            .times(1)
            .returning(|_| Box::pin(async { Ok(0) }));
        metrics_repo
            .expect_count_logs_since()
            .times(1)
            .returning(|_| Box::pin(async { Ok(0) }));

        let usecase = MetricsUseCase::new(Arc::new(metrics_repo));
        let summary = usecase.stats_summary().await.unwrap();

        assert_eq!(summary.success_rate, 0.0);
    }
}
