pub mod sinks;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use mockall::automock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::value_objects::dispatch::FailureContext;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN_SECS: i64 = 3600;

/// Operator notification channel. Best-effort: a sink that fails must never
/// fail the job that reported the failure.
#[async_trait]
#[automock]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
    fn sink_name(&self) -> &'static str;
}

#[derive(Debug, Default)]
struct AlerterState {
    consecutive_failures: u32,
    last_alert_at: Option<DateTime<Utc>>,
}

/// Tracks consecutive job/item failures and notifies operators once the
/// threshold is crossed, rate-limited by a cooldown window. State lives in
/// memory only; a restart forgets the failure history.
pub struct FailureAlerter {
    threshold: u32,
    cooldown: Duration,
    sinks: Vec<Arc<dyn AlertSink>>,
    state: Mutex<AlerterState>,
}

impl FailureAlerter {
    pub fn new(threshold: u32, cooldown: Duration, sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self {
            threshold,
            cooldown,
            sinks,
            state: Mutex::new(AlerterState::default()),
        }
    }

    /// Record a failure. Always logs; notifies operators once
    /// `consecutive_failures` reaches the threshold, unless a previous alert
    /// fired within the cooldown window. The counter keeps climbing while
    /// alerts are suppressed so any alert that does get through shows severity.
    pub async fn report_failure(
        &self,
        kind: &str,
        error: &anyhow::Error,
        context: Option<&FailureContext>,
    ) {
        let now = Utc::now();

        let alert = {
            let mut state = self.state.lock().await;
            state.consecutive_failures += 1;

            error!(
                failure_kind = kind,
                error = %error,
                consecutive_failures = state.consecutive_failures,
                "alerter: failure detected"
            );

            if state.consecutive_failures < self.threshold {
                None
            } else if let Some(last) = state.last_alert_at
                && now - last < self.cooldown
            {
                None
            } else {
                state.last_alert_at = Some(now);
                Some((
                    format!(
                        "{} - {} Consecutive Failures",
                        kind, state.consecutive_failures
                    ),
                    self.format_body(kind, error, state.consecutive_failures, now, context),
                ))
            }
        };

        if let Some((subject, body)) = alert {
            self.notify_sinks(&subject, &body).await;
            info!(failure_kind = kind, "alerter: failure alert sent");
        }
    }

    /// Reset the consecutive-failure counter after a healthy run.
    pub async fn report_success(&self) {
        let mut state = self.state.lock().await;
        if state.consecutive_failures > 0 {
            info!(
                cleared_failures = state.consecutive_failures,
                "alerter: service recovered from failures"
            );
            state.consecutive_failures = 0;
        }
    }

    pub async fn consecutive_failures(&self) -> u32 {
        self.state.lock().await.consecutive_failures
    }

    fn format_body(
        &self,
        kind: &str,
        error: &anyhow::Error,
        consecutive_failures: u32,
        now: DateTime<Utc>,
        context: Option<&FailureContext>,
    ) -> String {
        format!(
            "Failure Alert: {}\n\n\
             Error: {}\n\n\
             Consecutive Failures: {}\n\
             Time: {}\n\n\
             Context:\n{}",
            kind,
            error,
            consecutive_failures,
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
            context.map_or_else(|| "None".to_string(), |c| c.to_string()),
        )
    }

    async fn notify_sinks(&self, subject: &str, body: &str) {
        for sink in &self.sinks {
            if let Err(error) = sink.notify(subject, body).await {
                warn!(
                    sink = sink.sink_name(),
                    error = %error,
                    "alerter: alert sink failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn alerter_with(
        threshold: u32,
        cooldown: Duration,
        sink: MockAlertSink,
    ) -> FailureAlerter {
        FailureAlerter::new(threshold, cooldown, vec![Arc::new(sink)])
    }

    #[tokio::test]
    async fn alert_fires_once_threshold_is_reached() {
        let mut sink = MockAlertSink::new();
        sink.expect_notify()
            .withf(|subject, body| {
                subject.contains("3 Consecutive Failures") && body.contains("smtp timeout")
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let alerter = alerter_with(3, Duration::hours(1), sink);
        let error = anyhow!("smtp timeout");

        alerter.report_failure("Thank-You Email", &error, None).await;
        alerter.report_failure("Thank-You Email", &error, None).await;
        alerter.report_failure("Thank-You Email", &error, None).await;
    }

    #[tokio::test]
    async fn alert_is_suppressed_within_cooldown() {
        let mut sink = MockAlertSink::new();
        sink.expect_notify()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let alerter = alerter_with(3, Duration::hours(1), sink);
        let error = anyhow!("smtp timeout");

        for _ in 0..5 {
            alerter.report_failure("Thank-You Email", &error, None).await;
        }

        // Counter keeps climbing even while alerts are suppressed.
        assert_eq!(alerter.consecutive_failures().await, 5);
    }

    #[tokio::test]
    async fn alert_fires_again_after_cooldown_expiry() {
        let mut sink = MockAlertSink::new();
        sink.expect_notify()
            .times(2)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let alerter = alerter_with(3, Duration::zero(), sink);
        let error = anyhow!("smtp timeout");

        for _ in 0..4 {
            alerter.report_failure("Follow-Up Email", &error, None).await;
        }
    }

    #[tokio::test]
    async fn success_resets_the_counter() {
        let sink = MockAlertSink::new();
        let alerter = alerter_with(3, Duration::hours(1), sink);
        let error = anyhow!("smtp timeout");

        alerter.report_failure("Thank-You Email", &error, None).await;
        alerter.report_failure("Thank-You Email", &error, None).await;
        alerter.report_success().await;
        assert_eq!(alerter.consecutive_failures().await, 0);

        // Two more failures stay below the threshold again, so no alert.
        alerter.report_failure("Thank-You Email", &error, None).await;
        alerter.report_failure("Thank-You Email", &error, None).await;
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let mut sink = MockAlertSink::new();
        sink.expect_notify()
            .times(1)
            .returning(|_, _| Box::pin(async { Err(anyhow!("webhook unreachable")) }));
        sink.expect_sink_name().return_const("mock");

        let alerter = alerter_with(1, Duration::hours(1), sink);
        alerter
            .report_failure("Thank-You Email", &anyhow!("boom"), None)
            .await;

        assert_eq!(alerter.consecutive_failures().await, 1);
    }
}
