use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use mockall::automock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::alerts::FailureAlerter;
use crate::domain::{
    entities::email_logs::InsertEmailLogEntity,
    repositories::{
        appointments::AppointmentRepository, email_logs::EmailLogRepository,
        email_tracking::EmailTrackingRepository,
    },
    value_objects::{
        appointments::AppointmentModel,
        dispatch::{DispatchOutcome, FailureContext, JobSummary, SkipReason},
        email_kinds::EmailKind,
        enums::delivery_statuses::DeliveryStatus,
    },
};

/// Outbound customer mail. Implemented by the SMTP mailer; mocked in tests.
#[async_trait]
#[automock]
pub trait EmailNotifier {
    async fn send_thank_you(&self, appointment: &AppointmentModel) -> Result<()>;
    async fn send_followup(&self, appointment: &AppointmentModel) -> Result<()>;
}

/// Runs one dispatch job end to end: enumerate candidates for the target
/// date, skip anything already sent, send the rest, and record every attempt
/// in the delivery log. One candidate failing never aborts the batch.
pub struct DispatchUseCase<A, T, L, N>
where
    A: AppointmentRepository + Send + Sync + 'static,
    T: EmailTrackingRepository + Send + Sync + 'static,
    L: EmailLogRepository + Send + Sync + 'static,
    N: EmailNotifier + Send + Sync + 'static,
{
    appointment_repo: Arc<A>,
    tracking_repo: Arc<T>,
    email_log_repo: Arc<L>,
    notifier: Arc<N>,
    alerter: Arc<FailureAlerter>,
}

impl<A, T, L, N> DispatchUseCase<A, T, L, N>
where
    A: AppointmentRepository + Send + Sync + 'static,
    T: EmailTrackingRepository + Send + Sync + 'static,
    L: EmailLogRepository + Send + Sync + 'static,
    N: EmailNotifier + Send + Sync + 'static,
{
    pub fn new(
        appointment_repo: Arc<A>,
        tracking_repo: Arc<T>,
        email_log_repo: Arc<L>,
        notifier: Arc<N>,
        alerter: Arc<FailureAlerter>,
    ) -> Self {
        Self {
            appointment_repo,
            tracking_repo,
            email_log_repo,
            notifier,
            alerter,
        }
    }

    pub async fn run_job(&self, kind: EmailKind) -> Result<JobSummary> {
        self.run_job_on(kind, Local::now().date_naive()).await
    }

    /// `today` is a parameter so date arithmetic stays deterministic in tests.
    pub async fn run_job_on(&self, kind: EmailKind, today: NaiveDate) -> Result<JobSummary> {
        let target_date = kind.target_date(today);
        info!(
            email_kind = kind.label(),
            %target_date,
            "dispatch: job started"
        );

        let candidates = match self.appointment_repo.find_by_date(target_date).await {
            Ok(candidates) => candidates,
            Err(error) => {
                // Enumeration failing means the whole job failed, not one item.
                let job_name = format!("{} Job", kind.display_name());
                self.alerter.report_failure(&job_name, &error, None).await;
                return Err(error);
            }
        };

        let mut summary = JobSummary::default();
        for appointment in &candidates {
            match self.dispatch_one(kind, appointment).await {
                DispatchOutcome::Sent => summary.sent += 1,
                DispatchOutcome::Skipped(_) => summary.skipped += 1,
                DispatchOutcome::Failed(_) => summary.failed += 1,
            }
        }

        if summary.sent > 0 || summary.skipped > 0 {
            self.alerter.report_success().await;
        }

        info!(
            email_kind = kind.label(),
            candidates = candidates.len(),
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "dispatch: job finished"
        );

        Ok(summary)
    }

    async fn dispatch_one(&self, kind: EmailKind, appointment: &AppointmentModel) -> DispatchOutcome {
        let Some(appointment_id) = appointment.id else {
            warn!(
                platform_id = %appointment.platform_id,
                email_kind = kind.label(),
                "dispatch: appointment has no surrogate id, skipping"
            );
            return DispatchOutcome::Skipped(SkipReason::MissingId);
        };

        let tracking = match self.tracking_repo.get(appointment_id).await {
            Ok(tracking) => tracking,
            Err(error) => return self.fail(kind, appointment, appointment_id, error).await,
        };

        if tracking.is_some_and(|tracking| tracking.is_sent(kind)) {
            self.append_log(InsertEmailLogEntity {
                appointment_id: Some(appointment_id),
                email_kind: kind.label().to_string(),
                status: DeliveryStatus::Skipped.as_str().to_string(),
                error_message: Some(SkipReason::AlreadySent.as_str().to_string()),
            })
            .await;
            return DispatchOutcome::Skipped(SkipReason::AlreadySent);
        }

        let send_result = match kind {
            EmailKind::ThankYou(_) => self.notifier.send_thank_you(appointment).await,
            EmailKind::Followup => self.notifier.send_followup(appointment).await,
        };

        match send_result {
            Ok(()) => {
                // The flag flip and the `sent` log row are committed together
                // by the repository; if that write fails the send happened but
                // is unrecorded, so it must surface as a failure.
                if let Err(error) = self
                    .tracking_repo
                    .mark_sent(appointment_id, kind, Utc::now())
                    .await
                {
                    return self.fail(kind, appointment, appointment_id, error).await;
                }

                info!(
                    appointment_id,
                    email_kind = kind.label(),
                    customer_email = %appointment.customer_email,
                    "dispatch: email sent"
                );
                DispatchOutcome::Sent
            }
            Err(error) => self.fail(kind, appointment, appointment_id, error).await,
        }
    }

    async fn fail(
        &self,
        kind: EmailKind,
        appointment: &AppointmentModel,
        appointment_id: i64,
        error: anyhow::Error,
    ) -> DispatchOutcome {
        self.append_log(InsertEmailLogEntity {
            appointment_id: Some(appointment_id),
            email_kind: kind.label().to_string(),
            status: DeliveryStatus::Failed.as_str().to_string(),
            error_message: Some(error.to_string()),
        })
        .await;

        let context = FailureContext {
            appointment_id: Some(appointment_id),
            customer_email: appointment.customer_email.clone(),
            email_kind: kind.label().to_string(),
        };
        self.alerter
            .report_failure(kind.display_name(), &error, Some(&context))
            .await;

        DispatchOutcome::Failed(error)
    }

    /// The delivery log is an audit trail, not a dependency: losing a log row
    /// must not change the dispatch outcome.
    async fn append_log(&self, log: InsertEmailLogEntity) {
        if let Err(error) = self.email_log_repo.append(log).await {
            error!(%error, "dispatch: failed to append delivery log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::DEFAULT_FAILURE_THRESHOLD;
    use crate::domain::entities::email_tracking::EmailTrackingEntity;
    use crate::domain::repositories::{
        appointments::MockAppointmentRepository, email_logs::MockEmailLogRepository,
        email_tracking::MockEmailTrackingRepository,
    };
    use crate::domain::value_objects::email_kinds::TimeSlot;
    use anyhow::anyhow;
    use chrono::{Duration, NaiveDate};
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet_alerter() -> Arc<FailureAlerter> {
        Arc::new(FailureAlerter::new(
            DEFAULT_FAILURE_THRESHOLD,
            Duration::hours(1),
            Vec::new(),
        ))
    }

    fn appointment(id: Option<i64>, email: &str) -> AppointmentModel {
        AppointmentModel {
            id,
            platform_id: format!("booking-{}", email),
            customer_name: "Ann Example".to_string(),
            customer_email: email.to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap(),
            service_type: Some("Haircut".to_string()),
        }
    }

    fn tracked(appointment_id: i64, kind: EmailKind) -> EmailTrackingEntity {
        let mut entity = EmailTrackingEntity {
            id: 1,
            appointment_id,
            thank_you_sent_noon: false,
            thank_you_sent_evening: false,
            followup_sent: false,
            followup_sent_at: None,
        };
        match kind {
            EmailKind::ThankYou(TimeSlot::Noon) => entity.thank_you_sent_noon = true,
            EmailKind::ThankYou(TimeSlot::Evening) => entity.thank_you_sent_evening = true,
            EmailKind::Followup => entity.followup_sent = true,
        }
        entity
    }

    fn usecase(
        appointment_repo: MockAppointmentRepository,
        tracking_repo: MockEmailTrackingRepository,
        email_log_repo: MockEmailLogRepository,
        notifier: MockEmailNotifier,
        alerter: Arc<FailureAlerter>,
    ) -> DispatchUseCase<
        MockAppointmentRepository,
        MockEmailTrackingRepository,
        MockEmailLogRepository,
        MockEmailNotifier,
    > {
        DispatchUseCase::new(
            Arc::new(appointment_repo),
            Arc::new(tracking_repo),
            Arc::new(email_log_repo),
            Arc::new(notifier),
            alerter,
        )
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn sends_thank_you_and_marks_tracking() {
        let kind = EmailKind::ThankYou(TimeSlot::Noon);

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .with(eq(fixed_today()))
            .times(1)
            .returning(|_| Box::pin(async { Ok(vec![appointment(Some(7), "ann@example.com")]) }));

        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo
            .expect_get()
            .with(eq(7))
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));
        tracking_repo
            .expect_mark_sent()
            .withf(move |id, k, _| *id == 7 && *k == kind)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut notifier = MockEmailNotifier::new();
        notifier
            .expect_send_thank_you()
            .withf(|appointment| {
                appointment.customer_email == "ann@example.com"
                    && appointment.service_type.as_deref() == Some("Haircut")
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            MockEmailLogRepository::new(),
            notifier,
            quiet_alerter(),
        );

        let summary = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(
            summary,
            JobSummary {
                sent: 1,
                skipped: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn skips_when_flag_already_set() {
        let kind = EmailKind::ThankYou(TimeSlot::Noon);

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(1)
            .returning(|_| Box::pin(async { Ok(vec![appointment(Some(7), "ann@example.com")]) }));

        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo
            .expect_get()
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(Some(tracked(7, kind))) }));

        let mut email_log_repo = MockEmailLogRepository::new();
        email_log_repo
            .expect_append()
            .withf(|log| {
                log.status == "skipped" && log.error_message.as_deref() == Some("Already sent")
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(1) }));

        // No notifier expectations: sending would panic the mock.
        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            email_log_repo,
            MockEmailNotifier::new(),
            quiet_alerter(),
        );

        let summary = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.sent, 0);
    }

    #[tokio::test]
    async fn a_noon_send_does_not_block_the_evening_slot() {
        let kind = EmailKind::ThankYou(TimeSlot::Evening);

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(1)
            .returning(|_| Box::pin(async { Ok(vec![appointment(Some(7), "ann@example.com")]) }));

        // Noon already sent; the evening slot is tracked independently.
        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo.expect_get().times(1).returning(|_| {
            Box::pin(async {
                Ok(Some(tracked(7, EmailKind::ThankYou(TimeSlot::Noon))))
            })
        });
        tracking_repo
            .expect_mark_sent()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut notifier = MockEmailNotifier::new();
        notifier
            .expect_send_thank_you()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            MockEmailLogRepository::new(),
            notifier,
            quiet_alerter(),
        );

        let summary = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(summary.sent, 1);
    }

    #[tokio::test]
    async fn missing_id_counts_skipped_without_log() {
        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(1)
            .returning(|_| Box::pin(async { Ok(vec![appointment(None, "ann@example.com")]) }));

        // Neither tracking nor the log is touched for an unaddressable row.
        let usecase = usecase(
            appointment_repo,
            MockEmailTrackingRepository::new(),
            MockEmailLogRepository::new(),
            MockEmailNotifier::new(),
            quiet_alerter(),
        );

        let summary = usecase
            .run_job_on(EmailKind::ThankYou(TimeSlot::Noon), fixed_today())
            .await
            .unwrap();
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn failure_does_not_block_batch() {
        let kind = EmailKind::ThankYou(TimeSlot::Noon);

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo.expect_find_by_date().times(1).returning(|_| {
            Box::pin(async {
                Ok(vec![
                    appointment(Some(1), "a@example.com"),
                    appointment(Some(2), "b@example.com"),
                ])
            })
        });

        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo
            .expect_get()
            .times(2)
            .returning(|_| Box::pin(async { Ok(None) }));
        tracking_repo
            .expect_mark_sent()
            .withf(|id, _, _| *id == 2)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut notifier = MockEmailNotifier::new();
        notifier
            .expect_send_thank_you()
            .withf(|appointment| appointment.customer_email == "a@example.com")
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow!("smtp refused")) }));
        notifier
            .expect_send_thank_you()
            .withf(|appointment| appointment.customer_email == "b@example.com")
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let mut email_log_repo = MockEmailLogRepository::new();
        email_log_repo
            .expect_append()
            .withf(|log| {
                log.status == "failed"
                    && log.appointment_id == Some(1)
                    && log.error_message.as_deref() == Some("smtp refused")
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(1) }));

        let alerter = quiet_alerter();
        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            email_log_repo,
            notifier,
            Arc::clone(&alerter),
        );

        let summary = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(
            summary,
            JobSummary {
                sent: 1,
                skipped: 0,
                failed: 1
            }
        );

        // Sends succeeded in the same run, so the streak was reset.
        assert_eq!(alerter.consecutive_failures().await, 0);
    }

    #[tokio::test]
    async fn enumeration_failure_propagates_and_counts() {
        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow!("connection pool exhausted")) }));

        let alerter = quiet_alerter();
        let usecase = usecase(
            appointment_repo,
            MockEmailTrackingRepository::new(),
            MockEmailLogRepository::new(),
            MockEmailNotifier::new(),
            Arc::clone(&alerter),
        );

        let result = usecase
            .run_job_on(EmailKind::ThankYou(TimeSlot::Noon), fixed_today())
            .await;
        assert!(result.is_err());
        assert_eq!(alerter.consecutive_failures().await, 1);
    }

    #[tokio::test]
    async fn followup_targets_exactly_seven_days_back() {
        let today = fixed_today();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .with(eq(expected))
            .times(1)
            .returning(|_| Box::pin(async { Ok(Vec::new()) }));

        let usecase = usecase(
            appointment_repo,
            MockEmailTrackingRepository::new(),
            MockEmailLogRepository::new(),
            MockEmailNotifier::new(),
            quiet_alerter(),
        );

        let summary = usecase.run_job_on(EmailKind::Followup, today).await.unwrap();
        assert_eq!(summary, JobSummary::default());
    }

    #[tokio::test]
    async fn rerun_skips_what_the_first_run_sent() {
        let kind = EmailKind::Followup;

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(2)
            .returning(|_| Box::pin(async { Ok(vec![appointment(Some(7), "ann@example.com")]) }));

        // First run sees no tracking row; the rerun sees the flag set.
        let calls = AtomicUsize::new(0);
        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo.expect_get().times(2).returning(move |_| {
            let tracking = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                None
            } else {
                Some(tracked(7, kind))
            };
            Box::pin(async move { Ok(tracking) })
        });
        tracking_repo
            .expect_mark_sent()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut notifier = MockEmailNotifier::new();
        notifier
            .expect_send_followup()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let mut email_log_repo = MockEmailLogRepository::new();
        email_log_repo
            .expect_append()
            .withf(|log| log.status == "skipped")
            .times(1)
            .returning(|_| Box::pin(async { Ok(1) }));

        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            email_log_repo,
            notifier,
            quiet_alerter(),
        );

        let first = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(first.sent, 1);

        let second = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn tracking_write_failure_counts_as_failed() {
        let kind = EmailKind::ThankYou(TimeSlot::Noon);

        let mut appointment_repo = MockAppointmentRepository::new();
        appointment_repo
            .expect_find_by_date()
            .times(1)
            .returning(|_| Box::pin(async { Ok(vec![appointment(Some(7), "ann@example.com")]) }));

        let mut tracking_repo = MockEmailTrackingRepository::new();
        tracking_repo
            .expect_get()
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));
        tracking_repo
            .expect_mark_sent()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Err(anyhow!("deadlock detected")) }));

        let mut notifier = MockEmailNotifier::new();
        notifier
            .expect_send_thank_you()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let mut email_log_repo = MockEmailLogRepository::new();
        email_log_repo
            .expect_append()
            .withf(|log| log.status == "failed")
            .times(1)
            .returning(|_| Box::pin(async { Ok(1) }));

        let alerter = quiet_alerter();
        let usecase = usecase(
            appointment_repo,
            tracking_repo,
            email_log_repo,
            notifier,
            Arc::clone(&alerter),
        );

        let summary = usecase.run_job_on(kind, fixed_today()).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(alerter.consecutive_failures().await, 1);
    }
}
