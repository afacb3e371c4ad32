use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crates::application::usecases::health::{HealthUseCase, SmtpProbe};
use crates::domain::repositories::metrics::MetricsRepository;
use crates::domain::value_objects::enums::health_statuses::HealthStatus;
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad, repositories::metrics::MetricsPostgres,
};
use crates::infra::smtp::mailer::SmtpMailer;

pub fn routes(db_pool: Arc<PgPoolSquad>, mailer: Arc<SmtpMailer>) -> Router {
    let metrics_repository = MetricsPostgres::new(Arc::clone(&db_pool));
    let health_usecase = HealthUseCase::new(Arc::new(metrics_repository), mailer);

    Router::new()
        .route("/", get(full_report))
        .with_state(Arc::new(health_usecase))
}

pub async fn full_report<M, S>(
    State(health_usecase): State<Arc<HealthUseCase<M, S>>>,
) -> impl IntoResponse
where
    M: MetricsRepository + Send + Sync + 'static,
    S: SmtpProbe + Send + Sync + 'static,
{
    let report = health_usecase.full().await;

    // Degraded states surface through the status code so probes can act on it.
    let status = match report.overall {
        HealthStatus::Healthy | HealthStatus::Warning => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(report))
}
