use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::axum_http::error_responses::AppError;
use crates::application::usecases::metrics::MetricsUseCase;
use crates::domain::repositories::metrics::MetricsRepository;
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad, repositories::metrics::MetricsPostgres,
};

const MAX_WINDOW_HOURS: i64 = 720;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let metrics_repository = MetricsPostgres::new(Arc::clone(&db_pool));
    let metrics_usecase = MetricsUseCase::new(Arc::new(metrics_repository));

    Router::new()
        .route("/", get(report))
        .route("/stats", get(stats))
        .route("/email", get(email_stats))
        .with_state(Arc::new(metrics_usecase))
}

pub async fn report<M>(
    State(metrics_usecase): State<Arc<MetricsUseCase<M>>>,
) -> Result<impl IntoResponse, AppError>
where
    M: MetricsRepository + Send + Sync + 'static,
{
    let report = metrics_usecase.report().await?;
    Ok(Json(report))
}

pub async fn stats<M>(
    State(metrics_usecase): State<Arc<MetricsUseCase<M>>>,
) -> Result<impl IntoResponse, AppError>
where
    M: MetricsRepository + Send + Sync + 'static,
{
    let summary = metrics_usecase.stats_summary().await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct EmailStatsQuery {
    pub hours: Option<i64>,
}

pub async fn email_stats<M>(
    State(metrics_usecase): State<Arc<MetricsUseCase<M>>>,
    Query(query): Query<EmailStatsQuery>,
) -> Result<impl IntoResponse, AppError>
where
    M: MetricsRepository + Send + Sync + 'static,
{
    let hours = query.hours.unwrap_or(24);
    if !(1..=MAX_WINDOW_HOURS).contains(&hours) {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {}",
            MAX_WINDOW_HOURS
        )));
    }

    let stats = metrics_usecase.email_stats(hours).await?;
    Ok(Json(stats))
}
