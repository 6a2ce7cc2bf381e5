use std::sync::Arc;

use alfafin_core::{DateRange, Money, Purchase, Stats, SummaryPeriod};
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// A forwarded bank notification.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Original send time of a forwarded message; wins over `timestamp`.
    #[serde(default)]
    pub forwarded_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub purchase: Purchase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

#[derive(Debug, Serialize)]
struct ShippingFailure {
    #[serde(flatten)]
    error: ErrorBody,
    purchase: Purchase,
}

#[derive(Debug, Default, Deserialize)]
pub struct SenderQuery {
    pub sender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub period: SummaryPeriod,
    pub range: DateRange,
    pub count: u64,
    pub sum: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/messages", post(post_message))
        .route("/stats", get(stats))
        .route("/summary/{period}", get(summary))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status() -> &'static str {
    "I'm fine"
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let message_id = req
        .message_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let span = tracing::info_span!(
        "message",
        message_id = %message_id,
        sender = req.sender.as_deref().unwrap_or("-"),
    );
    handle_message(state, req).instrument(span).await
}

async fn handle_message(state: Arc<AppState>, req: MessageRequest) -> Response {
    if !state.is_allowed(req.sender.as_deref()) {
        tracing::warn!("Message from a sender other than admin");
        return ApiError::Forbidden.into_response();
    }

    let fallback = req
        .forwarded_at
        .or(req.timestamp)
        .unwrap_or_else(|| Utc::now().with_timezone(&state.builder.timezone()).fixed_offset());

    let purchase = match state.builder.build(fallback, &req.text).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Message rejected");
            return ApiError::from(e).into_response();
        }
    };
    state.expenses.add(&purchase);
    tracing::info!(
        merchant = purchase.merchant(),
        price = %purchase.price(),
        currency = purchase.currency().code(),
        price_rub = %purchase.price_rub(),
        "Purchase recorded"
    );

    let Some(gas) = &state.gas else {
        return Json(MessageResponse { purchase, remote: None }).into_response();
    };
    match gas.add(&purchase).await {
        Ok(message) => Json(MessageResponse { purchase, remote: Some(message) }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to ship purchase to the remote ledger");
            let error = ApiError::from(e);
            let body = ShippingFailure { error: ErrorBody::from(&error), purchase };
            (error.status(), Json(body)).into_response()
        }
    }
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SenderQuery>,
) -> ApiResult<Json<Stats>> {
    if !state.is_allowed(q.sender.as_deref()) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.expenses.snapshot()))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Path(period): Path<String>,
    Query(q): Query<SenderQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    if !state.is_allowed(q.sender.as_deref()) {
        return Err(ApiError::Forbidden);
    }
    let period: SummaryPeriod = period.parse().map_err(ApiError::BadRequest)?;
    let today = Utc::now().with_timezone(&state.builder.timezone()).date_naive();
    let range = period.range(today);
    let local = state.expenses.total(range);

    let remote = match &state.gas {
        Some(gas) => Some(gas.summary(period).await?),
        None => None,
    };
    Ok(Json(SummaryResponse { period, range, count: local.count, sum: local.sum, remote }))
}
