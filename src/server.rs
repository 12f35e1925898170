// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! REST API for the expense ledger.
//!
//! ## Endpoints
//!
//! - `POST /convert` - Convert a temperature (rate limited)
//! - `POST /expenses` - Record an expense (rate limited)
//! - `GET /expenses` - List expenses, filtered and paginated
//! - `GET /expenses/summary` - Total and count of matching expenses
//! - `GET /expenses/{id}` - Fetch one expense
//! - `GET /health` - Liveness probe
//!
//! Write routes have independent quotas. Admitted writes carry
//! `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset`; rejected
//! writes get `429` with `Retry-After`. Read routes carry none of these.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/expenses \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": 12.50, "category": "food", "date": "2025-01-15"}'
//!
//! curl "http://localhost:3000/expenses?category=food&month=2025-01&page=1&pageSize=10"
//!
//! curl "http://localhost:3000/expenses/summary?month=2025-01"
//! ```

use crate::LedgerError;
use crate::base::{ExpenseId, RouteId};
use crate::clock::{Clock, Timestamp};
use crate::config::Config;
use crate::convert::{ConvertRequest, ConvertResponse};
use crate::expense::ExpenseRecord;
use crate::ledger::{LedgerStore, Summary};
use crate::pagination::{Page, paginate};
use crate::rate_limit::{Decision, RateLimitConfig, RateLimitRegistry};
use crate::validation::{ExpenseRequest, ListQuery, SummaryQuery};
use axum::{
    Json, Router,
    extract::{
        ConnectInfo, MatchedPath, Path, Query, Request, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const RATE_LIMIT_LIMIT: &str = "ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "ratelimit-reset";

/// Response body for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub limiter: Arc<RateLimitRegistry>,
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new(rate_limit: RateLimitConfig, clock: Arc<dyn Clock>, trust_proxy: bool) -> Self {
        Self {
            ledger: Arc::new(LedgerStore::new()),
            limiter: Arc::new(RateLimitRegistry::new(rate_limit, clock)),
            trust_proxy,
        }
    }
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(LedgerError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(LedgerError::MalformedRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(LedgerError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::EmptyCategory => (StatusCode::BAD_REQUEST, "EMPTY_CATEGORY"),
            LedgerError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            LedgerError::InvalidMonth(_) => (StatusCode::BAD_REQUEST, "INVALID_MONTH"),
            LedgerError::InvalidPage => (StatusCode::BAD_REQUEST, "INVALID_PAGE"),
            LedgerError::InvalidPageSize { .. } => (StatusCode::BAD_REQUEST, "INVALID_PAGE_SIZE"),
            LedgerError::InvalidTemperature(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_TEMPERATURE")
            }
            LedgerError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST"),
            LedgerError::ExpenseNotFound => (StatusCode::NOT_FOUND, "EXPENSE_NOT_FOUND"),
            LedgerError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            LedgerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        match &self.0 {
            LedgerError::Internal(message) => error!(%message, "request failed"),
            err if err.is_validation() => debug!(error = %err, "rejected invalid request"),
            _ => {}
        }

        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response();

        if let LedgerError::RateLimitExceeded { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

// === Rate Limiting ===

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision, now: Timestamp) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(decision.reset_after_secs(now)));
}

/// Admission check for write routes. Attached per route, so reads never reach it.
async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let route = RouteId::new(request.method().as_str(), &path);

    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    // Without the peer address every caller would share one bucket.
    let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() else {
        return AppError(LedgerError::Internal(
            "peer address unavailable; serve with connect info".to_string(),
        ))
        .into_response();
    };
    let client =
        RateLimitRegistry::client_identity(forwarded_for, Some(peer.ip()), state.trust_proxy);

    let (decision, now) = state.limiter.admit_now(&route, &client);
    if !decision.allowed {
        let retry_after_secs = decision.retry_after_secs(now);
        let mut response =
            AppError(LedgerError::RateLimitExceeded { retry_after_secs }).into_response();
        insert_rate_limit_headers(response.headers_mut(), &decision, now);
        return response;
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &decision, now);
    response
}

// === Handlers ===

/// POST /convert - Convert a temperature between units.
async fn convert_temperature(
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, AppError> {
    let Json(request) = payload?;
    Ok(Json(request.execute()?))
}

/// POST /expenses - Record a new expense.
async fn create_expense(
    State(state): State<AppState>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseRecord>), AppError> {
    let Json(request) = payload?;
    let expense = request.validate()?;
    let record = state.ledger.create(expense);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /expenses - List expenses matching the filters, one page at a time.
async fn list_expenses(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<ExpenseRecord>>, AppError> {
    let Query(query) = query?;
    let (filter, page) = query.validate()?;
    Ok(Json(paginate(state.ledger.filter(&filter), page)))
}

/// GET /expenses/summary - Total and count of matching expenses.
async fn expense_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<Summary>, AppError> {
    let Query(query) = query?;
    let filter = query.validate()?;
    Ok(Json(state.ledger.summarize(&filter)))
}

/// GET /expenses/{id} - Fetch a single expense.
async fn get_expense(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ExpenseRecord>, AppError> {
    let Path(id) = id?;
    state
        .ledger
        .get(&ExpenseId(id))
        .map(Json)
        .ok_or(AppError(LedgerError::ExpenseNotFound))
}

/// GET /health - Liveness probe.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "expenses": state.ledger.len(),
    }))
}

// === Router ===

pub fn create_router(state: AppState) -> Router {
    let limited = middleware::from_fn_with_state(state.clone(), rate_limit);

    Router::new()
        .route(
            "/convert",
            post(convert_temperature).route_layer(limited.clone()),
        )
        .route(
            "/expenses",
            get(list_expenses).merge(post(create_expense).route_layer(limited)),
        )
        .route("/expenses/summary", get(expense_summary))
        .route("/expenses/{id}", get(get_expense))
        .route("/health", get(health))
        .with_state(state)
}

// === Serve ===

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn serve(config: &Config, clock: Arc<dyn Clock>) -> std::io::Result<()> {
    let state = AppState::new(config.rate_limit_config(), clock, config.trust_proxy);
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        trust_proxy = config.trust_proxy,
        rate_limit = config.rate_limit,
        window_secs = config.rate_limit_window_secs,
        "expense ledger API listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
