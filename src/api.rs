// Bazi Fortune - REST API
// axum router shared by the server binary and the integration tests

use crate::error::BaziError;
use crate::fortune::{FortuneReport, Gender};
use crate::history::{HistoryRecord, HistoryStore, Statistics, HISTORY_TAIL};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    history: Arc<HistoryStore>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl AppState {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Self {
            history,
            today: local_today,
        }
    }

    /// Replace the clock used for the date-dependent fortune term.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct CalculateResponse {
    success: bool,
    #[serde(flatten)]
    report: FortuneReport,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRequest {
    birth_date: String,
    birth_hour: HourField,
    gender: String,
}

/// Hours arrive as JSON integers, fractional numbers (truncated toward zero)
/// or numeric strings from form inputs.
#[derive(Deserialize)]
#[serde(untagged)]
enum HourField {
    Number(i64),
    Fraction(f64),
    Text(String),
}

impl HourField {
    fn value(&self) -> Result<u32, BaziError> {
        let hour = match self {
            HourField::Number(n) => *n,
            HourField::Fraction(f) => f.trunc() as i64,
            HourField::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| BaziError::input(format!("birthHour {:?} is not an integer", s)))?,
        };
        u32::try_from(hour)
            .ok()
            .filter(|h| *h <= 23)
            .ok_or_else(|| BaziError::input(format!("birthHour must be 0-23, got {}", hour)))
    }
}

fn error_response(err: &BaziError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn run_calculation(state: &AppState, body: &[u8]) -> Result<FortuneReport, BaziError> {
    let request: CalculateRequest = serde_json::from_slice(body)
        .map_err(|e| BaziError::input(format!("malformed request body: {}", e)))?;

    let birth_date = NaiveDate::parse_from_str(request.birth_date.trim(), "%Y-%m-%d")
        .map_err(|e| BaziError::input(format!("birthDate {:?}: {}", request.birth_date, e)))?;
    let hour = request.birth_hour.value()?;
    let gender = Gender::parse(&request.gender);

    let report = FortuneReport::compute(birth_date, hour, gender, (state.today)())?;

    state
        .history
        .append(HistoryRecord::new(birth_date, report.fortune, report.wealth))?;

    Ok(report)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/calculate - Compute chart, scores and advice; records the query
async fn calculate(State(state): State<AppState>, body: Bytes) -> Response {
    match run_calculation(&state, &body) {
        Ok(report) => {
            info!(
                "Calculated {} fortune={} wealth={}",
                report.bazi, report.fortune, report.wealth
            );
            (
                StatusCode::OK,
                Json(CalculateResponse {
                    success: true,
                    report,
                }),
            )
                .into_response()
        }
        Err(e) => {
            if e.is_client_error() {
                warn!("Rejected calculation: {}", e);
            } else {
                error!("Calculation failed: {}", e);
            }
            error_response(&e)
        }
    }
}

/// GET /api/history - Most recent records, oldest first
async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    Json(state.history.tail(HISTORY_TAIL))
}

/// GET /api/statistics - Totals and averages over the whole log
async fn get_statistics(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.history.statistics())
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/calculate", post(calculate))
        .route("/history", get(get_history))
        .route("/statistics", get(get_statistics))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_field_accepts_numbers_and_strings() {
        let parse = |json: &str| serde_json::from_str::<HourField>(json).unwrap().value();

        assert_eq!(parse("0").unwrap(), 0);
        assert_eq!(parse("23").unwrap(), 23);
        assert_eq!(parse("\"7\"").unwrap(), 7);
        assert!(parse("24").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("\"noon\"").is_err());
    }

    #[test]
    fn test_hour_field_truncates_fractions() {
        let parse = |json: &str| serde_json::from_str::<HourField>(json).unwrap().value();

        assert_eq!(parse("3.0").unwrap(), 3);
        assert_eq!(parse("23.9").unwrap(), 23);
        assert_eq!(parse("-0.5").unwrap(), 0);
        assert!(parse("24.0").is_err());
        assert!(parse("\"3.0\"").is_err());
    }
}
