//! HTTP route handlers.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::bridge::{
    BridgeService, Formulation, FormulationError, TabuBridgeService, TabuFormulation,
    already_there, route_cost,
};
use crate::deadline::{DeadlineError, run_with_deadline};
use crate::stops::StopLookupError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/search", get(search_stops))
        .route("/api/route/plan", post(plan_route))
        .route("/api/tour/plan", post(plan_tour))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Search stops by name, closest first.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Json<StopSearchResponse> {
    let limit = req.limit.unwrap_or(10).min(50);
    Json(StopSearchResponse {
        stops: state.stops.search(&req.q, limit),
    })
}

/// Parse JSON manually so we can log the body on failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "invalid JSON body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Route between two stops.
async fn plan_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RoutePlanResponse>, AppError> {
    let req: RoutePlanRequest = parse_body(&body)?;
    let formulation = Formulation::resolve(
        &state.stops,
        req.parameter,
        req.algorithm,
        req.heuristic,
        &req.start,
        &req.end,
        &req.time,
    )?;
    info!(start = %formulation.start, end = %formulation.end, "planning route");

    let bridge = state.bridge.clone();
    let query = formulation.clone();
    let (route, elapsed) = run_with_deadline(state.config.solution_timeout(), move |cancel| {
        bridge.solve_until(&query, &cancel)
    })
    .await?;

    Ok(Json(RoutePlanResponse {
        found: !route.is_empty(),
        already_there: already_there(&formulation, &route),
        report: BridgeService::report(&formulation, &route, elapsed),
        legs: LegResult::from_route(&route),
        cost: route_cost(&route, formulation.parameter),
        elapsed_ms: elapsed.as_millis() as u64,
    }))
}

/// Optimise the visiting order of a circular tour.
async fn plan_tour(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TourPlanResponse>, AppError> {
    let req: TourPlanRequest = parse_body(&body)?;

    let improvements = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&improvements);
    let formulation = TabuFormulation::resolve(&state.stops, &req.stops, &req.time, req.parameter)?
        .with_aspiration(req.aspiration)
        .with_tabu_limit(req.tabu_limit)
        .with_sampling(req.sampling)
        .with_on_change(move |_, to, from_cost, to_cost| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(Improvement {
                    from_cost,
                    to_cost,
                    plan: to.clone(),
                });
            }
        });
    info!(stops = formulation.stops.len(), "planning tour");

    let tours: Arc<TabuBridgeService> = Arc::clone(&state.tours);
    let query = formulation.clone();
    let solution = run_with_deadline(state.config.solution_timeout(), move |cancel| {
        tours.solve_until(&query, &cancel)
    })
    .await?;

    let improvements = improvements
        .lock()
        .map(|mut seen| std::mem::take(&mut *seen))
        .unwrap_or_default();

    Ok(Json(TourPlanResponse {
        report: TabuBridgeService::report(&formulation, &solution),
        legs: LegResult::from_route(&solution.tour.route),
        cost: solution.cost.is_finite().then_some(solution.cost),
        improvements,
        elapsed_ms: solution.elapsed.as_millis() as u64,
        plan: solution.plan,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Timeout { message: String },
    Internal { message: String },
}

impl From<FormulationError> for AppError {
    fn from(e: FormulationError) -> Self {
        match e {
            FormulationError::Stop(StopLookupError::NotFound { .. }) => AppError::NotFound {
                message: e.to_string(),
            },
            _ => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl From<DeadlineError> for AppError {
    fn from(e: DeadlineError) -> Self {
        match e {
            DeadlineError::TimedOut => AppError::Timeout {
                message: e.to_string(),
            },
            DeadlineError::WorkerFailed(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Timeout { message }
            | AppError::Internal { message } => message,
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
