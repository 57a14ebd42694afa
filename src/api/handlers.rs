//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::StepError;
use crate::sim::disturbance::Disturbance;
use crate::sim::driver::record_step;
use crate::sim::report::{RunReport, SystemHealth};
use crate::sim::types::StepInput;

use super::types::{ErrorResponse, ReportResponse, StateResponse, StepResponse, TelemetryQuery};
use super::{AppState, HEALTH_WINDOW};

/// A step error on its way out as an HTTP response.
///
/// Invalid calls map to 422, anything involving a fault or a stopped
/// stepper to 409.
pub struct ApiError(StepError);

impl From<StepError> for ApiError {
    fn from(e: StepError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            StepError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StepError::Fault(_) | StepError::Faulted(_) | StepError::Stopped => {
                StatusCode::CONFLICT
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            fault: self.0.fault().copied(),
        };
        (status, Json(body)).into_response()
    }
}

/// `GET /state` → 200 + `StateResponse`
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let session = state.lock();
    Json(StateResponse::from_stepper(
        &session.stepper,
        session.records.len(),
    ))
}

/// Advances the simulation by one step.
///
/// `POST /step` with a `StepInput` body → 200 + `StepResponse`
/// `POST /step` that faults, or on a faulted/stopped stepper → 409
/// `POST /step` with bad `dt_s` or non-increasing `time_s` → 422
pub async fn post_step(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StepInput>,
) -> Result<Json<StepResponse>, ApiError> {
    let mut session = state.lock();
    let output = session.stepper.step(input)?;
    let record = record_step(&session.stepper, input, output);
    session.records.push(record);
    debug!(time_s = input.time_s, steps = session.records.len(), "api step");
    Ok(Json(StepResponse::from(&record)))
}

/// `POST /reset` → 200 + `StateResponse`; also clears recorded telemetry.
pub async fn post_reset(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let mut session = state.lock();
    session.stepper.reset();
    session.records.clear();
    Json(StateResponse::from_stepper(&session.stepper, 0))
}

/// `POST /stop` → 200 + `StateResponse`
pub async fn post_stop(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let mut session = state.lock();
    session.stepper.stop();
    Json(StateResponse::from_stepper(
        &session.stepper,
        session.records.len(),
    ))
}

/// `POST /disturbance` with a `Disturbance` body → 200 + `StateResponse`,
/// 422 for out-of-range percentages, 409 when not accepting steps.
pub async fn post_disturbance(
    State(state): State<Arc<AppState>>,
    Json(disturbance): Json<Disturbance>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut session = state.lock();
    session.stepper.inject_disturbance(disturbance)?;
    Ok(Json(StateResponse::from_stepper(
        &session.stepper,
        session.records.len(),
    )))
}

/// Returns recorded steps, optionally filtered by index range.
///
/// `GET /telemetry` → 200 + every `StepRecord` since reset
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
                fault: None,
            }),
        ));
    }

    let session = state.lock();
    let records: Vec<_> = session
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| *i >= from && *i <= to)
        .map(|(_, r)| *r)
        .collect();

    Ok(Json(records))
}

/// `GET /report` → 200 + run totals and health over the recent window
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<ReportResponse> {
    let session = state.lock();
    Json(ReportResponse {
        report: RunReport::from_records(&session.records),
        health: SystemHealth::assess(&session.records, HEALTH_WINDOW),
    })
}
