//! HTTP lockstep interface to a single simulation stepper.
//!
//! Endpoints:
//! - `GET /state` - lifecycle state, battery, and active disturbance
//! - `POST /step` - advance one step with a `StepInput` body
//! - `POST /reset`, `POST /stop` - lifecycle control
//! - `POST /disturbance` - inject a `Disturbance` until the next reset
//! - `GET /telemetry` - recorded steps with optional range filtering
//! - `GET /report` - run totals and system health

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::sim::driver::StepRecord;
use crate::sim::stepper::SimulationStepper;

pub use handlers::ApiError;
pub use types::{ErrorResponse, ReportResponse, StateResponse, StepResponse};

/// Records considered by the health assessment on `GET /report`.
pub const HEALTH_WINDOW: usize = 10;

/// The stepper and the records of its accepted steps since reset.
#[derive(Debug)]
pub struct Session {
    pub stepper: SimulationStepper,
    pub records: Vec<StepRecord>,
}

/// Application state shared across all request handlers.
///
/// Steps must be sequential, so the session sits behind a mutex and each
/// request holds it for the whole call.
#[derive(Debug)]
pub struct AppState {
    session: Mutex<Session>,
}

impl AppState {
    pub fn new(stepper: SimulationStepper) -> Self {
        Self {
            session: Mutex::new(Session {
                stepper,
                records: Vec::new(),
            }),
        }
    }

    /// Locks the session, recovering from poisoning.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/step", post(handlers::post_step))
        .route("/reset", post(handlers::post_reset))
        .route("/stop", post(handlers::post_stop))
        .route("/disturbance", post(handlers::post_disturbance))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/report", get(handlers::get_report))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
