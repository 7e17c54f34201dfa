use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, DriverProfile, DriverStatus};
use crate::models::event::LedgerEvent;
use crate::models::payment::PaymentQuote;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers).post(register_driver))
        .route("/drivers/:id", get(get_driver).delete(delete_driver))
        .route("/drivers/:id/status", patch(update_driver_status))
        .route("/drivers/:id/online-time", patch(add_online_time))
        .route("/drivers/:id/online-time/reset", patch(reset_online_time))
        .route("/drivers/:id/payment", get(payment_quote))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DriverStatus,
}

#[derive(Deserialize)]
pub struct AddOnlineTimeRequest {
    pub hours: f64,
}

#[derive(Serialize)]
pub struct DeleteDriverResponse {
    pub driver_id: Uuid,
    pub detached_routes: usize,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DriverProfile>,
) -> Result<(StatusCode, Json<Driver>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let result = state.driver_ledger().register(payload);
    state.metrics.record_mutation("driver", "register", &result);
    let driver = result?;

    state
        .metrics
        .driver_online_hours
        .with_label_values(&[&driver.id.to_string()])
        .set(driver.online_time);
    state.publish(LedgerEvent::DriverRegistered {
        driver: driver.clone(),
    });

    Ok((StatusCode::CREATED, Json(driver)))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.driver_ledger().list()?))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(state.driver_ledger().get(id)?))
}

async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Driver>, AppError> {
    let result = state.driver_ledger().set_status(id, payload.status);
    state.metrics.record_mutation("driver", "set_status", &result);
    let driver = result?;

    state.publish(LedgerEvent::DriverUpdated {
        driver: driver.clone(),
    });
    Ok(Json(driver))
}

async fn add_online_time(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddOnlineTimeRequest>,
) -> Result<Json<Driver>, AppError> {
    let result = state.driver_ledger().add_online_time(id, payload.hours);
    state.metrics.record_mutation("driver", "add_online_time", &result);
    let driver = result?;

    on_online_time_changed(&state, &driver);
    Ok(Json(driver))
}

async fn reset_online_time(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let result = state.driver_ledger().reset_online_time(id);
    state.metrics.record_mutation("driver", "reset_online_time", &result);
    let driver = result?;

    on_online_time_changed(&state, &driver);
    Ok(Json(driver))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteDriverResponse>, AppError> {
    let result = state.driver_ledger().delete(id);
    state.metrics.record_mutation("driver", "delete", &result);
    let detached_routes = result?;

    if let Err(err) = state
        .metrics
        .driver_online_hours
        .remove_label_values(&[&id.to_string()])
    {
        debug!(driver_id = %id, error = %err, "no online-hours series to remove");
    }
    state.publish(LedgerEvent::DriverDeleted {
        driver_id: id,
        detached_routes,
    });

    Ok(Json(DeleteDriverResponse {
        driver_id: id,
        detached_routes,
    }))
}

async fn payment_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentQuote>, AppError> {
    let timer = Instant::now();
    let result = state.payments().quote(id);
    state
        .metrics
        .payment_quote_latency_seconds
        .observe(timer.elapsed().as_secs_f64());

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .payment_quotes_total
        .with_label_values(&[outcome])
        .inc();

    Ok(Json(result?))
}

fn on_online_time_changed(state: &AppState, driver: &Driver) {
    state
        .metrics
        .driver_online_hours
        .with_label_values(&[&driver.id.to_string()])
        .set(driver.online_time);
    state.publish(LedgerEvent::DriverUpdated {
        driver: driver.clone(),
    });
}
