use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::LedgerEvent;
use crate::models::route::{GeoPoint, RouteStatus, RouteView, StepInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/:id", get(get_route).delete(delete_route))
        .route("/routes/:id/steps", post(append_step))
        .route("/routes/:id/status", patch(update_route_status))
        .route("/routes/:id/distance", get(distance_traveled))
}

#[derive(Deserialize)]
pub struct CreateRouteRequest {
    pub order_id: Uuid,
    pub driver_id: Uuid,
    #[serde(default)]
    pub steps: Vec<StepInput>,
}

#[derive(Deserialize)]
pub struct AppendStepRequest {
    pub location: GeoPoint,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RouteStatus,
}

#[derive(Serialize)]
pub struct DistanceResponse {
    pub route_id: Uuid,
    pub distance_traveled: f64,
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRouteRequest>,
) -> Result<(StatusCode, Json<RouteView>), AppError> {
    let ledger = state.route_ledger();
    let result = ledger.create_route(payload.order_id, payload.driver_id, payload.steps);
    state.metrics.record_mutation("route", "create", &result);
    let route = result?;

    state.publish(LedgerEvent::RouteCreated {
        route: route.clone(),
    });
    Ok((StatusCode::CREATED, Json(ledger.view(route)?)))
}

async fn list_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RouteView>>, AppError> {
    Ok(Json(state.route_ledger().list_views()?))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteView>, AppError> {
    let ledger = state.route_ledger();
    let route = ledger.get_route(id)?;
    Ok(Json(ledger.view(route)?))
}

async fn append_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppendStepRequest>,
) -> Result<Json<RouteView>, AppError> {
    let ledger = state.route_ledger();
    let result = ledger.append_step(id, payload.location, payload.timestamp);
    state.metrics.record_mutation("route", "append_step", &result);
    let route = result?;

    if let Some(step) = route.steps.last() {
        state.publish(LedgerEvent::RouteStepAppended {
            route_id: id,
            step: step.clone(),
        });
    }
    Ok(Json(ledger.view(route)?))
}

async fn update_route_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<RouteView>, AppError> {
    let ledger = state.route_ledger();
    let result = ledger.set_status(id, payload.status);
    state.metrics.record_mutation("route", "set_status", &result);
    let route = result?;

    state.publish(LedgerEvent::RouteStatusChanged {
        route_id: id,
        status: route.status,
    });
    Ok(Json(ledger.view(route)?))
}

async fn distance_traveled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DistanceResponse>, AppError> {
    let distance_traveled = state.route_ledger().distance_traveled(id)?;
    Ok(Json(DistanceResponse {
        route_id: id,
        distance_traveled,
    }))
}

async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = state.route_ledger().delete_route(id);
    state.metrics.record_mutation("route", "delete", &result);

    if result? {
        state.publish(LedgerEvent::RouteDeleted { route_id: id });
    }
    Ok(StatusCode::NO_CONTENT)
}
