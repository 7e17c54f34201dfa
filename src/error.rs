use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::route::RouteStatus;

/// Failures of the accounting core. Every variant carries the offending id or
/// value so callers can render a message without another lookup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("{entity} {id} does not exist")]
    ReferenceNotFound { entity: &'static str, id: Uuid },

    #[error("route {route_id} is {status} and no longer accepts steps")]
    InvalidState { route_id: Uuid, status: RouteStatus },

    #[error("route {route_id} cannot move from {from} to {to}")]
    InvalidTransition {
        route_id: Uuid,
        from: RouteStatus,
        to: RouteStatus,
    },

    #[error("online time delta must be a positive number of hours, got {hours}")]
    InvalidAmount { hours: f64 },

    #[error("payment rate {name} must be a non-negative number, got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("driver {0} not found")]
    DriverNotFound(Uuid),

    #[error("route {0} not found")]
    RouteNotFound(Uuid),

    #[error("order {order_id} is already assigned to route {route_id}")]
    OrderAlreadyRouted { order_id: Uuid, route_id: Uuid },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidCoordinate { .. } => "invalid_coordinate",
            LedgerError::ReferenceNotFound { .. } => "reference_not_found",
            LedgerError::InvalidState { .. } => "invalid_state",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
            LedgerError::InvalidAmount { .. } => "invalid_amount",
            LedgerError::InvalidRate { .. } => "invalid_rate",
            LedgerError::DriverNotFound(_) => "driver_not_found",
            LedgerError::RouteNotFound(_) => "route_not_found",
            LedgerError::OrderAlreadyRouted { .. } => "order_already_routed",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            LedgerError::InvalidCoordinate { .. }
            | LedgerError::InvalidAmount { .. }
            | LedgerError::InvalidRate { .. } => StatusCode::BAD_REQUEST,
            LedgerError::ReferenceNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::InvalidState { .. }
            | LedgerError::InvalidTransition { .. }
            | LedgerError::OrderAlreadyRouted { .. } => StatusCode::CONFLICT,
            LedgerError::DriverNotFound(_) | LedgerError::RouteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Ledger(err) => (err.status(), err.code(), err.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
