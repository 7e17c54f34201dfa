use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::route_ledger::detach_order;
use crate::error::AppError;
use crate::models::event::LedgerEvent;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).delete(delete_order))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
}

#[derive(Serialize)]
pub struct DeleteOrderResponse {
    pub order_id: Uuid,
    pub detached_routes: usize,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer_name cannot be empty".to_string(),
        ));
    }

    let order = Order {
        id: Uuid::new_v4(),
        customer_name: payload.customer_name,
        driver_id: None,
        created_at: state.clock.now(),
    };

    let result = state.orders.put(order.clone());
    state.metrics.record_mutation("order", "create", &result);
    result?;

    info!(order_id = %order.id, "order created");
    state.publish(LedgerEvent::OrderCreated {
        order: order.clone(),
    });

    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list()?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(id)?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order))
}

/// Removes the order. Routes that referenced it are kept and flagged.
async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteOrderResponse>, AppError> {
    if state.orders.get(id)?.is_none() {
        return Err(AppError::NotFound(format!("order {} not found", id)));
    }

    let result = detach_order(state.routes.as_ref(), id, state.clock.now()).and_then(|detached| {
        state.orders.delete(id)?;
        Ok(detached)
    });
    state.metrics.record_mutation("order", "delete", &result);
    let detached_routes = result?;

    info!(order_id = %id, detached_routes, "order deleted");
    state.publish(LedgerEvent::OrderDeleted {
        order_id: id,
        detached_routes,
    });

    Ok(Json(DeleteOrderResponse {
        order_id: id,
        detached_routes,
    }))
}
