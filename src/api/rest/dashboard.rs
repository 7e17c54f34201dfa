use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::dashboard::{recent_order_counts, summarize, top_drivers};
use crate::error::AppError;
use crate::models::dashboard::{DailyOrderCount, DashboardSummary, DriverPerformance};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard_summary))
        .route("/dashboard/recent-orders", get(recent_orders))
        .route("/dashboard/top-drivers", get(leaderboard))
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, AppError> {
    let drivers = state.drivers.list()?;
    let orders = state.orders.list()?;
    let total_routes = state.routes.list()?.len();
    let today = state.clock.now().date_naive();

    Ok(Json(summarize(
        &drivers,
        &orders,
        total_routes,
        today,
        state.leaderboard_size,
    )))
}

async fn recent_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DailyOrderCount>>, AppError> {
    let orders = state.orders.list()?;
    let today = state.clock.now().date_naive();
    Ok(Json(recent_order_counts(&orders, today)))
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<DriverPerformance>>, AppError> {
    let limit = query.limit.unwrap_or(state.leaderboard_size);
    let drivers = state.drivers.list()?;
    let orders = state.orders.list()?;
    Ok(Json(top_drivers(&drivers, &orders, limit)))
}
