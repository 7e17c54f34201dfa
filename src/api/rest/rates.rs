use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::engine::payment::RateSource;
use crate::error::AppError;
use crate::models::event::LedgerEvent;
use crate::models::payment::PaymentRates;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/payment-rates", get(current_rates).put(replace_rates))
}

async fn current_rates(State(state): State<Arc<AppState>>) -> Result<Json<PaymentRates>, AppError> {
    Ok(Json(state.rates.load()?))
}

async fn replace_rates(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PaymentRates>,
) -> Result<Json<PaymentRates>, AppError> {
    let result = state.rates.replace(payload);
    state.metrics.record_mutation("payment_rates", "replace", &result);
    result?;

    info!(
        per_order = payload.per_order,
        per_kilometer = payload.per_kilometer,
        per_hour = payload.per_hour,
        "payment rates replaced"
    );
    state.publish(LedgerEvent::PaymentRatesUpdated { rates: payload });

    Ok(Json(payload))
}
