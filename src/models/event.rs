use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::payment::PaymentRates;
use crate::models::route::{Route, RouteStatus, Step};

/// Broadcast after every successful ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    RouteCreated { route: Route },
    RouteStepAppended { route_id: Uuid, step: Step },
    RouteStatusChanged { route_id: Uuid, status: RouteStatus },
    RouteDeleted { route_id: Uuid },
    DriverRegistered { driver: Driver },
    DriverUpdated { driver: Driver },
    DriverDeleted { driver_id: Uuid, detached_routes: usize },
    OrderCreated { order: Order },
    OrderDeleted { order_id: Uuid, detached_routes: usize },
    PaymentRatesUpdated { rates: PaymentRates },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LedgerEvent,
}
