use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::driver_ledger::DriverLedger;
use crate::engine::payment::{PaymentCalculator, SharedRates};
use crate::engine::route_ledger::RouteLedger;
use crate::error::LedgerError;
use crate::models::driver::Driver;
use crate::models::event::{EventEnvelope, LedgerEvent};
use crate::models::order::Order;
use crate::models::route::Route;
use crate::observability::metrics::Metrics;
use crate::store::{EntityStore, MemoryStore};

pub struct AppState {
    pub drivers: Arc<dyn EntityStore<Driver>>,
    pub orders: Arc<dyn EntityStore<Order>>,
    pub routes: Arc<dyn EntityStore<Route>>,
    pub clock: Arc<dyn Clock>,
    pub rates: SharedRates,
    pub leaderboard_size: usize,
    pub events_tx: broadcast::Sender<EventEnvelope>,
    pub metrics: Metrics,
}

impl AppState {
    /// In-memory stores and the system clock.
    pub fn new(config: &Config) -> Result<Self, LedgerError> {
        Self::with_collaborators(
            config,
            Arc::new(MemoryStore::<Driver>::new()),
            Arc::new(MemoryStore::<Order>::new()),
            Arc::new(MemoryStore::<Route>::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_collaborators(
        config: &Config,
        drivers: Arc<dyn EntityStore<Driver>>,
        orders: Arc<dyn EntityStore<Order>>,
        routes: Arc<dyn EntityStore<Route>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Ok(Self {
            drivers,
            orders,
            routes,
            clock,
            rates: SharedRates::new(config.payment_rates)?,
            leaderboard_size: config.leaderboard_size,
            events_tx,
            metrics: Metrics::new(),
        })
    }

    pub fn route_ledger(&self) -> RouteLedger<'_> {
        RouteLedger::new(
            self.routes.as_ref(),
            self.orders.as_ref(),
            self.drivers.as_ref(),
            self.clock.as_ref(),
        )
    }

    pub fn driver_ledger(&self) -> DriverLedger<'_> {
        DriverLedger::new(self.drivers.as_ref(), self.routes.as_ref(), self.clock.as_ref())
    }

    pub fn payments(&self) -> PaymentCalculator<'_> {
        PaymentCalculator::new(self.drivers.as_ref(), self.routes.as_ref(), &self.rates)
    }

    /// Fans an event out to websocket subscribers. Having none is fine.
    pub fn publish(&self, event: LedgerEvent) {
        let envelope = EventEnvelope {
            at: self.clock.now(),
            event,
        };
        if self.events_tx.send(envelope).is_err() {
            debug!("no event subscribers");
        }
    }
}
