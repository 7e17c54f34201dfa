use std::sync::{PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::geo::path_length;
use crate::models::driver::Driver;
use crate::models::payment::{PaymentQuote, PaymentRates};
use crate::models::route::{Route, RouteStatus};
use crate::store::EntityStore;

/// Where quotes read their rate table from. Loaded once per quote.
pub trait RateSource: Send + Sync {
    fn load(&self) -> Result<PaymentRates, LedgerError>;
}

impl RateSource for PaymentRates {
    fn load(&self) -> Result<PaymentRates, LedgerError> {
        Ok(*self)
    }
}

/// Rate table that operators can replace while the service runs.
pub struct SharedRates {
    current: RwLock<PaymentRates>,
}

impl SharedRates {
    pub fn new(rates: PaymentRates) -> Result<Self, LedgerError> {
        rates.validate()?;
        Ok(Self {
            current: RwLock::new(rates),
        })
    }

    pub fn replace(&self, rates: PaymentRates) -> Result<(), LedgerError> {
        rates.validate()?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = rates;
        Ok(())
    }
}

impl RateSource for SharedRates {
    fn load(&self) -> Result<PaymentRates, LedgerError> {
        Ok(*self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// `orders * per_order + km * per_kilometer + hours * per_hour`.
///
/// With non-negative rates this never decreases when any input grows.
pub fn compute_payment(
    completed_orders: u64,
    total_distance: f64,
    total_online_time: f64,
    rates: &PaymentRates,
) -> f64 {
    completed_orders as f64 * rates.per_order
        + total_distance * rates.per_kilometer
        + total_online_time * rates.per_hour
}

pub struct PaymentCalculator<'a> {
    drivers: &'a dyn EntityStore<Driver>,
    routes: &'a dyn EntityStore<Route>,
    rates: &'a dyn RateSource,
}

impl<'a> PaymentCalculator<'a> {
    pub fn new(
        drivers: &'a dyn EntityStore<Driver>,
        routes: &'a dyn EntityStore<Route>,
        rates: &'a dyn RateSource,
    ) -> Self {
        Self {
            drivers,
            routes,
            rates,
        }
    }

    /// Computes a fresh quote from current ledger state. Nothing is cached.
    pub fn quote(&self, driver_id: Uuid) -> Result<PaymentQuote, LedgerError> {
        let driver = self
            .drivers
            .get(driver_id)?
            .ok_or(LedgerError::DriverNotFound(driver_id))?;

        let rates = self.rates.load()?;
        rates.validate()?;

        let mut completed_orders = 0u64;
        let mut total_distance = 0.0;
        for route in self.routes.list()? {
            let counts = route.driver_id == driver_id
                && !route.driver_detached
                && route.status == RouteStatus::Completed;
            if counts {
                completed_orders += 1;
                total_distance += path_length(route.points())?;
            }
        }

        let total_online_time = driver.online_time;
        let total_payment =
            compute_payment(completed_orders, total_distance, total_online_time, &rates);

        debug!(
            driver_id = %driver_id,
            completed_orders,
            total_distance,
            total_online_time,
            total_payment,
            "payment quoted"
        );

        Ok(PaymentQuote {
            driver_id,
            completed_orders,
            total_distance,
            total_online_time,
            total_payment,
        })
    }
}
