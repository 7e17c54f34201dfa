use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::route_ledger::detach_driver;
use crate::error::LedgerError;
use crate::models::driver::{Driver, DriverProfile, DriverStatus};
use crate::models::route::Route;
use crate::store::{EntityStore, Mutation};

pub struct DriverLedger<'a> {
    drivers: &'a dyn EntityStore<Driver>,
    routes: &'a dyn EntityStore<Route>,
    clock: &'a dyn Clock,
}

impl<'a> DriverLedger<'a> {
    pub fn new(
        drivers: &'a dyn EntityStore<Driver>,
        routes: &'a dyn EntityStore<Route>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            drivers,
            routes,
            clock,
        }
    }

    pub fn register(&self, profile: DriverProfile) -> Result<Driver, LedgerError> {
        let now = self.clock.now();
        let driver = Driver {
            id: Uuid::new_v4(),
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            vehicle_type: profile.vehicle_type,
            status: DriverStatus::Active,
            online_time: 0.0,
            created_at: now,
            updated_at: now,
        };

        self.drivers.put(driver.clone())?;
        info!(driver_id = %driver.id, "driver registered");
        Ok(driver)
    }

    pub fn get(&self, driver_id: Uuid) -> Result<Driver, LedgerError> {
        self.drivers
            .get(driver_id)?
            .ok_or(LedgerError::DriverNotFound(driver_id))
    }

    /// All drivers in registration order.
    pub fn list(&self) -> Result<Vec<Driver>, LedgerError> {
        Ok(self.drivers.list()?)
    }

    /// Adds `hours` to the accumulator. Never overwrites it.
    pub fn add_online_time(&self, driver_id: Uuid, hours: f64) -> Result<Driver, LedgerError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(LedgerError::InvalidAmount { hours });
        }

        let now = self.clock.now();
        let driver = self.mutate(driver_id, &mut |driver| {
            let total = driver.online_time + hours;
            if !total.is_finite() {
                return Err(LedgerError::InvalidAmount { hours });
            }
            driver.online_time = total;
            driver.updated_at = now;
            Ok(())
        })?;

        info!(
            driver_id = %driver_id,
            added_hours = hours,
            online_time = driver.online_time,
            "online time added"
        );
        Ok(driver)
    }

    pub fn reset_online_time(&self, driver_id: Uuid) -> Result<Driver, LedgerError> {
        let now = self.clock.now();
        let driver = self.mutate(driver_id, &mut |driver| {
            driver.online_time = 0.0;
            driver.updated_at = now;
            Ok(())
        })?;

        info!(driver_id = %driver_id, "online time reset");
        Ok(driver)
    }

    pub fn set_status(&self, driver_id: Uuid, status: DriverStatus) -> Result<Driver, LedgerError> {
        let now = self.clock.now();
        let driver = self.mutate(driver_id, &mut |driver| {
            driver.status = status;
            driver.updated_at = now;
            Ok(())
        })?;

        info!(driver_id = %driver_id, status = ?status, "driver status updated");
        Ok(driver)
    }

    /// Removes the driver. Their routes are kept and flagged as detached so
    /// payment history stays auditable. Returns the number of detached routes.
    pub fn delete(&self, driver_id: Uuid) -> Result<usize, LedgerError> {
        self.get(driver_id)?;

        let detached = detach_driver(self.routes, driver_id, self.clock.now())?;
        if !self.drivers.delete(driver_id)? {
            warn!(driver_id = %driver_id, "driver vanished during delete");
        }

        info!(driver_id = %driver_id, detached_routes = detached, "driver deleted");
        Ok(detached)
    }

    fn mutate(
        &self,
        driver_id: Uuid,
        apply: Mutation<'_, Driver>,
    ) -> Result<Driver, LedgerError> {
        self.drivers
            .update(driver_id, apply)?
            .ok_or(LedgerError::DriverNotFound(driver_id))
    }
}
