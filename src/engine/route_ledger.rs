use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::geo::path_length;
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::route::{GeoPoint, Route, RouteStatus, RouteView, Step, StepInput};
use crate::store::EntityStore;

/// Name reported for a driver or customer that no longer exists.
pub const DELETED_PLACEHOLDER: &str = "<deleted>";

pub struct RouteLedger<'a> {
    routes: &'a dyn EntityStore<Route>,
    orders: &'a dyn EntityStore<Order>,
    drivers: &'a dyn EntityStore<Driver>,
    clock: &'a dyn Clock,
}

impl<'a> RouteLedger<'a> {
    pub fn new(
        routes: &'a dyn EntityStore<Route>,
        orders: &'a dyn EntityStore<Order>,
        drivers: &'a dyn EntityStore<Driver>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            routes,
            orders,
            drivers,
            clock,
        }
    }

    /// Assigns `order_id` to `driver_id` along `steps`. The new route starts `pending`.
    pub fn create_route(
        &self,
        order_id: Uuid,
        driver_id: Uuid,
        steps: Vec<StepInput>,
    ) -> Result<Route, LedgerError> {
        let now = self.clock.now();
        let steps = steps
            .into_iter()
            .map(|input| -> Result<Step, LedgerError> {
                input.location.validate()?;
                Ok(Step {
                    location: input.location,
                    timestamp: input.timestamp.unwrap_or(now),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.orders.get(order_id)?.is_none() {
            return Err(LedgerError::ReferenceNotFound {
                entity: "order",
                id: order_id,
            });
        }
        if self.drivers.get(driver_id)?.is_none() {
            return Err(LedgerError::ReferenceNotFound {
                entity: "driver",
                id: driver_id,
            });
        }

        if let Some(existing) = self
            .routes
            .list()?
            .into_iter()
            .find(|route| route.order_id == order_id && !route.order_detached)
        {
            return Err(LedgerError::OrderAlreadyRouted {
                order_id,
                route_id: existing.id,
            });
        }

        let route = Route {
            id: Uuid::new_v4(),
            order_id,
            driver_id,
            steps,
            status: RouteStatus::Pending,
            driver_detached: false,
            order_detached: false,
            created_at: now,
            updated_at: now,
        };
        self.routes.put(route.clone())?;

        // the order may have been deleted since the lookup; the route then
        // carries a dangling reference like any other
        self.orders.update(order_id, &mut |order| {
            order.driver_id = Some(driver_id);
            Ok(())
        })?;

        info!(
            route_id = %route.id,
            order_id = %order_id,
            driver_id = %driver_id,
            steps = route.steps.len(),
            "route created"
        );

        Ok(route)
    }

    /// Appends a step at the end. Steps are never reordered by timestamp.
    pub fn append_step(
        &self,
        route_id: Uuid,
        location: GeoPoint,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Route, LedgerError> {
        location.validate()?;

        let now = self.clock.now();
        let step = Step {
            location,
            timestamp: timestamp.unwrap_or(now),
        };

        let route = self
            .routes
            .update(route_id, &mut |route| {
                if route.status == RouteStatus::Completed {
                    return Err(LedgerError::InvalidState {
                        route_id,
                        status: route.status,
                    });
                }
                route.steps.push(step.clone());
                route.updated_at = now;
                Ok(())
            })?
            .ok_or(LedgerError::RouteNotFound(route_id))?;

        debug!(route_id = %route_id, steps = route.steps.len(), "step appended");
        Ok(route)
    }

    pub fn set_status(&self, route_id: Uuid, next: RouteStatus) -> Result<Route, LedgerError> {
        let now = self.clock.now();
        let route = self
            .routes
            .update(route_id, &mut |route| {
                if !route.status.can_transition_to(next) {
                    return Err(LedgerError::InvalidTransition {
                        route_id,
                        from: route.status,
                        to: next,
                    });
                }
                route.status = next;
                route.updated_at = now;
                Ok(())
            })?
            .ok_or(LedgerError::RouteNotFound(route_id))?;

        info!(route_id = %route_id, status = %route.status, "route status updated");
        Ok(route)
    }

    /// Kilometers along the route's steps, recomputed on every call.
    pub fn distance_traveled(&self, route_id: Uuid) -> Result<f64, LedgerError> {
        let route = self.get_route(route_id)?;
        path_length(route.points())
    }

    /// Removing a route that is already gone is a success. Returns whether
    /// anything was removed.
    pub fn delete_route(&self, route_id: Uuid) -> Result<bool, LedgerError> {
        let removed = self.routes.delete(route_id)?;
        info!(route_id = %route_id, removed, "route deleted");
        Ok(removed)
    }

    pub fn get_route(&self, route_id: Uuid) -> Result<Route, LedgerError> {
        self.routes
            .get(route_id)?
            .ok_or(LedgerError::RouteNotFound(route_id))
    }

    pub fn list_routes(&self) -> Result<Vec<Route>, LedgerError> {
        Ok(self.routes.list()?)
    }

    pub fn view(&self, route: Route) -> Result<RouteView, LedgerError> {
        let distance_traveled = path_length(route.points())?;

        let driver_name = if route.driver_detached {
            None
        } else {
            self.drivers.get(route.driver_id)?.map(|driver| driver.name)
        };
        let customer_name = if route.order_detached {
            None
        } else {
            self.orders.get(route.order_id)?.map(|order| order.customer_name)
        };

        Ok(RouteView {
            route,
            distance_traveled,
            driver_name: driver_name.unwrap_or_else(|| DELETED_PLACEHOLDER.to_string()),
            customer_name: customer_name.unwrap_or_else(|| DELETED_PLACEHOLDER.to_string()),
        })
    }

    pub fn list_views(&self) -> Result<Vec<RouteView>, LedgerError> {
        self.list_routes()?
            .into_iter()
            .map(|route| self.view(route))
            .collect()
    }
}

/// Flags every route of `driver_id` as detached. Returns how many were flagged.
pub fn detach_driver(
    routes: &dyn EntityStore<Route>,
    driver_id: Uuid,
    at: DateTime<Utc>,
) -> Result<usize, LedgerError> {
    detach_where(
        routes,
        |route| route.driver_id == driver_id && !route.driver_detached,
        |route| route.driver_detached = true,
        at,
    )
}

/// Flags the route(s) of `order_id` as detached. Returns how many were flagged.
pub fn detach_order(
    routes: &dyn EntityStore<Route>,
    order_id: Uuid,
    at: DateTime<Utc>,
) -> Result<usize, LedgerError> {
    detach_where(
        routes,
        |route| route.order_id == order_id && !route.order_detached,
        |route| route.order_detached = true,
        at,
    )
}

fn detach_where(
    routes: &dyn EntityStore<Route>,
    predicate: impl Fn(&Route) -> bool,
    flag: impl Fn(&mut Route),
    at: DateTime<Utc>,
) -> Result<usize, LedgerError> {
    let mut detached = 0;
    for route in routes.list()?.into_iter().filter(|route| predicate(route)) {
        let updated = routes.update(route.id, &mut |route| {
            flag(route);
            route.updated_at = at;
            Ok(())
        })?;
        if updated.is_some() {
            detached += 1;
        }
    }
    Ok(detached)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::{DELETED_PLACEHOLDER, detach_driver};
    use crate::engine::fixtures::Fixture;
    use crate::error::LedgerError;
    use crate::geo::{distance, path_length};
    use crate::models::route::{GeoPoint, RouteStatus, StepInput};
    use crate::store::EntityStore;

    fn step(lat: f64, lng: f64) -> StepInput {
        StepInput {
            location: GeoPoint { lat, lng },
            timestamp: None,
        }
    }

    #[test]
    fn create_route_starts_pending_and_assigns_order() {
        let fx = Fixture::new();
        let driver = fx.driver("Asha");
        let order = fx.order("Ravi", fx.now);

        let route = fx
            .route_ledger()
            .create_route(order.id, driver.id, vec![step(12.97, 77.59), step(12.93, 77.62)])
            .unwrap();

        assert_eq!(route.status, RouteStatus::Pending);
        assert_eq!(route.steps.len(), 2);
        assert!(route.steps.iter().all(|s| s.timestamp == fx.now));

        let stored_order = fx.orders.get(order.id).unwrap().unwrap();
        assert_eq!(stored_order.driver_id, Some(driver.id));
    }

    #[test]
    fn create_route_with_unknown_references_fails() {
        let fx = Fixture::new();
        let driver = fx.driver("Asha");
        let order = fx.order("Ravi", fx.now);
        let ghost = Uuid::from_u128(99);

        let err = fx.route_ledger().create_route(ghost, driver.id, vec![]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ReferenceNotFound {
                entity: "order",
                id: ghost
            }
        );

        let err = fx.route_ledger().create_route(order.id, ghost, vec![]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ReferenceNotFound {
                entity: "driver",
                id: ghost
            }
        );
        assert!(fx.routes.list().unwrap().is_empty());
    }

    #[test]
    fn create_route_rejects_invalid_step_coordinates() {
        let fx = Fixture::new();
        let driver = fx.driver("Asha");
        let order = fx.order("Ravi", fx.now);

        let err = fx
            .route_ledger()
            .create_route(order.id, driver.id, vec![step(12.0, 77.0), step(95.0, 77.0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCoordinate { .. }));
    }

    #[test]
    fn an_order_is_routed_at_most_once() {
        let fx = Fixture::new();
        let driver = fx.driver("Asha");
        let order = fx.order("Ravi", fx.now);

        let first = fx.route_ledger().create_route(order.id, driver.id, vec![]).unwrap();
        let err = fx.route_ledger().create_route(order.id, driver.id, vec![]).unwrap_err();

        assert_eq!(
            err,
            LedgerError::OrderAlreadyRouted {
                order_id: order.id,
                route_id: first.id
            }
        );
    }

    #[test]
    fn status_moves_forward_only() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[(12.97, 77.59)]);
        let ledger = fx.route_ledger();

        let route = ledger.set_status(route.id, RouteStatus::InProgress).unwrap();
        assert_eq!(route.status, RouteStatus::InProgress);
        let route = ledger.set_status(route.id, RouteStatus::Completed).unwrap();
        assert_eq!(route.status, RouteStatus::Completed);

        let err = ledger.set_status(route.id, RouteStatus::Pending).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidTransition {
                route_id: route.id,
                from: RouteStatus::Completed,
                to: RouteStatus::Pending
            }
        );
    }

    #[test]
    fn pending_cannot_skip_to_completed() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[]);

        let err = fx
            .route_ledger()
            .set_status(route.id, RouteStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    }

    #[test]
    fn reapplying_current_status_is_rejected() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[]);
        let ledger = fx.route_ledger();

        assert_eq!(
            ledger.set_status(route.id, RouteStatus::Pending).unwrap_err(),
            LedgerError::InvalidTransition {
                route_id: route.id,
                from: RouteStatus::Pending,
                to: RouteStatus::Pending,
            }
        );

        ledger.set_status(route.id, RouteStatus::InProgress).unwrap();
        ledger.set_status(route.id, RouteStatus::Completed).unwrap();
        assert!(matches!(
            ledger.set_status(route.id, RouteStatus::Completed).unwrap_err(),
            LedgerError::InvalidTransition { .. }
        ));
        assert_eq!(ledger.get_route(route.id).unwrap().status, RouteStatus::Completed);
    }

    #[test]
    fn append_keeps_insertion_order() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[(12.97, 77.59)]);
        let earlier = fx.now - Duration::hours(3);

        let updated = fx
            .route_ledger()
            .append_step(route.id, GeoPoint { lat: 12.93, lng: 77.62 }, Some(earlier))
            .unwrap();

        assert_eq!(updated.steps.len(), 2);
        assert_eq!(updated.steps[1].timestamp, earlier);
        assert_eq!(updated.steps[1].location, GeoPoint { lat: 12.93, lng: 77.62 });
    }

    #[test]
    fn append_to_completed_route_fails() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[(12.97, 77.59)]);
        let ledger = fx.route_ledger();
        ledger.set_status(route.id, RouteStatus::InProgress).unwrap();
        ledger.set_status(route.id, RouteStatus::Completed).unwrap();

        let err = ledger
            .append_step(route.id, GeoPoint { lat: 12.9, lng: 77.6 }, None)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidState {
                route_id: route.id,
                status: RouteStatus::Completed
            }
        );
        assert_eq!(ledger.get_route(route.id).unwrap().steps.len(), 1);
    }

    #[test]
    fn append_to_missing_route_fails() {
        let fx = Fixture::new();
        let ghost = Uuid::from_u128(5);

        let err = fx
            .route_ledger()
            .append_step(ghost, GeoPoint { lat: 1.0, lng: 1.0 }, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::RouteNotFound(ghost));
    }

    #[test]
    fn distance_tracks_appended_steps() {
        let fx = Fixture::new();
        let a = GeoPoint { lat: 28.6139, lng: 77.2090 };
        let b = GeoPoint { lat: 28.5355, lng: 77.3910 };
        let c = GeoPoint { lat: 28.4595, lng: 77.0266 };
        let route = fx.route_with_steps(&[(a.lat, a.lng), (b.lat, b.lng)]);
        let ledger = fx.route_ledger();

        let before = ledger.distance_traveled(route.id).unwrap();
        assert!((before - distance(&a, &b).unwrap()).abs() < 1e-9);

        ledger.append_step(route.id, c, None).unwrap();
        let after = ledger.distance_traveled(route.id).unwrap();
        assert!((after - path_length(&[a, b, c]).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn delete_is_idempotent() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[]);
        let ledger = fx.route_ledger();

        assert!(ledger.delete_route(route.id).unwrap());
        assert!(!ledger.delete_route(route.id).unwrap());
        assert_eq!(
            ledger.get_route(route.id).unwrap_err(),
            LedgerError::RouteNotFound(route.id)
        );
    }

    #[test]
    fn detached_driver_is_reported_as_deleted() {
        let fx = Fixture::new();
        let route = fx.route_with_steps(&[(12.97, 77.59)]);

        let flagged = detach_driver(&fx.routes, route.driver_id, fx.now).unwrap();
        assert_eq!(flagged, 1);
        fx.drivers.delete(route.driver_id).unwrap();

        let view = fx.route_ledger().view(fx.route_ledger().get_route(route.id).unwrap()).unwrap();
        assert!(view.route.driver_detached);
        assert_eq!(view.route.driver_id, route.driver_id);
        assert_eq!(view.driver_name, DELETED_PLACEHOLDER);
        assert_eq!(view.customer_name, "customer");
    }
}
