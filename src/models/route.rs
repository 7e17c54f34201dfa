use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Pending,
    InProgress,
    Completed,
}

impl RouteStatus {
    /// Forward-only progression, one step at a time.
    pub fn can_transition_to(self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (RouteStatus::Pending, RouteStatus::InProgress)
                | (RouteStatus::InProgress, RouteStatus::Completed)
        )
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RouteStatus::Pending => "pending",
            RouteStatus::InProgress => "in-progress",
            RouteStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A driver's path for one order. Distance is never stored; see
/// [`crate::engine::route_ledger::RouteLedger::distance_traveled`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub steps: Vec<Step>,
    pub status: RouteStatus,
    /// Set when the referenced driver was deleted. The id is kept for audit.
    pub driver_detached: bool,
    pub order_detached: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn points(&self) -> impl Iterator<Item = &GeoPoint> {
        self.steps.iter().map(|step| &step.location)
    }
}

/// Read model for route tables: the route plus derived distance and resolved names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteView {
    #[serde(flatten)]
    pub route: Route,
    pub distance_traveled: f64,
    pub driver_name: String,
    pub customer_name: String,
}

/// A step as submitted by a caller. A missing timestamp is filled from the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInput {
    pub location: GeoPoint,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
