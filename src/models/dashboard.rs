use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyOrderCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverPerformance {
    pub driver_name: String,
    pub completed_orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub total_drivers: usize,
    pub total_routes: usize,
    pub recent_orders: Vec<DailyOrderCount>,
    pub driver_performance: Vec<DriverPerformance>,
}
