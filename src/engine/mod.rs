pub mod dashboard;
pub mod driver_ledger;
pub mod payment;
pub mod route_ledger;
