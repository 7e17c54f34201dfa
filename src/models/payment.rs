use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Operator-tunable pay structure. Currency units are whatever the operator bills in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PaymentRates {
    pub per_order: f64,
    pub per_kilometer: f64,
    pub per_hour: f64,
}

impl PaymentRates {
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (name, value) in [
            ("per_order", self.per_order),
            ("per_kilometer", self.per_kilometer),
            ("per_hour", self.per_hour),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentQuote {
    pub driver_id: Uuid,
    pub completed_orders: u64,
    pub total_distance: f64,
    pub total_online_time: f64,
    pub total_payment: f64,
}
