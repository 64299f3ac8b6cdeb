//! Billing plans offered to kiosk organizations.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Platform billing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPlan {
    Monthly,
    Annual,
}

impl BillingPlan {
    /// Length of one billing period in days.
    pub fn period_days(&self) -> i64 {
        match self {
            BillingPlan::Monthly => 30,
            BillingPlan::Annual => 365,
        }
    }

    /// Stable string form used in database rows and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPlan::Monthly => "monthly",
            BillingPlan::Annual => "annual",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "monthly" => Ok(BillingPlan::Monthly),
            "annual" => Ok(BillingPlan::Annual),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}
