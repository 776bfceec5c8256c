use std::fmt::Display;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Billing cadence, fixed for the life of a subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frequency = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        };
        write!(f, "{}", frequency)
    }
}

impl Frequency {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "quarterly" => Some(Frequency::Quarterly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    /// Advances a billing date by one unit of this cadence. Always computed
    /// from the previous scheduled date, never from "now", so a late-running
    /// batch does not compress the cycle. Month-based cadences clamp to the
    /// end of shorter months (Jan 31 + 1 month = Feb 28).
    pub fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Monthly => from.checked_add_months(Months::new(1)).unwrap_or(from),
            Frequency::Quarterly => from.checked_add_months(Months::new(3)).unwrap_or(from),
            Frequency::Yearly => from.checked_add_months(Months::new(12)).unwrap_or(from),
        }
    }
}
