use anyhow::{Result, bail};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Processing fee schedule: a percentage of the gross amount plus a fixed
/// amount, both settled in currency minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub percentage: Decimal,
    pub fixed_minor: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        // Platform default: 2.3% + $0.30.
        Self {
            percentage: Decimal::new(23, 3),
            fixed_minor: 30,
        }
    }
}

impl FeeSchedule {
    pub fn new(percentage: Decimal, fixed_minor: i64) -> Self {
        Self {
            percentage,
            fixed_minor,
        }
    }

    /// Computes the processing fee for a gross amount in minor units.
    ///
    /// Rounding is half-up and applied exactly once, so recomputing from the
    /// same inputs always yields the same fee. Reconciliation relies on that
    /// determinism.
    pub fn fee(&self, amount_minor: i64) -> Result<i64> {
        if amount_minor < 0 {
            bail!("fee amount must be non-negative, got {}", amount_minor);
        }

        let fee = Decimal::from(amount_minor) * self.percentage + Decimal::from(self.fixed_minor);
        let rounded = fee.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        rounded
            .to_i64()
            .ok_or_else(|| anyhow::anyhow!("fee overflows minor-unit range: {}", rounded))
    }

    /// The amount the merchant is ultimately credited: gross minus fee.
    pub fn net(amount_minor: i64, fee_minor: i64) -> i64 {
        amount_minor - fee_minor
    }
}
