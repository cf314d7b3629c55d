//! Rental pricing. Partial hours and days are billed as whole units.

use chrono::{DateTime, Utc};
use isoko_core::{Amount, Price, RentalType};
use rust_decimal::Decimal;

use crate::settlement::{require_non_negative, require_positive, Settlement};
use crate::{LedgerError, LedgerResult};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

fn unit_millis(rental_type: RentalType) -> i64 {
    match rental_type {
        RentalType::Hour => HOUR_MS,
        // Monthly vehicles are billed per started day at the contract rate.
        RentalType::Day | RentalType::Month => DAY_MS,
    }
}

/// Number of billable units between `start` and `end`, rounded up.
///
/// Returns zero when `end` does not come after `start`.
pub fn billed_units(rental_type: RentalType, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let diff = (end - start).num_milliseconds();
    if diff <= 0 {
        return 0;
    }
    let unit = unit_millis(rental_type);
    (diff + unit - 1) / unit
}

/// Contract total for the elapsed period at `rate` per unit, or `None` when
/// the total does not fit in a [`Decimal`].
pub fn rental_total(
    rental_type: RentalType,
    rate: Price,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<Amount> {
    Decimal::from(billed_units(rental_type, start, end)).checked_mul(rate)
}

/// Validated settlement preview for a rental contract.
pub fn quote_rental(
    rental_type: RentalType,
    rate: Price,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    paid: Amount,
) -> LedgerResult<Settlement> {
    if end <= start {
        return Err(LedgerError::validation(
            "end_datetime",
            format!("must be after start_datetime {start}"),
        ));
    }
    require_positive("rate", rate)?;
    require_non_negative("amount_paid", paid)?;
    let total = rental_total(rental_type, rate, start, end).ok_or_else(|| {
        LedgerError::validation(
            "rate",
            format!("{rate} per {rental_type} over this period exceeds the largest representable amount"),
        )
    })?;
    Ok(Settlement::compute(total, paid))
}
