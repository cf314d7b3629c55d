use isoko_core::{
    multiply_quantity_price, Amount, Price, Purchase, Quantity, ReceiptStatus, RentalContract,
    Sale, SettlementState, SettlementStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, LedgerResult};

/// Derived money fields for a purchase, sale or rental contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub total: Amount,
    pub paid: Amount,
    pub remaining: Amount,
    pub state: SettlementState,
}

impl Settlement {
    /// Apply the settlement formula to a total and the amount paid or received so far.
    pub fn compute(total: Amount, paid: Amount) -> Self {
        let remaining = (total - paid).max(Decimal::ZERO);
        let state = if paid >= total {
            SettlementState::Complete
        } else if paid > Decimal::ZERO {
            SettlementState::Partial
        } else {
            SettlementState::Pending
        };
        Self {
            total,
            paid,
            remaining,
            state,
        }
    }

    pub fn settlement_status(&self) -> SettlementStatus {
        self.state.into()
    }

    pub fn receipt_status(&self) -> ReceiptStatus {
        self.state.into()
    }
}

pub(crate) fn require_positive(field: &'static str, value: Decimal) -> LedgerResult<()> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(LedgerError::validation(
            field,
            format!("must be greater than zero, got {value}"),
        ))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: Decimal) -> LedgerResult<()> {
    if value < Decimal::ZERO {
        Err(LedgerError::validation(
            field,
            format!("must not be negative, got {value}"),
        ))
    } else {
        Ok(())
    }
}

/// Live settlement preview for a purchase or sale line.
pub fn quote_goods(quantity: Quantity, unit_price: Price, paid: Amount) -> LedgerResult<Settlement> {
    require_positive("total_quantity", quantity)?;
    require_positive("unit_price", unit_price)?;
    require_non_negative("amount_paid", paid)?;
    let total = multiply_quantity_price(quantity, unit_price).ok_or_else(|| {
        LedgerError::validation(
            "unit_price",
            format!("{quantity} x {unit_price} exceeds the largest representable amount"),
        )
    })?;
    Ok(Settlement::compute(total, paid))
}

/// Records whose paid/remaining/status fields are driven by payments.
pub trait Settleable {
    /// Entity name used in error reports.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;

    fn total(&self) -> Amount;

    /// Amount paid (purchases, contracts) or received (sales) so far.
    fn settled(&self) -> Amount;

    /// Overwrite the derived fields with a freshly computed settlement.
    fn write_settlement(&mut self, settlement: &Settlement);

    fn settlement(&self) -> Settlement {
        Settlement::compute(self.total(), self.settled())
    }
}

impl Settleable for Purchase {
    const ENTITY: &'static str = "purchase";

    fn id(&self) -> Uuid {
        self.id
    }

    fn total(&self) -> Amount {
        self.total_purchase_cost
    }

    fn settled(&self) -> Amount {
        self.amount_paid
    }

    fn write_settlement(&mut self, settlement: &Settlement) {
        self.amount_paid = settlement.paid;
        self.remaining_amount = settlement.remaining;
        self.financial_status = settlement.settlement_status();
    }
}

impl Settleable for Sale {
    const ENTITY: &'static str = "sale";

    fn id(&self) -> Uuid {
        self.id
    }

    fn total(&self) -> Amount {
        self.total_sale_amount
    }

    fn settled(&self) -> Amount {
        self.amount_received
    }

    fn write_settlement(&mut self, settlement: &Settlement) {
        self.amount_received = settlement.paid;
        self.remaining_amount = settlement.remaining;
        self.financial_status = settlement.receipt_status();
    }
}

impl Settleable for RentalContract {
    const ENTITY: &'static str = "rental contract";

    fn id(&self) -> Uuid {
        self.id
    }

    fn total(&self) -> Amount {
        self.total_amount
    }

    fn settled(&self) -> Amount {
        self.amount_paid
    }

    fn write_settlement(&mut self, settlement: &Settlement) {
        self.amount_paid = settlement.paid;
        self.remaining_amount = settlement.remaining;
        self.financial_status = settlement.settlement_status();
    }
}

/// Add a payment to `record` and recompute its derived fields.
///
/// Rejects non-positive amounts and amounts larger than the outstanding balance,
/// leaving the record untouched on error.
pub fn apply_payment<T: Settleable>(record: &mut T, amount: Amount) -> LedgerResult<Settlement> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Integrity(format!(
            "payment amount must be positive, got {amount}"
        )));
    }
    let current = record.settlement();
    if amount > current.remaining {
        return Err(LedgerError::Integrity(format!(
            "payment of {amount} exceeds outstanding balance {} on {} {}",
            current.remaining,
            T::ENTITY,
            record.id()
        )));
    }
    let next = Settlement::compute(current.total, current.paid + amount);
    record.write_settlement(&next);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn purchase(quantity: Decimal, unit_price: Decimal, paid: Decimal) -> Purchase {
        let settlement = quote_goods(quantity, unit_price, paid).unwrap();
        Purchase {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            purchase_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total_quantity: quantity,
            unit_price,
            total_purchase_cost: settlement.total,
            package_size: None,
            package_count: None,
            amount_paid: settlement.paid,
            remaining_amount: settlement.remaining,
            financial_status: settlement.settlement_status(),
            amount_due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn settlement_formula_covers_every_state() {
        let total = dec!(1000);
        let pending = Settlement::compute(total, Decimal::ZERO);
        assert_eq!(pending.remaining, total);
        assert_eq!(pending.state, SettlementState::Pending);

        for paid in [dec!(1), dec!(250.5), dec!(999.99)] {
            let partial = Settlement::compute(total, paid);
            assert_eq!(partial.remaining, total - paid);
            assert_eq!(partial.state, SettlementState::Partial);
        }

        for paid in [dec!(1000), dec!(1500)] {
            let settled = Settlement::compute(total, paid);
            assert_eq!(settled.remaining, Decimal::ZERO);
            assert_eq!(settled.state, SettlementState::Complete);
        }
    }

    #[test]
    fn quote_rejects_non_positive_inputs() {
        let err = quote_goods(Decimal::ZERO, dec!(1200), Decimal::ZERO).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                field: "total_quantity",
                ..
            }
        ));
        let err = quote_goods(dec!(10), dec!(-1), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "unit_price", .. }));
        let err = quote_goods(dec!(10), dec!(5), dec!(-1)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "amount_paid", .. }));
    }

    #[test]
    fn quote_rejects_totals_that_overflow() {
        let err = quote_goods(dec!(1e20), dec!(1e10), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "unit_price", .. }));
        let err = quote_goods(Decimal::MAX, dec!(1.5), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "unit_price", .. }));
    }

    #[test]
    fn purchase_settles_through_payments() {
        let mut record = purchase(dec!(500), dec!(1200), dec!(400000));
        assert_eq!(record.total_purchase_cost, dec!(600000));
        assert_eq!(record.remaining_amount, dec!(200000));
        assert_eq!(record.financial_status, SettlementStatus::Partial);

        let settlement = apply_payment(&mut record, dec!(200000)).unwrap();
        assert_eq!(settlement.remaining, Decimal::ZERO);
        assert_eq!(record.remaining_amount, Decimal::ZERO);
        assert_eq!(record.amount_paid, dec!(600000));
        assert_eq!(record.financial_status, SettlementStatus::FullySettled);
    }

    #[test]
    fn rejected_payments_leave_record_untouched() {
        let mut record = purchase(dec!(10), dec!(100), dec!(900));
        let before = record.clone();
        assert!(matches!(
            apply_payment(&mut record, dec!(101)),
            Err(LedgerError::Integrity(_))
        ));
        assert!(matches!(
            apply_payment(&mut record, dec!(-5)),
            Err(LedgerError::Integrity(_))
        ));
        assert!(matches!(
            apply_payment(&mut record, Decimal::ZERO),
            Err(LedgerError::Integrity(_))
        ));
        assert_eq!(record, before);
    }
}
