//! Status state machines for balances, vehicles and rental contracts.

use chrono::NaiveDate;
use isoko_core::{
    Amount, ContractStatus, DisplayStatus, Purchase, RentalDirection, Sale, VehicleStatus,
};
use rust_decimal::Decimal;

use crate::{LedgerError, LedgerResult};

/// Read-time status for an open balance: `Delayed` once the due date has passed.
///
/// The persisted status is never rewritten; this is an overlay for display.
pub fn display_status(
    remaining: Amount,
    due_date: Option<NaiveDate>,
    persisted: impl Into<DisplayStatus>,
    today: NaiveDate,
) -> DisplayStatus {
    match due_date {
        Some(due) if remaining > Decimal::ZERO && today > due => DisplayStatus::Delayed,
        _ => persisted.into(),
    }
}

pub fn purchase_display_status(purchase: &Purchase, today: NaiveDate) -> DisplayStatus {
    display_status(
        purchase.remaining_amount,
        purchase.amount_due_date,
        purchase.financial_status,
        today,
    )
}

pub fn sale_display_status(sale: &Sale, today: NaiveDate) -> DisplayStatus {
    display_status(
        sale.remaining_amount,
        sale.amount_due_date,
        sale.financial_status,
        today,
    )
}

/// Whole days past the due date, zero when not overdue.
pub fn days_overdue(due_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    due_date
        .map(|due| (today - due).num_days().max(0))
        .unwrap_or(0)
}

/// Events that move a rental contract out of `Active`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContractEvent {
    Complete,
    Cancel,
}

/// Next contract status for `event`. Terminal states accept no events.
pub fn next_contract_status(
    current: ContractStatus,
    event: ContractEvent,
) -> LedgerResult<ContractStatus> {
    match (current, event) {
        (ContractStatus::Active, ContractEvent::Complete) => Ok(ContractStatus::Completed),
        (ContractStatus::Active, ContractEvent::Cancel) => Ok(ContractStatus::Cancelled),
        (terminal, event) => Err(LedgerError::Conflict(format!(
            "contract is {terminal}, cannot apply {event:?}"
        ))),
    }
}

/// Vehicle status once a contract in `direction` is opened against it.
pub fn vehicle_on_contract_opened(
    current: VehicleStatus,
    direction: RentalDirection,
) -> LedgerResult<VehicleStatus> {
    if current != VehicleStatus::Available {
        return Err(LedgerError::Conflict(format!(
            "vehicle is {current}, only AVAILABLE vehicles can be rented"
        )));
    }
    Ok(match direction {
        RentalDirection::Outgoing => VehicleStatus::RentedOut,
        RentalDirection::Incoming => VehicleStatus::RentedIn,
    })
}

/// Vehicle status once its contract completes or is cancelled.
pub fn vehicle_on_contract_closed() -> VehicleStatus {
    VehicleStatus::Available
}

/// Operator-initiated status change.
///
/// Only `Available`, `Maintenance` and `Offline` can be set by hand, and never
/// while a contract holds the vehicle.
pub fn manual_vehicle_status(
    current: VehicleStatus,
    target: VehicleStatus,
    has_active_contract: bool,
) -> LedgerResult<VehicleStatus> {
    if matches!(target, VehicleStatus::RentedOut | VehicleStatus::RentedIn) {
        return Err(LedgerError::validation(
            "current_status",
            format!("{target} is set by rental contracts only"),
        ));
    }
    if has_active_contract {
        return Err(LedgerError::Conflict(format!(
            "vehicle is {current} under an active contract"
        )));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoko_core::{ReceiptStatus, SettlementStatus};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_balance_displays_delayed() {
        let status = display_status(
            dec!(50000),
            Some(date(2024, 1, 1)),
            ReceiptStatus::Partial,
            date(2024, 6, 1),
        );
        assert_eq!(status, DisplayStatus::Delayed);
    }

    #[test]
    fn due_date_itself_is_not_overdue() {
        let status = display_status(
            dec!(50000),
            Some(date(2024, 1, 1)),
            SettlementStatus::Pending,
            date(2024, 1, 1),
        );
        assert_eq!(status, DisplayStatus::Pending);
    }

    #[test]
    fn settled_or_undated_balances_keep_persisted_status() {
        let settled = display_status(
            Decimal::ZERO,
            Some(date(2024, 1, 1)),
            ReceiptStatus::FullyReceived,
            date(2024, 6, 1),
        );
        assert_eq!(settled, DisplayStatus::FullyReceived);
        let undated = display_status(dec!(10), None, SettlementStatus::Partial, date(2024, 6, 1));
        assert_eq!(undated, DisplayStatus::Partial);
        assert_eq!(days_overdue(Some(date(2024, 1, 1)), date(2024, 1, 11)), 10);
        assert_eq!(days_overdue(Some(date(2024, 1, 11)), date(2024, 1, 1)), 0);
    }

    #[test]
    fn contract_lifecycle_is_terminal() {
        assert_eq!(
            next_contract_status(ContractStatus::Active, ContractEvent::Complete).unwrap(),
            ContractStatus::Completed
        );
        assert_eq!(
            next_contract_status(ContractStatus::Active, ContractEvent::Cancel).unwrap(),
            ContractStatus::Cancelled
        );
        for terminal in [ContractStatus::Completed, ContractStatus::Cancelled] {
            for event in [ContractEvent::Complete, ContractEvent::Cancel] {
                assert!(matches!(
                    next_contract_status(terminal, event),
                    Err(LedgerError::Conflict(_))
                ));
            }
        }
    }

    #[test]
    fn vehicle_follows_contract_direction() {
        assert_eq!(
            vehicle_on_contract_opened(VehicleStatus::Available, RentalDirection::Outgoing)
                .unwrap(),
            VehicleStatus::RentedOut
        );
        assert_eq!(
            vehicle_on_contract_opened(VehicleStatus::Available, RentalDirection::Incoming)
                .unwrap(),
            VehicleStatus::RentedIn
        );
        for busy in [
            VehicleStatus::RentedOut,
            VehicleStatus::RentedIn,
            VehicleStatus::Maintenance,
            VehicleStatus::Offline,
        ] {
            assert!(vehicle_on_contract_opened(busy, RentalDirection::Outgoing).is_err());
        }
        assert_eq!(vehicle_on_contract_closed(), VehicleStatus::Available);
    }

    #[test]
    fn manual_status_cannot_fake_rentals() {
        assert!(matches!(
            manual_vehicle_status(VehicleStatus::Available, VehicleStatus::RentedOut, false),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            manual_vehicle_status(VehicleStatus::RentedOut, VehicleStatus::Maintenance, true),
            Err(LedgerError::Conflict(_))
        ));
        assert_eq!(
            manual_vehicle_status(VehicleStatus::Available, VehicleStatus::Maintenance, false)
                .unwrap(),
            VehicleStatus::Maintenance
        );
    }
}
