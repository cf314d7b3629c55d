use isoko_core::{Amount, ContractStatus, LedgerSnapshot, VehicleStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::window::ReportWindow;

/// Fleet status counts and rental revenue.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: u32,
    pub available: u32,
    pub rented_out: u32,
    pub rented_in: u32,
    pub maintenance: u32,
    pub offline: u32,
    pub active_contracts: u32,
    /// Share of the fleet currently rented out or in, as a percentage.
    pub utilization: Decimal,
    pub today_revenue: Amount,
    pub month_revenue: Amount,
}

impl FleetSummary {
    pub fn compute(snapshot: &LedgerSnapshot, window: &ReportWindow) -> Self {
        let mut summary = Self::default();
        for vehicle in &snapshot.vehicles {
            summary.total += 1;
            match vehicle.current_status {
                VehicleStatus::Available => summary.available += 1,
                VehicleStatus::RentedOut => summary.rented_out += 1,
                VehicleStatus::RentedIn => summary.rented_in += 1,
                VehicleStatus::Maintenance => summary.maintenance += 1,
                VehicleStatus::Offline => summary.offline += 1,
            }
        }
        summary.active_contracts = snapshot
            .contracts
            .iter()
            .filter(|contract| contract.operational_status == ContractStatus::Active)
            .count() as u32;
        summary.utilization = utilization(summary.rented_out + summary.rented_in, summary.total);

        for payment in &snapshot.rental_payments {
            if window.is_today(payment.payment_date) {
                summary.today_revenue += payment.amount;
            }
            if window.in_month(payment.payment_date) {
                summary.month_revenue += payment.amount;
            }
        }
        summary
    }

    /// Sum of the per-status buckets; equals `total` for a well-formed summary.
    pub fn bucket_total(&self) -> u32 {
        self.available + self.rented_out + self.rented_in + self.maintenance + self.offline
    }
}

fn utilization(rented: u32, total: u32) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(rented) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(1)
}
