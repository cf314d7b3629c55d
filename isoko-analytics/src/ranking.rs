use std::collections::HashMap;

use isoko_core::{Amount, ContractStatus, LedgerSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleRevenue {
    pub vehicle_id: Uuid,
    pub name: String,
    pub revenue: Amount,
    pub contracts: u32,
}

/// Vehicles with at least one contract that was not cancelled, ranked by
/// collected rental revenue.
///
/// Cancelled contracts and their payments are left out. Ties break on
/// contract count, then name.
pub fn top_vehicles(snapshot: &LedgerSnapshot, limit: usize) -> Vec<VehicleRevenue> {
    let mut contract_vehicle: HashMap<Uuid, Uuid> = HashMap::new();
    let mut ranking: HashMap<Uuid, (Amount, u32)> = HashMap::new();
    for contract in &snapshot.contracts {
        if contract.operational_status == ContractStatus::Cancelled {
            continue;
        }
        contract_vehicle.insert(contract.id, contract.vehicle_id);
        ranking.entry(contract.vehicle_id).or_default().1 += 1;
    }
    for payment in &snapshot.rental_payments {
        if let Some(vehicle_id) = contract_vehicle.get(&payment.contract_id) {
            ranking.entry(*vehicle_id).or_default().0 += payment.amount;
        }
    }

    let mut rows: Vec<VehicleRevenue> = ranking
        .into_iter()
        .map(|(vehicle_id, (revenue, contracts))| VehicleRevenue {
            vehicle_id,
            name: snapshot
                .vehicle(vehicle_id)
                .map(|vehicle| vehicle.name.clone())
                .unwrap_or_default(),
            revenue,
            contracts,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.contracts.cmp(&a.contracts))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });
    rows.truncate(limit);
    rows
}

pub(crate) fn is_ranked(rows: &[VehicleRevenue]) -> bool {
    rows.windows(2).all(|pair| pair[0].revenue >= pair[1].revenue)
        && rows.iter().all(|row| row.revenue >= Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, Fixture};
    use isoko_core::{ContractStatus, VehicleStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn ranks_by_revenue_then_contract_count() {
        let mut fx = Fixture::new();
        let fuso = fx.vehicle("Fuso", VehicleStatus::Available);
        let jcb = fx.vehicle("JCB", VehicleStatus::Available);
        let canter = fx.vehicle("Canter", VehicleStatus::Available);
        let idle = fx.vehicle("Idle", VehicleStatus::Available);
        let f1 = fx.contract(fuso, ContractStatus::Completed);
        let j1 = fx.contract(jcb, ContractStatus::Completed);
        let j2 = fx.contract(jcb, ContractStatus::Active);
        let c1 = fx.contract(canter, ContractStatus::Completed);
        fx.rental_payment(f1, date(2024, 6, 1), dec!(300000));
        fx.rental_payment(j1, date(2024, 6, 1), dec!(100000));
        fx.rental_payment(j2, date(2024, 6, 2), dec!(50000));
        fx.rental_payment(c1, date(2024, 6, 3), dec!(150000));

        let top = top_vehicles(&fx.snapshot, 8);
        let names: Vec<_> = top.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["Fuso", "JCB", "Canter"]);
        assert_eq!(top[1].contracts, 2);
        assert!(top.iter().all(|row| row.vehicle_id != idle));
        assert!(is_ranked(&top));
        assert_eq!(top_vehicles(&fx.snapshot, 1).len(), 1);
    }

    #[test]
    fn cancelled_contracts_do_not_rank_a_vehicle() {
        let mut fx = Fixture::new();
        let ghost = fx.vehicle("Ghost", VehicleStatus::Available);
        let hilux = fx.vehicle("Hilux", VehicleStatus::Available);
        let dropped = fx.contract(ghost, ContractStatus::Cancelled);
        let kept = fx.contract(hilux, ContractStatus::Completed);
        let refused = fx.contract(hilux, ContractStatus::Cancelled);
        fx.rental_payment(dropped, date(2024, 6, 1), dec!(20000));
        fx.rental_payment(kept, date(2024, 6, 1), dec!(80000));
        fx.rental_payment(refused, date(2024, 6, 2), dec!(5000));

        let top = top_vehicles(&fx.snapshot, 8);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].vehicle_id, hilux);
        assert_eq!(top[0].contracts, 1);
        assert_eq!(top[0].revenue, dec!(80000));
    }
}
