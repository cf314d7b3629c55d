//! JSON bundle import. Every record goes through the repository's validated
//! write paths, in dependency order, so a bundle behaves exactly like the same
//! operations typed in by hand.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use isoko_core::{
    NewContact, NewGroceryPayment, NewItem, NewPurchase, NewRentalContract, NewRentalPayment,
    NewSale, NewVehicle,
};
use isoko_ledger::LedgerRepository;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBundle {
    pub items: Vec<NewItem>,
    pub contacts: Vec<NewContact>,
    pub vehicles: Vec<NewVehicle>,
    pub purchases: Vec<NewPurchase>,
    pub sales: Vec<NewSale>,
    pub grocery_payments: Vec<NewGroceryPayment>,
    pub contracts: Vec<NewRentalContract>,
    pub rental_payments: Vec<NewRentalPayment>,
    /// Contracts to complete once their payments are in.
    pub completed_contracts: Vec<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub items: usize,
    pub contacts: usize,
    pub vehicles: usize,
    pub purchases: usize,
    pub sales: usize,
    pub grocery_payments: usize,
    pub contracts: usize,
    pub rental_payments: usize,
    pub completed_contracts: usize,
}

impl ImportBundle {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read bundle {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse bundle {}", path.display()))
    }
}

/// Apply `bundle` to `business_id`, stopping at the first rejected record.
pub fn import_bundle(
    repo: &dyn LedgerRepository,
    business_id: Uuid,
    bundle: ImportBundle,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (idx, draft) in bundle.items.into_iter().enumerate() {
        repo.insert_item(business_id, draft)
            .with_context(|| format!("items[{idx}] rejected"))?;
        summary.items += 1;
    }
    for (idx, draft) in bundle.contacts.into_iter().enumerate() {
        repo.insert_contact(business_id, draft)
            .with_context(|| format!("contacts[{idx}] rejected"))?;
        summary.contacts += 1;
    }
    for (idx, draft) in bundle.vehicles.into_iter().enumerate() {
        repo.insert_vehicle(business_id, draft)
            .with_context(|| format!("vehicles[{idx}] rejected"))?;
        summary.vehicles += 1;
    }
    for (idx, draft) in bundle.purchases.into_iter().enumerate() {
        repo.record_purchase(business_id, draft)
            .with_context(|| format!("purchases[{idx}] rejected"))?;
        summary.purchases += 1;
    }
    for (idx, draft) in bundle.sales.into_iter().enumerate() {
        repo.record_sale(business_id, draft)
            .with_context(|| format!("sales[{idx}] rejected"))?;
        summary.sales += 1;
    }
    for (idx, draft) in bundle.grocery_payments.into_iter().enumerate() {
        repo.apply_grocery_payment(business_id, draft)
            .with_context(|| format!("grocery_payments[{idx}] rejected"))?;
        summary.grocery_payments += 1;
    }
    for (idx, draft) in bundle.contracts.into_iter().enumerate() {
        repo.open_contract(business_id, draft)
            .with_context(|| format!("contracts[{idx}] rejected"))?;
        summary.contracts += 1;
    }
    for (idx, draft) in bundle.rental_payments.into_iter().enumerate() {
        repo.apply_rental_payment(business_id, draft)
            .with_context(|| format!("rental_payments[{idx}] rejected"))?;
        summary.rental_payments += 1;
    }
    for contract_id in bundle.completed_contracts {
        repo.complete_contract(business_id, contract_id)
            .with_context(|| format!("completing contract {contract_id} failed"))?;
        summary.completed_contracts += 1;
    }
    info!(
        business = %business_id,
        purchases = summary.purchases,
        sales = summary.sales,
        contracts = summary.contracts,
        "imported bundle"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoko_ledger::{InMemoryLedgerRepository, RecordQuery};
    use rust_decimal::Decimal;

    const BUNDLE: &str = r#"{
        "items": [
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a01", "name": "Rice", "measurement": "WEIGHT", "base_unit": "KG"}
        ],
        "contacts": [
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a02", "role": "SUPPLIER", "name": "Gikondo Mills"},
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a03", "role": "CUSTOMER", "name": "Nyabugogo Shop"}
        ],
        "vehicles": [
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a04", "name": "Fuso", "vehicle_type": "TRUCK",
             "rental_type": "DAY", "ownership_type": "OWN", "base_rate": 150000}
        ],
        "purchases": [
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a05",
             "supplier_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a02",
             "item_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a01",
             "purchase_date": "2024-01-05", "total_quantity": 500, "unit_price": 1200,
             "amount_paid": 400000}
        ],
        "grocery_payments": [
            {"reference_type": "PURCHASE", "reference_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a05",
             "amount": 200000, "payment_date": "2024-01-20", "mode": "BANK_TRANSFER"}
        ],
        "contracts": [
            {"id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a06",
             "vehicle_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a04", "direction": "OUTGOING",
             "customer_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a03",
             "start_datetime": "2024-01-01T08:00:00Z", "end_datetime": "2024-01-06T08:00:00Z"}
        ],
        "rental_payments": [
            {"contract_id": "7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a06", "amount": 750000,
             "payment_date": "2024-01-06", "mode": "CASH"}
        ],
        "completed_contracts": ["7f1c1b8e-0d55-4a3e-9f0e-2d1c2a7b9a06"]
    }"#;

    #[test]
    fn bundle_flows_through_write_paths() {
        let repo = InMemoryLedgerRepository::new();
        let business = repo.ensure_seed("Isoko Trading").unwrap().business;
        let bundle: ImportBundle = serde_json::from_str(BUNDLE).unwrap();
        let summary = import_bundle(&repo, business.id, bundle).unwrap();
        assert_eq!(summary.purchases, 1);
        assert_eq!(summary.completed_contracts, 1);

        let snapshot = repo.snapshot(&RecordQuery::for_business(business.id)).unwrap();
        assert_eq!(snapshot.purchases[0].remaining_amount, Decimal::ZERO);
        assert_eq!(snapshot.contracts[0].remaining_amount, Decimal::ZERO);
        assert_eq!(
            snapshot.vehicles[0].current_status,
            isoko_core::VehicleStatus::Available
        );
    }

    #[test]
    fn rejected_record_is_named() {
        let repo = InMemoryLedgerRepository::new();
        let business = repo.ensure_seed("Isoko Trading").unwrap().business;
        let mut bundle: ImportBundle = serde_json::from_str(BUNDLE).unwrap();
        bundle.grocery_payments[0].amount = Decimal::from(900_000);
        let err = import_bundle(&repo, business.id, bundle).unwrap_err();
        assert!(err.to_string().contains("grocery_payments[0]"));
    }
}
