use isoko_core::{
    Business, Contact, GroceryPayment, Item, LedgerSnapshot, NewContact, NewGroceryPayment,
    NewItem, NewPurchase, NewRentalContract, NewRentalPayment, NewSale, NewVehicle, Purchase,
    RentalContract, RentalPayment, Sale, Vehicle, VehicleStatus,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{LedgerResult, RecordQuery, Settlement};

/// Result of [`LedgerRepository::ensure_seed`].
#[derive(Clone, Debug, Serialize)]
pub struct SeedOutcome {
    pub business: Business,
    pub created: bool,
}

/// A persisted payment together with the recomputed balance of its target.
#[derive(Clone, Debug, Serialize)]
pub struct AppliedPayment<P> {
    pub payment: P,
    pub settlement: Settlement,
}

/// Abstraction over durable ledger storage engines.
///
/// Every write goes through the posting rules in [`crate::journal`]; payment and
/// contract writes are atomic with the updates they imply.
pub trait LedgerRepository: Send + Sync {
    /// Create the named business unless it already exists. Idempotent.
    fn ensure_seed(&self, business_name: &str) -> LedgerResult<SeedOutcome>;

    fn find_business(&self, name: &str) -> LedgerResult<Option<Business>>;

    fn insert_item(&self, business_id: Uuid, draft: NewItem) -> LedgerResult<Item>;

    /// Soft-disable an item. History is kept.
    fn deactivate_item(&self, business_id: Uuid, item_id: Uuid) -> LedgerResult<Item>;

    fn insert_contact(&self, business_id: Uuid, draft: NewContact) -> LedgerResult<Contact>;

    fn insert_vehicle(&self, business_id: Uuid, draft: NewVehicle) -> LedgerResult<Vehicle>;

    fn record_purchase(&self, business_id: Uuid, draft: NewPurchase) -> LedgerResult<Purchase>;

    fn record_sale(&self, business_id: Uuid, draft: NewSale) -> LedgerResult<Sale>;

    /// Insert a payment and recompute its purchase or sale in one transaction.
    fn apply_grocery_payment(
        &self,
        business_id: Uuid,
        draft: NewGroceryPayment,
    ) -> LedgerResult<AppliedPayment<GroceryPayment>>;

    /// Open a contract and move its vehicle out of `AVAILABLE` in one transaction.
    fn open_contract(
        &self,
        business_id: Uuid,
        draft: NewRentalContract,
    ) -> LedgerResult<RentalContract>;

    fn complete_contract(&self, business_id: Uuid, contract_id: Uuid)
        -> LedgerResult<RentalContract>;

    fn cancel_contract(&self, business_id: Uuid, contract_id: Uuid) -> LedgerResult<RentalContract>;

    /// Insert a rental payment and recompute its contract in one transaction.
    fn apply_rental_payment(
        &self,
        business_id: Uuid,
        draft: NewRentalPayment,
    ) -> LedgerResult<AppliedPayment<RentalPayment>>;

    /// Manually set a vehicle to AVAILABLE, MAINTENANCE or OFFLINE.
    fn set_vehicle_status(
        &self,
        business_id: Uuid,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> LedgerResult<Vehicle>;

    /// Load the records matching `query`.
    fn snapshot(&self, query: &RecordQuery) -> LedgerResult<LedgerSnapshot>;
}
