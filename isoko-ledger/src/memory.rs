use chrono::Utc;
use isoko_core::{
    Business, Contact, ContractStatus, GroceryPayment, Item, LedgerSnapshot, NewContact,
    NewGroceryPayment, NewItem, NewPurchase, NewRentalContract, NewRentalPayment, NewSale,
    NewVehicle, PaymentReference, Purchase, RentalContract, RentalPayment, Sale, Vehicle,
    VehicleStatus,
};
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::journal;
use crate::transitions::{manual_vehicle_status, ContractEvent};
use crate::{
    AppliedPayment, LedgerError, LedgerRepository, LedgerResult, RecordQuery, SeedOutcome,
};

#[derive(Default)]
struct State {
    businesses: Vec<Business>,
    records: LedgerSnapshot,
}

impl State {
    fn require_business(&self, business_id: Uuid) -> LedgerResult<()> {
        if self.businesses.iter().any(|b| b.id == business_id) {
            Ok(())
        } else {
            Err(LedgerError::not_found("business", business_id))
        }
    }

    fn contact(&self, business_id: Uuid, id: Uuid) -> LedgerResult<&Contact> {
        self.records
            .contacts
            .iter()
            .find(|c| c.id == id && c.business_id == business_id)
            .ok_or_else(|| LedgerError::not_found("contact", id))
    }

    fn item(&self, business_id: Uuid, id: Uuid) -> LedgerResult<&Item> {
        self.records
            .items
            .iter()
            .find(|i| i.id == id && i.business_id == business_id)
            .ok_or_else(|| LedgerError::not_found("item", id))
    }

    fn vehicle_index(&self, business_id: Uuid, id: Uuid) -> LedgerResult<usize> {
        self.records
            .vehicles
            .iter()
            .position(|v| v.id == id && v.business_id == business_id)
            .ok_or_else(|| LedgerError::not_found("vehicle", id))
    }

    fn contract_index(&self, business_id: Uuid, id: Uuid) -> LedgerResult<usize> {
        self.records
            .contracts
            .iter()
            .position(|c| c.id == id && c.business_id == business_id)
            .ok_or_else(|| LedgerError::not_found("rental contract", id))
    }

    fn has_active_contract(&self, vehicle_id: Uuid) -> bool {
        self.records
            .contracts
            .iter()
            .any(|c| c.vehicle_id == vehicle_id && c.operational_status == ContractStatus::Active)
    }

    fn payment_in_scope(&self, payment: &GroceryPayment, query: &RecordQuery) -> bool {
        let Some(item_id) = query.item_id else {
            return true;
        };
        let r = &self.records;
        match payment.reference_type {
            PaymentReference::Purchase => r
                .purchases
                .iter()
                .any(|p| p.id == payment.reference_id && p.item_id == item_id),
            PaymentReference::Sale => r
                .sales
                .iter()
                .any(|s| s.id == payment.reference_id && s.item_id == item_id),
        }
    }

    fn ensure_unique(&self, id: Option<Uuid>) -> LedgerResult<()> {
        let Some(id) = id else {
            return Ok(());
        };
        let r = &self.records;
        let taken = r.items.iter().any(|x| x.id == id)
            || r.contacts.iter().any(|x| x.id == id)
            || r.vehicles.iter().any(|x| x.id == id)
            || r.purchases.iter().any(|x| x.id == id)
            || r.sales.iter().any(|x| x.id == id)
            || r.grocery_payments.iter().any(|x| x.id == id)
            || r.contracts.iter().any(|x| x.id == id)
            || r.rental_payments.iter().any(|x| x.id == id);
        if taken {
            Err(LedgerError::Conflict(format!("record {id} already exists")))
        } else {
            Ok(())
        }
    }
}

/// Process-local repository. One mutex guards every record, so each write is
/// atomic with the recomputation it implies.
#[derive(Default)]
pub struct InMemoryLedgerRepository {
    state: Mutex<State>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn close_contract(
        &self,
        business_id: Uuid,
        contract_id: Uuid,
        event: ContractEvent,
    ) -> LedgerResult<RentalContract> {
        let mut state = self.state.lock();
        let contract_idx = state.contract_index(business_id, contract_id)?;
        let vehicle_id = state.records.contracts[contract_idx].vehicle_id;
        let vehicle_idx = state.vehicle_index(business_id, vehicle_id)?;
        let mut contract = state.records.contracts[contract_idx].clone();
        let mut vehicle = state.records.vehicles[vehicle_idx].clone();
        journal::close_contract(&mut contract, &mut vehicle, event)?;
        state.records.contracts[contract_idx] = contract.clone();
        state.records.vehicles[vehicle_idx] = vehicle;
        info!(contract = %contract_id, status = %contract.operational_status, "closed rental contract");
        Ok(contract)
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn ensure_seed(&self, business_name: &str) -> LedgerResult<SeedOutcome> {
        let mut state = self.state.lock();
        if let Some(business) = state.businesses.iter().find(|b| b.name == business_name) {
            return Ok(SeedOutcome {
                business: business.clone(),
                created: false,
            });
        }
        if business_name.trim().is_empty() {
            return Err(LedgerError::validation("name", "must not be blank"));
        }
        let business = Business {
            id: Uuid::new_v4(),
            name: business_name.to_string(),
            created_at: Utc::now(),
        };
        state.businesses.push(business.clone());
        info!(business = %business.id, name = business_name, "seeded business");
        Ok(SeedOutcome {
            business,
            created: true,
        })
    }

    fn find_business(&self, name: &str) -> LedgerResult<Option<Business>> {
        let state = self.state.lock();
        Ok(state.businesses.iter().find(|b| b.name == name).cloned())
    }

    fn insert_item(&self, business_id: Uuid, draft: NewItem) -> LedgerResult<Item> {
        let mut state = self.state.lock();
        state.require_business(business_id)?;
        state.ensure_unique(draft.id)?;
        let item = journal::post_item(business_id, draft, Utc::now())?;
        state.records.items.push(item.clone());
        Ok(item)
    }

    fn deactivate_item(&self, business_id: Uuid, item_id: Uuid) -> LedgerResult<Item> {
        let mut state = self.state.lock();
        let item = state
            .records
            .items
            .iter_mut()
            .find(|i| i.id == item_id && i.business_id == business_id)
            .ok_or_else(|| LedgerError::not_found("item", item_id))?;
        item.active = false;
        Ok(item.clone())
    }

    fn insert_contact(&self, business_id: Uuid, draft: NewContact) -> LedgerResult<Contact> {
        let mut state = self.state.lock();
        state.require_business(business_id)?;
        state.ensure_unique(draft.id)?;
        let contact = journal::post_contact(business_id, draft, Utc::now())?;
        state.records.contacts.push(contact.clone());
        Ok(contact)
    }

    fn insert_vehicle(&self, business_id: Uuid, draft: NewVehicle) -> LedgerResult<Vehicle> {
        let mut state = self.state.lock();
        state.require_business(business_id)?;
        state.ensure_unique(draft.id)?;
        let owner = match draft.external_owner_id {
            Some(owner_id) => Some(state.contact(business_id, owner_id)?.clone()),
            None => None,
        };
        let vehicle = journal::post_vehicle(business_id, draft, owner.as_ref(), Utc::now())?;
        state.records.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    fn record_purchase(&self, business_id: Uuid, draft: NewPurchase) -> LedgerResult<Purchase> {
        let mut state = self.state.lock();
        state.require_business(business_id)?;
        state.ensure_unique(draft.id)?;
        let supplier = state.contact(business_id, draft.supplier_id)?;
        let item = state.item(business_id, draft.item_id)?;
        let purchase = journal::post_purchase(business_id, draft, supplier, item, Utc::now())?;
        state.records.purchases.push(purchase.clone());
        info!(purchase = %purchase.id, total = %purchase.total_purchase_cost, "recorded purchase");
        Ok(purchase)
    }

    fn record_sale(&self, business_id: Uuid, draft: NewSale) -> LedgerResult<Sale> {
        let mut state = self.state.lock();
        state.require_business(business_id)?;
        state.ensure_unique(draft.id)?;
        let customer = state.contact(business_id, draft.customer_id)?;
        let item = state.item(business_id, draft.item_id)?;
        let sale = journal::post_sale(business_id, draft, customer, item, Utc::now())?;
        state.records.sales.push(sale.clone());
        info!(sale = %sale.id, total = %sale.total_sale_amount, "recorded sale");
        Ok(sale)
    }

    fn apply_grocery_payment(
        &self,
        business_id: Uuid,
        draft: NewGroceryPayment,
    ) -> LedgerResult<AppliedPayment<GroceryPayment>> {
        let mut state = self.state.lock();
        state.ensure_unique(draft.id)?;
        let reference_id = draft.reference_id;
        let (payment, settlement) = match draft.reference_type {
            PaymentReference::Purchase => {
                let target = state
                    .records
                    .purchases
                    .iter_mut()
                    .find(|p| p.id == reference_id && p.business_id == business_id)
                    .ok_or_else(|| LedgerError::not_found("purchase", reference_id))?;
                let mut updated = target.clone();
                let posted =
                    journal::post_grocery_payment(business_id, draft, &mut updated, Utc::now())?;
                *target = updated;
                posted
            }
            PaymentReference::Sale => {
                let target = state
                    .records
                    .sales
                    .iter_mut()
                    .find(|s| s.id == reference_id && s.business_id == business_id)
                    .ok_or_else(|| LedgerError::not_found("sale", reference_id))?;
                let mut updated = target.clone();
                let posted =
                    journal::post_grocery_payment(business_id, draft, &mut updated, Utc::now())?;
                *target = updated;
                posted
            }
        };
        state.records.grocery_payments.push(payment.clone());
        info!(
            payment = %payment.id,
            reference = %reference_id,
            remaining = %settlement.remaining,
            "applied grocery payment"
        );
        Ok(AppliedPayment {
            payment,
            settlement,
        })
    }

    fn open_contract(
        &self,
        business_id: Uuid,
        draft: NewRentalContract,
    ) -> LedgerResult<RentalContract> {
        let mut state = self.state.lock();
        state.ensure_unique(draft.id)?;
        let vehicle_idx = state.vehicle_index(business_id, draft.vehicle_id)?;
        let party_id = journal::contract_party_id(&draft)?;
        let party = state.contact(business_id, party_id)?.clone();
        let has_active = state.has_active_contract(draft.vehicle_id);
        let vehicle = &state.records.vehicles[vehicle_idx];
        let (contract, vehicle_status) =
            journal::post_contract(business_id, draft, vehicle, &party, has_active, Utc::now())?;
        state.records.vehicles[vehicle_idx].current_status = vehicle_status;
        state.records.contracts.push(contract.clone());
        info!(
            contract = %contract.id,
            vehicle = %contract.vehicle_id,
            vehicle_status = %vehicle_status,
            "opened rental contract"
        );
        Ok(contract)
    }

    fn complete_contract(
        &self,
        business_id: Uuid,
        contract_id: Uuid,
    ) -> LedgerResult<RentalContract> {
        self.close_contract(business_id, contract_id, ContractEvent::Complete)
    }

    fn cancel_contract(&self, business_id: Uuid, contract_id: Uuid) -> LedgerResult<RentalContract> {
        self.close_contract(business_id, contract_id, ContractEvent::Cancel)
    }

    fn apply_rental_payment(
        &self,
        business_id: Uuid,
        draft: NewRentalPayment,
    ) -> LedgerResult<AppliedPayment<RentalPayment>> {
        let mut state = self.state.lock();
        state.ensure_unique(draft.id)?;
        let contract_idx = state.contract_index(business_id, draft.contract_id)?;
        let mut contract = state.records.contracts[contract_idx].clone();
        let (payment, settlement) =
            journal::post_rental_payment(business_id, draft, &mut contract, Utc::now())?;
        state.records.contracts[contract_idx] = contract;
        state.records.rental_payments.push(payment.clone());
        info!(
            payment = %payment.id,
            contract = %payment.contract_id,
            remaining = %settlement.remaining,
            "applied rental payment"
        );
        Ok(AppliedPayment {
            payment,
            settlement,
        })
    }

    fn set_vehicle_status(
        &self,
        business_id: Uuid,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> LedgerResult<Vehicle> {
        let mut state = self.state.lock();
        let idx = state.vehicle_index(business_id, vehicle_id)?;
        let has_active = state.has_active_contract(vehicle_id);
        let current = state.records.vehicles[idx].current_status;
        let next = manual_vehicle_status(current, status, has_active)?;
        let vehicle = &mut state.records.vehicles[idx];
        vehicle.current_status = next;
        Ok(vehicle.clone())
    }

    fn snapshot(&self, query: &RecordQuery) -> LedgerResult<LedgerSnapshot> {
        let state = self.state.lock();
        let r = &state.records;
        let business_id = query.business_id;
        Ok(LedgerSnapshot {
            items: r
                .items
                .iter()
                .filter(|x| x.business_id == business_id && query.includes_item(x.id))
                .cloned()
                .collect(),
            contacts: r
                .contacts
                .iter()
                .filter(|x| x.business_id == business_id)
                .cloned()
                .collect(),
            purchases: r
                .purchases
                .iter()
                .filter(|x| x.business_id == business_id && query.includes_item(x.item_id))
                .cloned()
                .collect(),
            sales: r
                .sales
                .iter()
                .filter(|x| x.business_id == business_id && query.includes_item(x.item_id))
                .cloned()
                .collect(),
            grocery_payments: r
                .grocery_payments
                .iter()
                .filter(|x| x.business_id == business_id && state.payment_in_scope(x, query))
                .cloned()
                .collect(),
            vehicles: r
                .vehicles
                .iter()
                .filter(|x| x.business_id == business_id)
                .cloned()
                .collect(),
            contracts: r
                .contracts
                .iter()
                .filter(|x| x.business_id == business_id)
                .cloned()
                .collect(),
            rental_payments: r
                .rental_payments
                .iter()
                .filter(|x| x.business_id == business_id)
                .cloned()
                .collect(),
        })
    }
}
