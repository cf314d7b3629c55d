//! Posting rules: turn drafts into persisted records with every derived field
//! computed in one place. Repositories resolve references and persist; they never
//! compute totals or statuses themselves.

use chrono::{DateTime, Utc};
use isoko_core::{
    Contact, ContactRole, ContractStatus, GroceryPayment, Item, NewContact, NewGroceryPayment,
    NewItem, NewPurchase, NewRentalContract, NewRentalPayment, NewSale, NewVehicle,
    OwnershipType, Purchase, Quantity, RentalContract, RentalDirection, RentalPayment, Sale,
    Vehicle, VehicleStatus,
};
use tracing::debug;
use uuid::Uuid;

use crate::billing::quote_rental;
use crate::settlement::{apply_payment, quote_goods, require_positive, Settleable, Settlement};
use crate::transitions::{
    next_contract_status, vehicle_on_contract_closed, vehicle_on_contract_opened, ContractEvent,
};
use crate::{LedgerError, LedgerResult};

fn require_name(field: &'static str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        Err(LedgerError::validation(field, "must not be blank"))
    } else {
        Ok(())
    }
}

fn require_role(field: &'static str, contact: &Contact, role: ContactRole) -> LedgerResult<()> {
    if contact.role == role {
        Ok(())
    } else {
        Err(LedgerError::validation(
            field,
            format!("contact {} is a {}, expected {role}", contact.id, contact.role),
        ))
    }
}

fn require_active_item(item: &Item) -> LedgerResult<()> {
    if item.active {
        Ok(())
    } else {
        Err(LedgerError::validation(
            "item_id",
            format!("item {} is inactive", item.id),
        ))
    }
}

fn require_within_total(field: &'static str, settlement: &Settlement) -> LedgerResult<()> {
    if settlement.paid > settlement.total {
        Err(LedgerError::validation(
            field,
            format!(
                "{} exceeds the total of {}",
                settlement.paid, settlement.total
            ),
        ))
    } else {
        Ok(())
    }
}

fn require_package(size: Option<Quantity>, count: Option<i64>) -> LedgerResult<()> {
    if let Some(size) = size {
        require_positive("package_size", size)?;
    }
    if let Some(count) = count {
        if count <= 0 {
            return Err(LedgerError::validation(
                "package_count",
                format!("must be greater than zero, got {count}"),
            ));
        }
    }
    Ok(())
}

pub fn post_item(business_id: Uuid, draft: NewItem, now: DateTime<Utc>) -> LedgerResult<Item> {
    require_name("name", &draft.name)?;
    Ok(Item {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        name: draft.name.trim().to_string(),
        measurement: draft.measurement,
        base_unit: draft.base_unit,
        active: true,
        created_at: now,
    })
}

pub fn post_contact(
    business_id: Uuid,
    draft: NewContact,
    now: DateTime<Utc>,
) -> LedgerResult<Contact> {
    require_name("name", &draft.name)?;
    Ok(Contact {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        role: draft.role,
        name: draft.name.trim().to_string(),
        phone: draft.phone,
        address: draft.address,
        notes: draft.notes,
        created_at: now,
    })
}

/// Build a vehicle. `owner` must be supplied for externally owned vehicles.
pub fn post_vehicle(
    business_id: Uuid,
    draft: NewVehicle,
    owner: Option<&Contact>,
    now: DateTime<Utc>,
) -> LedgerResult<Vehicle> {
    require_name("name", &draft.name)?;
    require_positive("base_rate", draft.base_rate)?;
    let external_owner_id = match (draft.ownership_type, owner) {
        (OwnershipType::External, Some(owner)) => {
            require_role("external_owner_id", owner, ContactRole::ExternalOwner)?;
            Some(owner.id)
        }
        (OwnershipType::External, None) => {
            return Err(LedgerError::validation(
                "external_owner_id",
                "externally owned vehicles need an owner",
            ))
        }
        (OwnershipType::Own, _) => None,
    };
    Ok(Vehicle {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        name: draft.name.trim().to_string(),
        vehicle_type: draft.vehicle_type,
        rental_type: draft.rental_type,
        ownership_type: draft.ownership_type,
        external_owner_id,
        base_rate: draft.base_rate,
        current_status: VehicleStatus::Available,
        current_location: draft.current_location,
        created_at: now,
    })
}

pub fn post_purchase(
    business_id: Uuid,
    draft: NewPurchase,
    supplier: &Contact,
    item: &Item,
    now: DateTime<Utc>,
) -> LedgerResult<Purchase> {
    require_role("supplier_id", supplier, ContactRole::Supplier)?;
    require_active_item(item)?;
    require_package(draft.package_size, draft.package_count)?;
    let settlement = quote_goods(draft.total_quantity, draft.unit_price, draft.amount_paid)?;
    require_within_total("amount_paid", &settlement)?;
    Ok(Purchase {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        supplier_id: supplier.id,
        item_id: item.id,
        purchase_date: draft.purchase_date,
        total_quantity: draft.total_quantity,
        unit_price: draft.unit_price,
        total_purchase_cost: settlement.total,
        package_size: draft.package_size,
        package_count: draft.package_count,
        amount_paid: settlement.paid,
        remaining_amount: settlement.remaining,
        financial_status: settlement.settlement_status(),
        amount_due_date: draft.amount_due_date,
        created_at: now,
    })
}

pub fn post_sale(
    business_id: Uuid,
    draft: NewSale,
    customer: &Contact,
    item: &Item,
    now: DateTime<Utc>,
) -> LedgerResult<Sale> {
    require_role("customer_id", customer, ContactRole::Customer)?;
    require_active_item(item)?;
    require_package(draft.package_size, draft.package_count)?;
    let settlement = quote_goods(draft.total_quantity, draft.unit_price, draft.amount_received)
        .map_err(|err| match err {
            LedgerError::Validation {
                field: "amount_paid",
                constraint,
            } => LedgerError::Validation {
                field: "amount_received",
                constraint,
            },
            other => other,
        })?;
    require_within_total("amount_received", &settlement)?;
    Ok(Sale {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        customer_id: customer.id,
        item_id: item.id,
        sale_date: draft.sale_date,
        total_quantity: draft.total_quantity,
        unit_price: draft.unit_price,
        total_sale_amount: settlement.total,
        package_size: draft.package_size,
        package_count: draft.package_count,
        amount_received: settlement.paid,
        remaining_amount: settlement.remaining,
        financial_status: settlement.receipt_status(),
        amount_due_date: draft.amount_due_date,
        created_at: now,
    })
}

/// Contact a contract draft must reference, given its direction.
pub fn contract_party_id(draft: &NewRentalContract) -> LedgerResult<Uuid> {
    match draft.direction {
        RentalDirection::Outgoing => draft
            .customer_id
            .ok_or_else(|| LedgerError::validation("customer_id", "required for outgoing contracts")),
        RentalDirection::Incoming => draft.external_owner_id.ok_or_else(|| {
            LedgerError::validation("external_owner_id", "required for incoming contracts")
        }),
    }
}

/// Build a rental contract and the status its vehicle moves to.
///
/// `party` is the customer for outgoing contracts and the external owner for
/// incoming ones. `has_active_contract` reports whether the vehicle is already
/// held by another ACTIVE contract.
pub fn post_contract(
    business_id: Uuid,
    draft: NewRentalContract,
    vehicle: &Vehicle,
    party: &Contact,
    has_active_contract: bool,
    now: DateTime<Utc>,
) -> LedgerResult<(RentalContract, VehicleStatus)> {
    if draft.vehicle_id != vehicle.id {
        return Err(LedgerError::Integrity(format!(
            "contract draft references vehicle {} but {} was supplied",
            draft.vehicle_id, vehicle.id
        )));
    }
    let (customer_id, external_owner_id) = match draft.direction {
        RentalDirection::Outgoing => {
            if draft.external_owner_id.is_some() {
                return Err(LedgerError::validation(
                    "external_owner_id",
                    "outgoing contracts reference a customer only",
                ));
            }
            if draft.customer_id.is_some_and(|id| id != party.id) {
                return Err(LedgerError::Integrity(format!(
                    "contract draft references customer {:?} but {} was supplied",
                    draft.customer_id, party.id
                )));
            }
            require_role("customer_id", party, ContactRole::Customer)?;
            (Some(party.id), None)
        }
        RentalDirection::Incoming => {
            if draft.customer_id.is_some() {
                return Err(LedgerError::validation(
                    "customer_id",
                    "incoming contracts reference an external owner only",
                ));
            }
            if draft.external_owner_id.is_some_and(|id| id != party.id) {
                return Err(LedgerError::Integrity(format!(
                    "contract draft references owner {:?} but {} was supplied",
                    draft.external_owner_id, party.id
                )));
            }
            require_role("external_owner_id", party, ContactRole::ExternalOwner)?;
            (None, Some(party.id))
        }
    };
    if has_active_contract {
        return Err(LedgerError::Conflict(format!(
            "vehicle {} already has an active contract",
            vehicle.id
        )));
    }
    let rate = draft.rate.unwrap_or(vehicle.base_rate);
    let settlement = quote_rental(
        vehicle.rental_type,
        rate,
        draft.start_datetime,
        draft.end_datetime,
        draft.amount_paid,
    )?;
    require_within_total("amount_paid", &settlement)?;
    let vehicle_status = vehicle_on_contract_opened(vehicle.current_status, draft.direction)?;
    let contract = RentalContract {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        vehicle_id: vehicle.id,
        direction: draft.direction,
        customer_id,
        external_owner_id,
        start_datetime: draft.start_datetime,
        end_datetime: draft.end_datetime,
        rental_type: vehicle.rental_type,
        rate,
        total_amount: settlement.total,
        amount_paid: settlement.paid,
        remaining_amount: settlement.remaining,
        financial_status: settlement.settlement_status(),
        operational_status: ContractStatus::Active,
        created_at: now,
    };
    debug!(
        contract = %contract.id,
        vehicle = %vehicle.id,
        total = %contract.total_amount,
        "posted rental contract"
    );
    Ok((contract, vehicle_status))
}

/// Complete or cancel a contract, releasing its vehicle.
pub fn close_contract(
    contract: &mut RentalContract,
    vehicle: &mut Vehicle,
    event: ContractEvent,
) -> LedgerResult<()> {
    if contract.vehicle_id != vehicle.id {
        return Err(LedgerError::Integrity(format!(
            "contract {} does not hold vehicle {}",
            contract.id, vehicle.id
        )));
    }
    contract.operational_status = next_contract_status(contract.operational_status, event)?;
    vehicle.current_status = vehicle_on_contract_closed();
    Ok(())
}

/// Build a grocery payment and apply it to the purchase or sale it references.
pub fn post_grocery_payment<T: Settleable>(
    business_id: Uuid,
    draft: NewGroceryPayment,
    target: &mut T,
    now: DateTime<Utc>,
) -> LedgerResult<(GroceryPayment, Settlement)> {
    if target.id() != draft.reference_id {
        return Err(LedgerError::Integrity(format!(
            "payment references {} but was applied to {} {}",
            draft.reference_id,
            T::ENTITY,
            target.id()
        )));
    }
    let settlement = apply_payment(target, draft.amount)?;
    let payment = GroceryPayment {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        reference_type: draft.reference_type,
        reference_id: draft.reference_id,
        amount: draft.amount,
        payment_date: draft.payment_date,
        mode: draft.mode,
        notes: draft.notes,
        created_at: now,
    };
    Ok((payment, settlement))
}

pub fn post_rental_payment(
    business_id: Uuid,
    draft: NewRentalPayment,
    contract: &mut RentalContract,
    now: DateTime<Utc>,
) -> LedgerResult<(RentalPayment, Settlement)> {
    if contract.id != draft.contract_id {
        return Err(LedgerError::Integrity(format!(
            "payment references contract {} but was applied to {}",
            draft.contract_id, contract.id
        )));
    }
    let settlement = apply_payment(contract, draft.amount)?;
    let payment = RentalPayment {
        id: draft.id.unwrap_or_else(Uuid::new_v4),
        business_id,
        contract_id: contract.id,
        amount: draft.amount,
        payment_date: draft.payment_date,
        mode: draft.mode,
        notes: draft.notes,
        created_at: now,
    };
    Ok((payment, settlement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use isoko_core::{
        BaseUnit, MeasurementKind, PaymentMode, PaymentReference, RentalType, SettlementStatus,
        VehicleType,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn contact(role: ContactRole) -> Contact {
        post_contact(
            Uuid::nil(),
            NewContact {
                id: None,
                role,
                name: format!("{role} one"),
                phone: None,
                address: None,
                notes: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn item() -> Item {
        post_item(
            Uuid::nil(),
            NewItem {
                id: None,
                name: "Rice".into(),
                measurement: MeasurementKind::Weight,
                base_unit: BaseUnit::Kg,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn truck(rental_type: RentalType, rate: Decimal) -> Vehicle {
        post_vehicle(
            Uuid::nil(),
            NewVehicle {
                id: None,
                name: "Fuso".into(),
                vehicle_type: VehicleType::Truck,
                rental_type,
                ownership_type: OwnershipType::Own,
                external_owner_id: None,
                base_rate: rate,
                current_location: None,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn purchase_draft(paid: Decimal) -> NewPurchase {
        NewPurchase {
            id: None,
            supplier_id: Uuid::nil(),
            item_id: Uuid::nil(),
            purchase_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total_quantity: dec!(500),
            unit_price: dec!(1200),
            package_size: Some(dec!(50)),
            package_count: Some(10),
            amount_paid: paid,
            amount_due_date: None,
        }
    }

    fn contract_draft(customer: &Contact, vehicle: &Vehicle) -> NewRentalContract {
        NewRentalContract {
            id: None,
            vehicle_id: vehicle.id,
            direction: RentalDirection::Outgoing,
            customer_id: Some(customer.id),
            external_owner_id: None,
            start_datetime: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            end_datetime: Utc.with_ymd_and_hms(2024, 1, 6, 8, 0, 0).unwrap(),
            rate: None,
            amount_paid: Decimal::ZERO,
        }
    }

    #[test]
    fn purchase_then_payment_settles() {
        let supplier = contact(ContactRole::Supplier);
        let rice = item();
        let mut purchase = post_purchase(
            Uuid::nil(),
            purchase_draft(dec!(400000)),
            &supplier,
            &rice,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(purchase.total_purchase_cost, dec!(600000));
        assert_eq!(purchase.remaining_amount, dec!(200000));
        assert_eq!(purchase.financial_status, SettlementStatus::Partial);

        let (payment, settlement) = post_grocery_payment(
            Uuid::nil(),
            NewGroceryPayment {
                id: None,
                reference_type: PaymentReference::Purchase,
                reference_id: purchase.id,
                amount: dec!(200000),
                payment_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                mode: PaymentMode::MobileMoney,
                notes: None,
            },
            &mut purchase,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(payment.amount, dec!(200000));
        assert_eq!(settlement.remaining, Decimal::ZERO);
        assert_eq!(purchase.financial_status, SettlementStatus::FullySettled);
    }

    #[test]
    fn purchase_requires_supplier_and_active_item() {
        let customer = contact(ContactRole::Customer);
        let mut rice = item();
        let err = post_purchase(Uuid::nil(), purchase_draft(Decimal::ZERO), &customer, &rice, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "supplier_id", .. }));

        let supplier = contact(ContactRole::Supplier);
        rice.active = false;
        let err = post_purchase(Uuid::nil(), purchase_draft(Decimal::ZERO), &supplier, &rice, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "item_id", .. }));
    }

    #[test]
    fn overpaid_purchase_is_rejected() {
        let supplier = contact(ContactRole::Supplier);
        let err = post_purchase(
            Uuid::nil(),
            purchase_draft(dec!(600001)),
            &supplier,
            &item(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "amount_paid", .. }));
    }

    #[test]
    fn outgoing_contract_rents_out_vehicle_until_completed() {
        let customer = contact(ContactRole::Customer);
        let mut vehicle = truck(RentalType::Day, dec!(150000));
        let (mut contract, status) = post_contract(
            Uuid::nil(),
            contract_draft(&customer, &vehicle),
            &vehicle,
            &customer,
            false,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(status, VehicleStatus::RentedOut);
        assert_eq!(contract.total_amount, dec!(750000));
        assert_eq!(contract.customer_id, Some(customer.id));
        assert_eq!(contract.external_owner_id, None);
        vehicle.current_status = status;

        close_contract(&mut contract, &mut vehicle, ContractEvent::Complete).unwrap();
        assert_eq!(contract.operational_status, ContractStatus::Completed);
        assert_eq!(vehicle.current_status, VehicleStatus::Available);
        assert!(close_contract(&mut contract, &mut vehicle, ContractEvent::Cancel).is_err());
    }

    #[test]
    fn second_active_contract_is_rejected() {
        let customer = contact(ContactRole::Customer);
        let vehicle = truck(RentalType::Hour, dec!(20000));
        let err = post_contract(
            Uuid::nil(),
            contract_draft(&customer, &vehicle),
            &vehicle,
            &customer,
            true,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn contract_party_must_match_direction() {
        let owner = contact(ContactRole::ExternalOwner);
        let vehicle = truck(RentalType::Day, dec!(100000));
        let mut draft = contract_draft(&owner, &vehicle);
        draft.customer_id = None;
        assert!(matches!(
            contract_party_id(&draft),
            Err(LedgerError::Validation { field: "customer_id", .. })
        ));
        let err = post_contract(Uuid::nil(), draft, &vehicle, &owner, false, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "customer_id", .. }));
    }

    #[test]
    fn rental_payment_reduces_contract_balance() {
        let customer = contact(ContactRole::Customer);
        let vehicle = truck(RentalType::Day, dec!(150000));
        let (mut contract, _) = post_contract(
            Uuid::nil(),
            contract_draft(&customer, &vehicle),
            &vehicle,
            &customer,
            false,
            Utc::now(),
        )
        .unwrap();
        let (_, settlement) = post_rental_payment(
            Uuid::nil(),
            NewRentalPayment {
                id: None,
                contract_id: contract.id,
                amount: dec!(300000),
                payment_date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                mode: PaymentMode::Cash,
                notes: Some("first instalment".into()),
            },
            &mut contract,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(settlement.remaining, dec!(450000));
        assert_eq!(contract.financial_status, SettlementStatus::Partial);
    }
}
