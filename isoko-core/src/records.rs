use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{zero_if_null, Amount, Price, Quantity};
use crate::status::{
    BaseUnit, ContactRole, ContractStatus, MeasurementKind, OwnershipType, PaymentMode,
    PaymentReference, ReceiptStatus, RentalDirection, RentalType, SettlementStatus,
    VehicleStatus, VehicleType,
};

/// Tenant record every other record is scoped to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Grocery item. Items are disabled through `active`, never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub measurement: MeasurementKind,
    pub base_unit: BaseUnit,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Supplier, customer or external asset owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub business_id: Uuid,
    pub role: ContactRole,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub business_id: Uuid,
    pub supplier_id: Uuid,
    pub item_id: Uuid,
    pub purchase_date: NaiveDate,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_quantity: Quantity,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub unit_price: Price,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_purchase_cost: Amount,
    #[serde(default)]
    pub package_size: Option<Quantity>,
    #[serde(default)]
    pub package_count: Option<i64>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount_paid: Amount,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub remaining_amount: Amount,
    pub financial_status: SettlementStatus,
    #[serde(default)]
    pub amount_due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub item_id: Uuid,
    pub sale_date: NaiveDate,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_quantity: Quantity,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub unit_price: Price,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_sale_amount: Amount,
    #[serde(default)]
    pub package_size: Option<Quantity>,
    #[serde(default)]
    pub package_count: Option<i64>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount_received: Amount,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub remaining_amount: Amount,
    pub financial_status: ReceiptStatus,
    #[serde(default)]
    pub amount_due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Append-only payment against a purchase or a sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroceryPayment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub reference_type: PaymentReference,
    pub reference_id: Uuid,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub vehicle_type: VehicleType,
    pub rental_type: RentalType,
    pub ownership_type: OwnershipType,
    #[serde(default)]
    pub external_owner_id: Option<Uuid>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub base_rate: Price,
    pub current_status: VehicleStatus,
    #[serde(default)]
    pub current_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rental agreement. Exactly one of `customer_id`/`external_owner_id` is set,
/// chosen by `direction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalContract {
    pub id: Uuid,
    pub business_id: Uuid,
    pub vehicle_id: Uuid,
    pub direction: RentalDirection,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub external_owner_id: Option<Uuid>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    /// Billing basis copied from the vehicle when the contract was opened.
    pub rental_type: RentalType,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub rate: Price,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_amount: Amount,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount_paid: Amount,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub remaining_amount: Amount,
    pub financial_status: SettlementStatus,
    pub operational_status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalPayment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub contract_id: Uuid,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full record set for one business, as read from persistence.
///
/// Aggregations fold over this view; it is never updated incrementally.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSnapshot {
    pub items: Vec<Item>,
    pub contacts: Vec<Contact>,
    pub purchases: Vec<Purchase>,
    pub sales: Vec<Sale>,
    pub grocery_payments: Vec<GroceryPayment>,
    pub vehicles: Vec<Vehicle>,
    pub contracts: Vec<RentalContract>,
    pub rental_payments: Vec<RentalPayment>,
}

impl LedgerSnapshot {
    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn vehicle(&self, id: Uuid) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn contract(&self, id: Uuid) -> Option<&RentalContract> {
        self.contracts.iter().find(|contract| contract.id == id)
    }

    /// Payments recorded against one purchase or sale, oldest first.
    pub fn payments_for(&self, reference_id: Uuid) -> Vec<&GroceryPayment> {
        let mut payments: Vec<_> = self
            .grocery_payments
            .iter()
            .filter(|payment| payment.reference_id == reference_id)
            .collect();
        payments.sort_by_key(|payment| (payment.payment_date, payment.created_at));
        payments
    }

    /// Sum of all payments recorded against `reference_id`.
    pub fn paid_towards(&self, reference_id: Uuid) -> Decimal {
        self.payments_for(reference_id)
            .into_iter()
            .map(|payment| payment.amount)
            .sum()
    }
}
