//! Write-side inputs. Drafts carry only what an operator types in; derived
//! fields are filled by the ledger when the draft is posted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{Amount, Price, Quantity};
use crate::status::{
    BaseUnit, ContactRole, MeasurementKind, OwnershipType, PaymentMode, PaymentReference,
    RentalDirection, RentalType, VehicleType,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub measurement: MeasurementKind,
    pub base_unit: BaseUnit,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub role: ContactRole,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewVehicle {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub vehicle_type: VehicleType,
    pub rental_type: RentalType,
    pub ownership_type: OwnershipType,
    #[serde(default)]
    pub external_owner_id: Option<Uuid>,
    pub base_rate: Price,
    #[serde(default)]
    pub current_location: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPurchase {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub supplier_id: Uuid,
    pub item_id: Uuid,
    pub purchase_date: NaiveDate,
    pub total_quantity: Quantity,
    pub unit_price: Price,
    #[serde(default)]
    pub package_size: Option<Quantity>,
    #[serde(default)]
    pub package_count: Option<i64>,
    #[serde(default)]
    pub amount_paid: Amount,
    #[serde(default)]
    pub amount_due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSale {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub customer_id: Uuid,
    pub item_id: Uuid,
    pub sale_date: NaiveDate,
    pub total_quantity: Quantity,
    pub unit_price: Price,
    #[serde(default)]
    pub package_size: Option<Quantity>,
    #[serde(default)]
    pub package_count: Option<i64>,
    #[serde(default)]
    pub amount_received: Amount,
    #[serde(default)]
    pub amount_due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewGroceryPayment {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub reference_type: PaymentReference,
    pub reference_id: Uuid,
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Contract draft. The rate defaults to the vehicle's base rate when omitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRentalContract {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub direction: RentalDirection,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub external_owner_id: Option<Uuid>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(default)]
    pub rate: Option<Price>,
    #[serde(default)]
    pub amount_paid: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRentalPayment {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub contract_id: Uuid,
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    #[serde(default)]
    pub notes: Option<String>,
}
