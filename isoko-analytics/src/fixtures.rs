//! Record builders for aggregation tests. Records are assembled directly so
//! tests can describe states the write path would never produce.

use chrono::{NaiveDate, TimeZone, Utc};
use isoko_core::{
    Amount, BaseUnit, ContractStatus, Item, LedgerSnapshot, MeasurementKind, OwnershipType,
    PaymentMode, Price, Purchase, Quantity, RentalContract, RentalDirection, RentalPayment,
    RentalType, Sale, Vehicle, VehicleStatus, VehicleType,
};
use isoko_ledger::Settlement;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
pub struct Fixture {
    pub snapshot: LedgerSnapshot,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&mut self, name: &str, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.snapshot.items.push(Item {
            id,
            business_id: Uuid::nil(),
            name: name.into(),
            measurement: MeasurementKind::Weight,
            base_unit: BaseUnit::Kg,
            active,
            created_at: Utc::now(),
        });
        id
    }

    pub fn purchase(
        &mut self,
        item_id: Uuid,
        on: NaiveDate,
        quantity: Quantity,
        unit_price: Price,
        paid: Amount,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let settlement = Settlement::compute(quantity * unit_price, paid);
        self.snapshot.purchases.push(Purchase {
            id,
            business_id: Uuid::nil(),
            supplier_id: Uuid::nil(),
            item_id,
            purchase_date: on,
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
        });
        id
    }

    pub fn sale(
        &mut self,
        item_id: Uuid,
        on: NaiveDate,
        quantity: Quantity,
        unit_price: Price,
        received: Amount,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let settlement = Settlement::compute(quantity * unit_price, received);
        self.snapshot.sales.push(Sale {
            id,
            business_id: Uuid::nil(),
            customer_id: Uuid::nil(),
            item_id,
            sale_date: on,
            total_quantity: quantity,
            unit_price,
            total_sale_amount: settlement.total,
            package_size: None,
            package_count: None,
            amount_received: settlement.paid,
            remaining_amount: settlement.remaining,
            financial_status: settlement.receipt_status(),
            amount_due_date: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn set_purchase_due(&mut self, id: Uuid, due: NaiveDate) {
        if let Some(purchase) = self.snapshot.purchases.iter_mut().find(|p| p.id == id) {
            purchase.amount_due_date = Some(due);
        }
    }

    pub fn set_sale_due(&mut self, id: Uuid, due: NaiveDate) {
        if let Some(sale) = self.snapshot.sales.iter_mut().find(|s| s.id == id) {
            sale.amount_due_date = Some(due);
        }
    }

    pub fn vehicle(&mut self, name: &str, status: VehicleStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.snapshot.vehicles.push(Vehicle {
            id,
            business_id: Uuid::nil(),
            name: name.into(),
            vehicle_type: VehicleType::Truck,
            rental_type: RentalType::Day,
            ownership_type: OwnershipType::Own,
            external_owner_id: None,
            base_rate: Decimal::from(100_000),
            current_status: status,
            current_location: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn contract(&mut self, vehicle_id: Uuid, status: ContractStatus) -> Uuid {
        let id = Uuid::new_v4();
        let settlement = Settlement::compute(Decimal::from(100_000), Decimal::ZERO);
        self.snapshot.contracts.push(RentalContract {
            id,
            business_id: Uuid::nil(),
            vehicle_id,
            direction: RentalDirection::Outgoing,
            customer_id: Some(Uuid::nil()),
            external_owner_id: None,
            start_datetime: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            end_datetime: Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap(),
            rental_type: RentalType::Day,
            rate: settlement.total,
            total_amount: settlement.total,
            amount_paid: settlement.paid,
            remaining_amount: settlement.remaining,
            financial_status: settlement.settlement_status(),
            operational_status: status,
            created_at: Utc::now(),
        });
        id
    }

    pub fn rental_payment(&mut self, contract_id: Uuid, on: NaiveDate, amount: Amount) {
        self.snapshot.rental_payments.push(RentalPayment {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            contract_id,
            amount,
            payment_date: on,
            mode: PaymentMode::Cash,
            notes: None,
            created_at: Utc::now(),
        });
    }
}
