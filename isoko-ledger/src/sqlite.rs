use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use isoko_core::{
    Business, Contact, ContractStatus, GroceryPayment, Item, LedgerSnapshot, NewContact,
    NewGroceryPayment, NewItem, NewPurchase, NewRentalContract, NewRentalPayment, NewSale,
    NewVehicle, PaymentReference, Purchase, RentalContract, RentalPayment, Sale, Vehicle,
    VehicleStatus,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Params, Row, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::journal;
use crate::transitions::{manual_vehicle_status, ContractEvent};
use crate::{
    AppliedPayment, LedgerError, LedgerRepository, LedgerResult, RecordQuery, SeedOutcome,
};

const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS businesses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    name TEXT NOT NULL,
    measurement TEXT NOT NULL,
    base_unit TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    role TEXT NOT NULL,
    name TEXT NOT NULL,
    phone TEXT,
    address TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicles (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    name TEXT NOT NULL,
    vehicle_type TEXT NOT NULL,
    rental_type TEXT NOT NULL,
    ownership_type TEXT NOT NULL,
    external_owner_id TEXT,
    base_rate TEXT,
    current_status TEXT NOT NULL,
    current_location TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS purchases (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    supplier_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    purchase_date TEXT NOT NULL,
    total_quantity TEXT,
    unit_price TEXT,
    total_purchase_cost TEXT,
    package_size TEXT,
    package_count INTEGER,
    amount_paid TEXT,
    remaining_amount TEXT,
    financial_status TEXT NOT NULL,
    amount_due_date TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sales (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    customer_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    sale_date TEXT NOT NULL,
    total_quantity TEXT,
    unit_price TEXT,
    total_sale_amount TEXT,
    package_size TEXT,
    package_count INTEGER,
    amount_received TEXT,
    remaining_amount TEXT,
    financial_status TEXT NOT NULL,
    amount_due_date TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS grocery_payments (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    reference_type TEXT NOT NULL,
    reference_id TEXT NOT NULL,
    amount TEXT,
    payment_date TEXT NOT NULL,
    mode TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rental_contracts (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    vehicle_id TEXT NOT NULL REFERENCES vehicles(id),
    direction TEXT NOT NULL,
    customer_id TEXT,
    external_owner_id TEXT,
    start_datetime TEXT NOT NULL,
    end_datetime TEXT NOT NULL,
    rental_type TEXT NOT NULL,
    rate TEXT,
    total_amount TEXT,
    amount_paid TEXT,
    remaining_amount TEXT,
    financial_status TEXT NOT NULL,
    operational_status TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rental_payments (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id),
    contract_id TEXT NOT NULL REFERENCES rental_contracts(id),
    amount TEXT,
    payment_date TEXT NOT NULL,
    mode TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS purchases_idx_business_date ON purchases(business_id, purchase_date);
CREATE INDEX IF NOT EXISTS sales_idx_business_date ON sales(business_id, sale_date);
CREATE INDEX IF NOT EXISTS grocery_payments_idx_reference ON grocery_payments(reference_id);
CREATE INDEX IF NOT EXISTS rental_payments_idx_contract ON rental_payments(contract_id);
CREATE UNIQUE INDEX IF NOT EXISTS rental_contracts_one_active_per_vehicle
    ON rental_contracts(vehicle_id) WHERE operational_status = 'ACTIVE';
"#;

const BUSINESS_COLUMNS: &str = "id, name, created_at";
const ITEM_COLUMNS: &str = "id, business_id, name, measurement, base_unit, active, created_at";
const CONTACT_COLUMNS: &str =
    "id, business_id, role, name, phone, address, notes, created_at";
const VEHICLE_COLUMNS: &str = "id, business_id, name, vehicle_type, rental_type, ownership_type, \
     external_owner_id, base_rate, current_status, current_location, created_at";
const PURCHASE_COLUMNS: &str = "id, business_id, supplier_id, item_id, purchase_date, \
     total_quantity, unit_price, total_purchase_cost, package_size, package_count, amount_paid, \
     remaining_amount, financial_status, amount_due_date, created_at";
const SALE_COLUMNS: &str = "id, business_id, customer_id, item_id, sale_date, total_quantity, \
     unit_price, total_sale_amount, package_size, package_count, amount_received, \
     remaining_amount, financial_status, amount_due_date, created_at";
const GROCERY_PAYMENT_COLUMNS: &str = "id, business_id, reference_type, reference_id, amount, \
     payment_date, mode, notes, created_at";
const CONTRACT_COLUMNS: &str = "id, business_id, vehicle_id, direction, customer_id, \
     external_owner_id, start_datetime, end_datetime, rental_type, rate, total_amount, \
     amount_paid, remaining_amount, financial_status, operational_status, created_at";
const RENTAL_PAYMENT_COLUMNS: &str =
    "id, business_id, contract_id, amount, payment_date, mode, notes, created_at";

/// SQLite-backed ledger repository.
///
/// Writes run inside `BEGIN IMMEDIATE` transactions so concurrent payments on
/// the same record serialize instead of losing updates.
#[derive(Clone, Debug)]
pub struct SqliteLedgerRepository {
    path: PathBuf,
}

impl SqliteLedgerRepository {
    pub fn new(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let repo = Self { path: path.into() };
        repo.initialize_schema()?;
        Ok(repo)
    }

    fn initialize_schema(&self) -> LedgerResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(LEDGER_SCHEMA)?;
        Ok(())
    }

    fn connect(&self) -> LedgerResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;",
        )?;
        Ok(conn)
    }

    fn write<T>(&self, op: impl FnOnce(&Connection) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn close_contract(
        &self,
        business_id: Uuid,
        contract_id: Uuid,
        event: ContractEvent,
    ) -> LedgerResult<RentalContract> {
        self.write(|conn| {
            let mut contract = load_contract(conn, business_id, contract_id)?;
            let mut vehicle = load_vehicle(conn, business_id, contract.vehicle_id)?;
            journal::close_contract(&mut contract, &mut vehicle, event)?;
            conn.execute(
                "UPDATE rental_contracts SET operational_status = ?1 WHERE id = ?2",
                params![contract.operational_status.as_str(), contract.id.to_string()],
            )?;
            conn.execute(
                "UPDATE vehicles SET current_status = ?1 WHERE id = ?2",
                params![vehicle.current_status.as_str(), vehicle.id.to_string()],
            )?;
            info!(
                contract = %contract.id,
                status = %contract.operational_status,
                "closed rental contract"
            );
            Ok(contract)
        })
    }
}

impl LedgerRepository for SqliteLedgerRepository {
    fn ensure_seed(&self, business_name: &str) -> LedgerResult<SeedOutcome> {
        self.write(|conn| {
            if let Some(business) = find_business(conn, business_name)? {
                return Ok(SeedOutcome {
                    business,
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
            conn.execute(
                "INSERT INTO businesses (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![
                    business.id.to_string(),
                    business.name,
                    business.created_at.to_rfc3339()
                ],
            )?;
            info!(business = %business.id, name = business_name, "seeded business");
            Ok(SeedOutcome {
                business,
                created: true,
            })
        })
    }

    fn find_business(&self, name: &str) -> LedgerResult<Option<Business>> {
        let conn = self.connect()?;
        find_business(&conn, name)
    }

    fn insert_item(&self, business_id: Uuid, draft: NewItem) -> LedgerResult<Item> {
        self.write(|conn| {
            require_business(conn, business_id)?;
            let item = journal::post_item(business_id, draft, Utc::now())?;
            conn.execute(
                &format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    item.id.to_string(),
                    item.business_id.to_string(),
                    item.name,
                    item.measurement.as_str(),
                    item.base_unit.as_str(),
                    item.active,
                    item.created_at.to_rfc3339()
                ],
            )?;
            Ok(item)
        })
    }

    fn deactivate_item(&self, business_id: Uuid, item_id: Uuid) -> LedgerResult<Item> {
        self.write(|conn| {
            let mut item = load_item(conn, business_id, item_id)?;
            conn.execute(
                "UPDATE items SET active = 0 WHERE id = ?1",
                params![item.id.to_string()],
            )?;
            item.active = false;
            Ok(item)
        })
    }

    fn insert_contact(&self, business_id: Uuid, draft: NewContact) -> LedgerResult<Contact> {
        self.write(|conn| {
            require_business(conn, business_id)?;
            let contact = journal::post_contact(business_id, draft, Utc::now())?;
            conn.execute(
                &format!(
                    "INSERT INTO contacts ({CONTACT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    contact.id.to_string(),
                    contact.business_id.to_string(),
                    contact.role.as_str(),
                    contact.name,
                    contact.phone,
                    contact.address,
                    contact.notes,
                    contact.created_at.to_rfc3339()
                ],
            )?;
            Ok(contact)
        })
    }

    fn insert_vehicle(&self, business_id: Uuid, draft: NewVehicle) -> LedgerResult<Vehicle> {
        self.write(|conn| {
            require_business(conn, business_id)?;
            let owner = match draft.external_owner_id {
                Some(owner_id) => Some(load_contact(conn, business_id, owner_id)?),
                None => None,
            };
            let vehicle = journal::post_vehicle(business_id, draft, owner.as_ref(), Utc::now())?;
            conn.execute(
                &format!(
                    "INSERT INTO vehicles ({VEHICLE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    vehicle.id.to_string(),
                    vehicle.business_id.to_string(),
                    vehicle.name,
                    vehicle.vehicle_type.as_str(),
                    vehicle.rental_type.as_str(),
                    vehicle.ownership_type.as_str(),
                    vehicle.external_owner_id.map(|id| id.to_string()),
                    vehicle.base_rate.to_string(),
                    vehicle.current_status.as_str(),
                    vehicle.current_location,
                    vehicle.created_at.to_rfc3339()
                ],
            )?;
            Ok(vehicle)
        })
    }

    fn record_purchase(&self, business_id: Uuid, draft: NewPurchase) -> LedgerResult<Purchase> {
        self.write(|conn| {
            require_business(conn, business_id)?;
            let supplier = load_contact(conn, business_id, draft.supplier_id)?;
            let item = load_item(conn, business_id, draft.item_id)?;
            let purchase = journal::post_purchase(business_id, draft, &supplier, &item, Utc::now())?;
            conn.execute(
                &format!(
                    "INSERT INTO purchases ({PURCHASE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ),
                params![
                    purchase.id.to_string(),
                    purchase.business_id.to_string(),
                    purchase.supplier_id.to_string(),
                    purchase.item_id.to_string(),
                    purchase.purchase_date.to_string(),
                    purchase.total_quantity.to_string(),
                    purchase.unit_price.to_string(),
                    purchase.total_purchase_cost.to_string(),
                    purchase.package_size.map(|size| size.to_string()),
                    purchase.package_count,
                    purchase.amount_paid.to_string(),
                    purchase.remaining_amount.to_string(),
                    purchase.financial_status.as_str(),
                    purchase.amount_due_date.map(|date| date.to_string()),
                    purchase.created_at.to_rfc3339()
                ],
            )?;
            info!(
                purchase = %purchase.id,
                total = %purchase.total_purchase_cost,
                "recorded purchase"
            );
            Ok(purchase)
        })
    }

    fn record_sale(&self, business_id: Uuid, draft: NewSale) -> LedgerResult<Sale> {
        self.write(|conn| {
            require_business(conn, business_id)?;
            let customer = load_contact(conn, business_id, draft.customer_id)?;
            let item = load_item(conn, business_id, draft.item_id)?;
            let sale = journal::post_sale(business_id, draft, &customer, &item, Utc::now())?;
            conn.execute(
                &format!(
                    "INSERT INTO sales ({SALE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ),
                params![
                    sale.id.to_string(),
                    sale.business_id.to_string(),
                    sale.customer_id.to_string(),
                    sale.item_id.to_string(),
                    sale.sale_date.to_string(),
                    sale.total_quantity.to_string(),
                    sale.unit_price.to_string(),
                    sale.total_sale_amount.to_string(),
                    sale.package_size.map(|size| size.to_string()),
                    sale.package_count,
                    sale.amount_received.to_string(),
                    sale.remaining_amount.to_string(),
                    sale.financial_status.as_str(),
                    sale.amount_due_date.map(|date| date.to_string()),
                    sale.created_at.to_rfc3339()
                ],
            )?;
            info!(sale = %sale.id, total = %sale.total_sale_amount, "recorded sale");
            Ok(sale)
        })
    }

    fn apply_grocery_payment(
        &self,
        business_id: Uuid,
        draft: NewGroceryPayment,
    ) -> LedgerResult<AppliedPayment<GroceryPayment>> {
        self.write(|conn| {
            let reference_id = draft.reference_id;
            let (payment, settlement) = match draft.reference_type {
                PaymentReference::Purchase => {
                    let mut purchase = load_purchase(conn, business_id, reference_id)?;
                    let posted =
                        journal::post_grocery_payment(business_id, draft, &mut purchase, Utc::now())?;
                    conn.execute(
                        "UPDATE purchases
                         SET amount_paid = ?1, remaining_amount = ?2, financial_status = ?3
                         WHERE id = ?4",
                        params![
                            purchase.amount_paid.to_string(),
                            purchase.remaining_amount.to_string(),
                            purchase.financial_status.as_str(),
                            purchase.id.to_string()
                        ],
                    )?;
                    posted
                }
                PaymentReference::Sale => {
                    let mut sale = load_sale(conn, business_id, reference_id)?;
                    let posted =
                        journal::post_grocery_payment(business_id, draft, &mut sale, Utc::now())?;
                    conn.execute(
                        "UPDATE sales
                         SET amount_received = ?1, remaining_amount = ?2, financial_status = ?3
                         WHERE id = ?4",
                        params![
                            sale.amount_received.to_string(),
                            sale.remaining_amount.to_string(),
                            sale.financial_status.as_str(),
                            sale.id.to_string()
                        ],
                    )?;
                    posted
                }
            };
            conn.execute(
                &format!(
                    "INSERT INTO grocery_payments ({GROCERY_PAYMENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    payment.id.to_string(),
                    payment.business_id.to_string(),
                    payment.reference_type.as_str(),
                    payment.reference_id.to_string(),
                    payment.amount.to_string(),
                    payment.payment_date.to_string(),
                    payment.mode.as_str(),
                    payment.notes,
                    payment.created_at.to_rfc3339()
                ],
            )?;
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
        })
    }

    fn open_contract(
        &self,
        business_id: Uuid,
        draft: NewRentalContract,
    ) -> LedgerResult<RentalContract> {
        self.write(|conn| {
            let vehicle = load_vehicle(conn, business_id, draft.vehicle_id)?;
            let party = load_contact(conn, business_id, journal::contract_party_id(&draft)?)?;
            let has_active = has_active_contract(conn, vehicle.id)?;
            let (contract, vehicle_status) =
                journal::post_contract(business_id, draft, &vehicle, &party, has_active, Utc::now())?;
            let claimed = conn.execute(
                "UPDATE vehicles SET current_status = ?1
                 WHERE id = ?2 AND business_id = ?3 AND current_status = 'AVAILABLE'",
                params![
                    vehicle_status.as_str(),
                    vehicle.id.to_string(),
                    business_id.to_string()
                ],
            )?;
            if claimed == 0 {
                warn!(vehicle = %vehicle.id, "vehicle was claimed by a concurrent contract");
                return Err(LedgerError::Conflict(format!(
                    "vehicle {} is no longer AVAILABLE",
                    vehicle.id
                )));
            }
            conn.execute(
                &format!(
                    "INSERT INTO rental_contracts ({CONTRACT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
                ),
                params![
                    contract.id.to_string(),
                    contract.business_id.to_string(),
                    contract.vehicle_id.to_string(),
                    contract.direction.as_str(),
                    contract.customer_id.map(|id| id.to_string()),
                    contract.external_owner_id.map(|id| id.to_string()),
                    contract.start_datetime.to_rfc3339(),
                    contract.end_datetime.to_rfc3339(),
                    contract.rental_type.as_str(),
                    contract.rate.to_string(),
                    contract.total_amount.to_string(),
                    contract.amount_paid.to_string(),
                    contract.remaining_amount.to_string(),
                    contract.financial_status.as_str(),
                    contract.operational_status.as_str(),
                    contract.created_at.to_rfc3339()
                ],
            )?;
            info!(
                contract = %contract.id,
                vehicle = %contract.vehicle_id,
                vehicle_status = %vehicle_status,
                "opened rental contract"
            );
            Ok(contract)
        })
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
        self.write(|conn| {
            let mut contract = load_contract(conn, business_id, draft.contract_id)?;
            let (payment, settlement) =
                journal::post_rental_payment(business_id, draft, &mut contract, Utc::now())?;
            conn.execute(
                "UPDATE rental_contracts
                 SET amount_paid = ?1, remaining_amount = ?2, financial_status = ?3
                 WHERE id = ?4",
                params![
                    contract.amount_paid.to_string(),
                    contract.remaining_amount.to_string(),
                    contract.financial_status.as_str(),
                    contract.id.to_string()
                ],
            )?;
            conn.execute(
                &format!(
                    "INSERT INTO rental_payments ({RENTAL_PAYMENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    payment.id.to_string(),
                    payment.business_id.to_string(),
                    payment.contract_id.to_string(),
                    payment.amount.to_string(),
                    payment.payment_date.to_string(),
                    payment.mode.as_str(),
                    payment.notes,
                    payment.created_at.to_rfc3339()
                ],
            )?;
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
        })
    }

    fn set_vehicle_status(
        &self,
        business_id: Uuid,
        vehicle_id: Uuid,
        status: VehicleStatus,
    ) -> LedgerResult<Vehicle> {
        self.write(|conn| {
            let mut vehicle = load_vehicle(conn, business_id, vehicle_id)?;
            let has_active = has_active_contract(conn, vehicle.id)?;
            vehicle.current_status = manual_vehicle_status(vehicle.current_status, status, has_active)?;
            conn.execute(
                "UPDATE vehicles SET current_status = ?1 WHERE id = ?2",
                params![vehicle.current_status.as_str(), vehicle.id.to_string()],
            )?;
            Ok(vehicle)
        })
    }

    fn snapshot(&self, query: &RecordQuery) -> LedgerResult<LedgerSnapshot> {
        let mut conn = self.connect()?;
        // One read transaction so every table comes from the same commit.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let business = query.business_id.to_string();
        let item = optional_text(query.item_id.map(|id| id.to_string()));

        let items = fetch_all(
            &tx,
            &format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE business_id = ?1 AND (?2 IS NULL OR id = ?2)
                 ORDER BY created_at"
            ),
            params![business, item],
            row_to_item,
        )?;
        let contacts = fetch_all(
            &tx,
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE business_id = ?1 ORDER BY created_at"),
            params![business],
            row_to_contact,
        )?;
        let purchases = fetch_all(
            &tx,
            &format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchases
                 WHERE business_id = ?1 AND (?2 IS NULL OR item_id = ?2)
                 ORDER BY purchase_date, created_at"
            ),
            params![business, item],
            row_to_purchase,
        )?;
        let sales = fetch_all(
            &tx,
            &format!(
                "SELECT {SALE_COLUMNS} FROM sales
                 WHERE business_id = ?1 AND (?2 IS NULL OR item_id = ?2)
                 ORDER BY sale_date, created_at"
            ),
            params![business, item],
            row_to_sale,
        )?;
        let grocery_payments = fetch_all(
            &tx,
            &format!(
                "SELECT {GROCERY_PAYMENT_COLUMNS} FROM grocery_payments
                 WHERE business_id = ?1
                   AND (?2 IS NULL OR reference_id IN (
                       SELECT id FROM purchases WHERE item_id = ?2
                       UNION SELECT id FROM sales WHERE item_id = ?2))
                 ORDER BY payment_date, created_at"
            ),
            params![business, item],
            row_to_grocery_payment,
        )?;
        let vehicles = fetch_all(
            &tx,
            &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE business_id = ?1 ORDER BY created_at"),
            params![business],
            row_to_vehicle,
        )?;
        let contracts = fetch_all(
            &tx,
            &format!(
                "SELECT {CONTRACT_COLUMNS} FROM rental_contracts
                 WHERE business_id = ?1 ORDER BY start_datetime, created_at"
            ),
            params![business],
            row_to_contract,
        )?;
        let rental_payments = fetch_all(
            &tx,
            &format!(
                "SELECT {RENTAL_PAYMENT_COLUMNS} FROM rental_payments
                 WHERE business_id = ?1 ORDER BY payment_date, created_at"
            ),
            params![business],
            row_to_rental_payment,
        )?;

        tx.commit()?;

        Ok(LedgerSnapshot {
            items,
            contacts,
            purchases,
            sales,
            grocery_payments,
            vehicles,
            contracts,
            rental_payments,
        })
    }
}

fn fetch_all<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> LedgerResult<T>,
) -> LedgerResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row)?);
    }
    Ok(out)
}

fn fetch_one<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> LedgerResult<T>,
) -> LedgerResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(map(row)?)),
        None => Ok(None),
    }
}

fn load_scoped<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    entity: &'static str,
    business_id: Uuid,
    id: Uuid,
    map: fn(&Row<'_>) -> LedgerResult<T>,
) -> LedgerResult<T> {
    fetch_one(
        conn,
        &format!("SELECT {columns} FROM {table} WHERE id = ?1 AND business_id = ?2"),
        params![id.to_string(), business_id.to_string()],
        map,
    )?
    .ok_or_else(|| LedgerError::not_found(entity, id))
}

fn find_business(conn: &Connection, name: &str) -> LedgerResult<Option<Business>> {
    fetch_one(
        conn,
        &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE name = ?1"),
        params![name],
        row_to_business,
    )
}

fn require_business(conn: &Connection, business_id: Uuid) -> LedgerResult<()> {
    fetch_one(
        conn,
        &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?1"),
        params![business_id.to_string()],
        row_to_business,
    )?
    .map(|_| ())
    .ok_or_else(|| LedgerError::not_found("business", business_id))
}

fn load_item(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<Item> {
    load_scoped(conn, "items", ITEM_COLUMNS, "item", business_id, id, row_to_item)
}

fn load_contact(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<Contact> {
    load_scoped(
        conn,
        "contacts",
        CONTACT_COLUMNS,
        "contact",
        business_id,
        id,
        row_to_contact,
    )
}

fn load_vehicle(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<Vehicle> {
    load_scoped(
        conn,
        "vehicles",
        VEHICLE_COLUMNS,
        "vehicle",
        business_id,
        id,
        row_to_vehicle,
    )
}

fn load_purchase(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<Purchase> {
    load_scoped(
        conn,
        "purchases",
        PURCHASE_COLUMNS,
        "purchase",
        business_id,
        id,
        row_to_purchase,
    )
}

fn load_sale(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<Sale> {
    load_scoped(conn, "sales", SALE_COLUMNS, "sale", business_id, id, row_to_sale)
}

fn load_contract(conn: &Connection, business_id: Uuid, id: Uuid) -> LedgerResult<RentalContract> {
    load_scoped(
        conn,
        "rental_contracts",
        CONTRACT_COLUMNS,
        "rental contract",
        business_id,
        id,
        row_to_contract,
    )
}

fn has_active_contract(conn: &Connection, vehicle_id: Uuid) -> LedgerResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rental_contracts WHERE vehicle_id = ?1 AND operational_status = ?2",
        params![vehicle_id.to_string(), ContractStatus::Active.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn optional_text(value: Option<String>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn parse_uuid(column: &str, value: &str) -> LedgerResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|err| LedgerError::Serialization(format!("invalid {column} {value}: {err}")))
}

fn parse_optional_uuid(column: &str, value: Option<String>) -> LedgerResult<Option<Uuid>> {
    value.map(|v| parse_uuid(column, &v)).transpose()
}

/// Nullable numeric columns read back as zero.
fn parse_amount(column: &str, value: Option<String>) -> LedgerResult<Decimal> {
    match value {
        Some(text) => Decimal::from_str(&text).map_err(|err| {
            LedgerError::Serialization(format!("invalid decimal {column} {text}: {err}"))
        }),
        None => Ok(Decimal::ZERO),
    }
}

fn parse_optional_decimal(column: &str, value: Option<String>) -> LedgerResult<Option<Decimal>> {
    value
        .map(|text| {
            Decimal::from_str(&text).map_err(|err| {
                LedgerError::Serialization(format!("invalid decimal {column} {text}: {err}"))
            })
        })
        .transpose()
}

fn parse_date(column: &str, value: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| LedgerError::Serialization(format!("invalid {column} {value}: {err}")))
}

fn parse_optional_date(column: &str, value: Option<String>) -> LedgerResult<Option<NaiveDate>> {
    value.map(|v| parse_date(column, &v)).transpose()
}

fn parse_timestamp(column: &str, value: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| LedgerError::Serialization(format!("invalid {column} {value}: {err}")))
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> LedgerResult<T> {
    T::from_str(value).map_err(LedgerError::Serialization)
}

fn row_to_business(row: &Row<'_>) -> LedgerResult<Business> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(2)?;
    Ok(Business {
        id: parse_uuid("id", &id)?,
        name: row.get(1)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_item(row: &Row<'_>) -> LedgerResult<Item> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let measurement: String = row.get(3)?;
    let base_unit: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    Ok(Item {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        name: row.get(2)?,
        measurement: parse_enum(&measurement)?,
        base_unit: parse_enum(&base_unit)?,
        active: row.get(5)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_contact(row: &Row<'_>) -> LedgerResult<Contact> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let role: String = row.get(2)?;
    let created_at: String = row.get(7)?;
    Ok(Contact {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        role: parse_enum(&role)?,
        name: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_vehicle(row: &Row<'_>) -> LedgerResult<Vehicle> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let vehicle_type: String = row.get(3)?;
    let rental_type: String = row.get(4)?;
    let ownership_type: String = row.get(5)?;
    let current_status: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    Ok(Vehicle {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        name: row.get(2)?,
        vehicle_type: parse_enum(&vehicle_type)?,
        rental_type: parse_enum(&rental_type)?,
        ownership_type: parse_enum(&ownership_type)?,
        external_owner_id: parse_optional_uuid("external_owner_id", row.get(6)?)?,
        base_rate: parse_amount("base_rate", row.get(7)?)?,
        current_status: parse_enum(&current_status)?,
        current_location: row.get(9)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_purchase(row: &Row<'_>) -> LedgerResult<Purchase> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let supplier_id: String = row.get(2)?;
    let item_id: String = row.get(3)?;
    let purchase_date: String = row.get(4)?;
    let financial_status: String = row.get(12)?;
    let created_at: String = row.get(14)?;
    Ok(Purchase {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        supplier_id: parse_uuid("supplier_id", &supplier_id)?,
        item_id: parse_uuid("item_id", &item_id)?,
        purchase_date: parse_date("purchase_date", &purchase_date)?,
        total_quantity: parse_amount("total_quantity", row.get(5)?)?,
        unit_price: parse_amount("unit_price", row.get(6)?)?,
        total_purchase_cost: parse_amount("total_purchase_cost", row.get(7)?)?,
        package_size: parse_optional_decimal("package_size", row.get(8)?)?,
        package_count: row.get(9)?,
        amount_paid: parse_amount("amount_paid", row.get(10)?)?,
        remaining_amount: parse_amount("remaining_amount", row.get(11)?)?,
        financial_status: parse_enum(&financial_status)?,
        amount_due_date: parse_optional_date("amount_due_date", row.get(13)?)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_sale(row: &Row<'_>) -> LedgerResult<Sale> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let customer_id: String = row.get(2)?;
    let item_id: String = row.get(3)?;
    let sale_date: String = row.get(4)?;
    let financial_status: String = row.get(12)?;
    let created_at: String = row.get(14)?;
    Ok(Sale {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        customer_id: parse_uuid("customer_id", &customer_id)?,
        item_id: parse_uuid("item_id", &item_id)?,
        sale_date: parse_date("sale_date", &sale_date)?,
        total_quantity: parse_amount("total_quantity", row.get(5)?)?,
        unit_price: parse_amount("unit_price", row.get(6)?)?,
        total_sale_amount: parse_amount("total_sale_amount", row.get(7)?)?,
        package_size: parse_optional_decimal("package_size", row.get(8)?)?,
        package_count: row.get(9)?,
        amount_received: parse_amount("amount_received", row.get(10)?)?,
        remaining_amount: parse_amount("remaining_amount", row.get(11)?)?,
        financial_status: parse_enum(&financial_status)?,
        amount_due_date: parse_optional_date("amount_due_date", row.get(13)?)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_grocery_payment(row: &Row<'_>) -> LedgerResult<GroceryPayment> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let reference_type: String = row.get(2)?;
    let reference_id: String = row.get(3)?;
    let payment_date: String = row.get(5)?;
    let mode: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    Ok(GroceryPayment {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        reference_type: parse_enum(&reference_type)?,
        reference_id: parse_uuid("reference_id", &reference_id)?,
        amount: parse_amount("amount", row.get(4)?)?,
        payment_date: parse_date("payment_date", &payment_date)?,
        mode: parse_enum(&mode)?,
        notes: row.get(7)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_contract(row: &Row<'_>) -> LedgerResult<RentalContract> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let vehicle_id: String = row.get(2)?;
    let direction: String = row.get(3)?;
    let start: String = row.get(6)?;
    let end: String = row.get(7)?;
    let rental_type: String = row.get(8)?;
    let financial_status: String = row.get(13)?;
    let operational_status: String = row.get(14)?;
    let created_at: String = row.get(15)?;
    Ok(RentalContract {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        vehicle_id: parse_uuid("vehicle_id", &vehicle_id)?,
        direction: parse_enum(&direction)?,
        customer_id: parse_optional_uuid("customer_id", row.get(4)?)?,
        external_owner_id: parse_optional_uuid("external_owner_id", row.get(5)?)?,
        start_datetime: parse_timestamp("start_datetime", &start)?,
        end_datetime: parse_timestamp("end_datetime", &end)?,
        rental_type: parse_enum(&rental_type)?,
        rate: parse_amount("rate", row.get(9)?)?,
        total_amount: parse_amount("total_amount", row.get(10)?)?,
        amount_paid: parse_amount("amount_paid", row.get(11)?)?,
        remaining_amount: parse_amount("remaining_amount", row.get(12)?)?,
        financial_status: parse_enum(&financial_status)?,
        operational_status: parse_enum(&operational_status)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn row_to_rental_payment(row: &Row<'_>) -> LedgerResult<RentalPayment> {
    let id: String = row.get(0)?;
    let business_id: String = row.get(1)?;
    let contract_id: String = row.get(2)?;
    let payment_date: String = row.get(4)?;
    let mode: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    Ok(RentalPayment {
        id: parse_uuid("id", &id)?,
        business_id: parse_uuid("business_id", &business_id)?,
        contract_id: parse_uuid("contract_id", &contract_id)?,
        amount: parse_amount("amount", row.get(3)?)?,
        payment_date: parse_date("payment_date", &payment_date)?,
        mode: parse_enum(&mode)?,
        notes: row.get(6)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}
