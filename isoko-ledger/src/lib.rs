//! Settlement rules, status transitions and storage backends for the Isoko ledger.

mod billing;
mod error;
pub mod journal;
mod memory;
mod query;
mod repository;
mod settlement;
mod sqlite;
mod stock;
mod transitions;

pub use billing::{billed_units, quote_rental, rental_total};
pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedgerRepository;
pub use query::RecordQuery;
pub use repository::{AppliedPayment, LedgerRepository, SeedOutcome};
pub use settlement::{apply_payment, quote_goods, Settleable, Settlement};
pub use sqlite::SqliteLedgerRepository;
pub use stock::{ItemStock, StockLedger};
pub use transitions::{
    days_overdue, display_status, manual_vehicle_status, next_contract_status,
    purchase_display_status, sale_display_status, vehicle_on_contract_closed,
    vehicle_on_contract_opened, ContractEvent,
};
