//! Core domain types shared by every Isoko crate.
//!
//! The records mirror what the persistence layer stores for a single business:
//! grocery wholesale (items, purchases, sales, payments) and vehicle rental
//! (fleet, contracts, rental payments). Derived fields such as
//! `remaining_amount` are computed by `isoko-ledger`, never edited directly.

pub mod drafts;
pub mod money;
pub mod records;
pub mod status;

pub use drafts::{
    NewContact, NewGroceryPayment, NewItem, NewPurchase, NewRentalContract, NewRentalPayment,
    NewSale, NewVehicle,
};
pub use money::{multiply_quantity_price, round_currency, Amount, CurrencyFormat, Price, Quantity};
pub use records::{
    Business, Contact, GroceryPayment, Item, LedgerSnapshot, Purchase, RentalContract,
    RentalPayment, Sale, Vehicle,
};
pub use status::{
    BaseUnit, ContactRole, ContractStatus, DisplayStatus, MeasurementKind, OwnershipType,
    PaymentMode, PaymentReference, ReceiptStatus, RentalDirection, RentalType, SettlementState,
    SettlementStatus, VehicleStatus, VehicleType,
};
