//! Read-time aggregations over a [`isoko_core::LedgerSnapshot`].
//!
//! Every function here is pure: the same snapshot and reporting date always
//! produce the same output, and empty input yields zeros and empty series.

mod error;
mod fleet;
mod grocery;
mod overdue;
mod ranking;
mod report;
mod trend;
mod window;

#[cfg(test)]
mod fixtures;

pub use error::{AnalyticsError, AnalyticsResult};
pub use fleet::FleetSummary;
pub use grocery::GrocerySummary;
pub use overdue::{overdue_balances, BalanceKind, OverdueBalance};
pub use ranking::{top_vehicles, VehicleRevenue};
pub use report::{AggregateReport, DashboardOptions, DashboardReport};
pub use trend::{grocery_daily, rental_daily, GroceryDailyPoint, RentalDailyPoint};
pub use window::ReportWindow;
