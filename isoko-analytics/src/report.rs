use chrono::NaiveDate;
use isoko_core::LedgerSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fleet::FleetSummary;
use crate::grocery::GrocerySummary;
use crate::overdue::{overdue_balances, OverdueBalance};
use crate::ranking::{is_ranked, top_vehicles, VehicleRevenue};
use crate::trend::{grocery_daily, rental_daily, GroceryDailyPoint, RentalDailyPoint};
use crate::window::ReportWindow;
use crate::{AnalyticsError, AnalyticsResult};

/// Series lengths for the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    pub trend_points: usize,
    pub top_vehicles: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            trend_points: 30,
            top_vehicles: 8,
        }
    }
}

/// Every dashboard aggregate, computed in one pass from a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub as_of: NaiveDate,
    pub grocery: GrocerySummary,
    pub fleet: FleetSummary,
    pub grocery_daily: Vec<GroceryDailyPoint>,
    pub rental_daily: Vec<RentalDailyPoint>,
    pub top_vehicles: Vec<VehicleRevenue>,
    pub overdue: Vec<OverdueBalance>,
}

impl DashboardReport {
    pub fn compute(snapshot: &LedgerSnapshot, as_of: NaiveDate, options: DashboardOptions) -> Self {
        let window = ReportWindow::new(as_of);
        let grocery = GrocerySummary::compute(snapshot, &window);
        if !grocery.negative_stock_items.is_empty() {
            warn!(
                items = grocery.negative_stock_items.len(),
                "sales exceed recorded purchases for some items"
            );
        }
        let report = Self {
            as_of,
            grocery,
            fleet: FleetSummary::compute(snapshot, &window),
            grocery_daily: grocery_daily(snapshot, as_of, options.trend_points),
            rental_daily: rental_daily(snapshot, as_of, options.trend_points),
            top_vehicles: top_vehicles(snapshot, options.top_vehicles),
            overdue: overdue_balances(snapshot, as_of),
        };
        debug!(
            %as_of,
            vehicles = report.fleet.total,
            overdue = report.overdue.len(),
            "computed dashboard report"
        );
        report
    }

    /// Split into the tagged payloads served to clients.
    pub fn aggregates(&self) -> Vec<AggregateReport> {
        vec![
            AggregateReport::GrocerySummary(self.grocery.clone()),
            AggregateReport::FleetSummary(self.fleet.clone()),
            AggregateReport::GroceryDaily {
                points: self.grocery_daily.clone(),
            },
            AggregateReport::RentalDaily {
                points: self.rental_daily.clone(),
            },
            AggregateReport::TopVehicles {
                vehicles: self.top_vehicles.clone(),
            },
        ]
    }
}

/// Aggregate payload tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateReport {
    GrocerySummary(GrocerySummary),
    FleetSummary(FleetSummary),
    GroceryDaily { points: Vec<GroceryDailyPoint> },
    RentalDaily { points: Vec<RentalDailyPoint> },
    TopVehicles { vehicles: Vec<VehicleRevenue> },
}

impl AggregateReport {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GrocerySummary(_) => "grocery_summary",
            Self::FleetSummary(_) => "fleet_summary",
            Self::GroceryDaily { .. } => "grocery_daily",
            Self::RentalDaily { .. } => "rental_daily",
            Self::TopVehicles { .. } => "top_vehicles",
        }
    }

    /// Parse an untyped payload and check the invariants its producer guarantees.
    pub fn from_json(payload: &str) -> AnalyticsResult<Self> {
        let report: Self = serde_json::from_str(payload)?;
        report.validate()?;
        Ok(report)
    }

    pub fn to_json(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn validate(&self) -> AnalyticsResult<()> {
        match self {
            Self::GrocerySummary(summary) => {
                if summary.monthly_profit != summary.monthly_sales - summary.monthly_purchases {
                    return Err(AnalyticsError::inconsistent(
                        self.kind(),
                        "monthly_profit must equal monthly_sales - monthly_purchases",
                    ));
                }
            }
            Self::FleetSummary(fleet) => {
                if fleet.bucket_total() != fleet.total {
                    return Err(AnalyticsError::inconsistent(
                        self.kind(),
                        format!(
                            "status buckets sum to {} but total is {}",
                            fleet.bucket_total(),
                            fleet.total
                        ),
                    ));
                }
            }
            Self::GroceryDaily { points } => {
                if !points.windows(2).all(|pair| pair[0].date < pair[1].date) {
                    return Err(AnalyticsError::inconsistent(
                        self.kind(),
                        "points must be strictly ascending by date",
                    ));
                }
            }
            Self::RentalDaily { points } => {
                if !points.windows(2).all(|pair| pair[0].date < pair[1].date) {
                    return Err(AnalyticsError::inconsistent(
                        self.kind(),
                        "points must be strictly ascending by date",
                    ));
                }
            }
            Self::TopVehicles { vehicles } => {
                if !is_ranked(vehicles) {
                    return Err(AnalyticsError::inconsistent(
                        self.kind(),
                        "vehicles must be ranked by non-negative revenue",
                    ));
                }
            }
        }
        Ok(())
    }
}
