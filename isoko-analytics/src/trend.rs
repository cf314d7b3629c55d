use std::collections::BTreeMap;

use chrono::NaiveDate;
use isoko_core::{Amount, LedgerSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroceryDailyPoint {
    pub date: NaiveDate,
    pub sales: Amount,
    pub purchases: Amount,
    pub profit: Amount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalDailyPoint {
    pub date: NaiveDate,
    pub revenue: Amount,
}

/// Sales, purchase cost and cash profit per day with activity, up to and
/// including `as_of`. Only the last `points` days are kept.
pub fn grocery_daily(
    snapshot: &LedgerSnapshot,
    as_of: NaiveDate,
    points: usize,
) -> Vec<GroceryDailyPoint> {
    let mut days: BTreeMap<NaiveDate, (Amount, Amount)> = BTreeMap::new();
    for sale in snapshot.sales.iter().filter(|sale| sale.sale_date <= as_of) {
        days.entry(sale.sale_date).or_default().0 += sale.total_sale_amount;
    }
    for purchase in snapshot
        .purchases
        .iter()
        .filter(|purchase| purchase.purchase_date <= as_of)
    {
        days.entry(purchase.purchase_date).or_default().1 += purchase.total_purchase_cost;
    }
    let series = days
        .into_iter()
        .map(|(date, (sales, purchases))| GroceryDailyPoint {
            date,
            sales,
            purchases,
            profit: sales - purchases,
        })
        .collect();
    keep_last(series, points)
}

/// Rental payment revenue per day, up to and including `as_of`.
pub fn rental_daily(
    snapshot: &LedgerSnapshot,
    as_of: NaiveDate,
    points: usize,
) -> Vec<RentalDailyPoint> {
    let mut days: BTreeMap<NaiveDate, Amount> = BTreeMap::new();
    for payment in snapshot
        .rental_payments
        .iter()
        .filter(|payment| payment.payment_date <= as_of)
    {
        *days.entry(payment.payment_date).or_default() += payment.amount;
    }
    let series = days
        .into_iter()
        .map(|(date, revenue)| RentalDailyPoint { date, revenue })
        .collect();
    keep_last(series, points)
}

fn keep_last<T>(mut series: Vec<T>, points: usize) -> Vec<T> {
    if series.len() > points {
        series.drain(..series.len() - points);
    }
    series
}
