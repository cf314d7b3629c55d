use isoko_core::{Amount, LedgerSnapshot, Quantity};
use isoko_ledger::StockLedger;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::window::ReportWindow;

/// Grocery wholesale KPIs for one reporting day.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrocerySummary {
    /// Current stock summed over active items, in base units.
    pub total_stock: Quantity,
    pub today_sales: Amount,
    pub monthly_sales: Amount,
    pub monthly_purchases: Amount,
    /// Monthly sales minus monthly purchase cost. Cash basis, not matched COGS.
    pub monthly_profit: Amount,
    pub payables: Amount,
    pub receivables: Amount,
    #[serde(default)]
    pub negative_stock_items: Vec<Uuid>,
}

impl GrocerySummary {
    pub fn compute(snapshot: &LedgerSnapshot, window: &ReportWindow) -> Self {
        let stock = StockLedger::from_records(&snapshot.purchases, &snapshot.sales);
        let total_stock = snapshot
            .items
            .iter()
            .filter(|item| item.active)
            .map(|item| stock.current_stock(item.id))
            .sum();

        let today_sales = snapshot
            .sales
            .iter()
            .filter(|sale| window.is_today(sale.sale_date))
            .map(|sale| sale.total_sale_amount)
            .sum();
        let monthly_sales: Decimal = snapshot
            .sales
            .iter()
            .filter(|sale| window.in_month(sale.sale_date))
            .map(|sale| sale.total_sale_amount)
            .sum();
        let monthly_purchases: Decimal = snapshot
            .purchases
            .iter()
            .filter(|purchase| window.in_month(purchase.purchase_date))
            .map(|purchase| purchase.total_purchase_cost)
            .sum();

        Self {
            total_stock,
            today_sales,
            monthly_sales,
            monthly_purchases,
            monthly_profit: monthly_sales - monthly_purchases,
            payables: snapshot
                .purchases
                .iter()
                .map(|purchase| purchase.remaining_amount)
                .sum(),
            receivables: snapshot.sales.iter().map(|sale| sale.remaining_amount).sum(),
            negative_stock_items: stock.negative_items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, Fixture};
    use rust_decimal_macros::dec;

    #[test]
    fn empty_snapshot_yields_zeros() {
        let summary = GrocerySummary::compute(
            &LedgerSnapshot::default(),
            &ReportWindow::new(date(2024, 3, 15)),
        );
        assert_eq!(summary, GrocerySummary::default());
    }

    #[test]
    fn monthly_profit_is_sales_minus_purchases_in_month() {
        let mut fx = Fixture::new();
        let rice = fx.item("Rice", true);
        fx.purchase(rice, date(2024, 3, 1), dec!(500), dec!(1000), dec!(500000));
        fx.purchase(rice, date(2024, 2, 28), dec!(100), dec!(1000), dec!(0));
        fx.sale(rice, date(2024, 3, 15), dec!(200), dec!(1300), dec!(60000));
        fx.sale(rice, date(2024, 3, 2), dec!(50), dec!(1300), dec!(65000));

        let summary = GrocerySummary::compute(&fx.snapshot, &ReportWindow::new(date(2024, 3, 15)));
        assert_eq!(summary.today_sales, dec!(260000));
        assert_eq!(summary.monthly_sales, dec!(325000));
        assert_eq!(summary.monthly_purchases, dec!(500000));
        assert_eq!(summary.monthly_profit, dec!(-175000));
        assert_eq!(summary.payables, dec!(100000));
        assert_eq!(summary.receivables, dec!(200000));
        assert_eq!(summary.total_stock, dec!(350));
    }

    #[test]
    fn inactive_items_leave_total_stock_but_negative_stock_is_flagged() {
        let mut fx = Fixture::new();
        let oil = fx.item("Cooking oil", true);
        let salt = fx.item("Salt", false);
        fx.purchase(oil, date(2024, 3, 1), dec!(20), dec!(2500), dec!(0));
        fx.sale(oil, date(2024, 3, 2), dec!(45), dec!(2800), dec!(0));
        fx.purchase(salt, date(2024, 3, 1), dec!(1000), dec!(300), dec!(0));

        let summary = GrocerySummary::compute(&fx.snapshot, &ReportWindow::new(date(2024, 3, 15)));
        assert_eq!(summary.total_stock, dec!(-25));
        assert_eq!(summary.negative_stock_items, vec![oil]);
    }
}
