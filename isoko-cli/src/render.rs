//! Plain-text views printed by the CLI. Amounts leave the engine here and only
//! here, formatted with the configured currency.

use isoko_analytics::{BalanceKind, DashboardReport};
use isoko_core::{CurrencyFormat, LedgerSnapshot};
use isoko_ledger::{Settlement, StockLedger};

pub fn settlement(settlement: &Settlement, status: &str, currency: &CurrencyFormat) -> String {
    [
        format!("total      {}", currency.format(settlement.total)),
        format!("paid       {}", currency.format(settlement.paid)),
        format!("remaining  {}", currency.format(settlement.remaining)),
        format!("status     {status}"),
    ]
    .join("\n")
}

pub fn stock(snapshot: &LedgerSnapshot) -> String {
    let ledger = StockLedger::from_records(&snapshot.purchases, &snapshot.sales);
    let mut lines = vec![format!("{:<24} {:>14}  {}", "ITEM", "STOCK", "PACKAGES")];
    for item in &snapshot.items {
        let Some(stock) = ledger.item(item.id) else {
            lines.push(format!("{:<24} {:>14}", item.name, format!("0 {}", item.base_unit)));
            continue;
        };
        let packages = stock
            .packages
            .iter()
            .map(|(size, count)| format!("{count}x{size}{}", item.base_unit.as_str().to_lowercase()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut line = format!(
            "{:<24} {:>14}  {}",
            item.name,
            format!("{} {}", stock.quantity(), item.base_unit),
            packages
        );
        if stock.is_negative() {
            line.push_str("  (negative)");
        }
        if !item.active {
            line.push_str("  (inactive)");
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

pub fn dashboard(report: &DashboardReport, snapshot: &LedgerSnapshot, currency: &CurrencyFormat) -> String {
    let grocery = &report.grocery;
    let fleet = &report.fleet;
    let mut lines = vec![
        format!("Dashboard as of {}", report.as_of),
        String::new(),
        "Grocery".to_string(),
        format!("  total stock        {}", grocery.total_stock),
        format!("  today sales        {}", currency.format(grocery.today_sales)),
        format!("  monthly sales      {}", currency.format(grocery.monthly_sales)),
        format!("  monthly purchases  {}", currency.format(grocery.monthly_purchases)),
        format!("  monthly profit     {}", currency.format(grocery.monthly_profit)),
        format!("  payables           {}", currency.format(grocery.payables)),
        format!("  receivables        {}", currency.format(grocery.receivables)),
    ];
    for item_id in &grocery.negative_stock_items {
        let name = snapshot.item(*item_id).map_or("unknown item", |item| item.name.as_str());
        lines.push(format!("  negative stock: {name}"));
    }

    lines.extend([
        String::new(),
        "Fleet".to_string(),
        format!(
            "  vehicles {} | available {} | rented out {} | rented in {} | maintenance {} | offline {}",
            fleet.total, fleet.available, fleet.rented_out, fleet.rented_in, fleet.maintenance, fleet.offline
        ),
        format!("  active contracts   {}", fleet.active_contracts),
        format!("  utilization        {}%", fleet.utilization),
        format!("  today revenue      {}", currency.format(fleet.today_revenue)),
        format!("  month revenue      {}", currency.format(fleet.month_revenue)),
    ]);

    if !report.top_vehicles.is_empty() {
        lines.push(String::new());
        lines.push("Top vehicles".to_string());
        for (rank, row) in report.top_vehicles.iter().enumerate() {
            lines.push(format!(
                "  {}. {:<20} {:>16}  {} contract(s)",
                rank + 1,
                row.name,
                currency.format(row.revenue),
                row.contracts
            ));
        }
    }

    if !report.overdue.is_empty() {
        lines.push(String::new());
        lines.push("Overdue balances".to_string());
        for row in &report.overdue {
            let label = match row.kind {
                BalanceKind::Payable => "payable",
                BalanceKind::Receivable => "receivable",
            };
            lines.push(format!(
                "  {label:<10} {} {:>16}  due {} ({} days)",
                row.record_id,
                currency.format(row.remaining),
                row.due_date,
                row.days_overdue
            ));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn settlement_lines_use_currency_format() {
        let view = settlement(
            &Settlement::compute(Decimal::from(600_000), Decimal::from(400_000)),
            "PARTIAL",
            &CurrencyFormat::default(),
        );
        assert!(view.contains("total      RWF 600,000"));
        assert!(view.contains("remaining  RWF 200,000"));
        assert!(view.ends_with("status     PARTIAL"));
    }
}
