use chrono::NaiveDate;
use isoko_core::{Amount, DisplayStatus, LedgerSnapshot};
use isoko_ledger::{days_overdue, purchase_display_status, sale_display_status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    /// Owed to a supplier.
    Payable,
    /// Owed by a customer.
    Receivable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverdueBalance {
    pub kind: BalanceKind,
    pub record_id: Uuid,
    pub contact_id: Uuid,
    pub item_id: Uuid,
    pub remaining: Amount,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

/// Open purchases and sales that display as `DELAYED` on `as_of`, most overdue first.
pub fn overdue_balances(snapshot: &LedgerSnapshot, as_of: NaiveDate) -> Vec<OverdueBalance> {
    let payables = snapshot.purchases.iter().filter_map(|purchase| {
        let due_date = purchase.amount_due_date?;
        (purchase_display_status(purchase, as_of) == DisplayStatus::Delayed).then(|| {
            OverdueBalance {
                kind: BalanceKind::Payable,
                record_id: purchase.id,
                contact_id: purchase.supplier_id,
                item_id: purchase.item_id,
                remaining: purchase.remaining_amount,
                due_date,
                days_overdue: days_overdue(Some(due_date), as_of),
            }
        })
    });
    let receivables = snapshot.sales.iter().filter_map(|sale| {
        let due_date = sale.amount_due_date?;
        (sale_display_status(sale, as_of) == DisplayStatus::Delayed).then(|| OverdueBalance {
            kind: BalanceKind::Receivable,
            record_id: sale.id,
            contact_id: sale.customer_id,
            item_id: sale.item_id,
            remaining: sale.remaining_amount,
            due_date,
            days_overdue: days_overdue(Some(due_date), as_of),
        })
    });
    let mut rows: Vec<_> = payables.chain(receivables).collect();
    rows.sort_by(|a, b| {
        b.days_overdue
            .cmp(&a.days_overdue)
            .then_with(|| b.remaining.cmp(&a.remaining))
            .then_with(|| a.record_id.cmp(&b.record_id))
    });
    rows
}
