use std::collections::BTreeMap;

use isoko_core::{Purchase, Quantity, Sale};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running inventory for a single item.
///
/// `packages` tracks whole sacks/cans per declared package size. It is a coarse
/// secondary view: it only counts lines that declare both a size and a count and
/// does not reconcile with `quantity`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStock {
    pub item_id: Uuid,
    pub purchased: Quantity,
    pub sold: Quantity,
    pub packages: BTreeMap<Decimal, i64>,
}

impl ItemStock {
    fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            ..Self::default()
        }
    }

    /// Purchased minus sold. May be negative; never clamped.
    pub fn quantity(&self) -> Quantity {
        self.purchased - self.sold
    }

    pub fn is_negative(&self) -> bool {
        self.quantity() < Decimal::ZERO
    }

    /// Signed whole-package count for `size`.
    pub fn package_count(&self, size: Decimal) -> i64 {
        self.packages.get(&size.normalize()).copied().unwrap_or(0)
    }

    fn record_packages(&mut self, size: Option<Decimal>, count: Option<i64>, sign: i64) {
        if let (Some(size), Some(count)) = (size, count) {
            let slot = self.packages.entry(size.normalize()).or_insert(0);
            *slot = slot.saturating_add(sign.saturating_mul(count));
        }
    }
}

/// All-time stock balance per item, folded from purchase and sale history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockLedger {
    items: BTreeMap<Uuid, ItemStock>,
}

impl StockLedger {
    pub fn from_records<'a>(
        purchases: impl IntoIterator<Item = &'a Purchase>,
        sales: impl IntoIterator<Item = &'a Sale>,
    ) -> Self {
        let mut ledger = Self::default();
        for purchase in purchases {
            ledger.add_purchase(purchase);
        }
        for sale in sales {
            ledger.add_sale(sale);
        }
        ledger
    }

    pub fn add_purchase(&mut self, purchase: &Purchase) {
        let stock = self.entry(purchase.item_id);
        stock.purchased += purchase.total_quantity;
        stock.record_packages(purchase.package_size, purchase.package_count, 1);
    }

    pub fn add_sale(&mut self, sale: &Sale) {
        let stock = self.entry(sale.item_id);
        stock.sold += sale.total_quantity;
        stock.record_packages(sale.package_size, sale.package_count, -1);
    }

    fn entry(&mut self, item_id: Uuid) -> &mut ItemStock {
        self.items
            .entry(item_id)
            .or_insert_with(|| ItemStock::new(item_id))
    }

    pub fn item(&self, item_id: Uuid) -> Option<&ItemStock> {
        self.items.get(&item_id)
    }

    /// Current stock for `item_id`; zero when the item has no history.
    pub fn current_stock(&self, item_id: Uuid) -> Quantity {
        self.item(item_id)
            .map(ItemStock::quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemStock> {
        self.items.values()
    }

    /// Items whose sales exceed recorded purchases.
    pub fn negative_items(&self) -> Vec<Uuid> {
        self.items
            .values()
            .filter(|stock| stock.is_negative())
            .map(|stock| stock.item_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use isoko_core::{ReceiptStatus, SettlementStatus};
    use rust_decimal_macros::dec;

    fn purchase(item_id: Uuid, qty: Decimal, package: Option<(Decimal, i64)>) -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            supplier_id: Uuid::nil(),
            item_id,
            purchase_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            total_quantity: qty,
            unit_price: dec!(1000),
            total_purchase_cost: qty * dec!(1000),
            package_size: package.map(|(size, _)| size),
            package_count: package.map(|(_, count)| count),
            amount_paid: Decimal::ZERO,
            remaining_amount: qty * dec!(1000),
            financial_status: SettlementStatus::Pending,
            amount_due_date: None,
            created_at: Utc::now(),
        }
    }

    fn sale(item_id: Uuid, qty: Decimal, package: Option<(Decimal, i64)>) -> Sale {
        Sale {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            customer_id: Uuid::nil(),
            item_id,
            sale_date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            total_quantity: qty,
            unit_price: dec!(1200),
            total_sale_amount: qty * dec!(1200),
            package_size: package.map(|(size, _)| size),
            package_count: package.map(|(_, count)| count),
            amount_received: Decimal::ZERO,
            remaining_amount: qty * dec!(1200),
            financial_status: ReceiptStatus::Pending,
            amount_due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stock_is_purchases_minus_sales_in_any_order() {
        let rice = Uuid::new_v4();
        let purchases = vec![purchase(rice, dec!(500), None), purchase(rice, dec!(250.5), None)];
        let sales = vec![sale(rice, dec!(120), None), sale(rice, dec!(30.25), None)];

        let forward = StockLedger::from_records(&purchases, &sales);
        let mut reversed = StockLedger::default();
        for s in sales.iter().rev() {
            reversed.add_sale(s);
        }
        for p in purchases.iter().rev() {
            reversed.add_purchase(p);
        }
        assert_eq!(forward.current_stock(rice), dec!(600.25));
        assert_eq!(reversed.current_stock(rice), forward.current_stock(rice));
    }

    #[test]
    fn negative_stock_is_reported_not_clamped() {
        let oil = Uuid::new_v4();
        let ledger = StockLedger::from_records(
            &[purchase(oil, dec!(20), None)],
            &[sale(oil, dec!(45), None)],
        );
        assert_eq!(ledger.current_stock(oil), dec!(-25));
        assert_eq!(ledger.negative_items(), vec![oil]);
        assert_eq!(ledger.current_stock(Uuid::new_v4()), Decimal::ZERO);
    }

    #[test]
    fn package_counts_track_each_size_separately() {
        let sugar = Uuid::new_v4();
        let ledger = StockLedger::from_records(
            &[
                purchase(sugar, dec!(500), Some((dec!(50), 10))),
                purchase(sugar, dec!(250), Some((dec!(25.0), 10))),
                purchase(sugar, dec!(40), None),
            ],
            &[
                sale(sugar, dec!(100), Some((dec!(50), 2))),
                sale(sugar, dec!(75), Some((dec!(25), 3))),
            ],
        );
        let stock = ledger.item(sugar).unwrap();
        assert_eq!(stock.package_count(dec!(50)), 8);
        assert_eq!(stock.package_count(dec!(25)), 7);
        assert_eq!(stock.package_count(dec!(5)), 0);
        assert_eq!(stock.quantity(), dec!(615));
    }
}
