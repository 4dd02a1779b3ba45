//! Sales figures for the administrator dashboard. Revenue, items, product
//! and daily figures count completed orders only.

use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::order::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: BigDecimal,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesStats {
    pub total_revenue: BigDecimal,
    pub total_orders: i64,
    pub total_items: i64,
    pub pending_orders: i64,
    pub paid_orders: i64,
    /// Best sellers by revenue first.
    pub product_sales: Vec<ProductSales>,
    /// Oldest day first, UTC dates.
    pub daily_sales: Vec<DailySales>,
}

impl Default for SalesStats {
    fn default() -> Self {
        Self {
            total_revenue: BigDecimal::zero(),
            total_orders: 0,
            total_items: 0,
            pending_orders: 0,
            paid_orders: 0,
            product_sales: Vec::new(),
            daily_sales: Vec::new(),
        }
    }
}

/// Best sellers by revenue, ties broken by name.
pub fn rank_products(sales: &mut [ProductSales]) {
    sales.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
}

/// Buckets completed orders' totals by UTC day, oldest first.
pub fn daily_sales<'a>(
    totals: impl IntoIterator<Item = (DateTime<Utc>, &'a BigDecimal)>,
) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
    for (created_at, total) in totals {
        let date = created_at.date_naive();
        let day = days.entry(date).or_insert_with(|| DailySales {
            date,
            revenue: BigDecimal::zero(),
            orders: 0,
        });
        day.revenue += total;
        day.orders += 1;
    }
    days.into_values().collect()
}

impl SalesStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = SalesStats::default();
        let mut products: BTreeMap<Uuid, ProductSales> = BTreeMap::new();
        let mut completed = Vec::new();

        for order in orders {
            match order.status {
                OrderStatus::Completed => {}
                OrderStatus::Pending => {
                    stats.pending_orders += 1;
                    continue;
                }
                OrderStatus::Paid => {
                    stats.paid_orders += 1;
                    continue;
                }
                _ => continue,
            }

            stats.total_orders += 1;
            stats.total_revenue += &order.total;
            completed.push((order.created_at, &order.total));

            for line in &order.lines {
                stats.total_items += i64::from(line.quantity);
                let entry = products
                    .entry(line.product_id)
                    .or_insert_with(|| ProductSales {
                        product_id: line.product_id,
                        name: line.name.clone(),
                        quantity: 0,
                        revenue: BigDecimal::zero(),
                    });
                entry.quantity += i64::from(line.quantity);
                entry.revenue += &line.total;
            }
        }

        stats.product_sales = products.into_values().collect();
        rank_products(&mut stats.product_sales);
        stats.daily_sales = daily_sales(completed);
        stats
    }
}
