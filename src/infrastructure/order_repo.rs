use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderFilter, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::domain::stats::{daily_sales, rank_products, ProductSales, SalesStats};
use crate::schema::{order_lines, orders};

use super::cart_repo::clear_cart_in;
use super::coupon_repo::increment_usage_in;
use super::models::{order_from_rows, NewOrderRow, OrderLineRow, OrderRow};

fn load_lines(conn: &mut PgConnection, order: OrderRow) -> Result<Order, DomainError> {
    let lines = OrderLineRow::belonging_to(&order)
        .select(OrderLineRow::as_select())
        .order(order_lines::position.asc())
        .load(conn)?;
    order_from_rows(order, lines)
}

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, order: NewOrder, cart_id: Uuid) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Count the coupon use; losing the race aborts the whole order.
            if let Some(applied) = &order.applied_coupon {
                if !increment_usage_in(conn, applied.id)? {
                    return Err(DomainError::CouponExhausted);
                }
            }

            // 2. Insert the order
            let order_id = Uuid::new_v4();
            let row = diesel::insert_into(orders::table)
                .values(&NewOrderRow::from_order(
                    order_id,
                    &order,
                    OrderStatus::Pending.as_str(),
                ))
                .returning(OrderRow::as_returning())
                .get_result::<OrderRow>(conn)?;

            // 3. Insert order lines
            let lines: Vec<OrderLineRow> = order
                .lines
                .iter()
                .zip(0..)
                .map(|(line, position)| OrderLineRow::from_line(order_id, position, line))
                .collect();
            if !lines.is_empty() {
                diesel::insert_into(order_lines::table)
                    .values(&lines)
                    .execute(conn)?;
            }

            // 4. Empty the cart the order came from.
            clear_cart_in(conn, cart_id)?;

            order_from_rows(row, lines)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        order.map(|order| load_lines(&mut conn, order)).transpose()
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .into_boxed();
        if let Some(user_id) = filter.user_id {
            query = query.filter(orders::user_id.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        let rows = query.load(&mut conn)?;

        let lines = OrderLineRow::belonging_to(&rows)
            .select(OrderLineRow::as_select())
            .order(order_lines::position.asc())
            .load(&mut conn)?
            .grouped_by(&rows);

        rows.into_iter()
            .zip(lines)
            .map(|(order, lines)| order_from_rows(order, lines))
            .collect()
    }

    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result::<OrderRow>(&mut conn)
            .optional()?;

        row.map(|order| load_lines(&mut conn, order)).transpose()
    }

    fn record_payment(
        &self,
        id: Uuid,
        slip_path: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(orders::table.find(id))
            .set((
                orders::payment_slip.eq(slip_path),
                orders::status.eq(OrderStatus::Paid.as_str()),
                orders::paid_at.eq(Some(paid_at)),
                orders::updated_at.eq(paid_at),
            ))
            .returning(OrderRow::as_returning())
            .get_result::<OrderRow>(&mut conn)
            .optional()?;

        row.map(|order| load_lines(&mut conn, order)).transpose()
    }

    fn sales_stats(&self) -> Result<SalesStats, DomainError> {
        let mut conn = self.pool.get()?;
        let completed = OrderStatus::Completed.as_str();

        let (total_orders, total_revenue) = orders::table
            .filter(orders::status.eq(completed))
            .select((count_star(), sum(orders::total)))
            .first::<(i64, Option<BigDecimal>)>(&mut conn)?;

        let by_status: HashMap<String, i64> = orders::table
            .filter(orders::status.eq_any(vec![
                OrderStatus::Pending.as_str(),
                OrderStatus::Paid.as_str(),
            ]))
            .group_by(orders::status)
            .select((orders::status, count_star()))
            .load::<(String, i64)>(&mut conn)?
            .into_iter()
            .collect();

        let mut product_sales: Vec<ProductSales> = order_lines::table
            .inner_join(orders::table)
            .filter(orders::status.eq(completed))
            .group_by(order_lines::product_id)
            .select((
                order_lines::product_id,
                max(order_lines::name),
                sum(order_lines::quantity),
                sum(order_lines::line_total),
            ))
            .load::<(Uuid, Option<String>, Option<i64>, Option<BigDecimal>)>(&mut conn)?
            .into_iter()
            .map(|(product_id, name, quantity, revenue)| ProductSales {
                product_id,
                name: name.unwrap_or_default(),
                quantity: quantity.unwrap_or(0),
                revenue: revenue.unwrap_or_else(BigDecimal::zero),
            })
            .collect();
        rank_products(&mut product_sales);

        let totals = orders::table
            .filter(orders::status.eq(completed))
            .select((orders::created_at, orders::total))
            .load::<(DateTime<Utc>, BigDecimal)>(&mut conn)?;

        Ok(SalesStats {
            total_revenue: total_revenue.unwrap_or_else(BigDecimal::zero),
            total_orders,
            total_items: product_sales.iter().map(|p| p.quantity).sum(),
            pending_orders: by_status
                .get(OrderStatus::Pending.as_str())
                .copied()
                .unwrap_or(0),
            paid_orders: by_status.get(OrderStatus::Paid.as_str()).copied().unwrap_or(0),
            product_sales,
            daily_sales: daily_sales(totals.iter().map(|(at, total)| (*at, total))),
        })
    }
}
