use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, Variant};
use crate::domain::coupon::{Coupon, CouponDraft};
use crate::domain::errors::DomainError;
use crate::domain::order::{CustomerContact, NewOrder, Order, OrderLineItem};
use crate::domain::product::Product;
use crate::schema::{cart_items, carts, coupons, order_lines, orders, products};

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
        }
    }
}

// ── Coupons ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: BigDecimal,
    pub min_order_amount: BigDecimal,
    pub usage_limit: i32,
    pub used_count: i32,
    pub expires_at: String,
    pub active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = coupons)]
pub struct NewCouponRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: BigDecimal,
    pub min_order_amount: BigDecimal,
    pub usage_limit: i32,
    pub expires_at: String,
    pub active: bool,
}

impl From<CouponDraft> for NewCouponRow {
    fn from(draft: CouponDraft) -> Self {
        NewCouponRow {
            id: Uuid::new_v4(),
            code: draft.code,
            kind: draft.kind.as_str().to_string(),
            value: draft.value,
            min_order_amount: draft.min_order_amount,
            usage_limit: draft.usage_limit,
            expires_at: draft.expires_at,
            active: draft.active,
        }
    }
}

/// Everything an administrator may change, plus the next version. `used_count`
/// is written only by the guarded increment.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = coupons)]
pub struct CouponChangeset {
    pub code: String,
    pub kind: String,
    pub value: BigDecimal,
    pub min_order_amount: BigDecimal,
    pub usage_limit: i32,
    pub expires_at: String,
    pub active: bool,
    pub version: i32,
}

impl From<&Coupon> for CouponChangeset {
    fn from(coupon: &Coupon) -> Self {
        CouponChangeset {
            code: coupon.code.clone(),
            kind: coupon.kind.as_str().to_string(),
            value: coupon.value.clone(),
            min_order_amount: coupon.min_order_amount.clone(),
            usage_limit: coupon.usage_limit,
            expires_at: coupon.expires_at.clone(),
            active: coupon.active,
            version: coupon.version + 1,
        }
    }
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| DomainError::Internal(format!("coupon {} has kind '{}'", row.id, row.kind)))?;
        Ok(Coupon {
            id: row.id,
            code: row.code,
            kind,
            value: row.value,
            min_order_amount: row.min_order_amount,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            expires_at: row.expires_at,
            active: row.active,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

// ── Carts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable,
)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(CartRow, foreign_key = cart_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub variant_name: Option<String>,
    pub variant_price: Option<BigDecimal>,
}

impl CartItemRow {
    pub fn from_item(cart_id: Uuid, position: i32, item: &CartItem) -> Self {
        CartItemRow {
            id: item.id,
            cart_id,
            position,
            product_id: item.product_id,
            quantity: item.quantity,
            variant_name: item.variant.as_ref().map(|v| v.name.clone()),
            variant_price: item.variant.as_ref().and_then(|v| v.price.clone()),
        }
    }
}

pub fn cart_from_rows(cart: CartRow, items: Vec<CartItemRow>) -> Cart {
    Cart {
        id: cart.id,
        user_id: cart.user_id,
        updated_at: cart.updated_at,
        items: items
            .into_iter()
            .map(|row| CartItem {
                id: row.id,
                product_id: row.product_id,
                quantity: row.quantity,
                variant: row.variant_name.map(|name| Variant {
                    name,
                    price: row.variant_price,
                }),
            })
            .collect(),
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub coupon_code: Option<String>,
    pub total: BigDecimal,
    pub status: String,
    pub payment_slip: String,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub coupon_code: Option<String>,
    pub total: BigDecimal,
    pub status: String,
    pub shipping_address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub note: String,
}

impl NewOrderRow {
    pub fn from_order(id: Uuid, order: &NewOrder, status: &str) -> Self {
        NewOrderRow {
            id,
            user_id: order.user_id,
            subtotal: order.subtotal.clone(),
            discount: order.discount.clone(),
            coupon_code: order.coupon_code.clone(),
            total: order.total.clone(),
            status: status.to_string(),
            shipping_address: order.contact.shipping_address.clone(),
            customer_name: order.contact.name.clone(),
            customer_phone: order.contact.phone.clone(),
            customer_email: order.contact.email.clone(),
            note: order.contact.note.clone(),
        }
    }
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable,
)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub variant_name: Option<String>,
    pub line_total: BigDecimal,
}

impl OrderLineRow {
    pub fn from_line(order_id: Uuid, position: i32, line: &OrderLineItem) -> Self {
        OrderLineRow {
            id: Uuid::new_v4(),
            order_id,
            position,
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.price.clone(),
            quantity: line.quantity,
            variant_name: line.variant.clone(),
            line_total: line.total.clone(),
        }
    }
}

pub fn order_from_rows(order: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DomainError> {
    let status = order
        .status
        .parse()
        .map_err(|_| DomainError::Internal(format!("order {} has status '{}'", order.id, order.status)))?;
    Ok(Order {
        id: order.id,
        user_id: order.user_id,
        lines: lines
            .into_iter()
            .map(|l| OrderLineItem {
                product_id: l.product_id,
                name: l.name,
                price: l.unit_price,
                quantity: l.quantity,
                variant: l.variant_name,
                total: l.line_total,
            })
            .collect(),
        subtotal: order.subtotal,
        discount: order.discount,
        coupon_code: order.coupon_code,
        total: order.total,
        status,
        payment_slip: order.payment_slip,
        contact: CustomerContact {
            name: order.customer_name,
            email: order.customer_email,
            phone: order.customer_phone,
            shipping_address: order.shipping_address,
            note: order.note,
        },
        created_at: order.created_at,
        updated_at: order.updated_at,
        paid_at: order.paid_at,
    })
}
