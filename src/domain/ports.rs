use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::Cart;
use super::coupon::{Coupon, CouponDraft};
use super::errors::DomainError;
use super::order::{NewOrder, Order, OrderFilter, OrderStatus};
use super::product::Product;
use super::stats::SalesStats;

pub trait ProductCatalog: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Products that no longer exist are simply absent from the map.
    fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError>;
    fn get_or_create(&self, user_id: Uuid) -> Result<Cart, DomainError>;
    /// Replaces the stored lines with `cart.items`.
    fn save(&self, cart: &Cart) -> Result<(), DomainError>;
}

pub trait CouponRepository: Send + Sync + 'static {
    fn list(&self) -> Result<Vec<Coupon>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, DomainError>;
    fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError>;
    /// Fails with `Conflict` when the code is taken.
    fn create(&self, draft: CouponDraft) -> Result<Coupon, DomainError>;
    /// Writes only if `coupon.version` is still current; returns the coupon
    /// with its new version. A stale version is a `Conflict`.
    fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    /// Atomically counts one use. Returns `false` when the coupon is missing
    /// or already at its usage limit.
    fn increment_usage(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists the order, counts the applied coupon's use and empties the
    /// originating cart as one unit. If the coupon has meanwhile hit its
    /// usage limit nothing is written and `CouponExhausted` is returned.
    fn place(&self, order: NewOrder, cart_id: Uuid) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Newest first.
    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError>;
    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, DomainError>;
    /// Stores the slip location and marks the order paid.
    fn record_payment(
        &self,
        id: Uuid,
        slip_path: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError>;
    fn sales_stats(&self) -> Result<SalesStats, DomainError>;
}
