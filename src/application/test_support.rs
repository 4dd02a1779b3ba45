//! An in-memory implementation of every port, sharing one lock so that
//! `place` behaves like a single transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::coupon::{normalize_code, Coupon, CouponDraft};
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderFilter, OrderStatus};
use crate::domain::ports::{CartRepository, CouponRepository, OrderRepository, ProductCatalog};
use crate::domain::product::Product;
use crate::domain::stats::SalesStats;

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    coupons: HashMap<Uuid, Coupon>,
    orders: Vec<Order>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store lock poisoned")
    }

    pub fn add_product(&self, name: &str, price: &str) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: price.parse().expect("valid decimal"),
        };
        self.lock().products.insert(product.id, product.clone());
        product
    }

    pub fn delete_product(&self, id: Uuid) {
        self.lock().products.remove(&id);
    }

    pub fn put_coupon(&self, coupon: Coupon) {
        self.lock().coupons.insert(coupon.id, coupon);
    }

    pub fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.lock().coupons.get(&id).cloned()
    }

    pub fn put_cart(&self, cart: Cart) {
        self.lock().carts.insert(cart.user_id, cart);
    }

    pub fn cart_of(&self, user_id: Uuid) -> Option<Cart> {
        self.lock().carts.get(&user_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }
}

impl ProductCatalog for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>, DomainError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

impl CartRepository for InMemoryStore {
    fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError> {
        Ok(self.cart_of(user_id))
    }

    fn get_or_create(&self, user_id: Uuid) -> Result<Cart, DomainError> {
        Ok(self
            .lock()
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id, Utc::now()))
            .clone())
    }

    fn save(&self, cart: &Cart) -> Result<(), DomainError> {
        self.put_cart(cart.clone());
        Ok(())
    }
}

impl CouponRepository for InMemoryStore {
    fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        let mut coupons: Vec<Coupon> = self.lock().coupons.values().cloned().collect();
        coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(coupons)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, DomainError> {
        Ok(self.coupon(id))
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let code = normalize_code(code);
        Ok(self.lock().coupons.values().find(|c| c.code == code).cloned())
    }

    fn create(&self, draft: CouponDraft) -> Result<Coupon, DomainError> {
        let mut state = self.lock();
        if state.coupons.values().any(|c| c.code == draft.code) {
            return Err(DomainError::Conflict(format!("coupon code {} exists", draft.code)));
        }
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: draft.code,
            kind: draft.kind,
            value: draft.value,
            min_order_amount: draft.min_order_amount,
            usage_limit: draft.usage_limit,
            used_count: 0,
            expires_at: draft.expires_at,
            active: draft.active,
            version: 0,
            created_at: Utc::now(),
        };
        state.coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }

    fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
        let mut state = self.lock();
        let stored = state
            .coupons
            .get_mut(&coupon.id)
            .ok_or(DomainError::NotFound("Coupon"))?;
        if stored.version != coupon.version {
            return Err(DomainError::Conflict("coupon was modified concurrently".into()));
        }
        let used_count = stored.used_count;
        *stored = Coupon {
            used_count,
            version: coupon.version + 1,
            ..coupon.clone()
        };
        Ok(stored.clone())
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.lock().coupons.remove(&id).is_some())
    }

    fn increment_usage(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(increment(&mut self.lock(), id))
    }
}

fn increment(state: &mut State, id: Uuid) -> bool {
    match state.coupons.get_mut(&id) {
        Some(c) if c.usage_limit == 0 || c.used_count < c.usage_limit => {
            c.used_count += 1;
            c.version += 1;
            true
        }
        _ => false,
    }
}

impl OrderRepository for InMemoryStore {
    fn place(&self, order: NewOrder, cart_id: Uuid) -> Result<Order, DomainError> {
        let mut state = self.lock();
        if let Some(applied) = &order.applied_coupon {
            if !increment(&mut state, applied.id) {
                return Err(DomainError::CouponExhausted);
            }
        }

        let now = Utc::now();
        let placed = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            lines: order.lines,
            subtotal: order.subtotal,
            discount: order.discount,
            coupon_code: order.coupon_code,
            total: order.total,
            status: OrderStatus::Pending,
            payment_slip: String::new(),
            contact: order.contact,
            created_at: now,
            updated_at: now,
            paid_at: None,
        };
        state.orders.push(placed.clone());

        if let Some(cart) = state.carts.values_mut().find(|c| c.id == cart_id) {
            cart.clear(now);
        }
        Ok(placed)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| filter.user_id.map_or(true, |u| o.user_id == u))
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect())
    }

    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, DomainError> {
        let mut state = self.lock();
        Ok(state.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status;
            o.updated_at = Utc::now();
            o.clone()
        }))
    }

    fn record_payment(
        &self,
        id: Uuid,
        slip_path: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError> {
        let mut state = self.lock();
        Ok(state.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.payment_slip = slip_path.to_string();
            o.status = OrderStatus::Paid;
            o.paid_at = Some(paid_at);
            o.updated_at = paid_at;
            o.clone()
        }))
    }

    fn sales_stats(&self) -> Result<SalesStats, DomainError> {
        Ok(SalesStats::from_orders(&self.lock().orders))
    }
}
