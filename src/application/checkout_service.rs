use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::checkout::{
    decide_coupon, price_cart, CheckoutPolicy, CouponOutcome, InvalidCouponPolicy, PricedCart,
    Totals,
};
use crate::domain::coupon::{normalize_code, Rejection};
use crate::domain::errors::DomainError;
use crate::domain::order::{CustomerContact, NewOrder, Order};
use crate::domain::ports::{CartRepository, CouponRepository, OrderRepository, ProductCatalog};

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub coupon_code: Option<String>,
    pub contact: CustomerContact,
}

/// Turns a user's cart into an order: prices lines at live product prices,
/// applies an eligible coupon and hands everything to the order store.
pub struct CheckoutService<C, P, K, O> {
    carts: C,
    products: P,
    coupons: K,
    orders: O,
    policy: CheckoutPolicy,
}

impl<C, P, K, O> CheckoutService<C, P, K, O>
where
    C: CartRepository,
    P: ProductCatalog,
    K: CouponRepository,
    O: OrderRepository,
{
    pub fn new(carts: C, products: P, coupons: K, orders: O, policy: CheckoutPolicy) -> Self {
        Self {
            carts,
            products,
            coupons,
            orders,
            policy,
        }
    }

    pub fn checkout(
        &self,
        request: CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        let cart = self
            .carts
            .find_by_user(request.user_id)?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| DomainError::InvalidInput("cart is empty".into()))?;

        let products = self.products.find_by_ids(&cart.product_ids())?;
        let priced = price_cart(&cart.items, &products, self.policy.missing_product)?;

        let coupon_code = request
            .coupon_code
            .as_deref()
            .map(normalize_code)
            .filter(|code| !code.is_empty());

        let outcome = match &coupon_code {
            Some(code) => {
                let coupon = self.coupons.find_by_code(code)?;
                let outcome = decide_coupon(coupon.as_ref(), &priced.subtotal, now, &self.policy)?;
                if let CouponOutcome::Ignored { reason } = &outcome {
                    log::info!(
                        "Checkout for user {} ignores coupon {code}: {reason}",
                        request.user_id
                    );
                }
                Some(outcome)
            }
            None => None,
        };

        let order = new_order(
            request.user_id,
            &priced,
            outcome.as_ref(),
            coupon_code.clone(),
            request.contact.clone(),
        );
        let had_coupon = order.applied_coupon.is_some();

        let placed = match self.orders.place(order, cart.id) {
            Err(DomainError::CouponExhausted)
                if had_coupon && self.policy.invalid_coupon == InvalidCouponPolicy::Ignore =>
            {
                log::warn!(
                    "Coupon {} ran out during checkout for user {}; placing order without discount",
                    coupon_code.as_deref().unwrap_or_default(),
                    request.user_id
                );
                let fallback =
                    new_order(request.user_id, &priced, None, coupon_code, request.contact);
                self.orders.place(fallback, cart.id)?
            }
            Err(DomainError::CouponExhausted) => {
                return Err(DomainError::CouponRejected(Rejection::UsageLimitReached))
            }
            other => other?,
        };

        log::info!(
            "Placed order {} for user {}: subtotal {} discount {} total {}",
            placed.id,
            placed.user_id,
            placed.subtotal,
            placed.discount,
            placed.total
        );
        Ok(placed)
    }
}

/// The submitted code is kept on the order even when it earned no discount.
fn new_order(
    user_id: Uuid,
    priced: &PricedCart,
    outcome: Option<&CouponOutcome>,
    coupon_code: Option<String>,
    contact: CustomerContact,
) -> NewOrder {
    let discount = outcome.map_or_else(BigDecimal::zero, CouponOutcome::discount);
    let totals = Totals::new(priced.subtotal.clone(), discount);
    NewOrder {
        user_id,
        lines: priced.lines.clone(),
        subtotal: totals.subtotal,
        discount: totals.discount,
        total: totals.total,
        coupon_code,
        applied_coupon: outcome.and_then(CouponOutcome::applied).cloned(),
        contact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryStore;
    use crate::domain::cart::Cart;
    use crate::domain::checkout::MissingProductPolicy;
    use crate::domain::coupon::tests::{coupon, dec, matcha10};
    use crate::domain::coupon::{Coupon, CouponKind};
    use crate::domain::order::OrderStatus;

    type Service = CheckoutService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

    fn service(store: &InMemoryStore, policy: CheckoutPolicy) -> Service {
        CheckoutService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            policy,
        )
    }

    fn request(user_id: Uuid, coupon_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            user_id,
            coupon_code: coupon_code.map(str::to_string),
            contact: CustomerContact {
                name: "Aiko".into(),
                shipping_address: "1 Tea Lane".into(),
                ..CustomerContact::default()
            },
        }
    }

    /// A cart holding `quantity` of a product at `price`.
    fn cart_with(store: &InMemoryStore, price: &str, quantity: i32) -> Uuid {
        let user_id = Uuid::new_v4();
        let product = store.add_product("Ceremonial matcha", price);
        let mut cart = Cart::new(user_id, Utc::now());
        cart.add_item(product.id, quantity, None, Utc::now()).unwrap();
        store.put_cart(cart);
        user_id
    }

    #[test]
    fn applies_valid_coupon_and_counts_its_use() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "250", 4);
        let c = matcha10();
        store.put_coupon(c.clone());

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user, Some("matcha10")), Utc::now())
            .unwrap();

        assert_eq!(order.subtotal, dec("1000"));
        assert_eq!(order.discount, dec("100.00"));
        assert_eq!(order.total, dec("900.00"));
        assert_eq!(order.coupon_code.as_deref(), Some("MATCHA10"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.contact.name, "Aiko");
        assert_eq!(store.coupon(c.id).unwrap().used_count, 1);
        assert!(store.cart_of(user).unwrap().is_empty());
    }

    #[test]
    fn below_minimum_coupon_is_silently_ignored() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "499", 1);
        let c = matcha10();
        store.put_coupon(c.clone());

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user, Some("MATCHA10")), Utc::now())
            .unwrap();

        assert_eq!(order.discount, BigDecimal::zero());
        assert_eq!(order.total, dec("499"));
        assert_eq!(store.coupon(c.id).unwrap().used_count, 0);
    }

    #[test]
    fn unknown_coupon_is_ignored() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "80", 2);

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user, Some("NOPE")), Utc::now())
            .unwrap();

        assert_eq!(order.total, dec("160"));
        assert_eq!(order.coupon_code.as_deref(), Some("NOPE"));
    }

    #[test]
    fn fixed_coupon_over_subtotal_yields_zero_total() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "25", 2);
        store.put_coupon(coupon("HUNDRED", CouponKind::Fixed, "100"));

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user, Some("hundred")), Utc::now())
            .unwrap();

        assert_eq!(order.discount, dec("50"));
        assert_eq!(order.total, BigDecimal::zero());
    }

    #[test]
    fn deleted_product_is_left_out_of_the_order() {
        let store = InMemoryStore::default();
        let user_id = Uuid::new_v4();
        let kept = store.add_product("Hojicha", "120");
        let gone = store.add_product("Genmaicha", "90");
        let mut cart = Cart::new(user_id, Utc::now());
        cart.add_item(kept.id, 2, None, Utc::now()).unwrap();
        cart.add_item(gone.id, 1, None, Utc::now()).unwrap();
        store.put_cart(cart);
        store.delete_product(gone.id);

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user_id, None), Utc::now())
            .unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_id, kept.id);
        assert_eq!(order.subtotal, dec("240"));
        assert_eq!(order.total, dec("240"));
    }

    #[test]
    fn deleted_product_aborts_checkout_under_reject_policy() {
        let store = InMemoryStore::default();
        let user_id = Uuid::new_v4();
        let gone = store.add_product("Genmaicha", "90");
        let mut cart = Cart::new(user_id, Utc::now());
        cart.add_item(gone.id, 1, None, Utc::now()).unwrap();
        store.put_cart(cart);
        store.delete_product(gone.id);

        let policy = CheckoutPolicy {
            missing_product: MissingProductPolicy::Reject,
            ..CheckoutPolicy::default()
        };
        let err = service(&store, policy)
            .checkout(request(user_id, None), Utc::now())
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("Product")));
        assert_eq!(store.order_count(), 0);
        assert!(!store.cart_of(user_id).unwrap().is_empty());
    }

    #[test]
    fn empty_or_missing_cart_is_rejected_before_writing() {
        let store = InMemoryStore::default();
        let svc = service(&store, CheckoutPolicy::default());

        let no_cart = svc.checkout(request(Uuid::new_v4(), None), Utc::now());
        assert!(matches!(no_cart, Err(DomainError::InvalidInput(_))));

        let user_id = Uuid::new_v4();
        store.put_cart(Cart::new(user_id, Utc::now()));
        let empty = svc.checkout(request(user_id, None), Utc::now());
        assert!(matches!(empty, Err(DomainError::InvalidInput(_))));
        assert_eq!(store.order_count(), 0);
    }

    /// Serves a coupon snapshot read before a concurrent checkout used it up.
    struct StaleCoupons {
        store: InMemoryStore,
        snapshot: Coupon,
    }

    impl CouponRepository for StaleCoupons {
        fn list(&self) -> Result<Vec<Coupon>, DomainError> {
            CouponRepository::list(&self.store)
        }
        fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, DomainError> {
            CouponRepository::find_by_id(&self.store, id)
        }
        fn find_by_code(&self, _code: &str) -> Result<Option<Coupon>, DomainError> {
            Ok(Some(self.snapshot.clone()))
        }
        fn create(
            &self,
            draft: crate::domain::coupon::CouponDraft,
        ) -> Result<Coupon, DomainError> {
            self.store.create(draft)
        }
        fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
            self.store.update(coupon)
        }
        fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
            self.store.delete(id)
        }
        fn increment_usage(&self, id: Uuid) -> Result<bool, DomainError> {
            self.store.increment_usage(id)
        }
    }

    fn race_fixture() -> (InMemoryStore, Uuid, StaleCoupons) {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "100", 1);
        let snapshot = Coupon {
            usage_limit: 1,
            ..coupon("LAST", CouponKind::Fixed, "10")
        };
        store.put_coupon(Coupon {
            used_count: 1,
            ..snapshot.clone()
        });
        let coupons = StaleCoupons {
            store: store.clone(),
            snapshot,
        };
        (store, user, coupons)
    }

    #[test]
    fn coupon_used_up_mid_checkout_falls_back_to_full_price() {
        let (store, user, coupons) = race_fixture();
        let coupon_id = coupons.snapshot.id;
        let svc = CheckoutService::new(
            store.clone(),
            store.clone(),
            coupons,
            store.clone(),
            CheckoutPolicy::default(),
        );

        let order = svc.checkout(request(user, Some("LAST")), Utc::now()).unwrap();

        assert_eq!(order.discount, BigDecimal::zero());
        assert_eq!(order.total, dec("100"));
        assert_eq!(store.coupon(coupon_id).unwrap().used_count, 1);
        assert_eq!(store.order_count(), 1);
        assert!(store.cart_of(user).unwrap().is_empty());
    }

    #[test]
    fn coupon_used_up_mid_checkout_fails_under_reject_policy() {
        let (store, user, coupons) = race_fixture();
        let policy = CheckoutPolicy {
            invalid_coupon: InvalidCouponPolicy::Reject,
            ..CheckoutPolicy::default()
        };
        let svc = CheckoutService::new(store.clone(), store.clone(), coupons, store.clone(), policy);

        let err = svc
            .checkout(request(user, Some("LAST")), Utc::now())
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::CouponRejected(Rejection::UsageLimitReached)
        ));
        assert_eq!(store.order_count(), 0);
        assert!(!store.cart_of(user).unwrap().is_empty());
    }

    #[test]
    fn invalid_coupon_aborts_under_reject_policy() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "499", 1);
        store.put_coupon(matcha10());

        let policy = CheckoutPolicy {
            invalid_coupon: InvalidCouponPolicy::Reject,
            ..CheckoutPolicy::default()
        };
        let err = service(&store, policy)
            .checkout(request(user, Some("MATCHA10")), Utc::now())
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::CouponRejected(Rejection::BelowMinimum { .. })
        ));
        assert_eq!(store.order_count(), 0);
    }

    #[test]
    fn blank_coupon_code_means_no_coupon() {
        let store = InMemoryStore::default();
        let user = cart_with(&store, "10", 1);

        let order = service(&store, CheckoutPolicy::default())
            .checkout(request(user, Some("   ")), Utc::now())
            .unwrap();

        assert_eq!(order.coupon_code, None);
        assert_eq!(order.total, dec("10"));
    }
}
