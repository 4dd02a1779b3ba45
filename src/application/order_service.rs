use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{check_slip_path, Caller, Order, OrderFilter, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::domain::stats::SalesStats;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Administrators see every order; customers only their own.
    pub fn list_orders(
        &self,
        caller: &Caller,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let filter = OrderFilter {
            user_id: (!caller.is_admin()).then_some(caller.user_id),
            status,
        };
        self.repo.list(&filter)
    }

    pub fn get_order(&self, caller: &Caller, id: Uuid) -> Result<Order, DomainError> {
        let order = self
            .repo
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Order"))?;
        if !caller.can_access(&order) {
            return Err(DomainError::Forbidden("not your order".into()));
        }
        Ok(order)
    }

    /// Any status may follow any other; there is no enforced transition graph.
    pub fn update_status(
        &self,
        caller: &Caller,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        caller.require_admin()?;
        let order = self
            .repo
            .update_status(id, status)?
            .ok_or(DomainError::NotFound("Order"))?;
        log::info!("Order {id} set to {status}");
        Ok(order)
    }

    /// Called once the upload collaborator has stored the slip at `slip_path`.
    pub fn attach_payment_slip(
        &self,
        caller: &Caller,
        id: Uuid,
        slip_path: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        self.get_order(caller, id)?;
        check_slip_path(slip_path)?;
        let order = self
            .repo
            .record_payment(id, slip_path, now)?
            .ok_or(DomainError::NotFound("Order"))?;
        log::info!("Order {id} paid, slip stored at {slip_path}");
        Ok(order)
    }

    pub fn sales_stats(&self, caller: &Caller) -> Result<SalesStats, DomainError> {
        caller.require_admin()?;
        self.repo.sales_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryStore;
    use crate::domain::coupon::tests::dec;
    use crate::domain::order::{CustomerContact, NewOrder, OrderLineItem};

    fn place(store: &InMemoryStore, user_id: Uuid) -> Order {
        let line = OrderLineItem {
            product_id: Uuid::new_v4(),
            name: "Matcha".into(),
            price: dec("10"),
            quantity: 2,
            variant: None,
            total: dec("20"),
        };
        store
            .place(
                NewOrder {
                    user_id,
                    lines: vec![line],
                    subtotal: dec("20"),
                    discount: dec("0"),
                    total: dec("20"),
                    coupon_code: None,
                    applied_coupon: None,
                    contact: CustomerContact::default(),
                },
                Uuid::new_v4(),
            )
            .unwrap()
    }

    #[test]
    fn customers_list_only_their_orders() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let alice = Uuid::new_v4();
        place(&store, alice);
        place(&store, alice);
        place(&store, Uuid::new_v4());

        assert_eq!(svc.list_orders(&Caller::customer(alice), None).unwrap().len(), 2);
        assert_eq!(
            svc.list_orders(&Caller::admin(Uuid::new_v4()), None)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn status_filter_applies() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let admin = Caller::admin(Uuid::new_v4());
        let first = place(&store, Uuid::new_v4());
        place(&store, Uuid::new_v4());
        svc.update_status(&admin, first.id, OrderStatus::Shipped).unwrap();

        let shipped = svc
            .list_orders(&admin, Some(OrderStatus::Shipped))
            .unwrap();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].id, first.id);
    }

    #[test]
    fn foreign_order_is_forbidden() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let order = place(&store, Uuid::new_v4());

        assert!(matches!(
            svc.get_order(&Caller::customer(Uuid::new_v4()), order.id),
            Err(DomainError::Forbidden(_))
        ));
        assert!(svc
            .get_order(&Caller::customer(order.user_id), order.id)
            .is_ok());
        assert!(matches!(
            svc.get_order(&Caller::admin(Uuid::new_v4()), Uuid::new_v4()),
            Err(DomainError::NotFound("Order"))
        ));
    }

    #[test]
    fn admin_may_set_any_status_in_any_order() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let admin = Caller::admin(Uuid::new_v4());
        let order = place(&store, Uuid::new_v4());

        for status in [
            OrderStatus::Completed,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            OrderStatus::Shipped,
        ] {
            assert_eq!(svc.update_status(&admin, order.id, status).unwrap().status, status);
        }
        assert!(matches!(
            svc.update_status(&Caller::customer(order.user_id), order.id, OrderStatus::Paid),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn payment_slip_marks_order_paid() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let order = place(&store, Uuid::new_v4());
        let owner = Caller::customer(order.user_id);
        let now = Utc::now();

        let paid = svc
            .attach_payment_slip(&owner, order.id, "/uploads/slips/slip_1.png", now)
            .unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.paid_at, Some(now));
        assert_eq!(paid.payment_slip, "/uploads/slips/slip_1.png");
        assert_eq!(paid.total, order.total);
    }

    #[test]
    fn payment_slip_checks_owner_and_extension() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let order = place(&store, Uuid::new_v4());

        assert!(matches!(
            svc.attach_payment_slip(
                &Caller::customer(Uuid::new_v4()),
                order.id,
                "slip.png",
                Utc::now()
            ),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.attach_payment_slip(
                &Caller::customer(order.user_id),
                order.id,
                "slip.gif",
                Utc::now()
            ),
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(
            svc.get_order(&Caller::customer(order.user_id), order.id)
                .unwrap()
                .status,
            OrderStatus::Pending
        );
    }

    #[test]
    fn sales_stats_are_for_admins_and_count_completed_orders() {
        let store = InMemoryStore::default();
        let svc = OrderService::new(store.clone());
        let admin = Caller::admin(Uuid::new_v4());
        let done = place(&store, Uuid::new_v4());
        let waiting = place(&store, Uuid::new_v4());
        place(&store, Uuid::new_v4());
        svc.update_status(&admin, done.id, OrderStatus::Completed).unwrap();
        svc.attach_payment_slip(&admin, waiting.id, "slip.jpg", Utc::now())
            .unwrap();

        let stats = svc.sales_stats(&admin).unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue, dec("20"));
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.paid_orders, 1);
        assert_eq!(stats.product_sales.len(), 1);
        assert_eq!(stats.daily_sales.len(), 1);

        assert!(matches!(
            svc.sales_stats(&Caller::customer(done.user_id)),
            Err(DomainError::Forbidden(_))
        ));
    }
}
