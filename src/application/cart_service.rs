use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, Variant};
use crate::domain::checkout::{price_cart, MissingProductPolicy};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductCatalog};
use crate::domain::product::Product;

#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    /// `None` once the product has been removed from the catalog.
    pub product: Option<Product>,
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub lines: Vec<CartLine>,
    pub item_count: i64,
    /// Priced at live product prices; lines without a product contribute nothing.
    pub subtotal: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

pub struct CartService<C, P> {
    carts: C,
    products: P,
}

impl<C: CartRepository, P: ProductCatalog> CartService<C, P> {
    pub fn new(carts: C, products: P) -> Self {
        Self { carts, products }
    }

    pub fn view(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let cart = self.carts.get_or_create(user_id)?;
        let products = self.products.find_by_ids(&cart.product_ids())?;
        let priced = price_cart(&cart.items, &products, MissingProductPolicy::Skip)?;

        Ok(CartView {
            id: cart.id,
            item_count: cart.item_count(),
            subtotal: priced.subtotal,
            updated_at: cart.updated_at,
            lines: cart
                .items
                .into_iter()
                .map(|item| CartLine {
                    product: products.get(&item.product_id).cloned(),
                    item,
                })
                .collect(),
        })
    }

    /// Returns the cart's new item count.
    pub fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        variant: Option<Variant>,
        now: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        if self.products.find_by_id(product_id)?.is_none() {
            return Err(DomainError::NotFound("Product"));
        }
        self.mutate(user_id, |cart| {
            cart.add_item(product_id, quantity, variant, now).map(|_| ())
        })
    }

    pub fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        self.mutate(user_id, |cart| cart.update_item(item_id, quantity, now))
    }

    pub fn remove_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        self.mutate(user_id, |cart| cart.remove_item(item_id, now))
    }

    pub fn clear(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.mutate(user_id, |cart| {
            cart.clear(now);
            Ok(())
        })
        .map(|_| ())
    }

    fn mutate<F>(&self, user_id: Uuid, change: F) -> Result<i64, DomainError>
    where
        F: FnOnce(&mut Cart) -> Result<(), DomainError>,
    {
        let mut cart = self.carts.get_or_create(user_id)?;
        change(&mut cart)?;
        self.carts.save(&cart)?;
        Ok(cart.item_count())
    }
}
