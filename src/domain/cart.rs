use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{check_amount, MAX_QUANTITY};

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub price: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub variant: Option<Variant>,
}

impl CartItem {
    fn variant_name(&self) -> &str {
        self.variant.as_ref().map_or("", |v| v.name.as_str())
    }
}

/// A user's cart. Exactly one per user; lines keep insertion order.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

fn check_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidInput(
            "quantity must be at least 1".into(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(DomainError::InvalidInput(format!(
            "quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

fn check_variant(variant: &Variant) -> Result<(), DomainError> {
    match &variant.price {
        Some(price) if *price < BigDecimal::zero() => Err(
            DomainError::InvalidInput("variant price must not be negative".into()),
        ),
        Some(price) => check_amount("variant price", price),
        None => Ok(()),
    }
}

impl Cart {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Adds `quantity` of a product. A line with the same product and variant
    /// name absorbs the quantity instead of a new line being appended.
    pub fn add_item(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        variant: Option<Variant>,
        now: DateTime<Utc>,
    ) -> Result<Uuid, DomainError> {
        check_quantity(quantity)?;
        if let Some(variant) = &variant {
            check_variant(variant)?;
        }
        let variant_name = variant.as_ref().map_or("", |v| v.name.as_str());

        let existing = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id && i.variant_name() == variant_name);

        let id = match existing {
            Some(item) => {
                let merged = item.quantity.saturating_add(quantity);
                check_quantity(merged)?;
                item.quantity = merged;
                item.id
            }
            None => {
                let id = Uuid::new_v4();
                self.items.push(CartItem {
                    id,
                    product_id,
                    quantity,
                    variant,
                });
                id
            }
        };

        self.updated_at = now;
        Ok(id)
    }

    pub fn update_item(
        &mut self,
        item_id: Uuid,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        check_quantity(quantity)?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(DomainError::NotFound("Cart item"))?;
        item.quantity = quantity;
        self.updated_at = now;
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(DomainError::NotFound("Cart item"));
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.items.clear();
        self.updated_at = now;
    }
}
