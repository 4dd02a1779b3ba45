//! Pricing rules shared by the cart view and checkout: turning cart lines
//! into frozen order lines, and deciding whether a submitted coupon applies.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::CartItem;
use super::coupon::{Coupon, ExpiryPolicy};
use super::errors::DomainError;
use super::money;
use super::order::{AppliedCoupon, OrderLineItem};
use super::product::Product;

/// What happens to a cart line whose product no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingProductPolicy {
    /// Drop the line silently.
    #[default]
    Skip,
    Reject,
}

impl FromStr for MissingProductPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingProductPolicy::Skip),
            "reject" => Ok(MissingProductPolicy::Reject),
            other => Err(format!("expected 'skip' or 'reject', got '{other}'")),
        }
    }
}

/// What happens at checkout when the submitted coupon is unknown or not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidCouponPolicy {
    /// Check out without a discount.
    #[default]
    Ignore,
    Reject,
}

impl FromStr for InvalidCouponPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(InvalidCouponPolicy::Ignore),
            "reject" => Ok(InvalidCouponPolicy::Reject),
            other => Err(format!("expected 'ignore' or 'reject', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckoutPolicy {
    pub missing_product: MissingProductPolicy,
    pub invalid_coupon: InvalidCouponPolicy,
    pub malformed_expiry: ExpiryPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<OrderLineItem>,
    pub subtotal: BigDecimal,
}

/// Prices every cart line at the product's current price. Cart-side variant
/// prices are not consulted. Line totals and the subtotal must fit a money
/// column.
pub fn price_cart(
    items: &[CartItem],
    products: &HashMap<Uuid, Product>,
    policy: MissingProductPolicy,
) -> Result<PricedCart, DomainError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = BigDecimal::zero();

    for item in items {
        let Some(product) = products.get(&item.product_id) else {
            match policy {
                MissingProductPolicy::Skip => {
                    log::warn!(
                        "Dropping cart line {}: product {} no longer exists",
                        item.id,
                        item.product_id
                    );
                    continue;
                }
                MissingProductPolicy::Reject => return Err(DomainError::NotFound("Product")),
            }
        };

        let total = &product.price * BigDecimal::from(item.quantity);
        subtotal += &total;
        if !money::fits(&total) || !money::fits(&subtotal) {
            return Err(DomainError::InvalidInput(format!(
                "order total exceeds {}",
                money::max_amount()
            )));
        }
        lines.push(OrderLineItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            quantity: item.quantity,
            variant: item.variant.as_ref().map(|v| v.name.clone()),
            total,
        });
    }

    Ok(PricedCart { lines, subtotal })
}

/// What an order charges.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
}

impl Totals {
    pub fn new(subtotal: BigDecimal, discount: BigDecimal) -> Self {
        let total = &subtotal - &discount;
        Self {
            subtotal,
            discount,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponOutcome {
    Applied {
        coupon: AppliedCoupon,
        discount: BigDecimal,
    },
    Ignored {
        reason: String,
    },
}

impl CouponOutcome {
    pub fn discount(&self) -> BigDecimal {
        match self {
            CouponOutcome::Applied { discount, .. } => discount.clone(),
            CouponOutcome::Ignored { .. } => BigDecimal::zero(),
        }
    }

    pub fn applied(&self) -> Option<&AppliedCoupon> {
        match self {
            CouponOutcome::Applied { coupon, .. } => Some(coupon),
            CouponOutcome::Ignored { .. } => None,
        }
    }
}

/// Decides the discount for a looked-up coupon against the cart subtotal.
/// Unknown and invalid coupons either yield no discount or an error,
/// depending on the policy.
pub fn decide_coupon(
    coupon: Option<&Coupon>,
    subtotal: &BigDecimal,
    now: DateTime<Utc>,
    policy: &CheckoutPolicy,
) -> Result<CouponOutcome, DomainError> {
    let Some(coupon) = coupon else {
        return match policy.invalid_coupon {
            InvalidCouponPolicy::Ignore => Ok(CouponOutcome::Ignored {
                reason: "coupon not found".into(),
            }),
            InvalidCouponPolicy::Reject => Err(DomainError::NotFound("Coupon")),
        };
    };

    match coupon.validate(subtotal, now, policy.malformed_expiry) {
        Ok(()) => Ok(CouponOutcome::Applied {
            coupon: AppliedCoupon {
                id: coupon.id,
                code: coupon.code.clone(),
            },
            discount: coupon.calculate_discount(subtotal),
        }),
        Err(rejection) => match policy.invalid_coupon {
            InvalidCouponPolicy::Ignore => Ok(CouponOutcome::Ignored {
                reason: rejection.to_string(),
            }),
            InvalidCouponPolicy::Reject => Err(DomainError::CouponRejected(rejection)),
        },
    }
}
