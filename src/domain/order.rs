use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Lifecycle of an order. Only `Paid` has a dedicated entry point (a stored
/// payment slip); administrators may set any status at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Confirmed,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order status '{s}'")))
    }
}

/// One purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub variant: Option<String>,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub note: String,
}

/// A coupon whose discount was granted and whose usage must be counted.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon {
    pub id: Uuid,
    pub code: String,
}

/// Everything needed to persist an order. `applied_coupon` is `None` when no
/// discount was granted, even if a code was submitted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub lines: Vec<OrderLineItem>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
    pub coupon_code: Option<String>,
    pub applied_coupon: Option<AppliedCoupon>,
    pub contact: CustomerContact,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lines: Vec<OrderLineItem>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub coupon_code: Option<String>,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub payment_slip: String,
    pub contact: CustomerContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, order: &Order) -> bool {
        self.is_admin() || order.user_id == self.user_id
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("administrator role required".into()))
        }
    }
}

const SLIP_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Payment slips must be images.
pub fn check_slip_path(path: &str) -> Result<(), DomainError> {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if path.trim().is_empty() || !SLIP_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DomainError::InvalidInput(
            "payment slip must be a JPG, PNG or WEBP image".into(),
        ));
    }
    Ok(())
}
