use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::errors::DomainError;
use super::money::check_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponKind {
    Percentage,
    Fixed,
}

impl CouponKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CouponKind::Percentage => "percentage",
            CouponKind::Fixed => "fixed",
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CouponKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(CouponKind::Percentage),
            "fixed" => Ok(CouponKind::Fixed),
            other => Err(DomainError::InvalidInput(format!(
                "unknown coupon type '{other}'"
            ))),
        }
    }
}

/// What to do with an `expires_at` value none of the known formats can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    #[default]
    TreatAsNoExpiry,
    Reject,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" | "no-expiry" => Ok(ExpiryPolicy::TreatAsNoExpiry),
            "reject" => Ok(ExpiryPolicy::Reject),
            other => Err(format!("expected 'ignore' or 'reject', got '{other}'")),
        }
    }
}

/// Why a coupon cannot be applied. Only the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("coupon not active")]
    Inactive,
    #[error("expired")]
    Expired,
    #[error("usage limit reached")]
    UsageLimitReached,
    #[error("below minimum order amount {minimum}")]
    BelowMinimum { minimum: BigDecimal },
    #[error("invalid expiry date '{0}'")]
    MalformedExpiry(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
    Malformed,
}

/// Reads the loosely formatted expiry strings coupons carry. Empty means never.
pub fn parse_expiry(raw: &str) -> Expiry {
    let raw = raw.trim();
    if raw.is_empty() {
        return Expiry::Never;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Expiry::At(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Expiry::At(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Expiry::At(naive.and_utc()))
        .unwrap_or(Expiry::Malformed)
}

/// Coupon codes are compared case-insensitively and stored uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub kind: CouponKind,
    pub value: BigDecimal,
    /// Zero means no minimum.
    pub min_order_amount: BigDecimal,
    /// Zero means unlimited.
    pub usage_limit: i32,
    pub used_count: i32,
    /// Empty means the coupon never expires.
    pub expires_at: String,
    pub active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Runs the eligibility checks in order: active, expiry, usage limit,
    /// minimum amount. The minimum is inclusive.
    pub fn validate(
        &self,
        order_amount: &BigDecimal,
        now: DateTime<Utc>,
        expiry_policy: ExpiryPolicy,
    ) -> Result<(), Rejection> {
        if !self.active {
            return Err(Rejection::Inactive);
        }

        match parse_expiry(&self.expires_at) {
            Expiry::At(at) if at < now => return Err(Rejection::Expired),
            Expiry::Malformed if expiry_policy == ExpiryPolicy::Reject => {
                return Err(Rejection::MalformedExpiry(self.expires_at.clone()));
            }
            _ => {}
        }

        if self.usage_limit > 0 && self.used_count >= self.usage_limit {
            return Err(Rejection::UsageLimitReached);
        }

        if self.min_order_amount > BigDecimal::zero() && *order_amount < self.min_order_amount {
            return Err(Rejection::BelowMinimum {
                minimum: self.min_order_amount.clone(),
            });
        }

        Ok(())
    }

    pub fn is_valid(
        &self,
        order_amount: &BigDecimal,
        now: DateTime<Utc>,
        expiry_policy: ExpiryPolicy,
    ) -> bool {
        self.validate(order_amount, now, expiry_policy).is_ok()
    }

    /// Discount for `order_amount`. Only meaningful after [`Coupon::validate`]
    /// succeeded. Percentages round half-up to cents; fixed amounts never
    /// exceed the order amount.
    pub fn calculate_discount(&self, order_amount: &BigDecimal) -> BigDecimal {
        match self.kind {
            CouponKind::Percentage => (order_amount * &self.value / BigDecimal::from(100))
                .with_scale_round(2, RoundingMode::HalfUp),
            CouponKind::Fixed => {
                if self.value < *order_amount {
                    self.value.clone()
                } else {
                    order_amount.clone()
                }
            }
        }
    }

    pub fn apply_draft(&mut self, draft: CouponDraft) {
        self.code = draft.code;
        self.kind = draft.kind;
        self.value = draft.value;
        self.min_order_amount = draft.min_order_amount;
        self.usage_limit = draft.usage_limit;
        self.expires_at = draft.expires_at;
        self.active = draft.active;
    }
}

/// The administrator-editable part of a coupon.
#[derive(Debug, Clone)]
pub struct CouponDraft {
    pub code: String,
    pub kind: CouponKind,
    pub value: BigDecimal,
    pub min_order_amount: BigDecimal,
    pub usage_limit: i32,
    pub expires_at: String,
    pub active: bool,
}

impl CouponDraft {
    /// Normalizes the code and rejects values the calculator would turn into
    /// negative totals or that the money columns cannot hold exactly.
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.code = normalize_code(&self.code);
        self.expires_at = self.expires_at.trim().to_string();

        if self.code.is_empty() {
            return Err(DomainError::InvalidInput("coupon code is required".into()));
        }
        if self.value < BigDecimal::zero() {
            return Err(DomainError::InvalidInput("value must not be negative".into()));
        }
        check_amount("value", &self.value)?;
        if self.kind == CouponKind::Percentage && self.value > BigDecimal::from(100) {
            return Err(DomainError::InvalidInput(
                "percentage value must not exceed 100".into(),
            ));
        }
        if self.min_order_amount < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "minimum order amount must not be negative".into(),
            ));
        }
        check_amount("minimum order amount", &self.min_order_amount)?;
        if self.usage_limit < 0 {
            return Err(DomainError::InvalidInput(
                "usage limit must not be negative".into(),
            ));
        }
        if parse_expiry(&self.expires_at) == Expiry::Malformed {
            return Err(DomainError::InvalidInput(format!(
                "unrecognised expiry date '{}'",
                self.expires_at
            )));
        }

        Ok(self)
    }
}
