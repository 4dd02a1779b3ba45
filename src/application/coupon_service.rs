use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::coupon::{normalize_code, Coupon, CouponDraft, ExpiryPolicy, Rejection};
use crate::domain::errors::DomainError;
use crate::domain::order::Caller;
use crate::domain::ports::CouponRepository;

/// A coupon that passed validation together with what it would take off.
#[derive(Debug, Clone)]
pub struct CouponQuote {
    pub coupon: Coupon,
    pub discount: BigDecimal,
}

pub struct CouponService<K> {
    coupons: K,
    expiry_policy: ExpiryPolicy,
}

impl<K: CouponRepository> CouponService<K> {
    pub fn new(coupons: K, expiry_policy: ExpiryPolicy) -> Self {
        Self {
            coupons,
            expiry_policy,
        }
    }

    pub fn list(&self, caller: &Caller) -> Result<Vec<Coupon>, DomainError> {
        caller.require_admin()?;
        self.coupons.list()
    }

    pub fn get(&self, caller: &Caller, id: Uuid) -> Result<Coupon, DomainError> {
        caller.require_admin()?;
        self.find(id)
    }

    fn find(&self, id: Uuid) -> Result<Coupon, DomainError> {
        self.coupons
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Coupon"))
    }

    pub fn create(&self, caller: &Caller, draft: CouponDraft) -> Result<Coupon, DomainError> {
        caller.require_admin()?;
        let draft = draft.validated()?;
        if self.coupons.find_by_code(&draft.code)?.is_some() {
            return Err(DomainError::Conflict(format!(
                "coupon code {} already exists",
                draft.code
            )));
        }
        let coupon = self.coupons.create(draft)?;
        log::info!("Created coupon {} ({})", coupon.code, coupon.id);
        Ok(coupon)
    }

    pub fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        draft: CouponDraft,
    ) -> Result<Coupon, DomainError> {
        caller.require_admin()?;
        let draft = draft.validated()?;
        let mut coupon = self.find(id)?;

        if draft.code != coupon.code {
            if let Some(other) = self.coupons.find_by_code(&draft.code)? {
                if other.id != id {
                    return Err(DomainError::Conflict(format!(
                        "coupon code {} already exists",
                        draft.code
                    )));
                }
            }
        }

        coupon.apply_draft(draft);
        self.coupons.update(&coupon)
    }

    pub fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        caller.require_admin()?;
        if !self.coupons.delete(id)? {
            return Err(DomainError::NotFound("Coupon"));
        }
        log::info!("Deleted coupon {id}");
        Ok(())
    }

    /// Checks a code against an order amount without consuming a use.
    pub fn validate_code(
        &self,
        code: &str,
        order_amount: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<CouponQuote, DomainError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(DomainError::InvalidInput("coupon code is required".into()));
        }
        if *order_amount < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "order amount must not be negative".into(),
            ));
        }

        let coupon = self
            .coupons
            .find_by_code(&code)?
            .ok_or(DomainError::NotFound("Coupon"))?;
        coupon
            .validate(order_amount, now, self.expiry_policy)
            .map_err(DomainError::CouponRejected)?;

        let discount = coupon.calculate_discount(order_amount);
        Ok(CouponQuote { coupon, discount })
    }

    /// Counts one use of the coupon outside checkout, e.g. a redemption made
    /// by another channel. Checkout counts its own use inside
    /// `OrderRepository::place`. Refuses once the limit is reached.
    pub fn increment_usage(&self, id: Uuid) -> Result<(), DomainError> {
        if self.coupons.increment_usage(id)? {
            return Ok(());
        }
        match self.coupons.find_by_id(id)? {
            Some(_) => Err(DomainError::CouponRejected(Rejection::UsageLimitReached)),
            None => Err(DomainError::NotFound("Coupon")),
        }
    }
}
