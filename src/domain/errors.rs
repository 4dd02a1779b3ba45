use thiserror::Error;

use super::coupon::Rejection;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Coupon rejected: {0}")]
    CouponRejected(Rejection),
    /// The guarded usage increment found the coupon already at its limit.
    #[error("Coupon usage limit reached")]
    CouponExhausted,
    #[error("Internal error: {0}")]
    Internal(String),
}
