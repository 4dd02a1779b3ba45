use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::checkout::{CheckoutPolicy, InvalidCouponPolicy, MissingProductPolicy};
use crate::domain::coupon::ExpiryPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub policy: CheckoutPolicy,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: try_load(&lookup, "PORT", 8080)?,
            policy: CheckoutPolicy {
                missing_product: try_load(
                    &lookup,
                    "MISSING_PRODUCT_POLICY",
                    MissingProductPolicy::default(),
                )?,
                invalid_coupon: try_load(
                    &lookup,
                    "INVALID_COUPON_POLICY",
                    InvalidCouponPolicy::default(),
                )?,
                malformed_expiry: try_load(
                    &lookup,
                    "MALFORMED_EXPIRY_POLICY",
                    ExpiryPolicy::default(),
                )?,
            },
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => {
            log::info!("{key} not set, using default");
            Ok(default)
        }
    }
}
