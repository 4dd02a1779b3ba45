pub mod cart_service;
pub mod checkout_service;
pub mod coupon_service;
pub mod order_service;

#[cfg(test)]
pub(crate) mod test_support;
