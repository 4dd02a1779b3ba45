use bigdecimal::BigDecimal;
use uuid::Uuid;

/// The live catalog view of a product that checkout prices against.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}
