use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::{CartLine, CartView};
use crate::domain::cart::Variant;
use crate::domain::order::Caller;
use crate::errors::AppError;

use super::{parse_decimal, AppState};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct VariantRequest {
    pub name: String,
    /// Decimal as a string. Informational only; checkout uses the product price.
    pub price: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    /// Defaults to 1
    pub quantity: Option<i32>,
    pub variant: Option<VariantRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemCountResponse {
    pub item_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub name: String,
    pub price: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub variant: Option<VariantResponse>,
    /// Null once the product has been removed from the catalog
    pub product: Option<ProductResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub item_count: i64,
    pub subtotal: String,
    pub updated_at: String,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        CartItemResponse {
            id: line.item.id,
            product_id: line.item.product_id,
            quantity: line.item.quantity,
            variant: line.item.variant.map(|v| VariantResponse {
                name: v.name,
                price: v.price.map(|p| p.to_string()),
            }),
            product: line.product.map(|p| ProductResponse {
                id: p.id,
                name: p.name,
                price: p.price.to_string(),
            }),
        }
    }
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        CartResponse {
            id: view.id,
            items: view.lines.into_iter().map(CartItemResponse::from).collect(),
            item_count: view.item_count,
            subtotal: view.subtotal.to_string(),
            updated_at: view.updated_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns the caller's cart, creating an empty one on first access.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Missing identity"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<HttpResponse, AppError> {
    let view = web::block(move || state.carts.view(caller.user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}

/// POST /cart/items
///
/// Adding a product already in the cart with the same variant increases that
/// line's quantity.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added", body = ItemCountResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let variant = body
        .variant
        .map(|v| -> Result<Variant, AppError> {
            Ok(Variant {
                price: v
                    .price
                    .as_deref()
                    .map(|raw| parse_decimal("variant price", raw))
                    .transpose()?,
                name: v.name,
            })
        })
        .transpose()?;
    let quantity = body.quantity.unwrap_or(1);

    let item_count = web::block(move || {
        state
            .carts
            .add_item(caller.user_id, body.product_id, quantity, variant, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ItemCountResponse { item_count }))
}

/// PUT /cart/items/{id}
#[utoipa::path(
    put,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item UUID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ItemCountResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Item not in cart"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let quantity = body.quantity;

    let item_count = web::block(move || {
        state
            .carts
            .update_item(caller.user_id, item_id, quantity, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ItemCountResponse { item_count }))
}

/// DELETE /cart/items/{id}
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item UUID")),
    responses(
        (status = 200, description = "Item removed", body = ItemCountResponse),
        (status = 404, description = "Item not in cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();

    let item_count =
        web::block(move || state.carts.remove_item(caller.user_id, item_id, Utc::now()))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ItemCountResponse { item_count }))
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    responses((status = 204, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<HttpResponse, AppError> {
    web::block(move || state.carts.clear(caller.user_id, Utc::now()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
