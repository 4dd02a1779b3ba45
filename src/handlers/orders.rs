use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::checkout_service::CheckoutRequest;
use crate::domain::order::{Caller, CustomerContact, Order, OrderLineItem, OrderStatus};
use crate::domain::stats::{DailySales, ProductSales, SalesStats};
use crate::errors::AppError;

use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Optional. Unknown or ineligible codes are ignored unless the server
    /// runs with INVALID_COUPON_POLICY=reject.
    pub coupon_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub note: Option<String>,
}

impl CreateOrderRequest {
    fn into_checkout(self, user_id: Uuid) -> CheckoutRequest {
        CheckoutRequest {
            user_id,
            coupon_code: self.coupon_code,
            contact: CustomerContact {
                name: self.customer_name.unwrap_or_default(),
                email: self.customer_email.unwrap_or_default(),
                phone: self.customer_phone.unwrap_or_default(),
                shipping_address: self.shipping_address.unwrap_or_default(),
                note: self.note.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub price: String,
    pub quantity: i32,
    pub variant: Option<String>,
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLineResponse>,
    pub subtotal: String,
    pub discount: String,
    pub coupon_code: Option<String>,
    pub total: String,
    pub status: String,
    pub payment_slip: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
    pub paid_at: Option<String>,
}

impl From<OrderLineItem> for OrderLineResponse {
    fn from(l: OrderLineItem) -> Self {
        OrderLineResponse {
            product_id: l.product_id,
            name: l.name,
            price: l.price.to_string(),
            quantity: l.quantity,
            variant: l.variant,
            total: l.total.to_string(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id,
            user_id: o.user_id,
            items: o.lines.into_iter().map(OrderLineResponse::from).collect(),
            subtotal: o.subtotal.to_string(),
            discount: o.discount.to_string(),
            coupon_code: o.coupon_code,
            total: o.total.to_string(),
            status: o.status.to_string(),
            payment_slip: o.payment_slip,
            customer_name: o.contact.name,
            customer_email: o.contact.email,
            customer_phone: o.contact.phone,
            shipping_address: o.contact.shipping_address,
            note: o.contact.note,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            paid_at: o.paid_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Only orders in this status, e.g. "pending"
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachSlipRequest {
    /// Where the upload service stored the slip image
    pub slip_path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSalesResponse {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySalesResponse {
    /// UTC date, e.g. "2025-06-01"
    pub date: String,
    pub revenue: String,
    pub orders: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesStatsResponse {
    /// Sum of completed order totals
    pub total_revenue: String,
    pub total_orders: i64,
    pub total_items: i64,
    pub pending_orders: i64,
    pub paid_orders: i64,
    pub product_sales: Vec<ProductSalesResponse>,
    pub daily_sales: Vec<DailySalesResponse>,
}

impl From<ProductSales> for ProductSalesResponse {
    fn from(p: ProductSales) -> Self {
        ProductSalesResponse {
            product_id: p.product_id,
            name: p.name,
            quantity: p.quantity,
            revenue: p.revenue.to_string(),
        }
    }
}

impl From<DailySales> for DailySalesResponse {
    fn from(d: DailySales) -> Self {
        DailySalesResponse {
            date: d.date.to_string(),
            revenue: d.revenue.to_string(),
            orders: d.orders,
        }
    }
}

impl From<SalesStats> for SalesStatsResponse {
    fn from(s: SalesStats) -> Self {
        SalesStatsResponse {
            total_revenue: s.total_revenue.to_string(),
            total_orders: s.total_orders,
            total_items: s.total_items,
            pending_orders: s.pending_orders,
            paid_orders: s.paid_orders,
            product_sales: s.product_sales.into_iter().map(Into::into).collect(),
            daily_sales: s.daily_sales.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Checks out the caller's cart. Lines are priced at current product prices,
/// products that no longer exist are dropped, and the coupon use, order and
/// cart clear are committed together.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Cart empty or coupon rejected"),
        (status = 401, description = "Missing identity"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_checkout(caller.user_id);

    let order = web::block(move || state.checkout.checkout(request, Utc::now()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Administrators see every order, customers only their own. Newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "Orders visible to the caller", body = [OrderResponse]),
        (status = 400, description = "Unknown status"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    caller: Caller,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let status = query
        .into_inner()
        .status
        .map(|s| s.parse::<OrderStatus>())
        .transpose()?;

    let orders = web::block(move || state.orders.list_orders(&caller, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let order = web::block(move || state.orders.get_order(&caller, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/status
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status: OrderStatus = body.status.trim().parse()?;

    let order = web::block(move || state.orders.update_status(&caller, id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/slip
///
/// Records a stored payment slip and marks the order paid.
#[utoipa::path(
    post,
    path = "/orders/{id}/slip",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = AttachSlipRequest,
    responses(
        (status = 200, description = "Slip recorded", body = OrderResponse),
        (status = 400, description = "Slip is not a JPG, PNG or WEBP image"),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn attach_slip(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<AttachSlipRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let slip_path = body.into_inner().slip_path;

    let order = web::block(move || {
        state
            .orders
            .attach_payment_slip(&caller, id, &slip_path, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /admin/stats
///
/// Sales figures from completed orders plus pending and paid counts.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Sales statistics", body = SalesStatsResponse),
        (status = 403, description = "Caller is not an administrator"),
    ),
    tag = "orders"
)]
pub async fn sales_stats(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<HttpResponse, AppError> {
    let stats = web::block(move || state.orders.sales_stats(&caller))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(SalesStatsResponse::from(stats)))
}
