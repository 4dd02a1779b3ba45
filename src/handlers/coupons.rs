use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::coupon::{Coupon, CouponDraft, CouponKind};
use crate::domain::order::Caller;
use crate::errors::AppError;

use super::{parse_decimal, AppState};

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Body for creating or editing a coupon. On update, omitted fields keep
/// their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CouponRequest {
    pub code: Option<String>,
    /// "percentage" or "fixed"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Decimal as a string, e.g. "10" or "99.50"
    pub value: Option<String>,
    pub min_order_amount: Option<String>,
    /// 0 means unlimited
    pub usage_limit: Option<i32>,
    /// Empty means the coupon never expires
    pub expires_at: Option<String>,
    pub active: Option<bool>,
}

impl CouponRequest {
    fn into_draft(self, base: Option<&Coupon>) -> Result<CouponDraft, AppError> {
        let required = |field: &str| AppError::BadRequest(format!("{field} is required"));

        let code = self
            .code
            .or_else(|| base.map(|c| c.code.clone()))
            .ok_or_else(|| required("code"))?;
        let kind = match self.kind {
            Some(kind) => kind.parse::<CouponKind>()?,
            None => base.map(|c| c.kind).ok_or_else(|| required("type"))?,
        };
        let value = match self.value {
            Some(raw) => parse_decimal("value", &raw)?,
            None => base.map(|c| c.value.clone()).ok_or_else(|| required("value"))?,
        };
        let min_order_amount = match self.min_order_amount {
            Some(raw) => parse_decimal("min_order_amount", &raw)?,
            None => base.map_or_else(BigDecimal::zero, |c| c.min_order_amount.clone()),
        };

        Ok(CouponDraft {
            code,
            kind,
            value,
            min_order_amount,
            usage_limit: self.usage_limit.or(base.map(|c| c.usage_limit)).unwrap_or(0),
            expires_at: self
                .expires_at
                .or_else(|| base.map(|c| c.expires_at.clone()))
                .unwrap_or_default(),
            active: self.active.or(base.map(|c| c.active)).unwrap_or(true),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub min_order_amount: String,
    pub usage_limit: i32,
    pub used_count: i32,
    pub expires_at: String,
    pub active: bool,
    pub version: i32,
    pub created_at: String,
}

impl From<Coupon> for CouponResponse {
    fn from(c: Coupon) -> Self {
        CouponResponse {
            id: c.id,
            code: c.code,
            kind: c.kind.to_string(),
            value: c.value.to_string(),
            min_order_amount: c.min_order_amount.to_string(),
            usage_limit: c.usage_limit,
            used_count: c.used_count,
            expires_at: c.expires_at,
            active: c.active,
            version: c.version,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    #[serde(default)]
    pub code: String,
    /// Decimal as a string; defaults to "0"
    pub order_amount: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub coupon: CouponResponse,
    pub discount: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /coupons
///
/// Administrators only.
#[utoipa::path(
    get,
    path = "/coupons",
    responses(
        (status = 200, description = "All coupons, newest first", body = [CouponResponse]),
        (status = 401, description = "Missing identity"),
        (status = 403, description = "Caller is not an administrator"),
    ),
    tag = "coupons"
)]
pub async fn list_coupons(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<HttpResponse, AppError> {
    let coupons = web::block(move || state.coupons.list(&caller))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<CouponResponse> = coupons.into_iter().map(CouponResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /coupons/{id}
///
/// Administrators only.
#[utoipa::path(
    get,
    path = "/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon UUID")),
    responses(
        (status = 200, description = "Coupon found", body = CouponResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Coupon not found"),
    ),
    tag = "coupons"
)]
pub async fn get_coupon(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let coupon = web::block(move || state.coupons.get(&caller, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CouponResponse::from(coupon)))
}

/// POST /coupons
///
/// Administrators only. Codes are stored uppercased and must be unique.
#[utoipa::path(
    post,
    path = "/coupons",
    request_body = CouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = CouponResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 409, description = "Code already exists"),
    ),
    tag = "coupons"
)]
pub async fn create_coupon(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CouponRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft(None)?;
    let coupon = web::block(move || state.coupons.create(&caller, draft))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CouponResponse::from(coupon)))
}

/// PUT /coupons/{id}
///
/// Administrators only. Usage counters are never written here.
#[utoipa::path(
    put,
    path = "/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon UUID")),
    request_body = CouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = CouponResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Coupon not found"),
        (status = 409, description = "Code taken or coupon modified concurrently"),
    ),
    tag = "coupons"
)]
pub async fn update_coupon(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<CouponRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();

    let coupon = web::block(move || -> Result<Coupon, AppError> {
        let current = state.coupons.get(&caller, id)?;
        let draft = body.into_draft(Some(&current))?;
        Ok(state.coupons.update(&caller, id, draft)?)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CouponResponse::from(coupon)))
}

/// DELETE /coupons/{id}
#[utoipa::path(
    delete,
    path = "/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon UUID")),
    responses(
        (status = 204, description = "Coupon deleted"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Coupon not found"),
    ),
    tag = "coupons"
)]
pub async fn delete_coupon(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.coupons.delete(&caller, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /coupons/validate
///
/// Quotes the discount a code would give on `order_amount` without counting
/// a use. Unknown codes are 404; ineligible ones are 400 with the reason.
#[utoipa::path(
    post,
    path = "/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon applies", body = ValidateCouponResponse),
        (status = 400, description = "Code missing, negative amount or coupon not applicable"),
        (status = 404, description = "Unknown code"),
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    state: web::Data<AppState>,
    _caller: Caller,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let amount = match body.order_amount.as_deref() {
        Some(raw) => parse_decimal("order_amount", raw)?,
        None => BigDecimal::zero(),
    };

    let quote = web::block(move || state.coupons.validate_code(&body.code, &amount, Utc::now()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ValidateCouponResponse {
        valid: true,
        discount: quote.discount.to_string(),
        coupon: CouponResponse::from(quote.coupon),
    }))
}
