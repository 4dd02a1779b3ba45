pub mod carts;
pub mod coupons;
pub mod identity;
pub mod orders;

use actix_web::web;
use bigdecimal::BigDecimal;
use utoipa::OpenApi;

use crate::application::cart_service::CartService;
use crate::application::checkout_service::CheckoutService;
use crate::application::coupon_service::CouponService;
use crate::application::order_service::OrderService;
use crate::db::DbPool;
use crate::domain::checkout::CheckoutPolicy;
use crate::errors::AppError;
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::coupon_repo::DieselCouponRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselProductCatalog;

pub type Coupons = CouponService<DieselCouponRepository>;
pub type Carts = CartService<DieselCartRepository, DieselProductCatalog>;
pub type Checkout = CheckoutService<
    DieselCartRepository,
    DieselProductCatalog,
    DieselCouponRepository,
    DieselOrderRepository,
>;
pub type Orders = OrderService<DieselOrderRepository>;

/// Services shared by every worker, wired to the Postgres repositories.
pub struct AppState {
    pub coupons: Coupons,
    pub carts: Carts,
    pub checkout: Checkout,
    pub orders: Orders,
}

impl AppState {
    pub fn new(pool: DbPool, policy: CheckoutPolicy) -> Self {
        let carts = DieselCartRepository::new(pool.clone());
        let products = DieselProductCatalog::new(pool.clone());
        let coupons = DieselCouponRepository::new(pool.clone());

        Self {
            coupons: CouponService::new(coupons.clone(), policy.malformed_expiry),
            carts: CartService::new(carts.clone(), products.clone()),
            checkout: CheckoutService::new(
                carts,
                products,
                coupons,
                DieselOrderRepository::new(pool.clone()),
                policy,
            ),
            orders: OrderService::new(DieselOrderRepository::new(pool)),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("", web::get().to(coupons::list_coupons))
            .route("", web::post().to(coupons::create_coupon))
            .route("/validate", web::post().to(coupons::validate_coupon))
            .route("/{id}", web::get().to(coupons::get_coupon))
            .route("/{id}", web::put().to(coupons::update_coupon))
            .route("/{id}", web::delete().to(coupons::delete_coupon)),
    )
    .service(
        web::scope("/cart")
            .route("", web::get().to(carts::get_cart))
            .route("", web::delete().to(carts::clear_cart))
            .route("/items", web::post().to(carts::add_item))
            .route("/items/{id}", web::put().to(carts::update_item))
            .route("/items/{id}", web::delete().to(carts::remove_item)),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/status", web::put().to(orders::update_status))
            .route("/{id}/slip", web::post().to(orders::attach_slip)),
    )
    .service(web::scope("/admin").route("/stats", web::get().to(orders::sales_stats)));
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Storefront checkout API"),
    paths(
        coupons::list_coupons,
        coupons::get_coupon,
        coupons::create_coupon,
        coupons::update_coupon,
        coupons::delete_coupon,
        coupons::validate_coupon,
        carts::get_cart,
        carts::add_item,
        carts::update_item,
        carts::remove_item,
        carts::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::attach_slip,
        orders::sales_stats,
    ),
    tags(
        (name = "coupons", description = "Coupon administration and validation"),
        (name = "cart", description = "The caller's shopping cart"),
        (name = "orders", description = "Checkout and order management"),
    )
)]
pub struct ApiDoc;

/// Decimal amounts travel as strings, e.g. "9.99".
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid {field} '{raw}': {e}")))
}
