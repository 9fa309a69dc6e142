use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{BusinessReport, ModifyUserRequest, UserList},
        auth::{LoginRequest, RegisterRequest, SessionUser},
        cart::{AddToCartRequest, CartCount, CartLine, CartView, UpdateCartItemRequest},
        orders::{OrderHistory, OrderLineDetail, OrderStats},
        payments::{CheckoutRequest, CheckoutResponse, VerifyPaymentRequest, VerifyPaymentResponse},
        products::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, ProductDetail, ProductList,
        },
    },
    middleware::auth::AUTH_COOKIE,
    models::{CartItem, Category, Order, OrderItem, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, payments, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::verify,
        products::list_products,
        products::get_product,
        products::list_categories,
        cart::cart_view,
        cart::add_to_cart,
        cart::cart_count,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::list_orders,
        orders::order_stats,
        payments::checkout,
        payments::verify_payment,
        admin::list_users,
        admin::get_user,
        admin::modify_user,
        admin::create_product,
        admin::delete_product,
        admin::create_category,
        admin::daily_business,
        admin::monthly_business,
        admin::yearly_business,
        admin::overall_business
    ),
    components(
        schemas(
            Role,
            User,
            Category,
            Product,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            SessionUser,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            CartCount,
            OrderLineDetail,
            OrderHistory,
            OrderStats,
            CheckoutRequest,
            CheckoutResponse,
            VerifyPaymentRequest,
            VerifyPaymentResponse,
            CreateProductRequest,
            CreateCategoryRequest,
            ProductDetail,
            ProductList,
            CategoryList,
            ModifyUserRequest,
            UserList,
            BusinessReport,
            params::Pagination,
            Meta,
            ApiResponse<User>,
            ApiResponse<SessionUser>,
            ApiResponse<CartView>,
            ApiResponse<OrderHistory>,
            ApiResponse<BusinessReport>
        )
    ),
    security(
        ("cookie_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order history endpoints"),
        (name = "Payments", description = "Checkout and payment verification"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
