use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::entities::{notification, order, order_item, payment, payment_card, product, user};
use crate::errors::ErrorResponse;
use crate::gateway::{CardTokenRequest, PreferenceResponse};
use crate::handlers;
use crate::handlers::auth::AuthResponse;
use crate::handlers::payments::CreatePreferenceInput;
use crate::services::orders::{CheckoutInput, CheckoutItem, OrderWithItems};
use crate::services::payments::{CardPaymentInput, CardPaymentResult};
use crate::services::products::{CreateProductInput, UpdateProductInput};
use crate::services::users::{LoginInput, RegisterInput};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Catalog, checkout, payment reconciliation and notifications for the storefront mobile app",
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::orders::checkout,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::cancel_order,
        handlers::payments::create_preference,
        handlers::payments::pay_with_card,
        handlers::payments::list_order_payments,
        handlers::payments::webhook,
        handlers::cards::add_card,
        handlers::cards::list_cards,
        handlers::cards::set_default_card,
        handlers::cards::delete_card,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::admin::list_users,
        handlers::admin::list_orders,
        handlers::admin::list_payments,
    ),
    components(schemas(
        ErrorResponse,
        user::Model,
        product::Model,
        order::Model,
        order_item::Model,
        payment::Model,
        payment_card::Model,
        notification::Model,
        RegisterInput,
        LoginInput,
        CreateProductInput,
        UpdateProductInput,
        CheckoutInput,
        CheckoutItem,
        OrderWithItems,
        CardTokenRequest,
        CardPaymentInput,
        CardPaymentResult,
        CreatePreferenceInput,
        PreferenceResponse,
        AuthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "products", description = "Catalog browsing and back-office product management"),
        (name = "orders", description = "Checkout and order history"),
        (name = "payments", description = "Payment provider integration"),
        (name = "cards", description = "Saved payment cards"),
        (name = "notifications", description = "In-app notifications"),
        (name = "admin", description = "Back-office listings"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
