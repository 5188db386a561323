use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ConfirmResetRequest, LoginRequest, LoginResponse, PasswordResetRequest,
            RegisterRequest, ResetTokenStatus, VerifyResetTokenRequest,
        },
        brands::{BrandList, BrandWithCount, CreateBrandRequest, UpdateBrandRequest},
        cart::{AddCartItemRequest, CartLine, CartView, UpdateCartItemRequest},
        categories::{CategoryDetail, CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        inventory::{AdjustInventoryRequest, InventoryList, InventoryWithProduct},
        orders::{
            CheckoutRequest, OrderDetail, OrderList, OrderWithItems, UpdateOrderStatusRequest,
        },
        products::{
            CreateProductRequest, FieldValueInput, ProductDetail, ProductList, ResolvedField,
            UpdateProductRequest,
        },
        templates::{
            CreateTemplateRequest, TemplateDetail, TemplateFieldInput, TemplateList,
            TemplateWithCount, UpdateTemplateRequest,
        },
    },
    models::{
        Brand, Category, Inventory, Order, OrderItem, Product, Template, TemplateField, User,
    },
    response::{ApiResponse, PageMeta},
    routes::{admin, auth, brands, cart, categories, health, orders, params, products, templates},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::request_password_reset,
        auth::verify_reset_token,
        auth::confirm_reset,
        brands::list_brands,
        brands::get_brand,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        templates::list_templates,
        templates::get_template,
        templates::create_template,
        templates::update_template,
        templates::delete_template,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::archive_product,
        cart::view_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::pay_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_inventory,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Brand,
            Category,
            Template,
            TemplateField,
            Product,
            Inventory,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            PasswordResetRequest,
            VerifyResetTokenRequest,
            ResetTokenStatus,
            ConfirmResetRequest,
            CreateBrandRequest,
            UpdateBrandRequest,
            BrandWithCount,
            BrandList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryDetail,
            CategoryList,
            TemplateFieldInput,
            CreateTemplateRequest,
            UpdateTemplateRequest,
            TemplateWithCount,
            TemplateDetail,
            TemplateList,
            FieldValueInput,
            CreateProductRequest,
            UpdateProductRequest,
            ResolvedField,
            ProductDetail,
            ProductList,
            AddCartItemRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderDetail,
            OrderList,
            AdjustInventoryRequest,
            InventoryWithProduct,
            InventoryList,
            params::ListParams,
            params::ProductListParams,
            params::CategoryListParams,
            params::InventoryListParams,
            PageMeta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and password reset"),
        (name = "Brands", description = "Brand catalog"),
        (name = "Categories", description = "Four-tier category tree"),
        (name = "Templates", description = "Attribute templates and their fields"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
