//! Table definitions for the shop schema

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static USERS: TableSchema = TableSchema {
    name: "users",
    seed_file: "users.csv",
    columns: &[
        Column::identity("user_id"),
        Column::required("email", ColumnType::Varchar(255)),
        Column::required("password", ColumnType::Varchar(255)),
        Column::required("first_name", ColumnType::Varchar(255)),
        Column::required("last_name", ColumnType::Varchar(255)),
        Column::new("gender", ColumnType::Varchar(45)),
        Column::new("is_staff", ColumnType::SmallInt),
        Column::new("country", ColumnType::Varchar(255)),
        Column::new("city", ColumnType::Varchar(255)),
        Column::new("address", ColumnType::Text),
    ],
    primary_key: Some("user_id"),
    foreign_keys: &[],
};

pub static CATEGORIES: TableSchema = TableSchema {
    name: "categories",
    seed_file: "categories.csv",
    columns: &[
        Column::identity("category_id"),
        Column::required("category_title", ColumnType::Varchar(255)),
        Column::new("category_description", ColumnType::Text),
    ],
    primary_key: Some("category_id"),
    foreign_keys: &[],
};

// =============================================================================
// Dependent Tables
// =============================================================================

pub static CARTS: TableSchema = TableSchema {
    name: "carts",
    seed_file: "carts.csv",
    columns: &[
        Column::identity("cart_id"),
        Column::required("users_user_id", ColumnType::Integer),
        Column::required("subtotal", ColumnType::Decimal),
        Column::required("total", ColumnType::Decimal),
        Column::required("created_at", ColumnType::Timestamp),
    ],
    primary_key: Some("cart_id"),
    foreign_keys: &[ForeignKey::new("users_user_id", "users", "user_id")],
};

pub static ORDERS: TableSchema = TableSchema {
    name: "orders",
    seed_file: "orders.csv",
    columns: &[
        Column::required("order_id", ColumnType::Integer),
        Column::required("users_user_id", ColumnType::Integer),
        Column::required("carts_cart_id", ColumnType::Integer),
        Column::required("status_name", ColumnType::Varchar(255)),
        Column::required("shipping_total", ColumnType::Decimal),
        Column::required("total", ColumnType::Decimal),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    primary_key: Some("order_id"),
    foreign_keys: &[
        ForeignKey::new("users_user_id", "users", "user_id"),
        ForeignKey::new("carts_cart_id", "carts", "cart_id"),
    ],
};

pub static PRODUCTS: TableSchema = TableSchema {
    name: "products",
    seed_file: "products.csv",
    columns: &[
        Column::identity("product_id"),
        Column::required("product_title", ColumnType::Varchar(255)),
        Column::new("product_description", ColumnType::Text),
        Column::required("in_stock", ColumnType::Integer),
        Column::required("slug", ColumnType::Varchar(45)),
        Column::required("price", ColumnType::Real),
        Column::required("category_category_id", ColumnType::Integer),
        Column::required("orders_order_id", ColumnType::Integer),
    ],
    primary_key: Some("product_id"),
    foreign_keys: &[
        ForeignKey::new("category_category_id", "categories", "category_id"),
        ForeignKey::new("orders_order_id", "orders", "order_id"),
    ],
};

// Junction table
pub static CART_PRODUCT: TableSchema = TableSchema {
    name: "cart_product",
    seed_file: "cart_product.csv",
    columns: &[
        Column::required("carts_cart_id", ColumnType::Integer),
        Column::required("products_product_id", ColumnType::Integer),
    ],
    primary_key: None,
    foreign_keys: &[
        ForeignKey::new("carts_cart_id", "carts", "cart_id"),
        ForeignKey::new("products_product_id", "products", "product_id"),
    ],
};

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    &USERS,
    &CATEGORIES,
    &CARTS,
    &ORDERS,
    &PRODUCTS,
    &CART_PRODUCT,
];

