// Shared fixtures for the integration tests
#![allow(dead_code)]

use sqlnav_database_tools::{DatabaseToolConfig, SqliteDatabase};
use std::collections::HashSet;
use std::sync::Arc;

/// Shop schema:
/// - `order_items` and `product_tags` bridge two tables with few columns
/// - `shipments` has two foreign keys but too many columns to be a junction
/// - `employees` references itself
/// - `audit_log` is unrelated to everything
pub const SHOP_SCHEMA: &[&str] = &[
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        placed_at TEXT
    )",
    "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT NOT NULL, price REAL)",
    "CREATE TABLE order_items (
        id INTEGER PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        product_id INTEGER NOT NULL REFERENCES products(id),
        quantity INTEGER NOT NULL
    )",
    "CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE product_tags (
        product_id INTEGER REFERENCES products,
        tag_id INTEGER REFERENCES tags,
        PRIMARY KEY (product_id, tag_id)
    )",
    "CREATE TABLE warehouses (id INTEGER PRIMARY KEY, city TEXT)",
    "CREATE TABLE shipments (
        id INTEGER PRIMARY KEY,
        order_id INTEGER REFERENCES orders(id),
        warehouse_id INTEGER REFERENCES warehouses(id),
        carrier TEXT,
        tracking_code TEXT,
        shipped_at TEXT
    )",
    "CREATE TABLE employees (
        id INTEGER PRIMARY KEY,
        manager_id INTEGER REFERENCES employees(id) ON UPDATE SET NULL
    )",
    "CREATE TABLE audit_log (id INTEGER PRIMARY KEY, note TEXT)",
];

pub const SHOP_DATA: &[&str] = &[
    "INSERT INTO customers (id, name, email) VALUES (1, 'Ada', 'ada@example.com'), (2, 'Grace', NULL)",
    "INSERT INTO orders (id, customer_id, placed_at) VALUES (10, 1, '2024-01-02'), (11, 2, '2024-01-03')",
    "INSERT INTO products (id, title, price) VALUES (100, 'Keyboard', 49.5), (101, 'Mouse', 19.0)",
    "INSERT INTO order_items (id, order_id, product_id, quantity) VALUES (1, 10, 100, 1), (2, 10, 101, 2), (3, 11, 101, 1)",
    "INSERT INTO tags (id, name) VALUES (1, 'input'), (2, 'sale')",
    "INSERT INTO product_tags (product_id, tag_id) VALUES (100, 1), (101, 1), (101, 2)",
];

pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn seed(db: &SqliteDatabase, statements: &[&str]) {
    for statement in statements {
        sqlx::query(statement)
            .execute(db.pool())
            .await
            .expect("Failed to seed database");
    }
}

/// In-memory SQLite database with the shop schema and rows
pub async fn shop_database() -> Arc<SqliteDatabase> {
    init_logging();

    let db = SqliteDatabase::connect("sqlite::memory:", &DatabaseToolConfig::default())
        .await
        .expect("Failed to open in-memory SQLite");
    seed(&db, SHOP_SCHEMA).await;
    seed(&db, SHOP_DATA).await;
    Arc::new(db)
}

/// Asserts that every JOIN line only references tables introduced above it
pub fn assert_joins_well_ordered(sql: &str) {
    let mut introduced: HashSet<&str> = HashSet::new();

    for line in sql.lines() {
        if let Some(table) = line.strip_prefix("FROM ") {
            introduced.insert(table.trim());
        } else if let Some(rest) = line.strip_prefix("JOIN ") {
            let (table, condition) = rest.split_once(" ON ").expect("JOIN without ON");
            let (left, right) = condition.split_once(" = ").expect("ON without =");
            let left_table = left.split('.').next().unwrap();
            let right_table = right.split('.').next().unwrap();

            assert_eq!(right_table, table, "JOIN target must be on the right: {}", line);
            assert!(
                introduced.contains(left_table),
                "{} references {} before it was joined",
                line,
                left_table
            );
            introduced.insert(table);
        }
    }
}
