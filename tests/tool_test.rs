mod common;

use serde_json::json;
use sqlnav_core::{CacheConfig, Error, Tool};
use sqlnav_database_tools::{
    DatabaseToolConfig, MULTIPLE_STATEMENTS, create_database_tools, create_sqlite_tools,
};
use sqlnav_tool::DefaultToolContext;
use std::sync::Arc;

async fn shop_tools(config: DatabaseToolConfig) -> Vec<Arc<dyn Tool>> {
    let db = common::shop_database().await;
    create_database_tools(db.clone(), db, "shop", config, &CacheConfig::default()).unwrap()
}

fn tool(tools: &[Arc<dyn Tool>], name: &str) -> Arc<dyn Tool> {
    tools
        .iter()
        .find(|t| t.name() == name)
        .cloned()
        .unwrap_or_else(|| panic!("tool {} not found", name))
}

fn ctx() -> Arc<DefaultToolContext> {
    Arc::new(DefaultToolContext::new("test-call", "test-invocation"))
}

#[tokio::test]
async fn test_tool_set() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();

    assert_eq!(
        names,
        vec![
            "shop_list_relationships",
            "shop_suggest_join",
            "shop_generate_join",
            "shop_detect_many_to_many",
            "shop_list_tables",
            "shop_scan_schema",
            "shop_validate_sql",
            "shop_query",
        ]
    );
    for tool in &tools {
        assert!(!tool.description().is_empty());
        assert_eq!(tool.schema()["type"], "object");
    }
}

#[tokio::test]
async fn test_empty_sqlite_database() {
    let tools = create_sqlite_tools("sqlite::memory:").await.unwrap();
    let list = tool(&tools, "sqlite_list_relationships");

    let response = list.execute(ctx(), json!({})).await.unwrap();
    assert_eq!(response.result["schema"], "main");
    assert_eq!(response.result["foreign_keys"], json!([]));
    assert_eq!(response.result["many_to_many"], json!([]));
}

#[tokio::test]
async fn test_suggest_join_tool() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let suggest = tool(&tools, "shop_suggest_join");

    let response = suggest
        .execute(ctx(), json!({"table1": "orders", "table2": "customers"}))
        .await
        .unwrap();
    assert_eq!(response.result["found"], true);
    assert_eq!(
        response.result["sql"],
        "FROM orders\nJOIN customers ON orders.customer_id = customers.id"
    );
    assert_eq!(
        response.result["explanation"],
        "Direct relationship: orders.customer_id → customers.id"
    );
    assert_eq!(response.result["path"][0]["is_reverse"], false);

    let missing = suggest.execute(ctx(), json!({"table1": "orders"})).await;
    assert!(matches!(missing, Err(Error::InvalidParameter(_))));
}

#[tokio::test]
async fn test_generate_join_tool() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let generate = tool(&tools, "shop_generate_join");

    let response = generate
        .execute(
            ctx(),
            json!({"tables": ["warehouses", "customers"], "select_all": true}),
        )
        .await
        .unwrap();
    assert_eq!(response.result["found"], true);
    assert_eq!(
        response.result["sql"],
        "SELECT *\nFROM warehouses\n\
         JOIN shipments ON warehouses.id = shipments.warehouse_id\n\
         JOIN orders ON shipments.order_id = orders.id\n\
         JOIN customers ON orders.customer_id = customers.id"
    );

    let unreachable = generate
        .execute(ctx(), json!({"tables": ["customers", "audit_log"]}))
        .await
        .unwrap();
    assert_eq!(unreachable.result["found"], false);
    assert_eq!(unreachable.result["failure"]["kind"], "unreachable_target");
    assert_eq!(unreachable.result["failure"]["target"], "audit_log");
}

#[tokio::test]
async fn test_list_and_detect_tools() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;

    let list = tool(&tools, "shop_list_relationships");
    let response = list.execute(ctx(), json!({"table": "products"})).await.unwrap();
    assert_eq!(response.result["foreign_keys"].as_array().unwrap().len(), 2);
    assert_eq!(response.result["many_to_many"].as_array().unwrap().len(), 2);

    let detect = tool(&tools, "shop_detect_many_to_many");
    let response = detect.execute(ctx(), json!({})).await.unwrap();
    assert_eq!(response.result["count"], 2);
}

#[tokio::test]
async fn test_query_tool_read_only() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let query = tool(&tools, "shop_query");

    let response = query
        .execute(ctx(), json!({"sql": "SELECT name, email FROM customers ORDER BY id"}))
        .await
        .unwrap();
    assert_eq!(response.result["row_count"], 2);
    assert_eq!(response.result["rows"][0]["name"], "Ada");
    assert!(response.result["rows"][1]["email"].is_null());

    let rejected = query
        .execute(ctx(), json!({"sql": "UPDATE customers SET name = 'Bob'"}))
        .await;
    assert!(matches!(rejected, Err(Error::QueryRejected(_))));
}

#[tokio::test]
async fn test_query_tool_with_writes() {
    let tools = shop_tools(DatabaseToolConfig::with_write_enabled()).await;
    let query = tool(&tools, "shop_query");

    let response = query
        .execute(ctx(), json!({"sql": "UPDATE customers SET email = 'grace@example.com' WHERE id = 2"}))
        .await
        .unwrap();
    assert_eq!(response.result["rows_affected"], 1);

    let ddl = query.execute(ctx(), json!({"sql": "DROP TABLE audit_log"})).await;
    assert!(matches!(ddl, Err(Error::QueryRejected(_))));

    let broken = query.execute(ctx(), json!({"sql": "SELECT * FROM missing_table"})).await;
    assert!(matches!(broken, Err(Error::QueryFailed(_))));
}

async fn foreign_key_count(list: &Arc<dyn Tool>) -> usize {
    let response = list.execute(ctx(), json!({})).await.unwrap();
    response.result["foreign_keys"].as_array().unwrap().len()
}

#[tokio::test]
async fn test_cache_setting_controls_catalog_reads() {
    let reviews = "CREATE TABLE reviews (id INTEGER PRIMARY KEY, product_id INTEGER REFERENCES products(id))";

    let cached_db = common::shop_database().await;
    let cached = create_database_tools(
        cached_db.clone(),
        cached_db.clone(),
        "shop",
        DatabaseToolConfig::default(),
        &CacheConfig::default(),
    )
    .unwrap();
    let list = tool(&cached, "shop_list_relationships");
    let before = foreign_key_count(&list).await;
    common::seed(&cached_db, &[reviews]).await;
    assert_eq!(foreign_key_count(&list).await, before);

    let live_db = common::shop_database().await;
    let live = create_database_tools(
        live_db.clone(),
        live_db.clone(),
        "shop",
        DatabaseToolConfig::default(),
        &CacheConfig {
            enabled: false,
            ..Default::default()
        },
    )
    .unwrap();
    let list = tool(&live, "shop_list_relationships");
    let before = foreign_key_count(&list).await;
    common::seed(&live_db, &[reviews]).await;
    assert_eq!(foreign_key_count(&list).await, before + 1);
}

#[tokio::test]
async fn test_query_tool_rejects_disguised_writes() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let query = tool(&tools, "shop_query");

    let behind_cte = query
        .execute(
            ctx(),
            json!({"sql": "WITH doomed AS (SELECT id FROM customers) DELETE FROM customers WHERE id IN (SELECT id FROM doomed)"}),
        )
        .await;
    assert!(matches!(behind_cte, Err(Error::QueryRejected(_))));

    let stacked = query
        .execute(ctx(), json!({"sql": "SELECT 1; DELETE FROM customers"}))
        .await;
    match stacked {
        Err(Error::QueryRejected(message)) => assert_eq!(message, MULTIPLE_STATEMENTS),
        other => panic!("expected rejection, got {:?}", other.map(|r| r.result)),
    }

    let response = query
        .execute(ctx(), json!({"sql": "SELECT COUNT(*) AS n FROM customers"}))
        .await
        .unwrap();
    assert_eq!(response.result["rows"][0]["n"], 2);
}

#[tokio::test]
async fn test_validate_sql_tool() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;
    let validate = tool(&tools, "shop_validate_sql");

    let response = validate
        .execute(
            ctx(),
            json!({"sql": "SELECT * FROM orders JOIN customer ON customer.id = orders.customer_id"}),
        )
        .await
        .unwrap();
    assert_eq!(response.result["valid"], false);
    let error = response.result["errors"][0].as_str().unwrap();
    assert!(error.contains("customer"));
    assert!(error.contains("customers"));

    let response = validate
        .execute(
            ctx(),
            json!({"sql": "SELECT name FROM customers WHERE id = 1", "explain": true}),
        )
        .await
        .unwrap();
    assert_eq!(response.result["valid"], true);
    assert!(response.result["explain"]["plan"].is_array());

    let response = validate
        .execute(ctx(), json!({"sql": "SELECT 1; SELECT 2"}))
        .await
        .unwrap();
    assert_eq!(response.result["valid"], false);
}

#[tokio::test]
async fn test_schema_tools() {
    let tools = shop_tools(DatabaseToolConfig::default()).await;

    let list = tool(&tools, "shop_list_tables");
    let response = list.execute(ctx(), json!({})).await.unwrap();
    assert_eq!(response.result["schema"], "main");
    assert_eq!(response.result["table_count"], 10);
    assert_eq!(response.result["tables"][0]["name"], "audit_log");

    let scan = tool(&tools, "shop_scan_schema");
    let response = scan
        .execute(ctx(), json!({"table": "order_items"}))
        .await
        .unwrap();
    let table = &response.result["tables"][0];
    assert_eq!(table["columns"].as_array().unwrap().len(), 4);
    let foreign_keys = table["constraints"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["type"] == "FOREIGN KEY")
        .count();
    assert_eq!(foreign_keys, 2);

    let missing = scan.execute(ctx(), json!({"table": "nope"})).await;
    assert!(matches!(missing, Err(Error::InvalidParameter(_))));
}
