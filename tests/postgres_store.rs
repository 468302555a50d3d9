//! `PgStore` against a live PostgreSQL.
//!
//! Ignored by default. Run with a disposable database:
//! `TEST_DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`
//! The tests only inspect rows they create.

use product_api::config::{DatabaseBackend, DatabaseConfig};
use product_api::product::model::{NewProduct, ProductPatch};
use product_api::product::query::{Statement, UpdateBuilder};
use product_api::store::{Datastore, PgStore};

async fn store() -> PgStore {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let config = DatabaseConfig {
        backend: DatabaseBackend::Postgres,
        url: Some(url),
        max_connections: 2,
        connect_timeout_secs: 5,
        ensure_schema: true,
    };
    let store = PgStore::connect(&config).await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

fn new_product(name: &str, price: f64, image: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price,
        image: image.to_string(),
    }
}

#[tokio::test]
#[ignore] // Requires PostgreSQL (TEST_DATABASE_URL)
async fn test_insert_binds_name_price_image_in_order() {
    let store = store().await;
    store.ping().await.unwrap();

    let rows = store
        .execute(&Statement::insert(&new_product("Teapot", 24.5, "teapot.png")))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Teapot");
    assert_eq!(rows[0].price, 24.5);
    assert_eq!(rows[0].image, "teapot.png");

    let fetched = store.execute(&Statement::select_by_id(rows[0].id)).await.unwrap();
    assert_eq!(fetched, rows);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL (TEST_DATABASE_URL)
async fn test_partial_update_binds_columns_then_id() {
    let store = store().await;
    let created = store
        .execute(&Statement::insert(&new_product("Chair", 80.0, "chair.png")))
        .await
        .unwrap()
        .remove(0);

    // Two non-adjacent columns: price must not land in name, id must come last.
    let patch = ProductPatch {
        name: Some("Armchair".into()),
        price: None,
        image: Some("armchair.png".into()),
    };
    let stmt = UpdateBuilder::from_patch(created.id, &patch).build().unwrap();
    let updated = store.execute(&stmt).await.unwrap().remove(0);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Armchair");
    assert_eq!(updated.price, 80.0);
    assert_eq!(updated.image, "armchair.png");
    assert_eq!(updated.created_at, created.created_at);

    let patch = ProductPatch {
        price: Some(95.0),
        ..Default::default()
    };
    let stmt = UpdateBuilder::from_patch(created.id, &patch).build().unwrap();
    let updated = store.execute(&stmt).await.unwrap().remove(0);
    assert_eq!(updated.name, "Armchair");
    assert_eq!(updated.price, 95.0);

    let stmt = UpdateBuilder::from_patch(i64::MAX, &patch).build().unwrap();
    assert!(store.execute(&stmt).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires PostgreSQL (TEST_DATABASE_URL)
async fn test_delete_returns_row_once_and_list_is_newest_first() {
    let store = store().await;
    let first = store
        .execute(&Statement::insert(&new_product("Older", 1.0, "a.png")))
        .await
        .unwrap()
        .remove(0);
    let second = store
        .execute(&Statement::insert(&new_product("Newer", 2.0, "b.png")))
        .await
        .unwrap()
        .remove(0);

    let ids: Vec<i64> = store
        .execute(&Statement::list_all())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .filter(|id| *id == first.id || *id == second.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let deleted = store.execute(&Statement::delete_by_id(first.id)).await.unwrap();
    assert_eq!(deleted, vec![first.clone()]);
    assert!(store.execute(&Statement::delete_by_id(first.id)).await.unwrap().is_empty());
    store.execute(&Statement::delete_by_id(second.id)).await.unwrap();
}
