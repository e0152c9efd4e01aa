//! Migration runner tests against in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct AppliedMigration {
    version: u32,
    name: String,
}

#[tokio::test]
async fn migrations_apply_and_are_recorded() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    palisade_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version ASC")
        .await
        .unwrap();
    let applied: Vec<AppliedMigration> = result.take(0).unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].version, 1);
    assert_eq!(applied[0].name, "initial_schema");
}

#[tokio::test]
async fn rerunning_migrations_is_a_no_op() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    palisade_db::run_migrations(&db).await.unwrap();
    palisade_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT version, name FROM _migration").await.unwrap();
    let applied: Vec<AppliedMigration> = result.take(0).unwrap();
    assert_eq!(applied.len(), 1, "no duplicate migration records");
}

#[tokio::test]
async fn schema_v1_ddl_is_valid() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("raw").use_db("raw").await.unwrap();

    // The raw DDL must apply cleanly on its own.
    db.query(palisade_db::schema_v1())
        .await
        .unwrap()
        .check()
        .unwrap();
}
