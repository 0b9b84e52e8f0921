use pgmodel::{
    DbConfig, Filter, LogConfig, ModelError, ModelHandle, ModelResult, Record, StatementExecutor,
    create_pool_with_size,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn database_url(test: &str) -> Option<String> {
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

/// A unique table name per test run; handles need a `'static` identifier.
fn scratch_table(prefix: &str) -> &'static str {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    Box::leak(format!("{prefix}_{}_{nanos}", std::process::id()).into_boxed_str())
}

async fn create_unit_table(pool: &deadpool_postgres::Pool, table: &str) -> ModelResult<()> {
    let client = pool.get().await?;
    client
        .batch_execute(&format!(
            r#"CREATE TABLE "{table}" (
                id SERIAL PRIMARY KEY,
                unit_number TEXT NOT NULL UNIQUE,
                rent_amount INTEGER NOT NULL,
                deposit NUMERIC(10, 2),
                status TEXT NOT NULL DEFAULT 'available',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#
        ))
        .await
        .map_err(ModelError::from_db_error)
}

async fn drop_table(pool: &deadpool_postgres::Pool, table: &str) -> ModelResult<()> {
    let client = pool.get().await?;
    client
        .batch_execute(&format!(r#"DROP TABLE IF EXISTS "{table}""#))
        .await
        .map_err(ModelError::from_db_error)
}

#[tokio::test]
async fn create_then_find_unique_roundtrip() -> ModelResult<()> {
    let Some(url) = database_url("create_then_find_unique_roundtrip") else {
        return Ok(());
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("queries.log");
    let config = DbConfig::new(url)
        .with_pool_max_size(2)
        .with_log(LogConfig::new().with_path(&log_path));

    let pool = config.create_pool()?;
    let table = scratch_table("pgmodel_unit");
    create_unit_table(&pool, table).await?;

    let executor = Arc::new(StatementExecutor::new(pool.clone()).with_monitor(config.monitor()));
    let units = ModelHandle::new(table, executor);

    let created = units
        .create(&Record::new().with("unitNumber", "A1").with("rentAmount", 1200))
        .await?;
    let id = created.get("id").cloned().expect("id returned");
    assert_eq!(created.get("status"), Some(&json!("available")));
    assert!(created.contains_key("createdAt"));

    let found = units
        .find_unique(&Filter::new().eq("id", id.clone()))
        .await?
        .expect("row exists");
    assert_eq!(found.get("unitNumber"), Some(&json!("A1")));
    assert_eq!(found.get("rentAmount"), Some(&json!(1200)));

    // A string id binds against the integer column.
    let id_text = id.as_i64().expect("integer id").to_string();
    let updated = units
        .update(
            &Filter::new().eq("id", id_text),
            &Record::new().with("rentAmount", 1500).with("deposit", "750.50"),
        )
        .await?
        .expect("row updated");
    assert_eq!(updated.get("rentAmount"), Some(&json!(1500)));
    assert_eq!(updated.get("deposit"), Some(&json!("750.50")));

    assert_eq!(units.count(&Filter::new()).await?, 1);
    assert!(units.find_unique(&Filter::new().eq("id", 0)).await?.is_none());

    let deleted = units.delete(&Filter::new().eq("unitNumber", "A1")).await?;
    assert!(deleted.success);
    assert_eq!(deleted.rows_affected, 1);

    let log = std::fs::read_to_string(&log_path).expect("query log written");
    assert!(log.lines().all(|line| line.starts_with("QUERY: ")));
    assert!(log.contains(&format!(r#"INSERT INTO "{table}""#)));

    drop_table(&pool, table).await
}

#[tokio::test]
async fn failing_statement_releases_connection() -> ModelResult<()> {
    let Some(url) = database_url("failing_statement_releases_connection") else {
        return Ok(());
    };
    let pool = create_pool_with_size(&url, 1)?;
    let table = scratch_table("pgmodel_fail");
    create_unit_table(&pool, table).await?;

    let units = ModelHandle::new(table, Arc::new(StatementExecutor::new(pool.clone())));
    units
        .create(&Record::new().with("unitNumber", "B1").with("rentAmount", 900))
        .await?;

    let err = units
        .create(&Record::new().with("unitNumber", "B1").with("rentAmount", 900))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "{err}");

    let missing = ModelHandle::new(
        "pgmodel_missing_table",
        Arc::new(StatementExecutor::new(pool.clone())),
    );
    assert!(matches!(
        missing.find_many(&Filter::new()).await,
        Err(ModelError::Query(_))
    ));

    // With a single-connection pool, this only succeeds if both failures
    // returned their connection.
    let status = pool.status();
    assert_eq!(status.size, status.available);
    assert_eq!(units.count(&Filter::new()).await?, 1);

    drop_table(&pool, table).await
}

#[tokio::test]
async fn server_error_text_reaches_the_log() -> ModelResult<()> {
    let Some(url) = database_url("server_error_text_reaches_the_log") else {
        return Ok(());
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("queries.log");
    let config = DbConfig::new(url)
        .with_pool_max_size(1)
        .with_log(LogConfig::new().with_path(&log_path));

    let pool = config.create_pool()?;
    let table = scratch_table("pgmodel_errlog");
    create_unit_table(&pool, table).await?;
    let executor = Arc::new(StatementExecutor::new(pool.clone()).with_monitor(config.monitor()));

    // `rent_amount` is NOT NULL; 23502 is not one of the classified codes.
    let units = ModelHandle::new(table, Arc::clone(&executor));
    let err = units
        .create(&Record::new().with("unitNumber", "E1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Query(_)), "{err}");
    assert!(err.to_string().contains("null value in column"), "{err}");

    let missing = ModelHandle::new("pgmodel_missing_table", executor);
    let err = missing.find_many(&Filter::new()).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");

    let log = std::fs::read_to_string(&log_path).expect("query log written");
    assert!(
        log.lines()
            .all(|line| line.starts_with("QUERY: ") || line.starts_with("[ERROR] ")),
        "{log}"
    );
    let errors: Vec<&str> = log.lines().filter(|l| l.starts_with("[ERROR] ")).collect();
    assert_eq!(errors.len(), 2, "{log}");
    assert!(errors[0].contains("null value in column"), "{log}");
    assert!(errors[1].contains(r#"relation "pgmodel_missing_table" does not exist"#), "{log}");

    drop_table(&pool, table).await
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Unit {
    #[serde(skip_serializing)]
    id: i32,
    unit_number: String,
    rent_amount: i32,
}

#[tokio::test]
async fn typed_model_roundtrip() -> ModelResult<()> {
    let Some(url) = database_url("typed_model_roundtrip") else {
        return Ok(());
    };
    let pool = create_pool_with_size(&url, 2)?;
    let table = scratch_table("pgmodel_typed");
    create_unit_table(&pool, table).await?;

    let units = ModelHandle::new(table, Arc::new(StatementExecutor::new(pool.clone())))
        .typed::<Unit>();
    let created = units
        .create(&Unit {
            id: 0,
            unit_number: "C3".into(),
            rent_amount: 800,
        })
        .await?;
    assert!(created.id > 0);

    let listed = units
        .find_many(&Filter::new().within("unitNumber", ["C3", "C4"]))
        .await?;
    assert_eq!(listed, vec![created]);

    drop_table(&pool, table).await
}
