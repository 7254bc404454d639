use sql_antipathy::SqlAntipathyError;
use sql_antipathy::dialect::{MssqlDialect, MysqlDialect, OracleDialect, SqliteDialect};
use sql_antipathy::loader::{BatchLoader, BulkInsertOptions, FailurePolicy, LoaderState, bulk_insert};
use sql_antipathy::record::Record;
use sql_antipathy::test_utils::{Event, RecordingConnection};

fn people(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|id| Record::new().with("id", id).with("name", format!("p{id}")))
        .collect()
}

fn tuples_in(statement: &str) -> usize {
    statement.matches("('").count()
}

#[tokio::test]
async fn seven_rows_in_windows_of_three() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();
    let rows = people(7);

    let report = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id", "name"],
        &rows,
        &BulkInsertOptions::new(3, 3),
    )
    .await?;

    assert_eq!(report.rows, 7);
    assert_eq!(report.statements, 3);
    assert_eq!(report.commits, 3);
    assert!(report.failures.is_empty());

    let sizes: Vec<usize> = log.dml_statements().iter().map(|s| tuples_in(s)).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert_eq!(
        log.dml_statements()[0],
        "INSERT INTO people (id, name) VALUES ('1', 'p1'), ('2', 'p2'), ('3', 'p3')"
    );

    // Every flush lands before the commit that closes its window.
    let kinds: Vec<&str> = log
        .events()
        .iter()
        .map(|e| match e {
            Event::Dml(_) => "dml",
            Event::Commit => "commit",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["dml", "commit", "dml", "commit", "dml", "commit"]);
    Ok(())
}

#[tokio::test]
async fn statement_and_commit_windows_are_independent() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();

    let report = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id", "name"],
        &people(7),
        &BulkInsertOptions::new(2, 3),
    )
    .await?;

    let sizes: Vec<usize> = log.dml_statements().iter().map(|s| tuples_in(s)).collect();
    assert_eq!(sizes, vec![2, 2, 2, 1]);
    assert_eq!(report.commits, 3);
    assert_eq!(log.commits(), 3);
    Ok(())
}

#[tokio::test]
async fn one_row_per_statement_emits_one_insert_per_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();

    let report = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id"],
        &people(4),
        &BulkInsertOptions::new(1, 5000),
    )
    .await?;

    assert_eq!(report.statements, 4);
    assert_eq!(report.commits, 1);
    assert_eq!(
        log.dml_statements(),
        vec![
            "INSERT INTO people (id) VALUES ('1')",
            "INSERT INTO people (id) VALUES ('2')",
            "INSERT INTO people (id) VALUES ('3')",
            "INSERT INTO people (id) VALUES ('4')",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn empty_input_is_a_successful_noop() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();

    let report = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id"],
        &[],
        &BulkInsertOptions::default(),
    )
    .await?;

    assert_eq!(report.rows, 0);
    assert_eq!(report.statements, 0);
    assert!(log.dml_statements().is_empty());
    assert_eq!(report.status_code(), 0);
    Ok(())
}

#[tokio::test]
async fn first_failed_flush_stops_the_load() {
    let mut conn = RecordingConnection::new().fail_dml_number(2);
    let log = conn.log();
    let rows = people(7);
    let dialect = SqliteDialect::default();

    let mut loader = BatchLoader::new(
        &mut conn,
        &dialect,
        "people",
        &["id", "name"],
        BulkInsertOptions::new(3, 100),
    )
    .unwrap();
    let err = loader.run(&rows).await.unwrap_err();

    assert_eq!(loader.state(), LoaderState::Failed);
    assert_eq!(loader.report().statements, 1);
    match &err {
        SqlAntipathyError::StatementFailure {
            row_index,
            statement_number,
            statement,
            ..
        } => {
            assert_eq!(*row_index, 5);
            assert_eq!(*statement_number, 2);
            assert!(statement.contains("('4', 'p4')"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.status_code(), 1);
    assert_eq!(err.row_index(), Some(5));

    // Nothing after the failing statement ran, and nothing was committed.
    assert_eq!(log.dml_statements().len(), 2);
    assert_eq!(log.commits(), 0);
}

#[tokio::test]
async fn tolerated_flush_failures_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new().fail_when_contains("'p4'");
    let options = BulkInsertOptions::builder()
        .record_each_statement(3)
        .commit_every(3)
        .failure_policy(FailurePolicy::TolerateTotal(1))
        .build()?;

    let report = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id", "name"],
        &people(7),
        &options,
    )
    .await?;

    assert_eq!(report.statements, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 5);
    assert_eq!(report.failures[0].rows, 3);
    assert_eq!(report.rows_loaded(), 4);
    Ok(())
}

#[tokio::test]
async fn missing_columns_render_the_missing_value() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();
    let rows = vec![
        Record::new().with("id", 1).with("name", "a"),
        Record::new().with("id", 2),
    ];

    bulk_insert(
        &mut conn,
        &MssqlDialect::default(),
        "people",
        &["id", "name"],
        &rows,
        &BulkInsertOptions::default(),
    )
    .await?;

    assert_eq!(
        log.dml_statements(),
        vec!["INSERT INTO people (id, name) VALUES ('1', 'a'), ('2', NULL)"]
    );
    Ok(())
}

#[tokio::test]
async fn mysql_json_keeps_its_escapes() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();
    let rows = vec![Record::new()
        .with("id", 1)
        .with("doc", serde_json::json!({"note": "line\nbreak"}))];

    bulk_insert(
        &mut conn,
        &MysqlDialect::default(),
        "docs",
        &["id", "doc"],
        &rows,
        &BulkInsertOptions::default(),
    )
    .await?;

    assert_eq!(
        log.dml_statements(),
        vec![r#"INSERT INTO docs (id, doc) VALUES ('1', '{"note":"line\\nbreak"}')"#]
    );
    Ok(())
}

#[tokio::test]
async fn oracle_uses_insert_all() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = RecordingConnection::new();
    let log = conn.log();

    bulk_insert(
        &mut conn,
        &OracleDialect::default(),
        "people",
        &["id", "name"],
        &people(2),
        &BulkInsertOptions::default(),
    )
    .await?;

    assert_eq!(
        log.dml_statements(),
        vec![
            "INSERT ALL INTO people (id, name) VALUES ('1', 'p1') \
             INTO people (id, name) VALUES ('2', 'p2') SELECT 1 FROM DUAL"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn invalid_windows_are_rejected_before_any_statement() {
    let mut conn = RecordingConnection::new();
    let log = conn.log();

    let err = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id"],
        &people(3),
        &BulkInsertOptions::new(0, 10),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SqlAntipathyError::ConfigError(_)));
    assert!(log.events().is_empty());
}

#[tokio::test]
async fn failed_commit_is_propagated() {
    let mut conn = RecordingConnection::new().fail_commits();

    let err = bulk_insert(
        &mut conn,
        &SqliteDialect::default(),
        "people",
        &["id"],
        &people(2),
        &BulkInsertOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SqlAntipathyError::ConnectionError(_)));
}
