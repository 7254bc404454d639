use std::sync::Arc;

use sql_antipathy::catalog::show_columns;
use sql_antipathy::prelude::*;
use sql_antipathy::test_utils::{Event, RecordingConnection};
use tokio::runtime::Runtime;

async fn seeded_session(path: &std::path::Path) -> Result<Session, SqlAntipathyError> {
    let mut session = Credentials::builder(DialectKind::Sqlite, path.to_string_lossy())
        .connect()
        .await?;
    session
        .execute("CREATE TABLE notes (id INTEGER NOT NULL, body TEXT, created TEXT)")
        .await?;
    session.execute("CREATE TABLE tags (label TEXT)").await?;
    session
        .execute("INSERT INTO notes VALUES (1, 'first line' || char(10) || 'second line', NULL)")
        .await?;
    session
        .execute("INSERT INTO notes VALUES (2, 'plain', '2024-01-01')")
        .await?;
    session.commit().await?;
    Ok(session)
}

#[test]
fn sqlite_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let dir = tempfile::tempdir()?;
        let mut session = seeded_session(&dir.path().join("notes.db")).await?;

        assert_eq!(session.show_databases().await?, vec!["main".to_string()]);
        assert_eq!(
            session.show_tables(None).await?,
            vec!["notes".to_string(), "tags".to_string()]
        );

        let columns = session.show_columns(None, "notes").await?;
        assert_eq!(
            columns,
            vec![
                ColumnInfo {
                    name: "id".into(),
                    data_type: "INTEGER".into(),
                    is_nullable: false,
                },
                ColumnInfo {
                    name: "body".into(),
                    data_type: "TEXT".into(),
                    is_nullable: true,
                },
                ColumnInfo {
                    name: "created".into(),
                    data_type: "TEXT".into(),
                    is_nullable: true,
                },
            ]
        );
        session.close().await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn csv_export_flattens_newlines() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let dir = tempfile::tempdir()?;
        let mut session = seeded_session(&dir.path().join("notes.db")).await?;

        let mut out = Vec::new();
        let written = session
            .export_csv("SELECT id, body, created FROM notes ORDER BY id", &mut out)
            .await?;
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out)?,
            "id,body,created\n1,first line second line,\n2,plain,2024-01-01\n"
        );

        let path = dir.path().join("notes.csv");
        let file = std::fs::File::create(&path)?;
        session.export_csv("SELECT label FROM tags", file).await?;
        assert_eq!(std::fs::read_to_string(&path)?, "label\n");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[tokio::test]
async fn show_columns_escapes_the_table_name() -> Result<(), Box<dyn std::error::Error>> {
    let mut canned = ResultSet::with_capacity(1);
    canned.set_column_names(Arc::new(vec![
        "COLUMN_NAME".into(),
        "DATA_TYPE".into(),
        "IS_NULLABLE".into(),
    ]));
    canned.add_row_values(vec![
        SqlValue::from("id"),
        SqlValue::from("int"),
        SqlValue::from("NO"),
    ])?;
    let mut conn = RecordingConnection::new().with_select("information_schema", canned);
    let log = conn.log();

    let columns = show_columns(&mut conn, &MssqlDialect::default(), "o'rders").await?;

    assert_eq!(columns.len(), 1);
    assert!(!columns[0].is_nullable);
    match &log.events()[0] {
        Event::Select(sql) => assert!(sql.contains("'o''rders'")),
        other => panic!("unexpected event {other:?}"),
    }
    Ok(())
}
