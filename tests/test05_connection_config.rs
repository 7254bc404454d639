use std::io::Write;

use sql_antipathy::prelude::*;
use sql_antipathy::test_utils::{Event, RecordingConnection};

#[test]
fn credentials_file_to_odbc_string() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"dialect": "mssql", "host": "db01", "port": 1433, "user": "etl",
            "password": "s3cret", "database": "staging", "driver": "odbc17"}}"#
    )?;

    let creds = Credentials::from_json_file(file.path())?;
    assert!(!creds.autocommit);
    assert!(creds.datetime_converter);

    let dialect = dialect_for(creds.dialect);
    assert_eq!(
        dialect.connection_string(&creds)?,
        "DRIVER={ODBC Driver 17 for SQL Server};SERVER=db01,1433;UID=etl;PWD=s3cret;DATABASE=staging"
    );
    assert!(
        dialect
            .connection_string(&creds.redacted())?
            .ends_with("PWD=***;DATABASE=staging")
    );
    Ok(())
}

#[test]
fn trusted_connection_excludes_a_login() {
    let creds = Credentials::builder(DialectKind::Mssql, "db01")
        .driver("windows")
        .trusted_connection(true)
        .user("etl")
        .finish();
    let err = MssqlDialect::default().connection_string(&creds).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let trusted = Credentials::builder(DialectKind::Mssql, "db01")
        .driver("windows")
        .trusted_connection(true)
        .finish();
    assert_eq!(
        MssqlDialect::default().connection_string(&trusted).unwrap(),
        "DRIVER={SQL Server};SERVER=db01;Trusted_Connection=yes"
    );
}

#[test]
fn unknown_dialect_in_config_is_rejected() {
    let err = Credentials::from_json_str(r#"{"dialect": "db2", "host": "x"}"#).unwrap_err();
    assert!(matches!(err, SqlAntipathyError::ConfigError(_)));
}

#[tokio::test]
async fn external_driver_through_session_new() -> Result<(), Box<dyn std::error::Error>> {
    let conn = RecordingConnection::new();
    let log = conn.log();
    let mut session = Session::new(Box::new(conn), Box::new(OracleDialect::default()));

    let rows = vec![
        Record::new().with("id", 1).with("dept", "R&D"),
        Record::new().with("id", 2).with("dept", "Ops"),
    ];
    let report = session
        .bulk_insertion(&["id", "dept"], &rows, Some("HR"), "staff", &BulkInsertOptions::default())
        .await?;
    assert_eq!(report.statements, 1);
    assert_eq!(session.current_database(), Some("HR"));

    session.close().await?;

    let events = log.events();
    assert_eq!(
        events.first(),
        Some(&Event::Batch("ALTER SESSION SET CURRENT_SCHEMA = HR".to_string()))
    );
    let inserts = log.dml_statements();
    assert!(inserts[0].contains("VALUES ('1', 'RANDD')"));
    assert_eq!(events.last(), Some(&Event::Close));
    Ok(())
}
