//! CSV export of query results.

use std::io::Write;

use csv::Writer;

use crate::connection::DatabaseConnection;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Text with embedded line breaks flattened to single spaces.
fn csv_field(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.replace("\r\n", " ").replace(['\n', '\r'], " "),
        other => other.to_string(),
    }
}

/// Write a result set as CSV: one header row of column names, then one record per row.
///
/// Returns the number of data rows written.
///
/// # Errors
///
/// Returns `SqlAntipathyError::Csv` or `SqlAntipathyError::Io` if writing fails.
pub fn write_csv<W: Write>(result: &ResultSet, writer: W) -> Result<usize, SqlAntipathyError> {
    let mut wtr = Writer::from_writer(writer);
    if let Some(columns) = result.get_column_names() {
        wtr.write_record(columns.iter())?;
    }
    let mut written = 0;
    for row in result {
        wtr.write_record(row.values.iter().map(csv_field))?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

/// Run `query` and write its rows as CSV.
///
/// # Errors
///
/// Returns the backend error if the query fails, or a CSV/I/O error if writing fails.
pub async fn export_csv<W: Write>(
    conn: &mut dyn DatabaseConnection,
    query: &str,
    writer: W,
) -> Result<usize, SqlAntipathyError> {
    tracing::debug!("Exporting query to CSV");
    let result = conn.execute_select(query).await?;
    let written = write_csv(&result, writer)?;
    tracing::debug!("Exported {written} rows");
    Ok(written)
}
