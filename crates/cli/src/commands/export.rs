//! Export a table as CSV.
//!
//! # Usage
//!
//! ```bash
//! envanter export materials              # writes malzemeler.csv
//! envanter export orders -o -            # writes to stdout
//! ```

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use envanter_client::ClientError;
use envanter_core::export::{ExportKind, ExportTable};

use super::session::{self, SessionError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Server returned a table with ragged rows")]
    Ragged,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write a table as CSV with its headers first.
///
/// # Errors
///
/// Returns `ExportError::Ragged` if a row does not match the headers.
pub fn write_csv<W: Write>(table: &ExportTable, writer: W) -> Result<(), ExportError> {
    if !table.is_rectangular() {
        return Err(ExportError::Ragged);
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.headers)?;
    for row in &table.data {
        csv.write_record(row.iter().map(ExportTable::cell_text))?;
    }
    csv.flush()?;
    Ok(())
}

/// Fetch an export and write it to `output` (`-` for stdout).
///
/// Without `output` the server's suggested file name is used.
///
/// # Errors
///
/// Returns `ExportError` if the fetch or the write fails.
pub async fn run(kind: ExportKind, output: Option<PathBuf>) -> Result<(), ExportError> {
    let client = session::signed_in_client().await?;
    let table = client.export(kind).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(&table.filename));
    if path.as_os_str() == "-" {
        write_csv(&table, std::io::stdout().lock())?;
    } else {
        write_csv(&table, std::fs::File::create(&path)?)?;
        tracing::info!(rows = table.data.len(), "Exported {} to {}", kind, path.display());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table(data: Vec<Vec<serde_json::Value>>) -> ExportTable {
        ExportTable {
            filename: "siparisler.csv".to_owned(),
            headers: vec!["Sipariş No".to_owned(), "Tutar".to_owned(), "Not".to_owned()],
            data,
        }
    }

    #[test]
    fn test_writes_headers_and_cells() {
        let mut out = Vec::new();
        write_csv(
            &table(vec![vec![json!("SIP000001"), json!("182.00"), json!("Acil, hızlı")]]),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Sipariş No,Tutar,Not\nSIP000001,182.00,\"Acil, hızlı\"\n");
    }

    #[test]
    fn test_numbers_and_nulls() {
        let mut out = Vec::new();
        write_csv(&table(vec![vec![json!(7), json!(null), json!(true)]]), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("7,,true\n"));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = write_csv(&table(vec![vec![json!("SIP000001")]]), Vec::new()).unwrap_err();
        assert!(matches!(err, ExportError::Ragged));
    }
}
