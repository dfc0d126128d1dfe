//! Decoding of the portal CSV files.

use std::fs;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::table::{Table, TabularError};

/// Reads one portal CSV into a [`Table`].
///
/// The files are Windows-1252 encoded, `;`-delimited, first row is the
/// header. Records with a deviant field count are padded or truncated to
/// the header width (the upstream occasionally emits unbalanced quotes
/// that shift fields). An input without data rows is an error.
pub fn read_table(path: &Path) -> Result<Table, TabularError> {
    let raw = fs::read(path).map_err(|source| TabularError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let (decoded, _, had_errors) = WINDOWS_1252.decode(&raw);
    if had_errors {
        debug!(path = %path.display(), "replacement characters while decoding");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| TabularError::Csv {
            path: path.display().to_string(),
            source,
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = Table::new(headers)?;
    let width = table.columns().len();

    for record in reader.records() {
        let record = record.map_err(|source| TabularError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(width, String::new());
        table.push_row(row)?;
    }

    if table.is_empty() {
        return Err(TabularError::Empty);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn decodes_windows_1252_and_semicolons() {
        // "Gestão" with 0xE3 (ã in Windows-1252, invalid UTF-8)
        let mut bytes = b"C\xF3digo;Gest\xE3o\n".to_vec();
        bytes.extend_from_slice(b"158454;UNIVERSIDADE\n");
        let file = write_fixture(&bytes);

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.columns(), &["Código", "Gestão"]);
        assert_eq!(table.value(0, "Código"), "158454");
        assert_eq!(table.value(0, "Gestão"), "UNIVERSIDADE");
    }

    #[test]
    fn empty_table_is_refused() {
        let file = write_fixture(b"A;B\n");
        assert!(matches!(read_table(file.path()), Err(TabularError::Empty)));
    }

    #[test]
    fn short_records_are_padded() {
        let file = write_fixture(b"A;B;C\n1;2\n");
        let table = read_table(file.path()).unwrap();
        assert_eq!(table.value(0, "C"), "");
        assert_eq!(table.value(0, "B"), "2");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_table(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, TabularError::Io { .. }));
    }
}
