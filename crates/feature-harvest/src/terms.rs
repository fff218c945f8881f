//! Search-term input.
//!
//! Input is a CSV-style record stream without a header; the first field of
//! every record is the search term and any further columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{HarvestError, HarvestResult};
use crate::types::SearchTerm;

/// Read terms from a file. Failing to open it is fatal for the run.
pub fn read_terms_from_path(path: &Path) -> HarvestResult<Vec<SearchTerm>> {
    let file = File::open(path).map_err(|source| HarvestError::InputRead {
        path: path.display().to_string(),
        source,
    })?;
    read_terms(file, &path.display().to_string())
}

/// Read terms from any reader, preserving input order.
///
/// Empty records, records with a blank first field and records that fail to
/// decode are skipped. An I/O error while reading is an
/// [`HarvestError::InputRead`].
pub fn read_terms<R: Read>(reader: R, source_name: &str) -> HarvestResult<Vec<SearchTerm>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut terms = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                let source = match e.into_kind() {
                    csv::ErrorKind::Io(io) => io,
                    other => std::io::Error::other(format!("{other:?}")),
                };
                return Err(HarvestError::InputRead {
                    path: source_name.to_string(),
                    source,
                });
            }
            Err(e) => {
                tracing::warn!("skipping malformed input record {}: {e}", line + 1);
                continue;
            }
        };

        match record.get(0) {
            Some(term) if !term.is_empty() => terms.push(term.to_string()),
            _ => tracing::debug!("skipping empty input record {}", line + 1),
        }
    }

    tracing::info!("read {} search terms from {source_name}", terms.len());
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_first_column_in_order() {
        let input = "Yellowstone,USA\nBanff,CAN,extra\n\nEndau Rompin\n";
        let terms = read_terms(input.as_bytes(), "test").unwrap();
        assert_eq!(terms, vec!["Yellowstone", "Banff", "Endau Rompin"]);
    }

    #[test]
    fn test_blank_first_field_skipped() {
        let input = ",orphan\n  \nKruger\n";
        let terms = read_terms(input.as_bytes(), "test").unwrap();
        assert_eq!(terms, vec!["Kruger"]);
    }

    #[test]
    fn test_quoted_term_with_comma() {
        let input = "\"Serengeti, North\",TZA\n";
        let terms = read_terms(input.as_bytes(), "test").unwrap();
        assert_eq!(terms, vec!["Serengeti, North"]);
    }

    #[test]
    fn test_invalid_utf8_record_skipped() {
        let mut input: Vec<u8> = b"Kruger\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"Etosha\n");
        let terms = read_terms(input.as_slice(), "test").unwrap();
        assert_eq!(terms, vec!["Kruger", "Etosha"]);
    }

    #[test]
    fn test_missing_file_is_input_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_terms_from_path(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, HarvestError::InputRead { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_read_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("terms.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Yellowstone").unwrap();
        writeln!(f, "Banff").unwrap();
        drop(f);

        let terms = read_terms_from_path(&path).unwrap();
        assert_eq!(terms.len(), 2);
    }
}
