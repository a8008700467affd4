// CSV metadata import.
//
// Expected header: filename,title,citation,url,year,states,sub_basins.
// Only `filename` is required; tag columns hold ';'-separated lists.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};

use super::models::DocumentRecord;
use super::queries::upsert_document;

#[derive(Debug, Deserialize)]
struct MetadataRow {
    filename: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    citation: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    states: String,
    #[serde(default)]
    sub_basins: String,
}

impl MetadataRow {
    fn into_record(self) -> DocumentRecord {
        DocumentRecord {
            filename: self.filename.trim().to_string(),
            title: self.title.trim().to_string(),
            citation: self.citation.trim().to_string(),
            url: self.url.trim().to_string(),
            year: self.year.as_deref().and_then(parse_year),
            states: self.states.trim().to_string(),
            sub_basins: self.sub_basins.trim().to_string(),
            ..Default::default()
        }
    }
}

/// Accepts "2014" and date-like values such as "2014-06-01".
fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw.trim().chars().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Load every row of a metadata CSV into the documents table. Rows with no
/// filename are skipped with a warning. Returns the number of rows stored.
pub fn import_metadata(conn: &Connection, path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open metadata file {}", path.display()))?;

    let tx = conn.unchecked_transaction()?;
    let mut imported = 0usize;
    for (line, result) in reader.deserialize::<MetadataRow>().enumerate() {
        let row = result.with_context(|| format!("Bad metadata row {}", line + 2))?;
        let record = row.into_record();
        if record.filename.is_empty() {
            warn!(row = line + 2, "Skipping metadata row without a filename");
            continue;
        }
        upsert_document(&tx, &record)?;
        imported += 1;
    }
    tx.commit()?;

    info!(rows = imported, path = %path.display(), "Metadata imported");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{get_document, list_documents};
    use crate::db::schema::create_tables;
    use std::io::Write;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2014"), Some(2014));
        assert_eq!(parse_year(" 1998-03-02 "), Some(1998));
        assert_eq!(parse_year("n.d."), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_import_metadata_rows() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "filename,title,citation,url,year,states,sub_basins").unwrap();
        writeln!(
            file,
            "doc1.txt,Sediment in Iowa,\"Smith, 2010\",http://x/1,2010,Iowa;Missouri,Upper Mississippi"
        )
        .unwrap();
        writeln!(file, ",Missing filename,,,,,").unwrap();
        writeln!(file, "doc2.txt,Undated,,,,Ohio,Ohio (Basin)").unwrap();
        file.flush().unwrap();

        let count = import_metadata(&conn, file.path()).unwrap();
        assert_eq!(count, 2, "the row without a filename is skipped");
        assert_eq!(list_documents(&conn).unwrap().len(), 2);

        let doc1 = get_document(&conn, "doc1.txt").unwrap().unwrap();
        assert_eq!(doc1.citation, "Smith, 2010");
        assert_eq!(doc1.year, Some(2010));
        assert_eq!(doc1.states, "Iowa;Missouri");

        let doc2 = get_document(&conn, "doc2.txt").unwrap().unwrap();
        assert_eq!(doc2.year, None);
        assert_eq!(doc2.sub_basins, "Ohio (Basin)");
    }

    #[test]
    fn test_import_missing_file_fails() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let err = import_metadata(&conn, Path::new("/nonexistent/meta.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open metadata file"));
    }
}
