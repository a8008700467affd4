// Database queries: CRUD operations on the documents table.
//
// All SQL lives here so the pipelines get plain Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::DocumentRecord;
use crate::config::Scope;
use crate::source::natural_cmp;

const DOCUMENT_COLUMNS: &str = "id, filename, title, citation, url, year, states, sub_basins,
     cleaned_text, processed_at";

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        title: row.get(2)?,
        citation: row.get(3)?,
        url: row.get(4)?,
        year: row.get(5)?,
        states: row.get(6)?,
        sub_basins: row.get(7)?,
        cleaned_text: row.get(8)?,
        processed_at: row.get(9)?,
    })
}

fn query_documents(conn: &Connection, sql: &str) -> Result<Vec<DocumentRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let mut docs = stmt
        .query_map([], row_to_document)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    docs.sort_by(|a, b| natural_cmp(&a.filename, &b.filename));
    Ok(docs)
}

/// Insert a document's metadata, or update it if the filename exists.
/// Cleaned text is left untouched on update. Returns the row id.
pub fn upsert_document(conn: &Connection, doc: &DocumentRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO documents (filename, title, citation, url, year, states, sub_basins)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(filename) DO UPDATE SET
            title = ?2,
            citation = ?3,
            url = ?4,
            year = ?5,
            states = ?6,
            sub_basins = ?7",
        params![
            doc.filename,
            doc.title,
            doc.citation,
            doc.url,
            doc.year,
            doc.states,
            doc.sub_basins,
        ],
    )?;
    let id = conn.query_row(
        "SELECT id FROM documents WHERE filename = ?1",
        params![doc.filename],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Look up one document by filename.
pub fn get_document(conn: &Connection, filename: &str) -> Result<Option<DocumentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE filename = ?1"
    ))?;
    let doc = stmt
        .query_row(params![filename], row_to_document)
        .optional()?;
    Ok(doc)
}

/// Every document, in natural filename order.
pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentRecord>> {
    query_documents(conn, &format!("SELECT {DOCUMENT_COLUMNS} FROM documents"))
}

/// Documents the preprocessing batch should handle. With `new_only`, only
/// those that have never been cleaned.
pub fn documents_to_process(conn: &Connection, new_only: bool) -> Result<Vec<DocumentRecord>> {
    let sql = if new_only {
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE cleaned_text IS NULL")
    } else {
        format!("SELECT {DOCUMENT_COLUMNS} FROM documents")
    };
    query_documents(conn, &sql)
}

/// Store the cleaned text for a document and stamp the time.
pub fn save_cleaned_text(conn: &Connection, id: i64, text: &str) -> Result<()> {
    conn.execute(
        "UPDATE documents SET cleaned_text = ?1, processed_at = datetime('now') WHERE id = ?2",
        params![text, id],
    )?;
    Ok(())
}

/// Documents in `scope` with usable cleaned text, in natural filename order.
pub fn select_documents(conn: &Connection, scope: &Scope) -> Result<Vec<DocumentRecord>> {
    let docs = query_documents(
        conn,
        &format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE cleaned_text IS NOT NULL AND TRIM(cleaned_text) != ''"
        ),
    )?;
    Ok(docs
        .into_iter()
        .filter(|doc| doc.has_cleaned_text() && doc.matches_scope(scope))
        .collect())
}

pub fn document_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
    Ok(count)
}

/// Documents with non-empty cleaned text.
pub fn processed_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM documents
         WHERE cleaned_text IS NOT NULL AND TRIM(cleaned_text) != ''",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
