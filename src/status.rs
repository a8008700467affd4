// System status display: DB location and size, document counts.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::db::queries;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let db_path = &config.db_path;
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `sediment init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let conn = db::open(db_path)?;
    let total = queries::document_count(&conn)?;
    let processed = queries::processed_count(&conn)?;
    println!("Documents: {} imported, {} with cleaned text", total, processed);
    if total == 0 {
        println!("  Run `sediment import <metadata.csv>` to add documents");
    } else if processed < total {
        println!("  Run `sediment preprocess --new-only` to clean the rest");
    }

    println!("Page text: {}", config.pages_dir.display());
    println!("Reports: {}", config.output_dir.display());

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
