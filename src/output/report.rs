// File-backed report sink.
//
// Every run writes into <output_dir>/<scope label>/<run folder>/: tables
// as CSV, word clouds and word webs as JSON, and a plain-text manifest.
// Rendering images from the JSON is left to downstream tooling.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::ReportSink;
use crate::config::RunConfig;
use crate::topics::evaluate::{CooccurrenceGraph, WordCloud};

pub const MANIFEST_FILE: &str = "manifest.txt";

/// Writes run results as CSV, JSON and plain text.
pub struct CsvReportWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvReportWriter {
    /// Prepare the run folder for `run`, replacing any earlier run with the
    /// same choices.
    pub fn create(output_dir: &Path, run: &RunConfig) -> Result<Self> {
        let dir = output_dir
            .join(file_slug(run.scope.label()))
            .join(run.folder_name());
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear old run folder {}", dir.display()))?;
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create run folder {}", dir.display()))?;
        debug!(dir = %dir.display(), "Run folder ready");
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_json<T: serde::Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        self.written.push(path);
        Ok(())
    }
}

impl ReportSink for CsvReportWriter {
    fn word_cloud(&mut self, cloud: &WordCloud) -> Result<()> {
        self.write_json(&format!("{}.json", file_slug(&cloud.title)), cloud)
    }

    fn cooccurrence_graph(&mut self, graph: &CooccurrenceGraph) -> Result<()> {
        self.write_json(&format!("Topic_{}_Word_Web.json", graph.topic), graph)
    }

    fn table(&mut self, name: &str, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
        let path = self.dir.join(format!("{}.csv", file_slug(name)));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        self.written.push(path);
        Ok(())
    }

    fn manifest(&mut self, entries: &[(String, String)]) -> Result<()> {
        let path = self.dir.join(MANIFEST_FILE);
        let body: String = entries
            .iter()
            .map(|(key, value)| format!("{key}: {value}\n"))
            .collect();
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        self.written.push(path);
        info!(dir = %self.dir.display(), files = self.written.len(), "Report written");
        Ok(())
    }
}

/// Make a label safe as a file name: keeps letters, digits, '-' and '_',
/// turns runs of anything else into one '_'.
pub fn file_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_gap = false;
    for c in label.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_gap && !slug.is_empty() {
                slug.push('_');
            }
            pending_gap = false;
            slug.push(c);
        } else {
            pending_gap = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}
