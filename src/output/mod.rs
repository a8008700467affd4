// Output: the report sink interface, its file-writing implementation and
// terminal display.

pub mod report;
pub mod terminal;

use anyhow::Result;

use crate::topics::evaluate::{CooccurrenceGraph, WordCloud};

/// Receives the data a modelling run produces. Implementations decide how
/// (or whether) to render it.
pub trait ReportSink {
    /// Term weights plus the name of the shape mask to draw them in.
    fn word_cloud(&mut self, cloud: &WordCloud) -> Result<()>;

    /// Nodes and styled edges of one topic's word web.
    fn cooccurrence_graph(&mut self, graph: &CooccurrenceGraph) -> Result<()>;

    /// A named table with a header row.
    fn table(&mut self, name: &str, headers: &[String], rows: &[Vec<String>]) -> Result<()>;

    /// Flat key/value run manifest.
    fn manifest(&mut self, entries: &[(String, String)]) -> Result<()>;
}

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, unlike byte slicing.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
