// Data models: Rust structs that map to database rows.
//
// Kept apart from the queries so the pipelines can use them without
// depending on rusqlite directly.

use serde::{Deserialize, Serialize};

use crate::config::Scope;
use crate::topics::evaluate::DocumentLabel;

/// Metadata for one source document, plus its cleaned text once
/// preprocessing has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub title: String,
    pub citation: String,
    pub url: String,
    pub year: Option<i32>,
    /// Semicolon-separated state tags.
    pub states: String,
    /// Semicolon-separated sub-basin tags.
    pub sub_basins: String,
    pub cleaned_text: Option<String>,
    pub processed_at: Option<String>,
}

impl DocumentRecord {
    /// Whether the document belongs to `scope`. Tag scopes compare whole
    /// tags, so "Iowa" does not match a document tagged only "Iowa River".
    pub fn matches_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::State(name) => has_tag(&self.states, name),
            Scope::SubBasin(name) => has_tag(&self.sub_basins, name),
            Scope::Decade(decade) => self.year.is_some_and(|year| decade.contains(year)),
        }
    }

    /// Whether preprocessing left usable text.
    pub fn has_cleaned_text(&self) -> bool {
        self.cleaned_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn label(&self) -> DocumentLabel {
        DocumentLabel {
            title: self.title.clone(),
            citation: self.citation.clone(),
            url: self.url.clone(),
        }
    }
}

fn has_tag(tags: &str, wanted: &str) -> bool {
    tags.split(';').any(|tag| tag.trim() == wanted)
}
