// Stopword lists: a user CSV or the built-in English list.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use stop_words::{get, LANGUAGE};

/// Case-sensitive set of tokens removed during normalization.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl FromIterator<String> for Stopwords {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().collect(),
        }
    }
}

/// The `stop-words` crate's English list.
pub fn default_stopwords() -> Stopwords {
    get(LANGUAGE::English).into_iter().collect()
}

/// First column of every row of a headerless CSV file. Blank cells are
/// skipped; case is kept as written.
pub fn load_stopwords(path: &Path) -> Result<Stopwords> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open stopword file {}", path.display()))?;

    let mut words = HashSet::new();
    for record in reader.records() {
        let record = record
            .with_context(|| format!("Malformed row in stopword file {}", path.display()))?;
        if let Some(word) = record.get(0).map(str::trim).filter(|w| !w.is_empty()) {
            words.insert(word.to_string());
        }
    }
    Ok(Stopwords { words })
}

/// Load from `path` when given, otherwise the built-in list.
pub fn resolve_stopwords(path: Option<&Path>) -> Result<Stopwords> {
    match path {
        Some(path) => load_stopwords(path),
        None => Ok(default_stopwords()),
    }
}
