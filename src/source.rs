// Document page source: where raw per-page text comes from.
//
// Text extraction from PDFs happens upstream (pdftotext or similar). This
// module only reads the result: one file per document, pages separated by
// form feeds. The trait lets tests feed pages from memory instead.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Page separator written by `pdftotext`.
pub const FORM_FEED: char = '\x0c';

/// Anything that can hand over the ordered pages of a named document.
pub trait PageSource {
    /// Pages of `filename` in reading order, or `None` when the document is
    /// absent or has no non-empty page.
    fn pages(&self, filename: &str) -> Result<Option<Vec<String>>>;
}

/// Reads `<dir>/<filename>` as form-feed separated page text.
pub struct TextDirSource {
    dir: PathBuf,
}

impl TextDirSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Look for the page file, trying the name as given and then with a
    /// `.txt` extension (metadata often lists the original `.pdf` name).
    fn locate(&self, filename: &str) -> Option<PathBuf> {
        let direct = self.dir.join(filename);
        if direct.is_file() {
            return Some(direct);
        }
        let as_text = direct.with_extension("txt");
        as_text.is_file().then_some(as_text)
    }
}

impl PageSource for TextDirSource {
    fn pages(&self, filename: &str) -> Result<Option<Vec<String>>> {
        let Some(path) = self.locate(filename) else {
            return Ok(None);
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read page file {}", path.display()))?;
        Ok(split_pages(&raw))
    }
}

/// Split extracted text into pages, dropping a trailing empty page. Returns
/// `None` when no page has any non-whitespace content.
pub fn split_pages(raw: &str) -> Option<Vec<String>> {
    let mut pages: Vec<String> = raw.split(FORM_FEED).map(str::to_string).collect();
    while pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    if pages.iter().all(|p| p.trim().is_empty()) {
        None
    } else {
        Some(pages)
    }
}

/// Natural ordering for filenames: digit runs compare numerically, so
/// `doc2.pdf` sorts before `doc10.pdf`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut left);
                let run_b = take_digits(&mut right);
                let ord = compare_digit_runs(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
