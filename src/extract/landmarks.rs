// Section boundary detection: keep only a paper's main body.
//
// Academic PDFs wrap the body in front matter (tables of contents, title
// pages, author blocks) and back matter (references, appendices,
// acknowledgements). Each pass below looks for one family of section
// headers and trims the page list around it. The passes run in a fixed
// order, each on the output of the previous one. A header that never shows
// up simply leaves the pages alone.
//
// Matching uses word-boundary regexes so "Abstracts" or "Introductions" in
// running text don't count. Splitting inside a page uses the plain header
// literal.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

/// Separator placed between surviving pages before splitting into lines.
pub const PAGE_SEPARATOR: &str = "\n";

/// Abstracts past this fraction of the document are body text.
const ABSTRACT_WINDOW: f64 = 0.4;
/// Introductions past this fraction are usually inside the reference list.
const INTRODUCTION_WINDOW: f64 = 0.8;
/// Appendix headers only count in the final stretch of the document.
const APPENDIX_WINDOW: f64 = 0.8;

/// Elsevier first pages carry this banner. It looks like a contents page
/// but is the start of the article.
const ELSEVIER_BANNER: &str = "Contents lists available";

/// Where a header family was found in a page list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandmarkMatch {
    NotFound,
    /// Matching page indices, ascending.
    FoundAt(Vec<usize>),
    /// A consecutive run of matches that ended at a later, non-adjacent
    /// match. Only the run is reported.
    FoundWithBreak(Vec<usize>),
}

impl LandmarkMatch {
    fn from_indices(indices: Vec<usize>) -> Self {
        if indices.is_empty() {
            LandmarkMatch::NotFound
        } else {
            LandmarkMatch::FoundAt(indices)
        }
    }

    pub fn indices(&self) -> &[usize] {
        match self {
            LandmarkMatch::NotFound => &[],
            LandmarkMatch::FoundAt(indices) | LandmarkMatch::FoundWithBreak(indices) => indices,
        }
    }

    pub fn first(&self) -> Option<usize> {
        self.indices().first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.indices().last().copied()
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, LandmarkMatch::NotFound)
    }
}

struct HeaderVariant {
    pattern: Regex,
    /// Literal used to split the page. Case-sensitive.
    literal: &'static str,
}

/// A family of header spellings for one kind of section.
pub struct Landmark {
    name: &'static str,
    variants: Vec<HeaderVariant>,
}

impl Landmark {
    fn new(name: &'static str, literals: &[&'static str]) -> Self {
        let variants = literals
            .iter()
            .map(|&literal| HeaderVariant {
                pattern: word_pattern(literal, false),
                literal,
            })
            .collect();
        Self { name, variants }
    }

    /// Add a spelling matched without regard to case.
    fn with_caseless(mut self, literal: &'static str) -> Self {
        self.variants.push(HeaderVariant {
            pattern: word_pattern(literal, true),
            literal,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether any spelling appears in the page as a whole word.
    pub fn matches(&self, page: &str) -> bool {
        self.variants.iter().any(|v| v.pattern.is_match(page))
    }

    /// Indices of every page that matches and passes `keep`.
    pub fn scan<F>(&self, pages: &[String], keep: F) -> LandmarkMatch
    where
        F: Fn(usize, &str) -> bool,
    {
        let indices = pages
            .iter()
            .enumerate()
            .filter(|(i, page)| self.matches(page) && keep(*i, page))
            .map(|(i, _)| i)
            .collect();
        LandmarkMatch::from_indices(indices)
    }

    /// The run of consecutive matching pages starting at the first match.
    pub fn scan_run(&self, pages: &[String]) -> LandmarkMatch {
        let mut run: Vec<usize> = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            if !self.matches(page) {
                continue;
            }
            match run.last() {
                Some(&prev) if i != prev + 1 => return LandmarkMatch::FoundWithBreak(run),
                _ => run.push(i),
            }
        }
        LandmarkMatch::from_indices(run)
    }

    /// Drop the text before each header spelling present in the page, in
    /// variant order.
    fn keep_after(&self, page: &str) -> String {
        self.variants.iter().fold(page.to_string(), |text, v| {
            match text.find(v.literal) {
                Some(at) => text[at + v.literal.len()..].to_string(),
                None => text,
            }
        })
    }

    /// Drop the header and everything after it, for each spelling present.
    fn keep_before(&self, page: &str) -> String {
        self.variants.iter().fold(page.to_string(), |text, v| {
            match text.find(v.literal) {
                Some(at) => text[..at].to_string(),
                None => text,
            }
        })
    }
}

fn word_pattern(literal: &str, caseless: bool) -> Regex {
    let flags = if caseless { "(?i)" } else { "" };
    Regex::new(&format!(r"{flags}\b{}\b", regex_lite::escape(literal)))
        .expect("header literal compiles as a pattern")
}

// --- Header families ---

static CONTENTS: LazyLock<Landmark> = LazyLock::new(|| {
    Landmark::new(
        "contents",
        &["Contents", "CONTENTS", "C O N T E N T S", "TABLEOFCONTENTS"],
    )
    .with_caseless("Contents lists available")
});

static ABSTRACT: LazyLock<Landmark> = LazyLock::new(|| {
    Landmark::new(
        "abstract",
        &["Abstract", "ABSTRACT", "A B S T R A C T", "a b s t r a c t"],
    )
});

static INTRODUCTION: LazyLock<Landmark> =
    LazyLock::new(|| Landmark::new("introduction", &["Introduction", "INTRODUCTION"]));

/// The bare word, used to keep the Introduction anchor out of reference lists.
static REFERENCES_WORD: LazyLock<Landmark> =
    LazyLock::new(|| Landmark::new("references", &["References", "REFERENCES"]));

static REFERENCES: LazyLock<Landmark> = LazyLock::new(|| {
    Landmark::new(
        "references",
        &[
            "References",
            "REFERENCES",
            "R E F E R E N C E S",
            "r e f e r e n c e s",
            "Cited Literature",
            "CITED LITERATURE",
            "Literature Cited",
            "Literature cited",
            "LITERATURE CITED",
            "Literature reviewed",
            "LITERATURE REVIEWED",
            "References Cited",
            "REFERENCES CITED",
            "Bibliography",
            "BIBLIOGRAPHY",
            "Select Bibliography",
            "SELECT BIBLIOGRAPHY",
        ],
    )
});

static APPENDIX: LazyLock<Landmark> =
    LazyLock::new(|| Landmark::new("appendix", &["Appendix", "APPENDIX"]));

/// Sections cut out of whichever page carries them last.
static BOILERPLATE: LazyLock<Vec<Landmark>> = LazyLock::new(|| {
    vec![
        Landmark::new(
            "acknowledgements",
            &[
                "Acknowledgements",
                "ACKNOWLEDGEMENTS",
                "A C K N O W L E D G E M E N T S",
                "Acknowledgments",
                "ACKNOWLEDGMENTS",
                "A C K N O W L E D G M E N T S",
                "Acknowledgement",
                "ACKNOWLEDGEMENT",
                "A C K N O W L E D G E M E N T",
                "Acknowledgment",
                "ACKNOWLEDGMENT",
                "A C K N O W L E D G M E N T",
            ],
        ),
        Landmark::new(
            "author contributions",
            &[
                "Author Contributions",
                "Author contributions",
                "AUTHOR CONTRIBUTIONS",
                "AUTHOR INFORMATION",
                "Author contribution statement",
                "CRediT authorship contribution statement",
            ],
        ),
        Landmark::new(
            "data availability",
            &[
                "Data availability statement",
                "Data Availability Statement",
                "DATA AVAILABILITY STATEMENT",
            ],
        ),
        Landmark::new(
            "competing interests",
            &[
                "Declaration of conflicting interests",
                "Declaration of Conflicting Interests",
                "Declaration of conflicting interest",
                "Declaration of Competing Interest",
                "Declaration of Competing interest",
                "Declaration of competing interest",
                "Declarations",
                "Disclosure statement",
                "Conflicts of Interest",
                "CONFLICT OF INTEREST",
            ],
        ),
    ]
});

// --- Page window ---

/// The surviving pages plus each one's index in the original document, so
/// positional windows stay relative to the full paper.
#[derive(Debug, Clone)]
struct PageWindow {
    pages: Vec<String>,
    numbers: Vec<usize>,
}

impl PageWindow {
    fn new(pages: &[String]) -> Self {
        Self {
            pages: pages.to_vec(),
            numbers: (0..pages.len()).collect(),
        }
    }

    fn last_number(&self) -> usize {
        self.numbers.last().copied().unwrap_or(0)
    }

    /// Whether page `i` sits within the first `fraction` of the document.
    fn within_leading(&self, i: usize, fraction: f64) -> bool {
        self.numbers[i] as f64 <= self.last_number() as f64 * fraction
    }

    /// Whether page `i` sits at or past `fraction` of the document.
    fn at_or_past(&self, i: usize, fraction: f64) -> bool {
        self.numbers[i] as f64 >= self.last_number() as f64 * fraction
    }

    fn drop_through(mut self, i: usize) -> Self {
        self.pages.drain(..=i);
        self.numbers.drain(..=i);
        self
    }

    fn drop_before(mut self, i: usize) -> Self {
        self.pages.drain(..i);
        self.numbers.drain(..i);
        self
    }

    fn truncate_after(mut self, i: usize) -> Self {
        self.pages.truncate(i + 1);
        self.numbers.truncate(i + 1);
        self
    }
}

// --- Passes ---

/// Contents pages at the front of the document.
///
/// Only the leading consecutive run counts, and only pages in the first
/// third of the document.
pub fn find_contents(pages: &[String]) -> LandmarkMatch {
    let last = pages.len().saturating_sub(1) as f64;
    let within_third = |i: &usize| *i as f64 <= last / 3.0;
    match CONTENTS.scan_run(pages) {
        LandmarkMatch::NotFound => LandmarkMatch::NotFound,
        LandmarkMatch::FoundAt(run) => {
            LandmarkMatch::from_indices(run.into_iter().filter(within_third).collect())
        }
        LandmarkMatch::FoundWithBreak(run) => {
            let kept: Vec<usize> = run.into_iter().filter(within_third).collect();
            if kept.is_empty() {
                LandmarkMatch::NotFound
            } else {
                LandmarkMatch::FoundWithBreak(kept)
            }
        }
    }
}

fn remove_contents(window: PageWindow) -> PageWindow {
    match find_contents(&window.pages).last() {
        Some(last) if !window.pages[last].contains(ELSEVIER_BANNER) => window.drop_through(last),
        _ => window,
    }
}

fn find_abstract(window: &PageWindow) -> LandmarkMatch {
    ABSTRACT.scan(&window.pages, |i, _| {
        window.within_leading(i, ABSTRACT_WINDOW)
    })
}

/// Introduction headers outside reference pages, early enough in the
/// document, and ahead of the first page that mentions References.
fn find_introduction(window: &PageWindow) -> LandmarkMatch {
    let candidates = INTRODUCTION.scan(&window.pages, |i, page| {
        !REFERENCES_WORD.matches(page) && window.within_leading(i, INTRODUCTION_WINDOW)
    });
    let first_references = REFERENCES_WORD.scan(&window.pages, |_, _| true).first();
    match (candidates.first(), first_references) {
        (Some(anchor), Some(refs)) if anchor > refs => LandmarkMatch::NotFound,
        _ => candidates,
    }
}

fn anchor_start(window: PageWindow) -> PageWindow {
    let (landmark, found) = match find_abstract(&window) {
        LandmarkMatch::NotFound => (&*INTRODUCTION, find_introduction(&window)),
        found => (&*ABSTRACT, found),
    };
    let Some(anchor) = found.first() else {
        return window;
    };
    debug!(landmark = landmark.name(), page = window.numbers[anchor], "Body start anchored");
    let mut window = window.drop_before(anchor);
    window.pages[0] = landmark.keep_after(&window.pages[0]);
    window
}

fn truncate_references(window: PageWindow) -> PageWindow {
    let Some(last) = REFERENCES.scan(&window.pages, |_, _| true).last() else {
        return window;
    };
    debug!(page = window.numbers[last], "Reference section cut");
    let mut window = window.truncate_after(last);
    window.pages[last] = REFERENCES.keep_before(&window.pages[last]);
    window
}

fn truncate_appendix(window: PageWindow) -> PageWindow {
    let found = APPENDIX.scan(&window.pages, |i, _| window.at_or_past(i, APPENDIX_WINDOW));
    let Some(first) = found.first() else {
        return window;
    };
    let mut window = window.truncate_after(first);
    window.pages[first] = APPENDIX.keep_before(&window.pages[first]);
    window
}

fn strip_boilerplate(mut window: PageWindow) -> PageWindow {
    for landmark in BOILERPLATE.iter() {
        if let Some(last) = landmark.scan(&window.pages, |_, _| true).last() {
            window.pages[last] = landmark.keep_before(&window.pages[last]);
        }
    }
    window
}

/// Run every pass over a document's pages and return the main-body lines.
pub fn extract_main_text(pages: &[String]) -> Vec<String> {
    if pages.is_empty() {
        return Vec::new();
    }
    let window = PageWindow::new(pages);
    let window = remove_contents(window);
    let window = if window.pages.is_empty() {
        window
    } else {
        anchor_start(window)
    };
    let window = truncate_references(window);
    let window = truncate_appendix(window);
    let window = strip_boilerplate(window);

    window
        .pages
        .join(PAGE_SEPARATOR)
        .split(PAGE_SEPARATOR)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_no_landmarks_passes_through() {
        let input = pages(&["alpha beta", "gamma delta", "epsilon"]);
        assert_eq!(extract_main_text(&input), input);
    }

    #[test]
    fn test_contents_run_stops_at_gap() {
        let input = pages(&["Contents", "CONTENTS", "body", "body", "Contents again", "x", "y"]);
        assert_eq!(find_contents(&input), LandmarkMatch::FoundWithBreak(vec![0, 1]));
    }

    #[test]
    fn test_contents_past_first_third_ignored() {
        let input = pages(&["title", "body", "body", "Contents", "end"]);
        assert_eq!(find_contents(&input), LandmarkMatch::NotFound);
    }

    #[test]
    fn test_contents_pages_dropped() {
        let input = pages(&["Contents 1 2 3", "chapter one text", "more", "end"]);
        assert_eq!(extract_main_text(&input), pages(&["chapter one text", "more", "end"]));
    }

    #[test]
    fn test_elsevier_banner_kept() {
        let input = pages(&["Contents lists available at ScienceDirect", "body", "more", "end"]);
        let out = extract_main_text(&input);
        assert_eq!(out[0], "Contents lists available at ScienceDirect");
    }

    #[test]
    fn test_abstract_anchor_drops_front_matter() {
        let input = pages(&[
            "Title page",
            "Authors Abstract The study",
            "body",
            "body",
            "body",
            "end",
        ]);
        let out = extract_main_text(&input);
        assert_eq!(out[0], " The study");
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_late_abstract_ignored() {
        let input = pages(&["Title", "body", "body", "body", "an Abstract idea"]);
        assert_eq!(extract_main_text(&input), input);
    }

    #[test]
    fn test_introduction_fallback() {
        let input = pages(&["Title", "1 Introduction Rivers", "body", "body", "body"]);
        let out = extract_main_text(&input);
        assert_eq!(out[0], " Rivers");
    }

    #[test]
    fn test_introduction_on_reference_page_ignored() {
        let input = pages(&["Title", "body", "References Smith Introduction to rivers"]);
        let out = extract_main_text(&input);
        // the reference pass still cuts the last page, but nothing before
        // it is dropped
        assert_eq!(out[0], "Title");
        assert_eq!(out[2], "");
    }

    #[test]
    fn test_references_truncate_tail() {
        let input = pages(&["body", "more body References Smith 2001", "Jones 2003"]);
        let out = extract_main_text(&input);
        assert_eq!(out, pages(&["body", "more body "]));
    }

    #[test]
    fn test_appendix_in_tail_only() {
        let input = pages(&["body", "see Appendix A", "x", "y", "z", "Appendix B tables"]);
        let out = extract_main_text(&input);
        assert_eq!(out.len(), 6);
        assert_eq!(out[1], "see Appendix A");
        assert_eq!(out[5], "");
    }

    #[test]
    fn test_acknowledgements_cut_mid_document() {
        let input = pages(&["body", "end of study Acknowledgements We thank", "more"]);
        let out = extract_main_text(&input);
        assert_eq!(out, pages(&["body", "end of study ", "more"]));
    }

    #[test]
    fn test_word_boundary_required() {
        assert!(!ABSTRACT.matches("Abstracts of talks"));
        assert!(ABSTRACT.matches("ABSTRACT:"));
        assert!(CONTENTS.matches("contents lists available at"));
    }

    #[test]
    fn test_round_trip_line_count() {
        let input = pages(&["a", "b", "", "c"]);
        assert_eq!(extract_main_text(&input).len(), input.len());
    }
}
