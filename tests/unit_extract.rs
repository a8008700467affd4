// Unit tests for the text cleaning stages.
//
// Each test feeds a small synthetic paper through the public extraction
// functions and checks which text survives.

use sediment::error::PipelineError;
use sediment::extract::clean_document;
use sediment::extract::landmarks::extract_main_text;
use sediment::extract::lemma::{Lemmatizer, PartOfSpeech};
use sediment::extract::normalize::{keep_sentences, remove_citations};
use sediment::extract::sanitize::{remove_unwanted_lines, strip_inside_lines};
use sediment::extract::stopwords::Stopwords;
use sediment::source::split_pages;

fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

fn stopwords(words: &[&str]) -> Stopwords {
    words.iter().map(|w| w.to_string()).collect()
}

// ============================================================
// Section boundaries
// ============================================================

#[test]
fn contents_page_and_introduction_anchor() {
    let pages = strings(&[
        "Contents\n1 Introduction 3\n2 Methods 7",
        "Introduction\nGravel bars migrate.",
        "Channels widen.",
        "More text here.",
        "Last page words.",
        "REFERENCES\nJones 2003",
    ]);
    let lines = extract_main_text(&pages);
    assert_eq!(
        lines,
        strings(&[
            "",
            "Gravel bars migrate.",
            "Channels widen.",
            "More text here.",
            "Last page words.",
            "",
        ]),
        "contents page, the Introduction header and the reference list should all go"
    );
}

#[test]
fn form_feed_pages_feed_boundary_detection() {
    let raw = "Title page\x0cAuthors Abstract Sediment study\x0cbody\x0cbody\x0cbody\x0cend\x0c";
    let pages = split_pages(raw).expect("pages with content");
    assert_eq!(pages.len(), 6, "trailing empty page is dropped");
    let lines = extract_main_text(&pages);
    assert_eq!(lines[0], " Sediment study");
}

// ============================================================
// Line sanitizing
// ============================================================

#[test]
fn sanitizer_drops_debris_and_rejoins_hyphens() {
    let lines = strings(&[
        "  Sediment   trans-",
        "port rose (Smith, 2001) in 2003.",
        "12",
        "doi:10.1/abc",
        "a = b",
        "  Sediment   trans-",
    ]);
    let kept = remove_unwanted_lines(&lines);
    assert_eq!(
        kept,
        strings(&["Sediment trans-", "port rose (Smith, 2001) in 2003."]),
        "numbers, identifiers, equations and repeats should be dropped"
    );
    assert_eq!(strip_inside_lines(&kept), "Sediment transport rose  in .");
}

// ============================================================
// Normalization
// ============================================================

#[test]
fn boilerplate_sentences_do_not_reach_tokens() {
    let sentences = keep_sentences("Open Access article. Bedload dominates. Key words sand");
    assert_eq!(sentences, vec!["Bedload dominates"]);
}

#[test]
fn chained_citations_are_all_removed() {
    let tokens = strings(&["as", "Smith", "Jones", "et", "al", "et", "al", "showed"]);
    let out = remove_citations(tokens);
    assert_eq!(out, strings(&["as", "showed"]));
}

#[test]
fn lemmatizer_handles_common_forms() {
    let lemmatizer = Lemmatizer::new();
    assert_eq!(lemmatizer.lemmatize("rivers", PartOfSpeech::Noun), "river");
    assert_eq!(lemmatizer.lemmatize_all("flooding"), "flood");
    assert_eq!(lemmatizer.lemmatize_all("Rivers"), "Rivers", "capitalized tokens are kept");
}

// ============================================================
// Whole document
// ============================================================

#[test]
fn full_paper_keeps_only_body_lemmas() {
    let pages = strings(&[
        "Journal of Rivers\nA study of sediment",
        "Authors\nAbstract\nSediment loads in the rivers increased sharply.",
        "Flood pulses moved sand downstream.\n12",
        "Turbidity was high each month.",
        "Acknowledgements\nWe thank the field crew.",
        "References\nSmith J. 2001. Sediment budgets.",
    ]);
    let text = clean_document(
        "paper.txt",
        &pages,
        &stopwords(&["in", "the", "was", "each"]),
        &Lemmatizer::new(),
    )
    .unwrap();
    assert_eq!(
        text,
        "Sediment load river increase sharply Flood pulse move sand downstream Turbidity high month"
    );
    assert!(!text.contains("thank"), "acknowledgements must be cut");
    assert!(!text.contains("budget"), "references must be cut");
}

#[test]
fn document_with_only_debris_is_malformed() {
    let pages = strings(&["1\n2\n3", "= =", "4.5"]);
    let err = clean_document("debris.txt", &pages, &Stopwords::default(), &Lemmatizer::new())
        .unwrap_err();
    match err {
        PipelineError::MalformedInput { document, .. } => assert_eq!(document, "debris.txt"),
        other => panic!("expected MalformedInput, got {other:?}"),
    }
}
