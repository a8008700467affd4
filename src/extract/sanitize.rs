// Line and token sanitizing for extracted page text.
//
// Two stages. `remove_unwanted_lines` drops whole lines that are layout
// debris: page numbers, equations, table cells, affiliation and licence
// lines, repeated headers. `strip_inside_lines` then cleans what's left
// character by character and hands back one text blob.

use std::collections::HashSet;

/// Lines containing any of these (compared lowercase) are affiliations,
/// identifiers or running headers.
const LINE_BLOCKLIST: &[&str] = &[
    "doi:",
    "http",
    "www.",
    "journal of",
    "@",
    ".gov",
    ", usa",
    "10.10",
    "10.11",
    "©",
    "department of",
    "e-mail",
    "fax",
    "tel:",
    "all rights reserved",
    "phone",
];

/// Typographic forms mapped back to plain Latin text.
const CHARACTER_MAP: &[(&str, &str)] = &[
    ("\u{FB02}", "fl"),
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{2013}", "-"),
    ("\u{2010}", "-"),
    ("\u{2011}", "-"),
    ("\u{00F1}", "n"),
    ("\u{00E9}", "e"),
];

/// Trim, collapse whitespace and drop layout debris, then dedupe and fold
/// ligatures and dash variants.
pub fn remove_unwanted_lines(lines: &[String]) -> Vec<String> {
    let kept: Vec<String> = lines
        .iter()
        .map(|line| collapse_whitespace(line))
        .map(|line| match line.strip_prefix(", ") {
            Some(rest) => rest.to_string(),
            None => line,
        })
        .filter(|line| !line.is_empty())
        .filter(|line| line.chars().count() != 1)
        .filter(|line| line.parse::<f64>().is_err())
        .filter(|line| !line.contains('='))
        .filter(|line| !is_numeric_debris(line))
        .filter(|line| !is_blocklisted(line))
        .collect();

    dedup_keep_first(kept)
        .into_iter()
        .map(|line| normalize_characters(&line))
        .collect()
}

/// Strip digits and parentheticals, rejoin hyphenated line breaks, drop
/// non-Latin characters and repeated rows, then join with newlines.
pub fn strip_inside_lines(lines: &[String]) -> String {
    let without_digits: Vec<String> = lines
        .iter()
        .map(|line| line.chars().filter(|c| !c.is_ascii_digit()).collect())
        .collect();

    let without_parens: Vec<String> = without_digits
        .iter()
        .map(|line| trim_open_parentheses(&remove_parentheticals(line)))
        .collect();

    let joined = join_hyphenated_lines(without_parens);

    let latin: Vec<String> = joined
        .iter()
        .map(|line| {
            line.chars()
                .filter(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '.' | '-'))
                .collect()
        })
        .collect();

    collapse_adjacent_duplicates(latin).join("\n")
}

/// Trim and reduce every whitespace run to a single space.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lines made only of digits, whitespace and ASCII punctuation.
fn is_numeric_debris(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_numeric() || c.is_whitespace() || c.is_ascii_punctuation())
}

fn is_blocklisted(line: &str) -> bool {
    let lower = line.to_lowercase();
    LINE_BLOCKLIST.iter().any(|needle| lower.contains(needle))
}

/// Order-preserving de-duplication: the first occurrence of each line wins.
pub fn dedup_keep_first(lines: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(lines.len());
    lines
        .into_iter()
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

fn normalize_characters(line: &str) -> String {
    CHARACTER_MAP
        .iter()
        .fold(line.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Remove every `(...)` span closed on the same line. The shortest span
/// from each opening parenthesis wins.
fn remove_parentheticals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Handle parentheses that span lines: text before a stray `)` belongs to
/// a span opened on an earlier line, text after a stray `(` to one closed
/// later.
fn trim_open_parentheses(line: &str) -> String {
    let after_close = match line.rfind(')') {
        Some(close) => &line[close + 1..],
        None => line,
    };
    match after_close.find('(') {
        Some(open) => after_close[..open].to_string(),
        None => after_close.to_string(),
    }
}

fn ends_with_split_hyphen(line: &str) -> bool {
    line.ends_with('-') && !line.ends_with(" -")
}

/// Join a line ending in a word-splitting hyphen with the next line,
/// dropping the hyphen. A hyphen on the last line has nothing to join.
pub fn join_hyphenated_lines(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter();
    while let Some(mut line) = iter.next() {
        while ends_with_split_hyphen(&line) {
            let Some(next) = iter.next() else { break };
            line.pop();
            line.push_str(&next);
        }
        out.push(line);
    }
    out
}

/// Collapse runs of identical adjacent lines to one line.
pub fn collapse_adjacent_duplicates(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if out.last() != Some(&line) {
            out.push(line);
        }
    }
    out
}
