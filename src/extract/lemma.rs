// Lemmatizer: maps inflected words to a dictionary form.
//
// Follows WordNet's morphological detachment: each part of speech has a
// short list of suffix rewrites plus a table of irregular forms. With a
// lexicon loaded, a rewrite only counts when it lands on a known word and
// the shortest known candidate wins. Without one, a conservative rule set
// decides instead: doubled consonants are undoubled, a final "e" is
// restored after stems that need it, and a few words that merely look
// inflected are left alone.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl PartOfSpeech {
    /// Order in which normalization applies the hypotheses.
    pub const SEQUENCE: [PartOfSpeech; 4] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
    ];

    /// WordNet detachment rules: (suffix, replacement).
    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PartOfSpeech::Noun => &[
                ("s", ""),
                ("ses", "s"),
                ("ves", "f"),
                ("xes", "x"),
                ("zes", "z"),
                ("ches", "ch"),
                ("shes", "sh"),
                ("men", "man"),
                ("ies", "y"),
            ],
            PartOfSpeech::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            PartOfSpeech::Adjective => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
            PartOfSpeech::Adverb => &[],
        }
    }
}

const NOUN_EXCEPTIONS: &[(&str, &str)] = &[
    ("algae", "alga"),
    ("analyses", "analysis"),
    ("appendices", "appendix"),
    ("axes", "axis"),
    ("calves", "calf"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("diagnoses", "diagnosis"),
    ("feet", "foot"),
    ("formulae", "formula"),
    ("fungi", "fungus"),
    ("geese", "goose"),
    ("genera", "genus"),
    ("halves", "half"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("knives", "knife"),
    ("larvae", "larva"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("loci", "locus"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("nuclei", "nucleus"),
    ("phenomena", "phenomenon"),
    ("radii", "radius"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("stimuli", "stimulus"),
    ("strata", "stratum"),
    ("syntheses", "synthesis"),
    ("taxa", "taxon"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("women", "woman"),
];

const VERB_EXCEPTIONS: &[(&str, &str)] = &[
    ("arisen", "arise"),
    ("arose", "arise"),
    ("became", "become"),
    ("began", "begin"),
    ("begun", "begin"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("built", "build"),
    ("caught", "catch"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("came", "come"),
    ("controlled", "control"),
    ("controlling", "control"),
    ("created", "create"),
    ("creating", "create"),
    ("dealt", "deal"),
    ("drawn", "draw"),
    ("drew", "draw"),
    ("driven", "drive"),
    ("drove", "drive"),
    ("fallen", "fall"),
    ("fed", "feed"),
    ("fell", "fall"),
    ("felt", "feel"),
    ("flew", "fly"),
    ("flown", "fly"),
    ("found", "find"),
    ("froze", "freeze"),
    ("frozen", "freeze"),
    ("gave", "give"),
    ("given", "give"),
    ("gone", "go"),
    ("grew", "grow"),
    ("grown", "grow"),
    ("held", "hold"),
    ("kept", "keep"),
    ("knew", "know"),
    ("known", "know"),
    ("labelled", "label"),
    ("laid", "lay"),
    ("led", "lead"),
    ("left", "leave"),
    ("lost", "lose"),
    ("made", "make"),
    ("meant", "mean"),
    ("met", "meet"),
    ("modelled", "model"),
    ("modelling", "model"),
    ("monitored", "monitor"),
    ("monitoring", "monitor"),
    ("paid", "pay"),
    ("ran", "run"),
    ("risen", "rise"),
    ("rose", "rise"),
    ("said", "say"),
    ("sank", "sink"),
    ("saw", "see"),
    ("seen", "see"),
    ("sent", "send"),
    ("shown", "show"),
    ("sold", "sell"),
    ("sought", "seek"),
    ("spent", "spend"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("stood", "stand"),
    ("struck", "strike"),
    ("sunk", "sink"),
    ("taken", "take"),
    ("taught", "teach"),
    ("thought", "think"),
    ("threw", "throw"),
    ("thrown", "throw"),
    ("told", "tell"),
    ("took", "take"),
    ("travelled", "travel"),
    ("underwent", "undergo"),
    ("undergone", "undergo"),
    ("understood", "understand"),
    ("went", "go"),
    ("won", "win"),
    ("wrote", "write"),
    ("written", "write"),
];

const ADJECTIVE_EXCEPTIONS: &[(&str, &str)] = &[
    ("best", "good"),
    ("better", "good"),
    ("bigger", "big"),
    ("biggest", "big"),
    ("coarser", "coarse"),
    ("coarsest", "coarse"),
    ("colder", "cold"),
    ("coldest", "cold"),
    ("deeper", "deep"),
    ("deepest", "deep"),
    ("drier", "dry"),
    ("driest", "dry"),
    ("earlier", "early"),
    ("earliest", "early"),
    ("easier", "easy"),
    ("farther", "far"),
    ("faster", "fast"),
    ("fastest", "fast"),
    ("finer", "fine"),
    ("finest", "fine"),
    ("further", "far"),
    ("greater", "great"),
    ("greatest", "great"),
    ("heavier", "heavy"),
    ("higher", "high"),
    ("highest", "high"),
    ("larger", "large"),
    ("largest", "large"),
    ("longer", "long"),
    ("longest", "long"),
    ("lower", "low"),
    ("lowest", "low"),
    ("newer", "new"),
    ("newest", "new"),
    ("older", "old"),
    ("oldest", "old"),
    ("slower", "slow"),
    ("slowest", "slow"),
    ("smaller", "small"),
    ("smallest", "small"),
    ("stronger", "strong"),
    ("strongest", "strong"),
    ("warmer", "warm"),
    ("warmest", "warm"),
    ("wetter", "wet"),
    ("wettest", "wet"),
    ("wider", "wide"),
    ("widest", "wide"),
    ("worse", "bad"),
    ("worst", "bad"),
];

const ADVERB_EXCEPTIONS: &[(&str, &str)] = &[("farther", "far"), ("further", "far")];

/// Words that end like an inflection but are already lemmas.
const UNINFLECTED: &[&str] = &[
    "alias",
    "always",
    "anything",
    "atlas",
    "bias",
    "bleed",
    "breed",
    "bring",
    "canvas",
    "ceiling",
    "evening",
    "everything",
    "gas",
    "hundred",
    "king",
    "lens",
    "morning",
    "news",
    "nothing",
    "ring",
    "series",
    "sing",
    "something",
    "species",
    "speed",
    "spring",
    "string",
    "swing",
    "thing",
    "watershed",
    "wing",
];

type ExceptionTable = HashMap<(PartOfSpeech, &'static str), &'static str>;

static EXCEPTIONS: LazyLock<ExceptionTable> = LazyLock::new(|| {
    let tables = [
        (PartOfSpeech::Noun, NOUN_EXCEPTIONS),
        (PartOfSpeech::Verb, VERB_EXCEPTIONS),
        (PartOfSpeech::Adjective, ADJECTIVE_EXCEPTIONS),
        (PartOfSpeech::Adverb, ADVERB_EXCEPTIONS),
    ];
    tables
        .into_iter()
        .flat_map(|(pos, table)| table.iter().map(move |&(form, lemma)| ((pos, form), lemma)))
        .collect()
});

static UNINFLECTED_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| UNINFLECTED.iter().copied().collect());

/// Rule-based lemmatizer with an optional lexicon of known lemmas.
#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
    lexicon: Option<HashSet<String>>,
}

impl Lemmatizer {
    /// Lemmatizer without a lexicon, using the built-in heuristics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(words: impl IntoIterator<Item = String>) -> Self {
        Self {
            lexicon: Some(words.into_iter().map(|w| w.to_lowercase()).collect()),
        }
    }

    /// Load a lexicon file: the first whitespace-separated field of each
    /// line is a lemma. Lines starting with whitespace or `#` are skipped,
    /// so WordNet `index.*` files work as-is.
    pub fn from_lexicon_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lemma lexicon {}", path.display()))?;
        let words = raw
            .lines()
            .filter(|line| !line.starts_with(char::is_whitespace) && !line.starts_with('#'))
            .filter_map(|line| line.split_whitespace().next())
            .map(|word| word.replace('_', " "));
        Ok(Self::with_lexicon(words))
    }

    pub fn has_lexicon(&self) -> bool {
        self.lexicon.is_some()
    }

    /// Lemma of `word` under one part-of-speech hypothesis. Words with
    /// capitals or other non-letter characters come back unchanged.
    pub fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        if word.is_empty() || !word.chars().all(|c| c.is_ascii_lowercase() || c == '-') {
            return word.to_string();
        }
        match &self.lexicon {
            Some(lexicon) => morphy(word, pos, lexicon).unwrap_or_else(|| word.to_string()),
            None => heuristic(word, pos),
        }
    }

    /// Apply every hypothesis in `PartOfSpeech::SEQUENCE`, each on the
    /// previous result.
    pub fn lemmatize_all(&self, word: &str) -> String {
        PartOfSpeech::SEQUENCE
            .iter()
            .fold(word.to_string(), |current, pos| self.lemmatize(&current, *pos))
    }
}

fn exception(word: &str, pos: PartOfSpeech) -> Option<&'static str> {
    EXCEPTIONS.get(&(pos, word)).copied()
}

fn apply_rules(forms: &[String], pos: PartOfSpeech) -> Vec<String> {
    let mut out = Vec::new();
    for form in forms {
        for (suffix, replacement) in pos.rules() {
            if let Some(stem) = form.strip_suffix(suffix) {
                let candidate = format!("{stem}{replacement}");
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

fn shortest_known(candidates: &[String], lexicon: &HashSet<String>) -> Option<String> {
    candidates
        .iter()
        .filter(|c| !c.is_empty() && lexicon.contains(c.as_str()))
        .min_by_key(|c| c.len())
        .cloned()
}

/// WordNet morphy: exceptions first, then rule rewrites repeated until
/// something lands in the lexicon.
fn morphy(word: &str, pos: PartOfSpeech, lexicon: &HashSet<String>) -> Option<String> {
    if let Some(lemma) = exception(word, pos) {
        return shortest_known(&[word.to_string(), lemma.to_string()], lexicon);
    }

    let mut forms = apply_rules(&[word.to_string()], pos);
    let mut first = vec![word.to_string()];
    first.extend(forms.iter().cloned());
    if let Some(found) = shortest_known(&first, lexicon) {
        return Some(found);
    }
    while !forms.is_empty() {
        forms = apply_rules(&forms, pos);
        if let Some(found) = shortest_known(&forms, lexicon) {
            return Some(found);
        }
    }
    None
}

// --- Lexicon-free heuristics ---

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn plausible(stem: &str) -> bool {
    stem.len() >= 3 && stem.chars().any(is_vowel)
}

fn heuristic(word: &str, pos: PartOfSpeech) -> String {
    if let Some(lemma) = exception(word, pos) {
        return lemma.to_string();
    }
    if UNINFLECTED_SET.contains(word) {
        return word.to_string();
    }
    let lemma = match pos {
        PartOfSpeech::Noun => strip_plural(word),
        PartOfSpeech::Verb => strip_plural(word).or_else(|| strip_verb_ending(word)),
        PartOfSpeech::Adjective | PartOfSpeech::Adverb => None,
    };
    lemma.unwrap_or_else(|| word.to_string())
}

fn strip_plural(word: &str) -> Option<String> {
    const REWRITES: &[(&str, &str)] = &[
        ("ies", "y"),
        ("sses", "ss"),
        ("ches", "ch"),
        ("shes", "sh"),
        ("xes", "x"),
        ("zes", "z"),
    ];
    for (suffix, replacement) in REWRITES {
        if let Some(stem) = word.strip_suffix(suffix) {
            let candidate = format!("{stem}{replacement}");
            return plausible(&candidate).then_some(candidate);
        }
    }
    if ["ss", "us", "is"].iter().any(|end| word.ends_with(end)) {
        return None;
    }
    let stem = word.strip_suffix('s')?;
    plausible(stem).then(|| stem.to_string())
}

fn strip_verb_ending(word: &str) -> Option<String> {
    // proceed, exceed, speed: far more often lemmas than past tenses
    if word.ends_with("eed") {
        return None;
    }
    let stem = word
        .strip_suffix("ing")
        .or_else(|| word.strip_suffix("ed"))?;

    let short_vc = stem.len() == 2 && {
        let mut chars = stem.chars();
        matches!((chars.next(), chars.next()), (Some(a), Some(b)) if is_vowel(a) && !is_vowel(b))
    };
    if !plausible(stem) && !short_vc {
        return None;
    }
    if short_vc {
        return Some(format!("{stem}e"));
    }
    if let Some(undoubled) = undouble(stem) {
        return Some(undoubled);
    }
    if needs_final_e(stem) {
        return Some(format!("{stem}e"));
    }
    Some(stem.to_string())
}

/// `stopp` -> `stop`, but `call` and `pass` keep their double letter.
fn undouble(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n < 3 {
        return None;
    }
    let (a, b) = (bytes[n - 2] as char, bytes[n - 1] as char);
    (a == b && !is_vowel(a) && !matches!(a, 'l' | 's' | 'z' | 'f')).then(|| stem[..n - 1].to_string())
}

/// Stems whose base form ends in a silent "e" (`estimat`, `observ`,
/// `reduc`, `provid`, ...).
fn needs_final_e(stem: &str) -> bool {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let last = chars[n - 1];
    let prev = chars[n - 2];
    let before = if n >= 3 { Some(chars[n - 3]) } else { None };
    let consonant_before = before.is_some_and(|c| !is_vowel(c));

    match (prev, last) {
        (_, 'c') | (_, 'v') | (_, 'z') => true,
        ('r', 'g') | ('d', 'g') => true,
        ('a', 'g') => n > 4,
        ('b' | 'c' | 'd' | 'f' | 'g' | 'k' | 'p' | 's' | 't' | 'z', 'l') => true,
        ('u', 'l') => true,
        ('a', 't') => !matches!(before, Some('e') | Some('o')),
        ('u' | 'o', 't') => consonant_before,
        ('i', 't') => consonant_before && n <= 4,
        ('i' | 'u' | 'o' | 'a', 'd') => consonant_before,
        ('i', 'n') => consonant_before,
        ('i', 'r') => !matches!(before, Some('a') | Some('e') | Some('o')),
        ('u', 'r') => before != Some('o'),
        ('a', 'r') => consonant_before,
        ('o', 'r') => consonant_before && n <= 6,
        ('a' | 'o', 'p') => consonant_before,
        ('a' | 'o', 'k') => consonant_before,
        ('e' | 'a' | 'o' | 'i' | 'r' | 'n', 's') => {
            !(prev == 'e' && before.is_some_and(|c| !is_vowel(c)))
        }
        ('u', 's') => before == Some('a'),
        _ => false,
    }
}
