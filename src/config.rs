use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::PipelineError;

/// Central configuration loaded from environment variables.
///
/// Everything has a default so `sediment init` works out of the box. The
/// .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Directory of per-document page files (form-feed separated pages).
    pub pages_dir: PathBuf,
    /// Optional stopword CSV. Unset means the built-in English list.
    pub stopwords_path: Option<PathBuf>,
    /// Optional lemma lexicon, one word per line.
    pub lexicon_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Passes per fit during calibration sweeps.
    pub calibration_passes: usize,
    /// Passes for the final fit with calibrated parameters.
    pub final_passes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("SEDIMENT_DB_PATH").unwrap_or_else(|_| "./sediment.db".to_string()),
            pages_dir: env::var("SEDIMENT_PAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./pages")),
            stopwords_path: env::var("SEDIMENT_STOPWORDS").ok().map(PathBuf::from),
            lexicon_path: env::var("SEDIMENT_LEXICON").ok().map(PathBuf::from),
            output_dir: env::var("SEDIMENT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
            calibration_passes: parse_count("SEDIMENT_CALIBRATION_PASSES", 1)?,
            final_passes: parse_count("SEDIMENT_FINAL_PASSES", 50)?,
        })
    }

    /// Check that the page directory exists.
    /// Call this before any operation that reads document pages.
    pub fn require_pages_dir(&self) -> Result<()> {
        if !self.pages_dir.is_dir() {
            anyhow::bail!(
                "Page directory not found at {}.\n\
                 Set SEDIMENT_PAGES_DIR to the folder holding the extracted page text files.",
                self.pages_dir.display()
            );
        }
        Ok(())
    }
}

fn parse_count(var: &str, default: usize) -> Result<usize> {
    match env::var(var) {
        Ok(raw) => {
            let value: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{var} must be a positive integer, got {raw:?}"))?;
            if value == 0 {
                anyhow::bail!("{var} must be at least 1");
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

// --- Selection scope ---

/// States that intersect the basin.
pub const STATES: [&str; 30] = [
    "Alabama",
    "Arkansas",
    "Colorado",
    "Georgia",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maryland",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Pennsylvania",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Virginia",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// The five sub-basins. "Missouri" and "Ohio" carry a suffix so they never
/// collide with the state names.
pub const SUB_BASINS: [&str; 5] = [
    "Arkansas-Red",
    "Lower Mississippi",
    "Missouri (Basin)",
    "Ohio (Basin)",
    "Upper Mississippi",
];

/// Publication decades covered by the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decade {
    Nineties,
    TwoThousands,
    TwentyTens,
    TwentyTwenties,
}

impl Decade {
    pub const ALL: [Decade; 4] = [
        Decade::Nineties,
        Decade::TwoThousands,
        Decade::TwentyTens,
        Decade::TwentyTwenties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decade::Nineties => "1990s",
            Decade::TwoThousands => "2000s",
            Decade::TwentyTens => "2010s",
            Decade::TwentyTwenties => "2020s",
        }
    }

    pub fn first_year(&self) -> i32 {
        match self {
            Decade::Nineties => 1990,
            Decade::TwoThousands => 2000,
            Decade::TwentyTens => 2010,
            Decade::TwentyTwenties => 2020,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        let first = self.first_year();
        (first..first + 10).contains(&year)
    }

    pub fn parse(literal: &str) -> Option<Self> {
        Decade::ALL.into_iter().find(|d| d.as_str() == literal)
    }
}

/// Which documents a modelling run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    State(String),
    SubBasin(String),
    Decade(Decade),
}

impl Scope {
    /// Build a scope from its kind keyword and literal, checking the literal
    /// against the fixed lists.
    pub fn parse(kind: &str, value: Option<&str>) -> Result<Self, PipelineError> {
        let need_value = |what: &str| {
            value.ok_or_else(|| {
                PipelineError::Configuration(format!("{what} scope needs a value"))
            })
        };

        match kind.to_ascii_lowercase().as_str() {
            "all" => Ok(Scope::All),
            "state" => {
                let literal = need_value("state")?;
                if STATES.contains(&literal) {
                    Ok(Scope::State(literal.to_string()))
                } else {
                    Err(PipelineError::Configuration(format!(
                        "unknown state {literal:?}; options are {}",
                        STATES.join(", ")
                    )))
                }
            }
            "sub-basin" | "subbasin" => {
                let literal = need_value("sub-basin")?;
                if SUB_BASINS.contains(&literal) {
                    Ok(Scope::SubBasin(literal.to_string()))
                } else {
                    Err(PipelineError::Configuration(format!(
                        "unknown sub-basin {literal:?}; options are {}",
                        SUB_BASINS.join(", ")
                    )))
                }
            }
            "decade" => {
                let literal = need_value("decade")?;
                Decade::parse(literal).map(Scope::Decade).ok_or_else(|| {
                    PipelineError::Configuration(format!(
                        "unknown decade {literal:?}; options are 1990s, 2000s, 2010s, 2020s"
                    ))
                })
            }
            other => Err(PipelineError::Configuration(format!(
                "unknown scope {other:?}; options are all, state, sub-basin, decade"
            ))),
        }
    }

    /// Report label. Also names the word-cloud shape mask.
    pub fn label(&self) -> &str {
        match self {
            Scope::All => "Basin-Wide",
            Scope::State(name) | Scope::SubBasin(name) => name,
            Scope::Decade(decade) => decade.as_str(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// --- Run configuration ---

pub const MAX_NGRAM_ORDER: usize = 10;

/// Every choice a modelling run needs, fixed up front and passed explicitly
/// to the corpus builder, the calibrator and the report writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Preprocessing was re-run before this model run.
    pub reprocessed: bool,
    /// When reprocessing, only documents without cleaned text were handled.
    pub new_only: bool,
    pub ngram_order: usize,
    pub suppress_common: bool,
    pub tfidf: bool,
    pub default_alpha: bool,
    pub default_eta: bool,
    pub scope: Scope,
}

impl RunConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reprocessed: bool,
        new_only: bool,
        ngram_order: usize,
        suppress_common: bool,
        tfidf: bool,
        default_alpha: bool,
        default_eta: bool,
        scope: Scope,
    ) -> Result<Self, PipelineError> {
        if !(1..=MAX_NGRAM_ORDER).contains(&ngram_order) {
            return Err(PipelineError::Configuration(format!(
                "n-gram order must be between 1 and {MAX_NGRAM_ORDER}, got {ngram_order}"
            )));
        }
        Ok(Self {
            reprocessed,
            new_only,
            ngram_order,
            suppress_common,
            tfidf,
            default_alpha,
            default_eta,
            scope,
        })
    }

    /// Folder name encoding the six run choices, e.g.
    /// `RedoN_Ngram2_RemoveY_TFIDFN_AlphaY_EtaN`.
    pub fn folder_name(&self) -> String {
        format!(
            "Redo{}_Ngram{}_Remove{}_TFIDF{}_Alpha{}_Eta{}",
            yes_no(self.reprocessed),
            self.ngram_order,
            yes_no(self.suppress_common),
            yes_no(self.tfidf),
            yes_no(self.default_alpha),
            yes_no(self.default_eta),
        )
    }
}

fn yes_no(flag: bool) -> char {
    if flag {
        'Y'
    } else {
        'N'
    }
}
