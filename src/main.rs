use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use sediment::config::{Config, RunConfig, Scope};
use sediment::extract::lemma::Lemmatizer;
use sediment::extract::stopwords::resolve_stopwords;
use sediment::output::report::CsvReportWriter;
use sediment::output::terminal;
use sediment::pipeline::{model, preprocess};
use sediment::source::TextDirSource;
use sediment::topics::lda::VariationalLda;
use sediment::{db, status};

/// Sediment: topic modelling for a collection of river-basin research papers.
///
/// Cleans the body text of extracted PDFs, then fits a calibrated LDA model
/// over a chosen slice of the collection and writes its reports.
#[derive(Parser)]
#[command(name = "sediment", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import document metadata from a CSV file
    Import {
        /// CSV with columns filename,title,citation,url,year,states,sub_basins
        csv: PathBuf,
    },

    /// Clean the page text of stored documents
    Preprocess {
        /// Only documents that have never been cleaned
        #[arg(long)]
        new_only: bool,
    },

    /// Fit a calibrated topic model and write its reports
    Model {
        /// Longest n-gram to index (1-10)
        #[arg(long)]
        ngram: usize,

        /// Drop the built-in list of ubiquitous domain terms
        #[arg(long)]
        suppress_common: bool,

        /// Weight the training corpus by TF-IDF
        #[arg(long)]
        tfidf: bool,

        /// Sweep alpha instead of using 50/k
        #[arg(long)]
        calibrate_alpha: bool,

        /// Sweep eta instead of using 0.1
        #[arg(long)]
        calibrate_eta: bool,

        /// Which documents to model: all, state, sub-basin or decade
        #[arg(long, default_value = "all")]
        scope: String,

        /// State, sub-basin or decade literal for the chosen scope
        #[arg(long)]
        value: Option<String>,

        /// Rerun preprocessing before modelling
        #[arg(long)]
        reprocess: bool,

        /// With --reprocess, only clean documents that have never been cleaned
        #[arg(long, requires = "reprocess")]
        new_only: bool,
    },

    /// Show system status (DB location, document counts)
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sediment=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Sediment database...");
            let config = Config::load()?;
            let conn = db::initialize(&config.db_path)?;
            let table_count = db::schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: sediment import <metadata.csv>");
        }

        Commands::Import { csv } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let count = db::import::import_metadata(&conn, &csv)?;
            println!("Imported {} documents from {}", count, csv.display());
            println!("{}", "Then run: sediment preprocess".dimmed());
        }

        Commands::Preprocess { new_only } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let summary = run_preprocess(&config, &conn, new_only)?;
            terminal::display_preprocess_summary(&summary);
        }

        Commands::Model {
            ngram,
            suppress_common,
            tfidf,
            calibrate_alpha,
            calibrate_eta,
            scope,
            value,
            reprocess,
            new_only,
        } => {
            let config = Config::load()?;
            // Validate every choice before touching the database.
            let scope = Scope::parse(&scope, value.as_deref())?;
            let run_config = RunConfig::new(
                reprocess,
                new_only,
                ngram,
                suppress_common,
                tfidf,
                !calibrate_alpha,
                !calibrate_eta,
                scope,
            )?;
            let conn = db::open(&config.db_path)?;

            if reprocess {
                let summary = run_preprocess(&config, &conn, new_only)?;
                terminal::display_preprocess_summary(&summary);
            }

            println!(
                "Modelling {} documents (folder {})...",
                run_config.scope.label().bold(),
                run_config.folder_name()
            );
            let run = model::run(
                &conn,
                run_config,
                &VariationalLda,
                config.calibration_passes,
                config.final_passes,
            )?;
            terminal::display_model_run(&run);

            let mut writer = CsvReportWriter::create(&config.output_dir, &run.config)?;
            model::publish(&run, &mut writer)?;
            println!(
                "{} {} files in {}",
                "Report written:".bold(),
                writer.written().len(),
                writer.dir().display()
            );
        }

        Commands::Status => {
            let config = Config::load()?;
            status::show(&config)?;
        }
    }

    Ok(())
}

/// Load stopwords and lemmatizer, then clean stored documents.
fn run_preprocess(
    config: &Config,
    conn: &rusqlite::Connection,
    new_only: bool,
) -> Result<preprocess::PreprocessSummary> {
    config.require_pages_dir()?;
    let stopwords = resolve_stopwords(config.stopwords_path.as_deref())?;
    let lemmatizer = match &config.lexicon_path {
        Some(path) => Lemmatizer::from_lexicon_file(path)?,
        None => Lemmatizer::new(),
    };
    let source = TextDirSource::new(&config.pages_dir);
    preprocess::run(conn, &source, &stopwords, &lemmatizer, new_only)
}
