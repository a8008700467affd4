// Colored terminal output for preprocessing batches and model runs.
//
// main.rs delegates all human-facing summaries here.

use colored::Colorize;

use crate::corpus::dictionary::TermDictionary;
use crate::pipeline::model::ModelRun;
use crate::pipeline::preprocess::PreprocessSummary;

/// Terms listed per topic in the summary.
const SUMMARY_TERMS: usize = 10;
/// Example titles listed per topic.
const SUMMARY_TITLES: usize = 3;

/// Display the outcome of a preprocessing batch.
pub fn display_preprocess_summary(summary: &PreprocessSummary) {
    if summary.total() == 0 {
        println!("No documents needed preprocessing.");
        return;
    }

    println!("\n{}", "=== Preprocessing ===".bold());
    println!("  Cleaned: {}", summary.processed.to_string().green());
    if summary.failed > 0 {
        println!("  Skipped: {}", summary.failed.to_string().yellow());
        for (filename, reason) in &summary.failures {
            println!("    {} {}", filename, super::truncate_chars(reason, 100).dimmed());
        }
    }
}

/// Display the calibrated parameters and each topic's leading terms and
/// documents.
pub fn display_model_run(run: &ModelRun) {
    let params = &run.calibration.parameters;
    println!(
        "\n{}",
        format!(
            "=== {} Topic Model ({} documents) ===",
            run.config.scope.label(),
            run.documents.len()
        )
        .bold()
    );
    println!(
        "  Topics: {}  Seed: {} ({:.2}%)  Alpha: {:.2}  Eta: {:.2}",
        params.num_topics.to_string().bold(),
        params.seed,
        params.seed_percent,
        params.alpha,
        params.eta
    );
    println!(
        "  Coherence (u_mass): {}",
        format!("{:.4}", run.calibration.final_coherence).bold()
    );

    let model = &run.calibration.model;
    for topic in 0..model.num_topics() {
        let terms = topic_term_list(&run.corpus.dictionary, model.topic_terms(topic, SUMMARY_TERMS));
        let share = run
            .evaluation
            .assignments
            .iter()
            .filter(|a| a.topic == topic + 1)
            .count();
        println!(
            "\n  {} {}",
            format!("Topic {}", topic + 1).bold(),
            format!("({share} documents)").dimmed()
        );
        println!("    {}", terms.join(", "));

        let titles = run
            .evaluation
            .density
            .iter()
            .filter(|row| row.topic == topic + 1 && !row.title.is_empty())
            .take(SUMMARY_TITLES);
        for row in titles {
            println!("    - {}", super::truncate_chars(&row.title, 80).dimmed());
        }
    }
    println!();
}

fn topic_term_list(dictionary: &TermDictionary, ranked: Vec<(usize, f64)>) -> Vec<String> {
    ranked
        .into_iter()
        .filter_map(|(id, _)| dictionary.term(id).map(str::to_string))
        .collect()
}
