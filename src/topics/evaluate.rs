// Topic evaluation: per-document assignments and per-topic word webs.
//
// Everything here is data for the report sink. Nothing is rendered.

use serde::Serialize;
use tracing::info;

use super::coherence::DocumentIndex;
use super::lda::TrainedModel;
use crate::corpus::TrainingCorpus;

/// Terms per topic in a word web.
pub const WEB_TOP_N: usize = 25;
/// Terms per word cloud.
pub const CLOUD_TOP_N: usize = 100;
/// Label font sizes for word-web nodes.
pub const LABEL_SIZE_RANGE: (f64, f64) = (15.0, 50.0);
/// Edge weights for word-web pairs.
pub const EDGE_WEIGHT_RANGE: (f64, f64) = (0.1, 1.0);

/// A document's topic distribution and its most probable topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicAssignment {
    pub probabilities: Vec<f64>,
    /// 1-indexed for reporting.
    pub topic: usize,
}

/// Bibliographic fields shown next to each document's densities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentLabel {
    pub title: String,
    pub citation: String,
    pub url: String,
}

/// One row of the document-topic density table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityRow {
    pub title: String,
    pub citation: String,
    /// Per-topic probability truncated to 3 decimals.
    pub probabilities: Vec<String>,
    pub topic: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebNode {
    pub term: String,
    pub probability: f64,
    pub label_size: f64,
    /// Sum of this term's raw pair counts.
    pub pair_count: usize,
    pub pair_percent: f64,
    /// Documents containing the term.
    pub solo_count: usize,
    pub solo_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebEdge {
    pub source: String,
    pub target: String,
    /// Documents containing both terms.
    pub raw_count: usize,
    pub weight: f64,
    pub color: (f64, f64, f64),
    pub width: f64,
    pub alpha: f64,
    /// Drawing order: heavier edges get higher values and land on top.
    pub z_order: usize,
}

/// Term co-occurrence web of one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooccurrenceGraph {
    /// 1-indexed.
    pub topic: usize,
    /// Ordered by pair count, lowest first.
    pub nodes: Vec<WebNode>,
    pub edges: Vec<WebEdge>,
}

/// Weighted terms for a word-cloud image in the shape named by `mask`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCloud {
    pub title: String,
    pub mask: String,
    pub weights: Vec<(String, f64)>,
}

/// Everything the evaluator hands to the report sink.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub assignments: Vec<TopicAssignment>,
    pub density: Vec<DensityRow>,
    pub graphs: Vec<CooccurrenceGraph>,
    pub clouds: Vec<WordCloud>,
}

/// Linearly map `values` onto `[floor, ceiling]`. The minimum lands on
/// `floor` and the maximum on `ceiling` exactly; when every value is equal
/// they all map to `ceiling`.
pub fn rescale(values: &[f64], floor: f64, ceiling: f64) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range <= 0.0 || v == max {
                ceiling
            } else if v == min {
                floor
            } else {
                floor + (v - min) * (ceiling - floor) / range
            }
        })
        .collect()
}

/// Rescale raw pair counts into edge weights. The lowest count maps to
/// 0.0 (drawn as no co-occurrence), as does a count of zero.
pub fn pair_weights(counts: &[usize]) -> Vec<f64> {
    let raw: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    let (floor, ceiling) = EDGE_WEIGHT_RANGE;
    rescale(&raw, floor, ceiling)
        .into_iter()
        .zip(counts)
        .map(|(w, &count)| {
            if count == 0 || w == floor {
                0.0
            } else {
                w.min(ceiling)
            }
        })
        .collect()
}

/// Truncate (not round) a probability to 3 decimals.
pub fn truncate_probability(p: f64) -> String {
    let truncated = ((p * 1000.0) + 1e-9).floor() / 1000.0;
    format!("{truncated:.3}")
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Topic distribution and 1-indexed dominant topic of every document.
pub fn assign_topics(model: &TrainedModel) -> Vec<TopicAssignment> {
    (0..model.num_documents())
        .map(|doc| TopicAssignment {
            probabilities: model.document_topics(doc),
            topic: model.dominant_topic(doc) + 1,
        })
        .collect()
}

/// Density table rows, ordered by assigned topic. Documents sharing a topic
/// keep corpus order.
pub fn density_table(labels: &[DocumentLabel], assignments: &[TopicAssignment]) -> Vec<DensityRow> {
    let mut rows: Vec<DensityRow> = labels
        .iter()
        .zip(assignments)
        .map(|(label, assignment)| DensityRow {
            title: label.title.clone(),
            citation: label.citation.clone(),
            probabilities: assignment
                .probabilities
                .iter()
                .map(|&p| truncate_probability(p))
                .collect(),
            topic: assignment.topic,
            url: label.url.clone(),
        })
        .collect();
    rows.sort_by_key(|row| row.topic);
    rows
}

/// Word web for `topic` (0-indexed) over its `top_n` most probable terms.
pub fn cooccurrence_graph(
    model: &TrainedModel,
    corpus: &TrainingCorpus,
    index: &DocumentIndex,
    topic: usize,
    top_n: usize,
) -> CooccurrenceGraph {
    let terms: Vec<(usize, String, f64)> = model
        .topic_terms(topic, top_n)
        .into_iter()
        .filter_map(|(id, p)| corpus.dictionary.term(id).map(|t| (id, t.to_string(), p)))
        .collect();

    let probabilities: Vec<f64> = terms.iter().map(|(_, _, p)| *p).collect();
    let (low, high) = LABEL_SIZE_RANGE;
    let label_sizes = rescale(&probabilities, low, high);

    let mut pairs: Vec<(usize, usize, usize)> = Vec::new();
    for i in 0..terms.len() {
        for j in i + 1..terms.len() {
            pairs.push((i, j, index.co_document_frequency(terms[i].0, terms[j].0)));
        }
    }
    let counts: Vec<usize> = pairs.iter().map(|&(_, _, c)| c).collect();
    let weights = pair_weights(&counts);

    let mut pair_sums = vec![0usize; terms.len()];
    for &(i, j, count) in &pairs {
        pair_sums[i] += count;
        pair_sums[j] += count;
    }

    let n_docs = index.num_documents().max(1) as f64;
    let pair_denominator = n_docs * terms.len().max(1) as f64;
    let mut nodes: Vec<WebNode> = terms
        .iter()
        .enumerate()
        .map(|(i, (id, term, p))| {
            let solo = index.document_frequency(*id);
            WebNode {
                term: term.clone(),
                probability: *p,
                label_size: label_sizes[i],
                pair_count: pair_sums[i],
                pair_percent: round_one_decimal(pair_sums[i] as f64 / pair_denominator * 100.0),
                solo_count: solo,
                solo_percent: round_one_decimal(solo as f64 / n_docs * 100.0),
            }
        })
        .collect();
    nodes.sort_by_key(|node| node.pair_count);

    let mut draw_order: Vec<usize> = (0..pairs.len()).collect();
    draw_order.sort_by(|&a, &b| weights[a].total_cmp(&weights[b]));
    let mut z_orders = vec![0usize; pairs.len()];
    for (rank, &edge) in draw_order.iter().enumerate() {
        z_orders[edge] = rank;
    }

    let edges = pairs
        .iter()
        .enumerate()
        .map(|(e, &(i, j, count))| {
            let w = weights[e];
            WebEdge {
                source: terms[i].1.clone(),
                target: terms[j].1.clone(),
                raw_count: count,
                weight: w,
                color: (0.0, w, 0.0),
                width: w,
                alpha: w,
                z_order: z_orders[e],
            }
        })
        .collect();

    CooccurrenceGraph {
        topic: topic + 1,
        nodes,
        edges,
    }
}

/// Word cloud of the corpus-wide most frequent terms.
pub fn corpus_word_cloud(top_terms: &[(String, usize)], scope_label: &str) -> WordCloud {
    WordCloud {
        title: format!("{scope_label} Corpus"),
        mask: scope_label.to_string(),
        weights: top_terms
            .iter()
            .take(CLOUD_TOP_N)
            .map(|(term, count)| (term.clone(), *count as f64))
            .collect(),
    }
}

/// One word cloud per topic from its most probable terms.
pub fn topic_word_clouds(
    model: &TrainedModel,
    corpus: &TrainingCorpus,
    scope_label: &str,
) -> Vec<WordCloud> {
    (0..model.num_topics())
        .map(|topic| WordCloud {
            title: format!("{scope_label} Topic {}", topic + 1),
            mask: scope_label.to_string(),
            weights: model
                .topic_terms(topic, CLOUD_TOP_N)
                .into_iter()
                .filter_map(|(id, p)| corpus.dictionary.term(id).map(|t| (t.to_string(), p)))
                .collect(),
        })
        .collect()
}

/// Run every evaluation over the final model.
pub fn evaluate(
    model: &TrainedModel,
    corpus: &TrainingCorpus,
    labels: &[DocumentLabel],
    top_terms: &[(String, usize)],
    scope_label: &str,
) -> Evaluation {
    let index = DocumentIndex::for_corpus(corpus);
    let assignments = assign_topics(model);
    let density = density_table(labels, &assignments);
    let graphs = (0..model.num_topics())
        .map(|topic| cooccurrence_graph(model, corpus, &index, topic, WEB_TOP_N))
        .collect();

    let mut clouds = vec![corpus_word_cloud(top_terms, scope_label)];
    clouds.extend(topic_word_clouds(model, corpus, scope_label));

    info!(
        documents = assignments.len(),
        topics = model.num_topics(),
        "Model evaluated"
    );
    Evaluation {
        assignments,
        density,
        graphs,
        clouds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::lda::LdaParams;
    use ndarray::array;
    use std::collections::BTreeSet;

    fn corpus() -> TrainingCorpus {
        let docs: Vec<BTreeSet<String>> = vec![
            ["delta", "levee", "scour"].map(String::from).into(),
            ["delta", "levee"].map(String::from).into(),
            ["delta"].map(String::from).into(),
        ];
        TrainingCorpus::new(docs, false)
    }

    fn model() -> TrainedModel {
        // dictionary ids: delta 0, levee 1, scour 2
        let topic_term = array![[0.5, 0.3, 0.2], [0.1, 0.1, 0.8]];
        let doc_topic = array![[0.2, 0.8], [0.9, 0.1], [0.5, 0.5]];
        TrainedModel::from_weights(topic_term, doc_topic, LdaParams::new(2))
    }

    #[test]
    fn test_rescale_hits_bounds() {
        let scaled = rescale(&[0.2, 0.5, 0.35], 15.0, 50.0);
        assert_eq!(scaled[0], 15.0);
        assert_eq!(scaled[1], 50.0);
        assert!((scaled[2] - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_single_value_maps_to_ceiling() {
        assert_eq!(rescale(&[3.0, 3.0], 0.1, 1.0), vec![1.0, 1.0]);
        assert!(rescale(&[], 0.1, 1.0).is_empty());
    }

    #[test]
    fn test_pair_weights() {
        let weights = pair_weights(&[0, 5, 10]);
        assert_eq!(weights[0], 0.0);
        assert!((weights[1] - 0.55).abs() < 1e-12);
        assert_eq!(weights[2], 1.0);
        // the minimum count reads as no co-occurrence
        assert_eq!(pair_weights(&[2, 4]), vec![0.0, 1.0]);
        assert_eq!(pair_weights(&[0, 0]), vec![0.0, 0.0]);
        assert_eq!(pair_weights(&[3, 3]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_truncate_not_round() {
        assert_eq!(truncate_probability(0.12999), "0.129");
        assert_eq!(truncate_probability(0.29), "0.290");
        assert_eq!(truncate_probability(1.0), "1.000");
        assert_eq!(truncate_probability(0.0), "0.000");
    }

    #[test]
    fn test_assignments_are_one_indexed() {
        let assignments = assign_topics(&model());
        let topics: Vec<usize> = assignments.iter().map(|a| a.topic).collect();
        // the tie in document 3 goes to the first topic
        assert_eq!(topics, vec![2, 1, 1]);
    }

    #[test]
    fn test_density_table_sorted_stably() {
        let labels: Vec<DocumentLabel> = ["A", "B", "C"]
            .iter()
            .map(|t| DocumentLabel {
                title: t.to_string(),
                ..Default::default()
            })
            .collect();
        let rows = density_table(&labels, &assign_topics(&model()));
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C", "A"]);
        assert_eq!(rows[0].probabilities, vec!["0.900", "0.100"]);
    }

    #[test]
    fn test_cooccurrence_graph() {
        let corpus = corpus();
        let index = DocumentIndex::for_corpus(&corpus);
        let graph = cooccurrence_graph(&model(), &corpus, &index, 0, 3);
        assert_eq!(graph.topic, 1);
        assert_eq!(graph.edges.len(), 3);

        // delta-levee: 2 docs, delta-scour: 1, levee-scour: 1
        let delta_levee = graph
            .edges
            .iter()
            .find(|e| e.source == "delta" && e.target == "levee")
            .unwrap();
        assert_eq!(delta_levee.raw_count, 2);
        assert_eq!(delta_levee.weight, 1.0);
        assert_eq!(delta_levee.color, (0.0, 1.0, 0.0));
        assert_eq!(delta_levee.z_order, 2, "heaviest edge is drawn last");

        let delta = graph.nodes.iter().find(|n| n.term == "delta").unwrap();
        assert_eq!(delta.solo_count, 3);
        assert_eq!(delta.solo_percent, 100.0);
        assert_eq!(delta.pair_count, 3);
        assert_eq!(delta.pair_percent, 33.3);
        assert_eq!(delta.label_size, 50.0);

        let scour = graph.nodes.iter().find(|n| n.term == "scour").unwrap();
        assert_eq!(scour.label_size, 15.0);
        assert_eq!(graph.nodes[0].term, "scour", "nodes run from fewest pairs up");
    }

    #[test]
    fn test_word_clouds_use_scope_mask() {
        let clouds = topic_word_clouds(&model(), &corpus(), "Iowa");
        assert_eq!(clouds.len(), 2);
        assert_eq!(clouds[1].mask, "Iowa");
        assert_eq!(clouds[1].weights[0].0, "scour");

        let top = vec![("delta".to_string(), 3)];
        let cloud = corpus_word_cloud(&top, "Iowa");
        assert_eq!(cloud.weights, vec![("delta".to_string(), 3.0)]);
    }
}
