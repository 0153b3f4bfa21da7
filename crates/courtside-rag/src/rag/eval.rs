//! Routing Evaluation Module
//!
//! Measures classifier routing quality against a labeled question set:
//! - Accuracy: fraction of questions routed to the expected store(s)
//! - Precision / Recall per query type
//! - Confusion between query types
//! - Greeting detection hits and misses
//!
//! Designed for offline evaluation; classification is fanned out with rayon.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CourtsideError, Result};
use crate::rag::query_classifier::QueryClassifier;
use crate::types::{ClassificationResult, QueryType};

/// A question with its expected routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledQuestion {
    pub question: String,
    /// Expected type; ignored when `greeting` is set
    pub expected: QueryType,
    #[serde(default)]
    pub greeting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeMetrics {
    pub precision: f64,
    pub recall: f64,
    /// Non-greeting questions labeled with this type
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCell {
    pub expected: QueryType,
    pub predicted: QueryType,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingMetrics {
    pub labeled: usize,
    pub predicted: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misroute {
    pub question: String,
    pub expected: QueryType,
    pub expected_greeting: bool,
    pub predicted: QueryType,
    pub predicted_greeting: bool,
    pub reasoning: String,
}

/// Aggregated routing metrics across a labeled set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetrics {
    pub num_questions: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub per_type: BTreeMap<QueryType, TypeMetrics>,
    /// Off-diagonal and diagonal cells between non-greeting labels and predictions
    pub confusion: Vec<ConfusionCell>,
    pub greetings: GreetingMetrics,
    pub misrouted: Vec<Misroute>,
}

fn is_correct(label: &LabeledQuestion, result: &ClassificationResult) -> bool {
    if label.greeting || result.is_greeting {
        label.greeting == result.is_greeting
    } else {
        label.expected == result.query_type
    }
}

/// Classify every labeled question and score the routing.
pub fn evaluate_routing(
    classifier: &QueryClassifier,
    labeled: &[LabeledQuestion],
) -> RoutingMetrics {
    let results: Vec<ClassificationResult> = labeled
        .par_iter()
        .map(|l| classifier.classify(&l.question))
        .collect();

    let mut correct = 0;
    let mut greetings = GreetingMetrics::default();
    let mut confusion: BTreeMap<(QueryType, QueryType), usize> = BTreeMap::new();
    let mut misrouted = Vec::new();

    for (label, result) in labeled.iter().zip(&results) {
        if label.greeting {
            greetings.labeled += 1;
        }
        if result.is_greeting {
            greetings.predicted += 1;
        }
        if label.greeting && result.is_greeting {
            greetings.correct += 1;
        }
        if !label.greeting && !result.is_greeting {
            *confusion.entry((label.expected, result.query_type)).or_insert(0) += 1;
        }

        if is_correct(label, result) {
            correct += 1;
        } else {
            misrouted.push(Misroute {
                question: label.question.clone(),
                expected: label.expected,
                expected_greeting: label.greeting,
                predicted: result.query_type,
                predicted_greeting: result.is_greeting,
                reasoning: result.reasoning.clone(),
            });
        }
    }

    let mut per_type = BTreeMap::new();
    for query_type in QueryType::ALL {
        let support = labeled
            .iter()
            .filter(|l| !l.greeting && l.expected == query_type)
            .count();
        let predicted = results
            .iter()
            .filter(|r| !r.is_greeting && r.query_type == query_type)
            .count();
        let hits = confusion.get(&(query_type, query_type)).copied().unwrap_or(0);
        per_type.insert(
            query_type,
            TypeMetrics {
                precision: ratio(hits, predicted),
                recall: ratio(hits, support),
                support,
            },
        );
    }

    let metrics = RoutingMetrics {
        num_questions: labeled.len(),
        correct,
        accuracy: ratio(correct, labeled.len()),
        per_type,
        confusion: confusion
            .into_iter()
            .map(|((expected, predicted), count)| ConfusionCell {
                expected,
                predicted,
                count,
            })
            .collect(),
        greetings,
        misrouted,
    };

    tracing::info!(
        questions = metrics.num_questions,
        accuracy = metrics.accuracy,
        misrouted = metrics.misrouted.len(),
        "[RoutingEval] Evaluation complete"
    );

    metrics
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Load a labeled set from a JSON array of `LabeledQuestion`.
pub fn load_labeled_set(path: &Path) -> Result<Vec<LabeledQuestion>> {
    let content = std::fs::read_to_string(path).map_err(|source| CourtsideError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CourtsideError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Format routing metrics as a human-readable report.
pub fn format_report(metrics: &RoutingMetrics) -> String {
    let mut report = String::new();

    report.push_str(&format!(
        "=== Routing Evaluation Report ({} questions) ===\n\n",
        metrics.num_questions
    ));
    report.push_str(&format!(
        "Accuracy: {:.4} ({}/{})\n\n",
        metrics.accuracy, metrics.correct, metrics.num_questions
    ));

    report.push_str("| Type        | Precision | Recall | Support |\n");
    report.push_str("|-------------|-----------|--------|---------|\n");
    for (query_type, m) in &metrics.per_type {
        report.push_str(&format!(
            "| {:<11} | {:.4}    | {:.4} | {:7} |\n",
            query_type.as_str(),
            m.precision,
            m.recall,
            m.support
        ));
    }

    let g = &metrics.greetings;
    report.push_str(&format!(
        "\nGreetings: {} labeled, {} detected, {} correct\n",
        g.labeled, g.predicted, g.correct
    ));

    if !metrics.misrouted.is_empty() {
        report.push_str(&format!(
            "\n--- Misrouted questions ({}/{}) ---\n",
            metrics.misrouted.len(),
            metrics.num_questions
        ));
        for m in &metrics.misrouted {
            let expected = if m.expected_greeting { "GREETING" } else { m.expected.as_str() };
            let predicted = if m.predicted_greeting { "GREETING" } else { m.predicted.as_str() };
            report.push_str(&format!(
                "  - \"{}\" expected {}, got {} ({})\n",
                m.question, expected, predicted, m.reasoning
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(question: &str, expected: QueryType) -> LabeledQuestion {
        LabeledQuestion {
            question: question.to_string(),
            expected,
            greeting: false,
        }
    }

    fn labeled_set() -> Vec<LabeledQuestion> {
        vec![
            label("Who scored the most points?", QueryType::Statistical),
            label(
                "Why was the triangle offense so successful in Chicago?",
                QueryType::Contextual,
            ),
            label("Who is LeBron?", QueryType::Hybrid),
            LabeledQuestion {
                question: "hi".to_string(),
                expected: QueryType::Contextual,
                greeting: true,
            },
            // deliberately mislabeled: definitions route to the semantic store
            label("What is a triple-double?", QueryType::Statistical),
        ]
    }

    #[test]
    fn test_accuracy_and_misroutes() {
        let classifier = QueryClassifier::builtin().unwrap();
        let metrics = evaluate_routing(&classifier, &labeled_set());

        assert_eq!(metrics.num_questions, 5);
        assert_eq!(metrics.correct, 4);
        assert!((metrics.accuracy - 0.8).abs() < 1e-9);
        assert_eq!(metrics.misrouted.len(), 1);
        assert_eq!(metrics.misrouted[0].question, "What is a triple-double?");
        assert_eq!(metrics.misrouted[0].predicted, QueryType::Contextual);
    }

    #[test]
    fn test_precision_recall_per_type() {
        let classifier = QueryClassifier::builtin().unwrap();
        let metrics = evaluate_routing(&classifier, &labeled_set());

        let stat = metrics.per_type[&QueryType::Statistical];
        assert_eq!(stat.support, 2);
        assert_eq!(stat.precision, 1.0);
        assert_eq!(stat.recall, 0.5);

        let ctx = metrics.per_type[&QueryType::Contextual];
        assert_eq!(ctx.support, 1);
        assert_eq!(ctx.precision, 0.5);
        assert_eq!(ctx.recall, 1.0);

        let hybrid = metrics.per_type[&QueryType::Hybrid];
        assert_eq!((hybrid.precision, hybrid.recall, hybrid.support), (1.0, 1.0, 1));
    }

    #[test]
    fn test_confusion_and_greetings() {
        let classifier = QueryClassifier::builtin().unwrap();
        let metrics = evaluate_routing(&classifier, &labeled_set());

        assert!(metrics.confusion.contains(&ConfusionCell {
            expected: QueryType::Statistical,
            predicted: QueryType::Contextual,
            count: 1,
        }));
        let total: usize = metrics.confusion.iter().map(|c| c.count).sum();
        assert_eq!(total, 4);
        assert_eq!(
            metrics.greetings,
            GreetingMetrics {
                labeled: 1,
                predicted: 1,
                correct: 1
            }
        );
    }

    #[test]
    fn test_empty_set() {
        let classifier = QueryClassifier::builtin().unwrap();
        let metrics = evaluate_routing(&classifier, &[]);
        assert_eq!(metrics.num_questions, 0);
        assert_eq!(metrics.accuracy, 0.0);
        assert!(metrics.confusion.is_empty());
    }

    #[test]
    fn test_load_labeled_set() {
        let path = std::env::temp_dir().join(format!(
            "courtside-rag-labeled-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"[
                {"question": "How many threes did Curry make?", "expected": "STATISTICAL"},
                {"question": "thanks", "expected": "CONTEXTUAL", "greeting": true}
            ]"#,
        )
        .unwrap();

        let labeled = load_labeled_set(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(labeled.len(), 2);
        assert!(!labeled[0].greeting);
        assert!(labeled[1].greeting);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let path = std::env::temp_dir().join(format!(
            "courtside-rag-labeled-bad-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"[{"question": "missing label"}]"#).unwrap();
        let result = load_labeled_set(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(CourtsideError::Parse { .. })));
    }

    #[test]
    fn test_format_report_no_panic() {
        let classifier = QueryClassifier::builtin().unwrap();
        let metrics = evaluate_routing(&classifier, &labeled_set());
        let report = format_report(&metrics);
        assert!(report.contains("Routing Evaluation Report"));
        assert!(report.contains("STATISTICAL"));
        assert!(report.contains("What is a triple-double?"));
    }
}
