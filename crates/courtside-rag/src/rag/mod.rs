//! Query classification and retrieval preparation - rule tiers, detectors,
//! classification, synonym expansion, follow-up resolution and routing.

pub mod backends;
pub mod detectors;
pub mod eval;
pub mod follow_up;
pub mod glossary;
pub mod query_classifier;
pub mod query_expander;
pub mod router;
pub mod rules;

// Re-export commonly used types
pub use backends::{Passage, RoutingHint, SemanticStore, StatRow, StructuredStore, SynthesisInput};
pub use detectors::{BiographicalDetector, GreetingDetector, LexicalSignals};
pub use eval::{
    evaluate_routing, format_report, load_labeled_set, ConfusionCell, GreetingMetrics,
    LabeledQuestion, Misroute, RoutingMetrics, TypeMetrics,
};
pub use follow_up::{resolve_follow_up, ConversationContext, Resolution};
pub use glossary::{contains_term, DefinitionDetector, Glossary};
pub use query_classifier::{ClassifierTables, QueryClassifier};
pub use query_expander::{DictionaryKind, QueryExpander, SynonymDictionary, SynonymEntry};
pub use router::{Backend, BackendFailure, QueryRouter, RetrievalPlan, RoutedContext};
pub use rules::{Matcher, Rule, RuleBook, RuleSet, RuleSpec};
