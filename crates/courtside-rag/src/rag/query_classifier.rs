//! Query Classification
//!
//! Decides, for every incoming question, whether retrieval is needed at all
//! and which store(s) to consult, then derives the retrieval depth and the
//! synonym budget for the expansion step.
//!
//! Precedence (first match wins):
//! 1. greeting
//! 2. definitional phrasing or glossary term -> contextual
//! 3. biographical -> hybrid
//! 4. any hybrid rule -> hybrid
//! 5. statistical vs contextual tally, with promotion to hybrid when both are strong

use std::sync::Arc;

use crate::config::{
    ClassifierConfig, CourtsideConfig, ExpansionConfig, MAX_EXPANSIONS, MIN_EXPANSIONS,
};
use crate::error::Result;
use crate::rag::detectors::{BiographicalDetector, GreetingDetector, LexicalSignals};
use crate::rag::glossary::{DefinitionDetector, Glossary};
use crate::rag::rules::RuleBook;
use crate::types::{ClassificationResult, QueryCategory, QueryType, RuleTally};

// ============================================================================
// Classifier Tables
// ============================================================================

/// Every compiled pattern the classifier consults. Immutable once built;
/// shared between classifier clones through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierTables {
    pub rules: RuleBook,
    pub greeting: GreetingDetector,
    pub definition: DefinitionDetector,
    pub glossary: Glossary,
    pub biographical: BiographicalDetector,
    pub signals: LexicalSignals,
}

impl ClassifierTables {
    pub fn new(rules: RuleBook) -> Result<Self> {
        Ok(Self {
            rules,
            greeting: GreetingDetector::new()?,
            definition: DefinitionDetector::new()?,
            glossary: Glossary::new(),
            biographical: BiographicalDetector::new()?,
            signals: LexicalSignals::new()?,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(RuleBook::new()?)
    }
}

// ============================================================================
// Query Classifier - Main Entry Point
// ============================================================================

#[derive(Debug, Clone)]
pub struct QueryClassifier {
    tables: Arc<ClassifierTables>,
    config: ClassifierConfig,
    expansion: ExpansionConfig,
}

/// Why a question ended up with its query type.
enum Decision {
    Definitional(&'static str),
    Glossary(&'static str),
    Biographical(String),
    Tally(QueryType, String),
}

impl QueryClassifier {
    pub fn new(tables: Arc<ClassifierTables>) -> Self {
        Self::with_config(tables, ClassifierConfig::default(), ExpansionConfig::default())
    }

    pub fn with_config(
        tables: Arc<ClassifierTables>,
        config: ClassifierConfig,
        expansion: ExpansionConfig,
    ) -> Self {
        Self {
            tables,
            config,
            expansion,
        }
    }

    /// Builtin rules with default thresholds.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Arc::new(ClassifierTables::builtin()?)))
    }

    /// Compile the rule tiers (including configured extra rules) and apply
    /// the configured thresholds. Fails on any invalid pattern.
    pub fn from_config(config: &CourtsideConfig) -> Result<Self> {
        config.validate()?;
        let rules = RuleBook::with_extra_rules(&config.classifier.extra_rules)?;
        Ok(Self::with_config(
            Arc::new(ClassifierTables::new(rules)?),
            config.classifier.clone(),
            config.expansion.clone(),
        ))
    }

    pub fn tables(&self) -> &ClassifierTables {
        &self.tables
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = normalize(text);
        let tables = &*self.tables;

        if tables.greeting.is_greeting(&normalized) {
            tracing::debug!(question = %text, "[QueryClassifier] Greeting - skipping retrieval");
            return ClassificationResult::greeting();
        }

        let tally = tables.rules.tally(&normalized);

        let decision = if let Some(pattern) = tables.definition.matched_pattern(&normalized) {
            Decision::Definitional(definition_label(pattern))
        } else if let Some(term) = tables.glossary.find_term(&normalized) {
            Decision::Glossary(term)
        } else if let Some(entity) = tables.biographical.entity(&normalized) {
            Decision::Biographical(entity.to_string())
        } else {
            let (query_type, reasoning) = self.decide_from_tally(&tally);
            Decision::Tally(query_type, reasoning)
        };

        let (query_type, is_biographical, reasoning) = match decision {
            Decision::Definitional(label) => (
                QueryType::Contextual,
                false,
                format!("Definitional phrasing ({}) - reference content", label),
            ),
            Decision::Glossary(term) => (
                QueryType::Contextual,
                false,
                format!("Glossary term '{}' - reference content", term),
            ),
            Decision::Biographical(entity) => (
                QueryType::Hybrid,
                true,
                format!("Biographical question about '{}' - profile plus narrative", entity),
            ),
            Decision::Tally(query_type, reasoning) => (query_type, false, reasoning),
        };

        let words = normalized.split_whitespace().count();
        let compound = tables.signals.compound_count(&normalized);
        let complexity_k = self.complexity_k(words, compound);
        let query_category = self.categorize(&normalized, words, compound);
        let max_expansions = self.expansion_budget(query_category, words);

        tracing::debug!(
            query_type = %query_type,
            is_biographical,
            statistical = tally.statistical,
            contextual = tally.contextual,
            hybrid = tally.hybrid,
            complexity_k,
            category = %query_category,
            max_expansions,
            "[QueryClassifier] {}",
            reasoning
        );

        ClassificationResult {
            query_type,
            is_greeting: false,
            is_biographical,
            complexity_k,
            query_category,
            max_expansions,
            tally,
            reasoning,
        }
    }

    fn decide_from_tally(&self, tally: &RuleTally) -> (QueryType, String) {
        let threshold = self.config.hybrid_promotion_threshold;

        if tally.hybrid > 0 {
            return (
                QueryType::Hybrid,
                "Explicit dual-intent phrasing".to_string(),
            );
        }

        if tally.statistical >= threshold && tally.contextual >= threshold {
            return (
                QueryType::Hybrid,
                format!(
                    "Strong numeric ({}) and narrative ({}) signal",
                    tally.statistical, tally.contextual
                ),
            );
        }

        if tally.statistical > tally.contextual {
            (
                QueryType::Statistical,
                format!(
                    "Statistical signal dominates ({} vs {})",
                    tally.statistical, tally.contextual
                ),
            )
        } else if tally.contextual > tally.statistical {
            (
                QueryType::Contextual,
                format!(
                    "Contextual signal dominates ({} vs {})",
                    tally.contextual, tally.statistical
                ),
            )
        } else {
            (
                QueryType::Contextual,
                format!(
                    "No dominant signal ({} vs {}) - narrative fallback",
                    tally.statistical, tally.contextual
                ),
            )
        }
    }

    /// Retrieval depth grows with length and with every extra clause.
    fn complexity_k(&self, words: usize, compound: usize) -> usize {
        let c = &self.config;
        let k = if words <= c.simple_word_limit && compound == 0 {
            c.simple_k
        } else if words <= c.moderate_word_limit && compound <= 1 {
            c.moderate_k
        } else {
            let extra_clauses = compound.saturating_sub(2);
            let extra_length = words.saturating_sub(c.moderate_word_limit) / 10;
            c.complex_k + extra_clauses + extra_length
        };
        k.clamp(1, c.max_k.max(1))
    }

    fn categorize(&self, text: &str, words: usize, compound: usize) -> QueryCategory {
        let signals = &self.tables.signals;
        if signals.is_noisy(text) {
            QueryCategory::Noisy
        } else if words <= self.config.follow_up_word_limit && signals.is_follow_up(text) {
            QueryCategory::Conversational
        } else if words > self.config.moderate_word_limit || compound >= 2 {
            QueryCategory::Complex
        } else {
            QueryCategory::Simple
        }
    }

    /// Category base, +1 for very short questions, -1 for long ones.
    fn expansion_budget(&self, category: QueryCategory, words: usize) -> usize {
        let e = &self.expansion;
        let base = e.base_for(category);
        let adjusted = if words <= e.short_query_words {
            base + 1
        } else if words > e.long_query_words {
            base.saturating_sub(1)
        } else {
            base
        };
        adjusted.clamp(MIN_EXPANSIONS, MAX_EXPANSIONS)
    }
}

fn definition_label(pattern: &str) -> &'static str {
    match pattern {
        "define" | "definition_of" => "define",
        "what_does_mean" => "what does X mean",
        "what_is_a" => "what is a X",
        _ => "explain term",
    }
}

/// Lower-case, trim, and fold typographic apostrophes.
fn normalize(text: &str) -> String {
    text.trim().replace(['\u{2019}', '\u{2018}'], "'").to_lowercase()
}
