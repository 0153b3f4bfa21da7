use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CourtsideError, Result};
use crate::rag::rules::RuleSpec;
use crate::types::QueryCategory;

/// Hard bounds of the synonym budget handed to the expansion engine.
pub const MIN_EXPANSIONS: usize = 1;
pub const MAX_EXPANSIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtsideConfig {
    pub classifier: ClassifierConfig,
    pub expansion: ExpansionConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub simple_k: usize,
    pub moderate_k: usize,
    pub complex_k: usize,
    pub max_k: usize,
    /// Questions up to this many words with no conjunction get `simple_k`
    pub simple_word_limit: usize,
    /// Questions up to this many words with at most one conjunction get `moderate_k`
    pub moderate_word_limit: usize,
    /// Follow-up phrasing only counts as conversational up to this length
    pub follow_up_word_limit: usize,
    /// Minimum statistical and contextual matches that promote a question to hybrid
    pub hybrid_promotion_threshold: usize,
    /// Additional rules appended to the builtin tiers
    pub extra_rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub enabled: bool,
    pub simple_base: usize,
    pub noisy_base: usize,
    pub conversational_base: usize,
    pub complex_base: usize,
    /// At or below this word count the budget grows by one
    pub short_query_words: usize,
    /// Above this word count the budget shrinks by one
    pub long_query_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Per-backend deadline for a single routed question
    pub backend_timeout_ms: u64,
    /// Rows kept from the structured store
    pub max_rows: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            simple_k: 3,
            moderate_k: 5,
            complex_k: 7,
            max_k: 10,
            simple_word_limit: 8,
            moderate_word_limit: 18,
            follow_up_word_limit: 12,
            hybrid_promotion_threshold: 2,
            extra_rules: Vec::new(),
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            simple_base: 3,
            noisy_base: 4,
            conversational_base: 4,
            complex_base: 2,
            short_query_words: 5,
            long_query_words: 20,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend_timeout_ms: 8_000,
            max_rows: 50,
        }
    }
}

impl ExpansionConfig {
    pub fn base_for(&self, category: QueryCategory) -> usize {
        match category {
            QueryCategory::Simple => self.simple_base,
            QueryCategory::Noisy => self.noisy_base,
            QueryCategory::Conversational => self.conversational_base,
            QueryCategory::Complex => self.complex_base,
        }
    }
}

impl CourtsideConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        if c.simple_k == 0 {
            return invalid("classifier.simple_k must be > 0");
        }
        if !(c.simple_k <= c.moderate_k && c.moderate_k <= c.complex_k && c.complex_k <= c.max_k) {
            return invalid(
                "classifier k tiers must satisfy simple_k <= moderate_k <= complex_k <= max_k",
            );
        }
        if c.simple_word_limit >= c.moderate_word_limit {
            return invalid("classifier.simple_word_limit must be < moderate_word_limit");
        }
        if c.hybrid_promotion_threshold == 0 {
            return invalid("classifier.hybrid_promotion_threshold must be > 0");
        }

        let e = &self.expansion;
        for category in QueryCategory::ALL {
            let base = e.base_for(category);
            if !(MIN_EXPANSIONS..=MAX_EXPANSIONS).contains(&base) {
                return Err(CourtsideError::InvalidConfig(format!(
                    "expansion base for {} must be in [{}, {}], got {}",
                    category, MIN_EXPANSIONS, MAX_EXPANSIONS, base
                )));
            }
        }
        if e.short_query_words >= e.long_query_words {
            return invalid("expansion.short_query_words must be < long_query_words");
        }

        if self.retrieval.backend_timeout_ms == 0 {
            return invalid("retrieval.backend_timeout_ms must be > 0");
        }
        if self.retrieval.max_rows == 0 {
            return invalid("retrieval.max_rows must be > 0");
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CourtsideError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| CourtsideError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/courtside-rag/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("courtside-rag").join("config.json"))
    }

    /// An explicit path must exist. Without one, the default location is used
    /// when present, otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => {
                tracing::debug!(path = %default.display(), "Loading config from default location");
                Self::from_file(&default)
            }
            _ => Ok(Self::default()),
        }
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(CourtsideError::InvalidConfig(message.to_string()))
}
