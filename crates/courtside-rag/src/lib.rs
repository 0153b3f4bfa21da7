pub mod config;
pub mod error;
pub mod rag;
pub mod types;

// Re-export primary types for convenience
pub use config::{
    ClassifierConfig, CourtsideConfig, ExpansionConfig, RetrievalConfig, MAX_EXPANSIONS,
    MIN_EXPANSIONS,
};
pub use error::{CourtsideError, Result};
pub use rag::{QueryClassifier, QueryExpander, QueryRouter, RuleBook};
pub use types::{ClassificationResult, QueryCategory, QueryType, Question, RuleTally};

// Re-export common types
pub use uuid::Uuid;
