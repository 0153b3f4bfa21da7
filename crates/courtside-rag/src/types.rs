use serde::{Deserialize, Serialize};
use std::fmt;

/// A user question as received from the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Conversation turn counter. Carried through routing untouched.
    #[serde(default)]
    pub turn: Option<u32>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            turn: None,
        }
    }

    pub fn with_turn(mut self, turn: u32) -> Self {
        self.turn = Some(turn);
        self
    }
}

impl From<&str> for Question {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Which backend(s) a question must be answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// Numeric data from the structured store only
    Statistical,
    /// Narrative passages from the semantic store only
    Contextual,
    /// Both stores
    Hybrid,
}

impl QueryType {
    pub const ALL: [QueryType; 3] = [Self::Statistical, Self::Contextual, Self::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statistical => "STATISTICAL",
            Self::Contextual => "CONTEXTUAL",
            Self::Hybrid => "HYBRID",
        }
    }

    pub fn needs_structured(&self) -> bool {
        matches!(self, Self::Statistical | Self::Hybrid)
    }

    pub fn needs_semantic(&self) -> bool {
        matches!(self, Self::Contextual | Self::Hybrid)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical shape of a question. Independent of [`QueryType`]; only drives
/// how aggressively the query is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryCategory {
    Simple,
    Noisy,
    Conversational,
    Complex,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 4] = [
        Self::Simple,
        Self::Noisy,
        Self::Conversational,
        Self::Complex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Noisy => "NOISY",
            Self::Conversational => "CONVERSATIONAL",
            Self::Complex => "COMPLEX",
        }
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many rules of each tier matched, and which ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTally {
    pub statistical: usize,
    pub contextual: usize,
    pub hybrid: usize,
    /// Names of matched rules in evaluation order
    pub matched: Vec<String>,
}

/// Routing decision for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub query_type: QueryType,
    /// Pure social utterance. When set, callers skip retrieval entirely and
    /// ignore every other field.
    pub is_greeting: bool,
    /// "Who is X" style question; always routed as [`QueryType::Hybrid`].
    pub is_biographical: bool,
    /// Suggested number of rows/passages to retrieve
    pub complexity_k: usize,
    pub query_category: QueryCategory,
    /// Synonym budget for the expansion engine, in `1..=5`
    pub max_expansions: usize,
    pub tally: RuleTally,
    pub reasoning: String,
}

impl ClassificationResult {
    pub fn greeting() -> Self {
        Self {
            query_type: QueryType::Contextual,
            is_greeting: true,
            is_biographical: false,
            complexity_k: 1,
            query_category: QueryCategory::Simple,
            max_expansions: 1,
            tally: RuleTally::default(),
            reasoning: "Greeting - no retrieval needed".to_string(),
        }
    }

    pub fn should_retrieve(&self) -> bool {
        !self.is_greeting
    }

    pub fn needs_structured(&self) -> bool {
        self.should_retrieve() && self.query_type.needs_structured()
    }

    pub fn needs_semantic(&self) -> bool {
        self.should_retrieve() && self.query_type.needs_semantic()
    }
}
