//! Retrieval backends - the stores a routed question is dispatched to.
//!
//! The classification core never talks to a store directly; the router holds
//! these as trait objects so SQL generation and vector search can live in
//! whatever service owns them.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::QueryType;

/// One row returned by the structured store, column name to value.
pub type StatRow = serde_json::Map<String, serde_json::Value>;

/// A passage returned by the semantic store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    /// Similarity score, higher is closer
    pub score: f32,
    pub source: Option<String>,
}

/// Classification details the structured store may use to shape its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingHint {
    pub query_type: QueryType,
    pub is_biographical: bool,
    pub k: usize,
}

/// Numeric store queried through generated SQL
#[async_trait]
pub trait StructuredStore: Send + Sync {
    /// Backend name used in logs and failure records
    fn name(&self) -> &str {
        "structured"
    }

    async fn execute_statistical_query(
        &self,
        question: &str,
        hint: RoutingHint,
    ) -> Result<Vec<StatRow>>;
}

/// Free-text store queried by vector similarity
#[async_trait]
pub trait SemanticStore: Send + Sync {
    fn name(&self) -> &str {
        "semantic"
    }

    async fn search_similar(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

/// What answer synthesis receives for one question. A backend that was not
/// consulted is `None`; one that was consulted but returned nothing is an
/// empty slice.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SynthesisInput<'a> {
    pub question: &'a str,
    pub query_type: QueryType,
    pub is_greeting: bool,
    pub is_biographical: bool,
    pub rows: Option<&'a [StatRow]>,
    pub passages: Option<&'a [Passage]>,
}

impl SynthesisInput<'_> {
    /// True when neither store contributed anything.
    pub fn is_empty(&self) -> bool {
        self.rows.map_or(true, |r| r.is_empty()) && self.passages.map_or(true, |p| p.is_empty())
    }
}
