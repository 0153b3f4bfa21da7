//! Retrieval Router
//!
//! Turns a question into retrieved context: classify, resolve conversational
//! references, expand for semantic search, then dispatch to the structured
//! and semantic stores concurrently. A failing or slow store is recorded and
//! the other store's results are still returned; the request only fails when
//! every store it needed failed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{CourtsideConfig, RetrievalConfig};
use crate::rag::backends::{
    Passage, RoutingHint, SemanticStore, StatRow, StructuredStore, SynthesisInput,
};
use crate::rag::follow_up::{resolve_follow_up, ConversationContext, Resolution};
use crate::rag::query_classifier::QueryClassifier;
use crate::rag::query_expander::QueryExpander;
use crate::types::{ClassificationResult, Question};

// ============================================================================
// Plan & Results
// ============================================================================

/// Which stores a question goes to and with what parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalPlan {
    pub use_structured: bool,
    pub use_semantic: bool,
    /// Passages requested from the semantic store
    pub k: usize,
    pub max_rows: usize,
    /// Text sent to the semantic store (resolved and expanded)
    pub semantic_query: Option<String>,
    pub hint: RoutingHint,
}

impl RetrievalPlan {
    pub fn from_classification(
        classification: &ClassificationResult,
        semantic_query: String,
        max_rows: usize,
    ) -> Self {
        let use_semantic = classification.needs_semantic();
        Self {
            use_structured: classification.needs_structured(),
            use_semantic,
            k: classification.complexity_k,
            max_rows,
            semantic_query: use_semantic.then_some(semantic_query),
            hint: RoutingHint {
                query_type: classification.query_type,
                is_biographical: classification.is_biographical,
                k: classification.complexity_k,
            },
        }
    }

    /// Greetings plan no retrieval at all.
    pub fn is_empty(&self) -> bool {
        !self.use_structured && !self.use_semantic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Structured,
    Semantic,
}

/// A store call that errored or missed its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: Backend,
    pub message: String,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutedContext {
    pub request_id: Uuid,
    pub question: Question,
    pub classification: ClassificationResult,
    /// Question after follow-up resolution; equals the original text when
    /// nothing was resolved
    pub resolved_question: String,
    pub follow_up_note: Option<String>,
    pub plan: RetrievalPlan,
    /// `None` when the structured store was not consulted or failed
    pub rows: Option<Vec<StatRow>>,
    /// `None` when the semantic store was not consulted or failed
    pub passages: Option<Vec<Passage>>,
    pub failures: Vec<BackendFailure>,
    pub elapsed_ms: u64,
}

impl RoutedContext {
    pub fn synthesis_input(&self) -> SynthesisInput<'_> {
        SynthesisInput {
            question: &self.resolved_question,
            query_type: self.classification.query_type,
            is_greeting: self.classification.is_greeting,
            is_biographical: self.classification.is_biographical,
            rows: self.rows.as_deref(),
            passages: self.passages.as_deref(),
        }
    }
}

// ============================================================================
// Query Router
// ============================================================================

pub struct QueryRouter {
    classifier: QueryClassifier,
    expander: QueryExpander,
    structured: Arc<dyn StructuredStore>,
    semantic: Arc<dyn SemanticStore>,
    retrieval: RetrievalConfig,
    expansion_enabled: bool,
}

impl QueryRouter {
    pub fn new(
        classifier: QueryClassifier,
        expander: QueryExpander,
        structured: Arc<dyn StructuredStore>,
        semantic: Arc<dyn SemanticStore>,
    ) -> Self {
        Self {
            classifier,
            expander,
            structured,
            semantic,
            retrieval: RetrievalConfig::default(),
            expansion_enabled: true,
        }
    }

    pub fn from_config(
        config: &CourtsideConfig,
        structured: Arc<dyn StructuredStore>,
        semantic: Arc<dyn SemanticStore>,
    ) -> crate::Result<Self> {
        let classifier = QueryClassifier::from_config(config)?;
        Ok(Self {
            classifier,
            expander: QueryExpander::new(),
            structured,
            semantic,
            retrieval: config.retrieval.clone(),
            expansion_enabled: config.expansion.enabled,
        })
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Classify and prepare a question without touching any store.
    pub fn plan(
        &self,
        question: &Question,
        ctx: &ConversationContext,
    ) -> (ClassificationResult, Resolution, RetrievalPlan) {
        let classification = self.classifier.classify(&question.text);
        let resolution = resolve_follow_up(&question.text, ctx);
        let semantic_query = self.semantic_query(&classification, &resolution.text);
        let plan = RetrievalPlan::from_classification(
            &classification,
            semantic_query,
            self.retrieval.max_rows,
        );
        (classification, resolution, plan)
    }

    fn semantic_query(&self, classification: &ClassificationResult, resolved: &str) -> String {
        if self.expansion_enabled && classification.needs_semantic() {
            self.expander.expand(
                resolved,
                classification.max_expansions,
                classification.query_category,
            )
        } else {
            resolved.to_string()
        }
    }

    pub async fn route(
        &self,
        question: &Question,
        ctx: &ConversationContext,
    ) -> Result<RoutedContext> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "route",
            request_id = %request_id,
            turn = ?question.turn
        );
        self.route_inner(request_id, question, ctx)
            .instrument(span)
            .await
    }

    async fn route_inner(
        &self,
        request_id: Uuid,
        question: &Question,
        ctx: &ConversationContext,
    ) -> Result<RoutedContext> {
        let start = Instant::now();
        let (classification, resolution, plan) = self.plan(question, ctx);
        if let Some(note) = &resolution.note {
            tracing::debug!(resolved = %resolution.text, "[QueryRouter] {}", note);
        }

        tracing::info!(
            query_type = %classification.query_type,
            greeting = classification.is_greeting,
            structured = plan.use_structured,
            semantic = plan.use_semantic,
            k = plan.k,
            "[QueryRouter] Dispatching question"
        );

        let deadline = Duration::from_millis(self.retrieval.backend_timeout_ms);
        let resolved = resolution.text.as_str();

        let structured_call = async {
            if !plan.use_structured {
                return None;
            }
            Some(
                call_backend(
                    Backend::Structured,
                    self.structured.name(),
                    deadline,
                    self.structured.execute_statistical_query(resolved, plan.hint),
                )
                .await,
            )
        };
        let semantic_call = async {
            let query = plan.semantic_query.as_deref()?;
            Some(
                call_backend(
                    Backend::Semantic,
                    self.semantic.name(),
                    deadline,
                    self.semantic.search_similar(query, plan.k),
                )
                .await,
            )
        };

        let (structured_outcome, semantic_outcome) = tokio::join!(structured_call, semantic_call);

        let mut failures = Vec::new();
        let rows = match structured_outcome {
            Some(Ok(mut rows)) => {
                rows.truncate(plan.max_rows);
                Some(rows)
            }
            Some(Err(failure)) => {
                failures.push(failure);
                None
            }
            None => None,
        };
        let passages = match semantic_outcome {
            Some(Ok(passages)) => Some(passages),
            Some(Err(failure)) => {
                failures.push(failure);
                None
            }
            None => None,
        };

        let planned = plan.use_structured as usize + plan.use_semantic as usize;
        if planned > 0 && failures.len() == planned {
            let reasons: Vec<String> = failures
                .iter()
                .map(|f| format!("{:?}: {}", f.backend, f.message))
                .collect();
            bail!("All retrieval backends failed: {}", reasons.join("; "));
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            rows = rows.as_ref().map_or(0, |r| r.len()),
            passages = passages.as_ref().map_or(0, |p| p.len()),
            failures = failures.len(),
            elapsed_ms,
            "[QueryRouter] Retrieval complete"
        );

        Ok(RoutedContext {
            request_id,
            question: question.clone(),
            classification,
            resolved_question: resolution.text,
            follow_up_note: resolution.note,
            plan,
            rows,
            passages,
            failures,
            elapsed_ms,
        })
    }
}

/// Await one store call under `deadline`, folding errors and timeouts into a
/// `BackendFailure`.
async fn call_backend<T, F>(
    backend: Backend,
    name: &str,
    deadline: Duration,
    call: F,
) -> std::result::Result<T, BackendFailure>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(backend = name, "[QueryRouter] Backend failed: {:#}", e);
            Err(BackendFailure {
                backend,
                message: format!("{:#}", e),
                timed_out: false,
            })
        }
        Err(_) => {
            tracing::warn!(
                backend = name,
                timeout_ms = deadline.as_millis() as u64,
                "[QueryRouter] Backend timed out"
            );
            Err(BackendFailure {
                backend,
                message: format!("timed out after {}ms", deadline.as_millis()),
                timed_out: true,
            })
        }
    }
}
