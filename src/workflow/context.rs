//! Context retrieval capability.
//!
//! The orchestrator only sees the [`ContextStore`] trait; the default
//! implementation is an in-memory index of previously seen messages with
//! term-overlap scoring. A vector-backed store can replace it behind the
//! same trait.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::WorkflowError;
use crate::mail::MessageSummary;
use crate::workflow::types::{ContextSnippet, EmailContext};

/// Snippet length cap in the retrieved context.
const SNIPPET_CHARS: usize = 200;

/// Retrieves supporting context for an email, keyed on its content.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn retrieve(&self, content: &str) -> Result<EmailContext, WorkflowError>;
}

/// One indexed message.
#[derive(Debug, Clone)]
struct IndexedMessage {
    id: String,
    text: String,
}

/// In-memory message index with term-overlap retrieval.
pub struct MessageIndex {
    entries: RwLock<Vec<IndexedMessage>>,
    limit: usize,
}

impl MessageIndex {
    /// Create an index returning at most `limit` snippets per retrieval.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            limit,
        }
    }

    /// Index one message body.
    pub async fn index(&self, id: &str, text: &str) {
        let mut entries = self.entries.write().await;
        entries.push(IndexedMessage {
            id: id.to_string(),
            text: text.to_string(),
        });
    }

    /// Index a batch of listed messages (subject + snippet).
    pub async fn index_summaries(&self, summaries: &[MessageSummary]) {
        let mut entries = self.entries.write().await;
        for summary in summaries {
            entries.push(IndexedMessage {
                id: summary.id.clone(),
                text: format!("{} {}", summary.subject, summary.snippet),
            });
        }
    }

    /// Number of indexed messages.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ContextStore for MessageIndex {
    async fn retrieve(&self, content: &str) -> Result<EmailContext, WorkflowError> {
        let query = content.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(EmailContext::default());
        }

        let entries = self.entries.read().await;
        let mut related: Vec<ContextSnippet> = Vec::new();

        for entry in entries.iter() {
            let text_lower = entry.text.to_lowercase();
            let matched = terms.iter().filter(|t| text_lower.contains(**t)).count();
            if matched > 0 {
                related.push(ContextSnippet {
                    source_id: entry.id.clone(),
                    snippet: entry.text.chars().take(SNIPPET_CHARS).collect(),
                    score: matched as f32 / terms.len() as f32,
                });
            }
        }

        related.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        related.truncate(self.limit);

        Ok(EmailContext { related })
    }
}
