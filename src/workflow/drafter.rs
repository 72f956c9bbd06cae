//! Response generation capability — the three response paths.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::WorkflowError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::workflow::types::{DraftedReply, EmailContext, InboundEmail, ResponseKind};

/// Max tokens per drafted reply.
const DRAFT_MAX_TOKENS: u32 = 1024;

/// Generates a reply for an email plus its retrieved context.
#[async_trait]
pub trait ResponseDrafter: Send + Sync {
    /// Urgent path: reply meant to go out right away.
    async fn immediate(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError>;

    /// Followup path: reply plus a scheduled send time.
    async fn followup(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError>;

    /// Normal path: standard reply.
    async fn standard(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError>;
}

/// LLM-backed drafter with one prompt per path.
pub struct LlmDrafter {
    llm: Arc<dyn LlmProvider>,
    followup_delay: chrono::Duration,
}

impl LlmDrafter {
    pub fn new(llm: Arc<dyn LlmProvider>, followup_delay: chrono::Duration) -> Self {
        Self {
            llm,
            followup_delay,
        }
    }

    async fn draft(
        &self,
        system: &str,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<String, WorkflowError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(build_draft_prompt(email, context)),
        ])
        .with_max_tokens(DRAFT_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| WorkflowError::Generation(format!("LLM call failed: {e}")))?;
        Ok(response.content)
    }
}

#[async_trait]
impl ResponseDrafter for LlmDrafter {
    async fn immediate(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError> {
        let body = self.draft(IMMEDIATE_SYSTEM_PROMPT, email, context).await?;
        Ok(DraftedReply {
            kind: ResponseKind::Immediate,
            body,
            scheduled_for: None,
        })
    }

    async fn followup(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError> {
        let body = self.draft(FOLLOWUP_SYSTEM_PROMPT, email, context).await?;
        Ok(DraftedReply {
            kind: ResponseKind::Followup,
            body,
            scheduled_for: Some(Utc::now() + self.followup_delay),
        })
    }

    async fn standard(
        &self,
        email: &InboundEmail,
        context: &EmailContext,
    ) -> Result<DraftedReply, WorkflowError> {
        let body = self.draft(STANDARD_SYSTEM_PROMPT, email, context).await?;
        Ok(DraftedReply {
            kind: ResponseKind::Standard,
            body,
            scheduled_for: None,
        })
    }
}

const IMMEDIATE_SYSTEM_PROMPT: &str =
    "You draft immediate responses to urgent emails. Acknowledge the urgency, \
     state the next concrete action, and keep it short. Respond with the reply body only.";

const FOLLOWUP_SYSTEM_PROMPT: &str =
    "You draft followup replies for emails that can wait. Acknowledge receipt and \
     say when a full answer will come. Respond with the reply body only.";

const STANDARD_SYSTEM_PROMPT: &str =
    "You draft clear, friendly replies to routine emails. Respond with the reply body only.";

fn build_draft_prompt(email: &InboundEmail, context: &EmailContext) -> String {
    let mut prompt = String::with_capacity(512);
    prompt.push_str(&format!("To: {}\n", email.to));
    prompt.push_str(&format!("Subject: {}\n", email.subject));

    if !context.related.is_empty() {
        prompt.push_str("\nRelated prior messages:\n");
        for snippet in context.related.iter().take(5) {
            prompt.push_str(&format!("- {}\n", snippet.snippet));
        }
    }

    prompt.push_str(&format!("\nEmail:\n{}", email.content));
    prompt
}
