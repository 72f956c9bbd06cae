//! Priority classification capability.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::WorkflowError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::workflow::rules::PriorityRules;
use crate::workflow::types::{InboundEmail, Priority};

/// Max tokens for the classification call (one label expected).
const CLASSIFY_MAX_TOKENS: u32 = 8;

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Classifies an inbound email into exactly one priority.
#[async_trait]
pub trait PriorityClassifier: Send + Sync {
    async fn classify(&self, email: &InboundEmail) -> Result<Priority, WorkflowError>;
}

/// LLM-backed classifier with a rules fast path.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
    rules: PriorityRules,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, rules: PriorityRules) -> Self {
        Self { llm, rules }
    }
}

#[async_trait]
impl PriorityClassifier for LlmClassifier {
    async fn classify(&self, email: &InboundEmail) -> Result<Priority, WorkflowError> {
        // Fast path: unambiguous emails skip the LLM entirely.
        if let Some(priority) = self.rules.evaluate(email) {
            return Ok(priority);
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(CLASSIFY_SYSTEM_PROMPT),
            ChatMessage::user(build_classify_prompt(email)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| WorkflowError::Classification(format!("LLM call failed: {e}")))?;

        // Out-of-enum labels are a hard error, not a silent "normal".
        match Priority::parse(&response.content) {
            Some(priority) => {
                debug!(priority = priority.label(), "Email classified");
                Ok(priority)
            }
            None => {
                warn!(raw = %response.content, "Classifier returned unknown priority label");
                Err(WorkflowError::Classification(format!(
                    "unknown priority label: {:?}",
                    response.content.trim()
                )))
            }
        }
    }
}

const CLASSIFY_SYSTEM_PROMPT: &str =
    "You are an email priority classifier. Classify the email into exactly one of:\n\
     - urgent: needs an immediate response (outages, deadlines today, explicit urgency)\n\
     - followup: needs a response later (scheduling, deferred decisions, no rush)\n\
     - normal: everything else\n\n\
     Respond with ONLY the single word: urgent, followup, or normal.";

fn build_classify_prompt(email: &InboundEmail) -> String {
    format!(
        "To: {}\nSubject: {}\n\n{}",
        email.to, email.subject, email.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::LlmError;
    use crate::llm::CompletionResponse;

    /// Mock LLM returning a fixed label, counting calls.
    struct FixedLlm {
        label: String,
        calls: AtomicUsize,
    }

    impl FixedLlm {
        fn new(label: &str) -> Self {
            Self {
                label: label.into(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.label.clone(),
                input_tokens: 20,
                output_tokens: 1,
            })
        }
    }

    fn email(subject: &str, content: &str) -> InboundEmail {
        InboundEmail {
            to: "me@example.com".into(),
            subject: subject.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn classifies_llm_labels() {
        for (label, expected) in [
            ("urgent", Priority::Urgent),
            ("Followup\n", Priority::Followup),
            ("normal", Priority::Normal),
        ] {
            let classifier =
                LlmClassifier::new(Arc::new(FixedLlm::new(label)), PriorityRules::empty());
            let got = classifier
                .classify(&email("hi", "plain message"))
                .await
                .unwrap();
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn unknown_label_is_a_hard_error() {
        let classifier = LlmClassifier::new(
            Arc::new(FixedLlm::new("somewhat-important")),
            PriorityRules::empty(),
        );
        let err = classifier
            .classify(&email("hi", "plain message"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Classification(_)));
    }

    #[tokio::test]
    async fn rules_short_circuit_the_llm() {
        // LLM would say normal, but the rules catch the urgency marker first.
        let llm = Arc::new(FixedLlm::new("normal"));
        let classifier = LlmClassifier::new(llm.clone(), PriorityRules::default_rules());

        let got = classifier
            .classify(&email("URGENT: prod down", "the server is down"))
            .await
            .unwrap();
        assert_eq!(got, Priority::Urgent);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
