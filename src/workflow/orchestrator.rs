//! Email workflow orchestrator.
//!
//! Routes an inbound email through priority classification and context
//! retrieval to one of three response paths. Each step runs under its own
//! tracing span (closed on every exit path, including errors), is bounded
//! by a step timeout, and fails the whole request on error: the failure is
//! logged once, then propagated. No retry, no partial result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, info, info_span};

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::telemetry::Telemetry;
use crate::workflow::classifier::PriorityClassifier;
use crate::workflow::context::ContextStore;
use crate::workflow::drafter::ResponseDrafter;
use crate::workflow::types::{InboundEmail, Priority, WorkflowResult};

/// Workflow orchestrator over injected capabilities.
pub struct Orchestrator {
    classifier: Arc<dyn PriorityClassifier>,
    context: Arc<dyn ContextStore>,
    drafter: Arc<dyn ResponseDrafter>,
    telemetry: Arc<Telemetry>,
    step_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<dyn PriorityClassifier>,
        context: Arc<dyn ContextStore>,
        drafter: Arc<dyn ResponseDrafter>,
        telemetry: Arc<Telemetry>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            classifier,
            context,
            drafter,
            telemetry,
            step_timeout: config.step_timeout,
        }
    }

    /// Process one inbound email through the full workflow.
    pub async fn process_incoming_email(
        &self,
        email: &InboundEmail,
    ) -> Result<WorkflowResult, WorkflowError> {
        let span = info_span!(
            "process_incoming_email",
            request_id = %uuid::Uuid::new_v4(),
            to = %email.to,
            priority = tracing::field::Empty,
            response_kind = tracing::field::Empty,
        );

        async {
            let result = self.run_steps(email).await;
            if let Err(ref e) = result {
                self.telemetry
                    .log_error("Email processing failed", &e.to_string());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_steps(&self, email: &InboundEmail) -> Result<WorkflowResult, WorkflowError> {
        if email.content.trim().is_empty() {
            return Err(WorkflowError::InvalidEmail("empty content".into()));
        }

        // Step 1: classify priority.
        let priority = self
            .bounded(
                "classify_priority",
                self.classifier
                    .classify(email)
                    .instrument(info_span!("classify_priority")),
            )
            .await?;
        tracing::Span::current().record("priority", priority.label());

        // Step 2: retrieve context keyed on content.
        let context = self
            .bounded(
                "retrieve_context",
                self.context
                    .retrieve(&email.content)
                    .instrument(info_span!("retrieve_context")),
            )
            .await?;

        // Step 3: dispatch on priority.
        let response = match priority {
            Priority::Urgent => {
                self.bounded(
                    "generate_immediate_response",
                    self.drafter.immediate(email, &context).instrument(
                        info_span!("generate_immediate_response", priority = priority.label()),
                    ),
                )
                .await?
            }
            Priority::Followup => {
                self.bounded(
                    "schedule_followup",
                    self.drafter
                        .followup(email, &context)
                        .instrument(info_span!("schedule_followup", priority = priority.label())),
                )
                .await?
            }
            Priority::Normal => {
                self.bounded(
                    "handle_normal_priority",
                    self.drafter.standard(email, &context).instrument(
                        info_span!("handle_normal_priority", priority = priority.label()),
                    ),
                )
                .await?
            }
        };
        tracing::Span::current().record("response_kind", response.kind.label());

        info!(
            priority = priority.label(),
            response_kind = response.kind.label(),
            "Email processed"
        );

        Ok(WorkflowResult {
            status: "success".into(),
            priority,
            response,
        })
    }

    /// Bound one external call by the step timeout.
    async fn bounded<T>(
        &self,
        step: &'static str,
        call: impl Future<Output = Result<T, WorkflowError>>,
    ) -> Result<T, WorkflowError> {
        tokio::time::timeout(self.step_timeout, call)
            .await
            .map_err(|_| WorkflowError::Timeout {
                step,
                timeout: self.step_timeout,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::workflow::types::{DraftedReply, EmailContext, ResponseKind};

    struct FixedClassifier(Priority);

    #[async_trait]
    impl PriorityClassifier for FixedClassifier {
        async fn classify(&self, _email: &InboundEmail) -> Result<Priority, WorkflowError> {
            Ok(self.0)
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl PriorityClassifier for SlowClassifier {
        async fn classify(&self, _email: &InboundEmail) -> Result<Priority, WorkflowError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Priority::Normal)
        }
    }

    struct EmptyContext;

    #[async_trait]
    impl ContextStore for EmptyContext {
        async fn retrieve(&self, _content: &str) -> Result<EmailContext, WorkflowError> {
            Ok(EmailContext::default())
        }
    }

    struct FailingContext;

    #[async_trait]
    impl ContextStore for FailingContext {
        async fn retrieve(&self, _content: &str) -> Result<EmailContext, WorkflowError> {
            Err(WorkflowError::Retrieval("vector store unavailable".into()))
        }
    }

    /// Drafter that counts which path was taken.
    #[derive(Default)]
    struct CountingDrafter {
        immediate: AtomicUsize,
        followup: AtomicUsize,
        standard: AtomicUsize,
    }

    impl CountingDrafter {
        fn reply(kind: ResponseKind) -> DraftedReply {
            DraftedReply {
                kind,
                body: "drafted".into(),
                scheduled_for: None,
            }
        }
    }

    #[async_trait]
    impl ResponseDrafter for CountingDrafter {
        async fn immediate(
            &self,
            _email: &InboundEmail,
            _context: &EmailContext,
        ) -> Result<DraftedReply, WorkflowError> {
            self.immediate.fetch_add(1, Ordering::SeqCst);
            Ok(Self::reply(ResponseKind::Immediate))
        }

        async fn followup(
            &self,
            _email: &InboundEmail,
            _context: &EmailContext,
        ) -> Result<DraftedReply, WorkflowError> {
            self.followup.fetch_add(1, Ordering::SeqCst);
            Ok(Self::reply(ResponseKind::Followup))
        }

        async fn standard(
            &self,
            _email: &InboundEmail,
            _context: &EmailContext,
        ) -> Result<DraftedReply, WorkflowError> {
            self.standard.fetch_add(1, Ordering::SeqCst);
            Ok(Self::reply(ResponseKind::Standard))
        }
    }

    fn email(content: &str) -> InboundEmail {
        InboundEmail {
            to: "a@b.com".into(),
            subject: "subject".into(),
            content: content.into(),
        }
    }

    fn orchestrator(
        classifier: Arc<dyn PriorityClassifier>,
        context: Arc<dyn ContextStore>,
        drafter: Arc<CountingDrafter>,
        telemetry: Arc<Telemetry>,
    ) -> Orchestrator {
        Orchestrator::new(
            classifier,
            context,
            drafter,
            telemetry,
            &WorkflowConfig::default(),
        )
    }

    #[tokio::test]
    async fn each_priority_dispatches_to_its_path() {
        for (priority, kind) in [
            (Priority::Urgent, ResponseKind::Immediate),
            (Priority::Followup, ResponseKind::Followup),
            (Priority::Normal, ResponseKind::Standard),
        ] {
            let drafter = Arc::new(CountingDrafter::default());
            let orch = orchestrator(
                Arc::new(FixedClassifier(priority)),
                Arc::new(EmptyContext),
                drafter.clone(),
                Arc::new(Telemetry::new()),
            );

            let result = orch.process_incoming_email(&email("hello")).await.unwrap();
            assert_eq!(result.status, "success");
            assert_eq!(result.priority, priority);
            assert_eq!(result.response.kind, kind);

            let calls = (
                drafter.immediate.load(Ordering::SeqCst),
                drafter.followup.load(Ordering::SeqCst),
                drafter.standard.load(Ordering::SeqCst),
            );
            let expected = match priority {
                Priority::Urgent => (1, 0, 0),
                Priority::Followup => (0, 1, 0),
                Priority::Normal => (0, 0, 1),
            };
            assert_eq!(calls, expected);
        }
    }

    #[tokio::test]
    async fn retrieval_failure_propagates_and_logs_once() {
        for priority in [Priority::Urgent, Priority::Followup, Priority::Normal] {
            let drafter = Arc::new(CountingDrafter::default());
            let telemetry = Arc::new(Telemetry::new());
            let orch = orchestrator(
                Arc::new(FixedClassifier(priority)),
                Arc::new(FailingContext),
                drafter.clone(),
                telemetry.clone(),
            );

            let err = orch
                .process_incoming_email(&email("hello"))
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::Retrieval(_)));
            assert_eq!(telemetry.errors_logged(), 1);

            // No response path ran.
            assert_eq!(drafter.immediate.load(Ordering::SeqCst), 0);
            assert_eq!(drafter.followup.load(Ordering::SeqCst), 0);
            assert_eq!(drafter.standard.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn urgent_scenario_takes_immediate_path_once() {
        use crate::workflow::classifier::LlmClassifier;
        use crate::workflow::rules::PriorityRules;

        // "urgent: server down" hits the rules fast path; the LLM is
        // never consulted (the mock would claim normal).
        struct NormalLlm;

        #[async_trait]
        impl crate::llm::LlmProvider for NormalLlm {
            fn model_name(&self) -> &str {
                "normal-llm"
            }

            async fn complete(
                &self,
                _request: crate::llm::CompletionRequest,
            ) -> Result<crate::llm::CompletionResponse, crate::error::LlmError> {
                Ok(crate::llm::CompletionResponse {
                    content: "normal".into(),
                    input_tokens: 1,
                    output_tokens: 1,
                })
            }
        }

        let classifier = Arc::new(LlmClassifier::new(
            Arc::new(NormalLlm),
            PriorityRules::default_rules(),
        ));
        let drafter = Arc::new(CountingDrafter::default());
        let orch = orchestrator(
            classifier,
            Arc::new(EmptyContext),
            drafter.clone(),
            Arc::new(Telemetry::new()),
        );

        let result = orch
            .process_incoming_email(&email("urgent: server down"))
            .await
            .unwrap();

        assert_eq!(result.priority, Priority::Urgent);
        assert_eq!(drafter.immediate.load(Ordering::SeqCst), 1);
        assert_eq!(drafter.followup.load(Ordering::SeqCst), 0);
        assert_eq!(drafter.standard.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let drafter = Arc::new(CountingDrafter::default());
        let telemetry = Arc::new(Telemetry::new());
        let orch = orchestrator(
            Arc::new(FixedClassifier(Priority::Normal)),
            Arc::new(EmptyContext),
            drafter,
            telemetry.clone(),
        );

        let err = orch
            .process_incoming_email(&email("  \n "))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidEmail(_)));
        assert_eq!(telemetry.errors_logged(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_step_times_out() {
        let drafter = Arc::new(CountingDrafter::default());
        let telemetry = Arc::new(Telemetry::new());
        let config = WorkflowConfig {
            step_timeout: Duration::from_millis(100),
            ..WorkflowConfig::default()
        };
        let orch = Orchestrator::new(
            Arc::new(SlowClassifier),
            Arc::new(EmptyContext),
            drafter,
            telemetry.clone(),
            &config,
        );

        let err = orch
            .process_incoming_email(&email("hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Timeout {
                step: "classify_priority",
                ..
            }
        ));
        assert_eq!(telemetry.errors_logged(), 1);
    }
}
