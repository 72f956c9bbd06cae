//! Agent roles and the crew execution primitive.
//!
//! Three fixed roles — reader, analyzer, composer — with shared mail tool
//! bindings. The roles carry no decision logic of their own; they are
//! prompt profiles handed to the LLM provider. `Crew::kickoff` is the
//! single blocking run primitive the API layer calls: tasks execute
//! sequentially, each seeing the previous task's output.

use std::sync::Arc;

use tracing::info;

use crate::error::{AdapterError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::{GmailClient, MessageSummary, SendReceipt};

/// Max tokens per crew task completion.
const TASK_MAX_TOKENS: u32 = 1024;

/// One agent role: a prompt profile, not a behavior.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentProfile {
    /// Render the profile as a system prompt.
    fn system_prompt(&self) -> String {
        format!(
            "You are the {role}.\nGoal: {goal}\n{backstory}",
            role = self.role,
            goal = self.goal,
            backstory = self.backstory,
        )
    }
}

/// The fixed agent set.
#[derive(Debug, Clone)]
pub struct CrewProfiles {
    pub reader: AgentProfile,
    pub analyzer: AgentProfile,
    pub composer: AgentProfile,
}

/// Build the three named roles with their standing instructions.
pub fn crew_profiles() -> CrewProfiles {
    CrewProfiles {
        reader: AgentProfile {
            role: "Email Reader",
            goal: "Efficiently read and understand email content",
            backstory: "You are an expert at reading and comprehending emails. \
                        Your responsibility is to process email content and extract key information.",
        },
        analyzer: AgentProfile {
            role: "Email Analyzer",
            goal: "Analyze emails and provide insights",
            backstory: "You are an expert at analyzing email content and identifying patterns, \
                        priorities, and action items. You work with the Email Reader to process information.",
        },
        composer: AgentProfile {
            role: "Email Composer",
            goal: "Compose and send effective emails",
            backstory: "You are an expert at writing clear and effective emails. \
                        You can draft responses and new emails based on analysis and requirements.",
        },
    }
}

/// One unit of crew work: a description assigned to a role.
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub agent: AgentProfile,
}

impl Task {
    pub fn new(description: impl Into<String>, agent: &AgentProfile) -> Self {
        Self {
            description: description.into(),
            agent: agent.clone(),
        }
    }
}

/// Sequential task runner over the LLM provider.
pub struct Crew {
    llm: Arc<dyn LlmProvider>,
}

impl Crew {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Run the task list in order; each task sees the previous task's
    /// output. Returns the final task's output.
    pub async fn kickoff(&self, tasks: &[Task]) -> Result<String, LlmError> {
        let mut previous: Option<String> = None;

        for (index, task) in tasks.iter().enumerate() {
            let mut prompt = task.description.clone();
            if let Some(ref output) = previous {
                prompt.push_str("\n\nOutput of the previous step:\n");
                prompt.push_str(output);
            }

            let request = CompletionRequest::new(vec![
                ChatMessage::system(task.agent.system_prompt()),
                ChatMessage::user(prompt),
            ])
            .with_max_tokens(TASK_MAX_TOKENS);

            let response = self.llm.complete(request).await?;
            info!(
                task = index,
                role = task.agent.role,
                output_tokens = response.output_tokens,
                "Crew task complete"
            );
            previous = Some(response.content);
        }

        Ok(previous.unwrap_or_default())
    }
}

/// Fixed tool bindings shared by all roles: read and send.
pub struct MailToolset {
    client: Arc<GmailClient>,
}

impl MailToolset {
    pub fn new(client: Arc<GmailClient>) -> Self {
        Self { client }
    }

    /// Read emails. Parameters: max_results, query (optional).
    pub async fn read_emails(
        &self,
        max_results: u32,
        query: Option<&str>,
    ) -> Result<Vec<MessageSummary>, AdapterError> {
        self.client.list_messages(max_results, query).await
    }

    /// Send an email. Parameters: to, subject, body.
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<SendReceipt, AdapterError> {
        self.client.send(to, subject, body).await
    }
}
