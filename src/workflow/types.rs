//! Shared types for the email workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Inbound email ───────────────────────────────────────────────────

/// An email entering the workflow. Created per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    pub to: String,
    pub subject: String,
    pub content: String,
}

// ── Priority ────────────────────────────────────────────────────────

/// Priority classification driving response strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Followup,
    Normal,
}

impl Priority {
    /// Short label for logging and span fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Followup => "followup",
            Self::Normal => "normal",
        }
    }

    /// Strict parse: exactly one of the three labels, else `None`.
    ///
    /// Out-of-enum classifier output is a hard error upstream, never a
    /// silent fallback to normal handling.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "urgent" => Some(Self::Urgent),
            "followup" => Some(Self::Followup),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }
}

// ── Context ─────────────────────────────────────────────────────────

/// Supporting information retrieved for an email. Lives for one
/// orchestration call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailContext {
    pub related: Vec<ContextSnippet>,
}

/// One related prior message fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub source_id: String,
    pub snippet: String,
    pub score: f32,
}

// ── Response ────────────────────────────────────────────────────────

/// Which response path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Immediate,
    Followup,
    Standard,
}

impl ResponseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Followup => "followup",
            Self::Standard => "standard",
        }
    }
}

/// A generated reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftedReply {
    pub kind: ResponseKind,
    pub body: String,
    /// Set only on the followup path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

// ── Workflow result ─────────────────────────────────────────────────

/// Returned to the caller only when every step succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub status: String,
    pub priority: Priority,
    pub response: DraftedReply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_accepts_exact_labels() {
        assert_eq!(Priority::parse("urgent"), Some(Priority::Urgent));
        assert_eq!(Priority::parse("followup"), Some(Priority::Followup));
        assert_eq!(Priority::parse("normal"), Some(Priority::Normal));
    }

    #[test]
    fn priority_parse_tolerates_case_and_whitespace() {
        assert_eq!(Priority::parse("  Urgent\n"), Some(Priority::Urgent));
        assert_eq!(Priority::parse("FOLLOWUP"), Some(Priority::Followup));
    }

    #[test]
    fn priority_parse_rejects_out_of_enum_labels() {
        assert_eq!(Priority::parse("high"), None);
        assert_eq!(Priority::parse("urgent-ish"), None);
        assert_eq!(Priority::parse(""), None);
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Priority::Urgent).unwrap(),
            serde_json::json!("urgent")
        );
    }

    #[test]
    fn workflow_result_serialization_shape() {
        let result = WorkflowResult {
            status: "success".into(),
            priority: Priority::Followup,
            response: DraftedReply {
                kind: ResponseKind::Followup,
                body: "I'll get back to you next week.".into(),
                scheduled_for: Some(Utc::now()),
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["priority"], "followup");
        assert_eq!(json["response"]["kind"], "followup");
        assert!(json["response"]["scheduled_for"].is_string());
    }

    #[test]
    fn standard_reply_omits_schedule() {
        let reply = DraftedReply {
            kind: ResponseKind::Standard,
            body: "Thanks!".into(),
            scheduled_for: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("scheduled_for").is_none());
    }
}
