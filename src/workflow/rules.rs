//! Pre-LLM priority fast path.
//!
//! Runs before the LLM classification step to short-circuit unambiguous
//! cases: explicit urgency markers go straight to urgent, scheduling
//! language goes to followup. If no rule matches, the classifier falls
//! through to the LLM.

use regex::Regex;
use tracing::debug;

use crate::workflow::types::{InboundEmail, Priority};

/// Which field a rule matches against.
#[derive(Debug, Clone, Copy)]
pub enum RuleField {
    Subject,
    Content,
}

/// A single priority rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct PriorityRule {
    /// Compiled regex for matching.
    pub regex: Regex,
    /// Which email field to match.
    pub field: RuleField,
    /// Priority assigned on match.
    pub priority: Priority,
    /// Why this rule triggers.
    pub reason: &'static str,
}

/// Fast-path priority rules, evaluated in order.
pub struct PriorityRules {
    rules: Vec<PriorityRule>,
}

impl PriorityRules {
    /// Create the default rule set.
    pub fn default_rules() -> Self {
        let rules = vec![
            PriorityRule {
                regex: Regex::new(r"(?i)^\s*urgent\b").unwrap(),
                field: RuleField::Subject,
                priority: Priority::Urgent,
                reason: "subject starts with urgent",
            },
            PriorityRule {
                regex: Regex::new(r"(?i)\b(urgent|asap|emergency|immediately|critical)\b").unwrap(),
                field: RuleField::Content,
                priority: Priority::Urgent,
                reason: "urgency keyword in content",
            },
            PriorityRule {
                regex: Regex::new(r"(?i)\b(server|site|service|system) (is )?down\b").unwrap(),
                field: RuleField::Content,
                priority: Priority::Urgent,
                reason: "outage language in content",
            },
            PriorityRule {
                regex: Regex::new(r"(?i)\b(follow[- ]?up|circle back|check back|when you get a chance|no rush)\b")
                    .unwrap(),
                field: RuleField::Content,
                priority: Priority::Followup,
                reason: "deferral language in content",
            },
        ];
        Self { rules }
    }

    /// Create an empty rule set (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Evaluate an email against all rules.
    ///
    /// Returns `Some(Priority)` on the first match (short-circuits the
    /// LLM), `None` if nothing matched.
    pub fn evaluate(&self, email: &InboundEmail) -> Option<Priority> {
        for rule in &self.rules {
            let haystack = match rule.field {
                RuleField::Subject => &email.subject,
                RuleField::Content => &email.content,
            };
            if rule.regex.is_match(haystack) {
                debug!(
                    priority = rule.priority.label(),
                    reason = rule.reason,
                    "Priority rule matched, skipping LLM classification"
                );
                return Some(rule.priority);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(subject: &str, content: &str) -> InboundEmail {
        InboundEmail {
            to: "me@example.com".into(),
            subject: subject.into(),
            content: content.into(),
        }
    }

    #[test]
    fn urgent_subject_prefix_matches() {
        let rules = PriorityRules::default_rules();
        assert_eq!(
            rules.evaluate(&email("URGENT: prod is broken", "details inside")),
            Some(Priority::Urgent)
        );
    }

    #[test]
    fn outage_content_matches_urgent() {
        let rules = PriorityRules::default_rules();
        assert_eq!(
            rules.evaluate(&email("status", "urgent: server down since 09:00")),
            Some(Priority::Urgent)
        );
    }

    #[test]
    fn deferral_language_matches_followup() {
        let rules = PriorityRules::default_rules();
        assert_eq!(
            rules.evaluate(&email("re: roadmap", "no rush, let's circle back next week")),
            Some(Priority::Followup)
        );
    }

    #[test]
    fn plain_email_matches_nothing() {
        let rules = PriorityRules::default_rules();
        assert_eq!(
            rules.evaluate(&email("lunch", "want to grab lunch tomorrow?")),
            None
        );
    }

    #[test]
    fn empty_rules_never_match() {
        let rules = PriorityRules::empty();
        assert_eq!(rules.evaluate(&email("URGENT", "emergency")), None);
    }
}
