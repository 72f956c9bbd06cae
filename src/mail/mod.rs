//! Mail provider boundary — OAuth token lifecycle and the Gmail adapter.

pub mod auth;
pub mod client;

pub use auth::{TokenState, TokenStore};
pub use client::{GmailClient, MessageSummary, SendReceipt};
