// Dialogue backend session protocol and client

pub mod client;
pub mod protocol;

pub use client::{ContextSources, DialogueSessionClient, RetryPolicy, SessionSettings, SessionState};
