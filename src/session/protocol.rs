//! JSON wire types for the dialogue backend.
//!
//! | Operation         | Method + Path                       |
//! |-------------------|-------------------------------------|
//! | create session    | POST `/start_session`               |
//! | terminate session | DELETE `/stop_session`              |
//! | push context      | PUT `/set_state`                    |
//! | pull utterances   | GET `/get_response?session_id=<id>` |

use serde::{Deserialize, Serialize};

/// Body of POST `/start_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub provider_type: String,
    pub person_id: String,
    pub target_tickrate: u32,
}

/// Response to POST `/start_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    /// Backend-assigned opaque session token; absent or empty means failure
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of DELETE `/stop_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopSessionRequest {
    pub session_id: String,
}

/// Body of PUT `/set_state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStateRequest {
    pub session_id: String,
    /// Rendered perception summary
    pub visual: String,
    /// Digest of recently overheard speech
    pub external: String,
    /// Fixed persona/scenario text
    pub episodic: String,
}

/// Response to GET `/get_response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponseData {
    /// Generated utterances to speak aloud, in order
    #[serde(default)]
    pub response: Vec<String>,
    /// Backend's view of the agent's state
    #[serde(default)]
    pub state: String,
}
