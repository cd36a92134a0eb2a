//! Client-side session state machine for the dialogue backend.
//!
//! Lifecycle: `Idle → Starting → Active → Stopping → Idle`. There is no error
//! state — network failures are logged and the loop continues on its fixed
//! schedule with local state unchanged. A failed create-session attempt is
//! terminal for the activation: the client stays inert and never retries on
//! its own.

use crate::perception::{describe_registry, Detail, SharedRegistry};
use crate::session::protocol::{
    GetResponseData, SetStateRequest, StartSessionRequest, StartSessionResponse,
    StopSessionRequest,
};
use crate::speech::{SpeechBus, SpeechInbox};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// Per-request retry policy injected into the client.
///
/// The default preserves the observed behavior: a single attempt per loop
/// iteration, no backoff, bounded only by the fixed poll interval.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per request before giving up for this iteration
    pub max_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Backend endpoint and scheduling parameters
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base URL of the dialogue backend, e.g. `http://localhost:8000`
    pub base_url: String,
    pub provider_type: String,
    pub person_id: String,
    pub target_tickrate: u32,
    /// Delay before the create-session attempt (lets perception warm up)
    pub start_delay: Duration,
    /// Delay between push/pull iterations
    pub update_delay: Duration,
}

/// Inputs the context push is composed from, recomputed every iteration
pub struct ContextSources {
    /// Visibility registry maintained by the perception loop
    pub registry: SharedRegistry,
    /// This agent's speech inbox
    pub inbox: SpeechInbox,
    /// Fixed persona/scenario text, set once at startup
    pub episodic: String,
    /// How long overheard speech stays in the digest
    pub speech_window: Duration,
}

impl ContextSources {
    /// Short-form summary of the current registry snapshot
    pub fn visual(&self) -> String {
        let snapshot = self.registry.lock().unwrap().snapshot();
        describe_registry(&snapshot, Detail::Short)
    }

    /// Digest of recently overheard speech; purges expired entries
    pub fn external(&self) -> String {
        self.inbox.digest(self.speech_window, Utc::now())
    }
}

/// Owns the session lifecycle and the periodic push/pull loop
pub struct DialogueSessionClient {
    http: reqwest::Client,
    settings: SessionSettings,
    retry: RetryPolicy,
    sources: ContextSources,
    bus: SpeechBus,
    /// Last spoken utterance, mirrored for display
    display_tx: watch::Sender<String>,
    /// Last state string returned by the backend
    backend_state_tx: watch::Sender<String>,
    shutdown: watch::Receiver<bool>,
    state_tx: watch::Sender<SessionState>,
    session_id: Option<String>,
}

impl DialogueSessionClient {
    pub fn new(
        settings: SessionSettings,
        retry: RetryPolicy,
        sources: ContextSources,
        bus: SpeechBus,
        display_tx: watch::Sender<String>,
        backend_state_tx: watch::Sender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            retry,
            sources,
            bus,
            display_tx,
            backend_state_tx,
            shutdown,
            state_tx: watch::channel(SessionState::Idle).0,
            session_id: None,
        }
    }

    /// Watch the lifecycle state as `run` drives it
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn enter(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }

    /// Run the session to completion: one create-session attempt, then the
    /// push/pull loop until shutdown, then a fire-and-forget terminate.
    pub async fn run(mut self) {
        if self.wait(self.settings.start_delay).await {
            return;
        }

        self.enter(SessionState::Starting);
        let session_id = match self.start_session().await {
            Ok(Some(id)) if !id.is_empty() => id,
            Ok(_) => {
                // Fire-once by design: no retry is scheduled
                error!("Session ID not found in start_session response");
                self.enter(SessionState::Idle);
                return;
            }
            Err(e) => {
                error!(error = %e, "Error starting session");
                self.enter(SessionState::Idle);
                return;
            }
        };

        info!(session_id = %session_id, speaker = %self.sources.inbox.name(), "Dialogue session active");
        self.session_id = Some(session_id);
        self.enter(SessionState::Active);

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            if let Err(e) = self.push_context().await {
                error!(error = %e, "Error updating state");
            }

            match self.pull_utterances().await {
                Ok(data) => {
                    for utterance in data.response {
                        self.say_aloud(&utterance);
                    }
                    let _ = self.backend_state_tx.send(data.state);
                }
                Err(e) => error!(error = %e, "Error getting response"),
            }

            if self.wait(self.settings.update_delay).await {
                break;
            }
        }

        self.enter(SessionState::Stopping);
        self.stop_session();
        self.enter(SessionState::Idle);
    }

    /// Sleep for `duration`, returning early when shutdown is signalled.
    /// Returns true when the client should stop.
    async fn wait(&mut self, duration: Duration) -> bool {
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return *self.shutdown.borrow(),
                changed = self.shutdown.changed() => match changed {
                    Ok(()) => {
                        if *self.shutdown.borrow() {
                            return true;
                        }
                    }
                    // Sender dropped: the owning agent is gone
                    Err(_) => return true,
                },
            }
        }
    }

    /// Publish to the speech bus and mirror to the display slot
    fn say_aloud(&self, utterance: &str) {
        info!(speaker = %self.sources.inbox.name(), utterance = %utterance, "Speaking aloud");
        self.bus.publish(self.sources.inbox.name(), utterance);
        let _ = self.display_tx.send(utterance.to_string());
    }

    async fn start_session(&self) -> Result<Option<String>> {
        let request = StartSessionRequest {
            provider_type: self.settings.provider_type.clone(),
            person_id: self.settings.person_id.clone(),
            target_tickrate: self.settings.target_tickrate,
        };
        let url = format!("{}/start_session", self.settings.base_url);

        let response = self
            .send_with_retries("start_session", self.http.post(&url).json(&request))
            .await?;
        let body: StartSessionResponse = response
            .json()
            .await
            .context("Failed to parse start_session response")?;
        Ok(body.session_id)
    }

    /// PUT `/set_state` with the freshly composed context
    async fn push_context(&self) -> Result<()> {
        let session_id = self.require_session_id()?;
        let request = SetStateRequest {
            session_id: session_id.to_string(),
            visual: self.sources.visual(),
            external: self.sources.external(),
            episodic: self.sources.episodic.clone(),
        };
        let url = format!("{}/set_state", self.settings.base_url);

        self.send_with_retries("set_state", self.http.put(&url).json(&request))
            .await?;
        debug!("Context pushed");
        Ok(())
    }

    /// GET `/get_response` for generated utterances
    async fn pull_utterances(&self) -> Result<GetResponseData> {
        let session_id = self.require_session_id()?;
        let url = format!("{}/get_response", self.settings.base_url);

        let response = self
            .send_with_retries(
                "get_response",
                self.http.get(&url).query(&[("session_id", session_id)]),
            )
            .await?;
        response
            .json()
            .await
            .context("Failed to parse get_response body")
    }

    /// DELETE `/stop_session`, fire-and-forget — the agent is tearing down
    /// and does not await the response for correctness.
    fn stop_session(&self) {
        let session_id = match &self.session_id {
            Some(id) => id.clone(),
            None => return,
        };
        let url = format!("{}/stop_session", self.settings.base_url);
        let request = self
            .http
            .delete(&url)
            .json(&StopSessionRequest { session_id });

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Session stopped successfully")
                }
                Ok(response) => warn!(status = %response.status(), "Error stopping session"),
                Err(e) => warn!(error = %e, "Error stopping session"),
            }
        });
    }

    fn require_session_id(&self) -> Result<&str> {
        self.session_id
            .as_deref()
            .ok_or_else(|| anyhow!("No active session"))
    }

    /// Send a request under the retry policy, treating non-2xx as failure
    async fn send_with_retries(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let mut attempt = 1u32;
        loop {
            let req = request
                .try_clone()
                .ok_or_else(|| anyhow!("Request body not cloneable"))?;

            let result = match req.send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(anyhow!(
                    "{} failed with status {}",
                    what,
                    response.status()
                )),
                Err(e) => Err(anyhow::Error::from(e).context(format!("{} request failed", what))),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry.max_attempts => {
                    warn!(error = %e, attempt = attempt, "Retrying {}", what);
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
