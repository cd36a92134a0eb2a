//! Agent wiring: one perception loop plus one session loop per agent.
//!
//! Both loops are independently scheduled cooperative tasks. The perception
//! task exclusively mutates the visibility registry; the session task reads
//! it by snapshot when composing a context push. Disabling the agent is the
//! only cancellation signal — both loops observe it at their next suspension
//! point, and the session fires its terminate request without awaiting it.

use crate::geometry::Pose;
use crate::perception::{FieldSettings, PerceptionField, Raycast, SharedRegistry};
use crate::session::{ContextSources, DialogueSessionClient, RetryPolicy, SessionSettings};
use crate::speech::SpeechBus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Everything needed to bring one agent up
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    /// Fixed persona/scenario text; empty uses the default template
    pub episodic: String,
    /// Viewer pose sampled by the perception cone
    pub pose: Pose,
    /// Delay between perception ticks
    pub perception_delay: Duration,
    pub field: FieldSettings,
    /// How long overheard speech stays in the context digest
    pub speech_window: Duration,
    pub session: SessionSettings,
    pub retry: RetryPolicy,
}

/// Handle to a running agent
pub struct Agent {
    name: String,
    registry: SharedRegistry,
    shutdown_tx: watch::Sender<bool>,
    display_rx: watch::Receiver<String>,
    backend_state_rx: watch::Receiver<String>,
    tasks: Vec<JoinHandle<()>>,
}

impl Agent {
    /// Spawn the perception and session tasks for one agent
    pub fn spawn(settings: AgentSettings, bus: &SpeechBus, raycaster: Arc<dyn Raycast>) -> Agent {
        let episodic = if settings.episodic.trim().is_empty() {
            default_episodic(&settings.name)
        } else {
            settings.episodic.clone()
        };

        let field = PerceptionField::new(settings.field.clone(), raycaster);
        let registry = field.registry();
        let inbox = bus.subscribe(&settings.name);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (display_tx, display_rx) = watch::channel(String::new());
        let (backend_state_tx, backend_state_rx) = watch::channel(String::new());

        let client = DialogueSessionClient::new(
            settings.session.clone(),
            settings.retry.clone(),
            ContextSources {
                registry: registry.clone(),
                inbox,
                episodic,
                speech_window: settings.speech_window,
            },
            bus.clone(),
            display_tx,
            backend_state_tx,
            shutdown_rx.clone(),
        );

        info!(agent = %settings.name, "Agent starting");

        let perception_task = tokio::spawn(perception_loop(
            field,
            settings.pose,
            settings.perception_delay,
            shutdown_rx,
        ));
        let session_task = tokio::spawn(client.run());

        Agent {
            name: settings.name,
            registry,
            shutdown_tx,
            display_rx,
            backend_state_rx,
            tasks: vec![perception_task, session_task],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only handle to this agent's visibility registry
    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// Latest spoken utterance (stands in for the UI speech text)
    pub fn display(&self) -> watch::Receiver<String> {
        self.display_rx.clone()
    }

    /// Latest state string reported by the backend
    pub fn backend_state(&self) -> watch::Receiver<String> {
        self.backend_state_rx.clone()
    }

    /// Signal both loops to stop at their next suspension point
    pub fn disable(&self) {
        info!(agent = %self.name, "Agent disabled");
        let _ = self.shutdown_tx.send(true);
    }

    /// Disable and wait for both loops to finish
    pub async fn shutdown(self) {
        self.disable();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

fn default_episodic(name: &str) -> String {
    format!(
        "Your name is {}. You are a talking dog in a room. Talk with the others.",
        name
    )
}

async fn perception_loop(
    field: PerceptionField,
    pose: Pose,
    delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        field.tick(pose, Instant::now());

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
        if *shutdown.borrow() {
            return;
        }
    }
}
