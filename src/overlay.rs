//! Read-only diagnostic overlay over the visibility registry.
//!
//! Renders the full descriptions of the currently remembered objects into a
//! watch slot at a fixed refresh rate. Consumes the registry by snapshot and
//! never mutates core state.

use crate::perception::{describe_registry, Detail, SharedRegistry};
use std::time::Duration;
use tokio::sync::watch;

pub struct PerceptionOverlay {
    registry: SharedRegistry,
    refresh: Duration,
    tx: watch::Sender<String>,
    shutdown: watch::Receiver<bool>,
}

impl PerceptionOverlay {
    /// Build the overlay and the receiver its text is published on
    pub fn new(
        registry: SharedRegistry,
        refresh: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        (
            Self {
                registry,
                refresh,
                tx,
                shutdown,
            },
            rx,
        )
    }

    pub async fn run(mut self) {
        loop {
            let snapshot = self.registry.lock().unwrap().snapshot();
            let _ = self.tx.send(describe_registry(&snapshot, Detail::Full));

            tokio::select! {
                _ = tokio::time::sleep(self.refresh) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return;
                    }
                }
            }
            if *self.shutdown.borrow() {
                return;
            }
        }
    }
}
