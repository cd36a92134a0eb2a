use anyhow::Result;
use percept::agent::Agent;
use percept::config::{load_config, PerceptConfig};
use percept::descriptor::{Action, ObjectDescriptor};
use percept::geometry::{Orientation, Pose, Vec3};
use percept::overlay::PerceptionOverlay;
use percept::scene::{SceneObject, StaticScene};
use percept::speech::SpeechBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "percept=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "Loading configuration");
            load_config(&path)?
        }
        None => {
            info!("No config path given, using defaults");
            PerceptConfig::default()
        }
    };

    let bus = SpeechBus::new();
    let scene = Arc::new(demo_scene());

    // Two agents facing each other across the room
    let first = Agent::spawn(
        config.agent_settings(&config.agent.name, Pose::default()),
        &bus,
        scene.clone(),
    );
    let second = Agent::spawn(
        config.agent_settings(
            "Rex",
            Pose::new(Vec3::new(0.0, 0.0, 6.0), Orientation::new(180.0, 0.0, 0.0)),
        ),
        &bus,
        scene.clone(),
    );

    // Diagnostic overlay over the first agent's registry
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (overlay, mut overlay_rx) = PerceptionOverlay::new(
        first.registry(),
        Duration::from_secs_f64(config.display.refresh_seconds),
        shutdown_rx,
    );
    tokio::spawn(overlay.run());
    tokio::spawn(async move {
        while overlay_rx.changed().await.is_ok() {
            let text = overlay_rx.borrow_and_update().clone();
            info!(overlay = %text, "Perception overlay");
        }
    });

    info!("Percept running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    let _ = shutdown_tx.send(true);
    first.shutdown().await;
    second.shutdown().await;

    info!("Percept stopped");
    Ok(())
}

/// A small room: a lamp with a toggle action and a mute decoration
fn demo_scene() -> StaticScene {
    let lamp = ObjectDescriptor::new("Lamp")
        .with_name("Floor lamp")
        .with_description("A tall floor lamp")
        .with_property("color", "brass")
        .with_variable("powered", "off")
        .with_action(
            Action::new("toggle")
                .with_description("Flip the power switch")
                .with_parameters(["state"])
                .bind(Box::new(|args| Ok(args.first().cloned()))),
        )
        .into_shared();

    let plant = ObjectDescriptor::new("Plant")
        .with_name("Potted fern")
        .with_property("condition", "healthy")
        .into_shared();

    StaticScene::new(vec![
        SceneObject::new(Vec3::new(1.5, 0.0, 3.0), 0.5, u32::MAX, lamp),
        SceneObject::new(Vec3::new(-1.5, 0.0, 3.0), 0.5, u32::MAX, plant),
    ])
}
