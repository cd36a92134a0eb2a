// Full agent wiring against a mock backend: the perception loop fills the
// registry, the session loop pushes the rendered summary, and utterances
// returned by the backend reach the other agent's inbox.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use percept::agent::Agent;
use percept::config::PerceptConfig;
use percept::descriptor::ObjectDescriptor;
use percept::geometry::{Pose, Vec3};
use percept::scene::{SceneObject, StaticScene};
use percept::session::protocol::SetStateRequest;
use percept::speech::SpeechBus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Backend {
    set_states: Mutex<Vec<SetStateRequest>>,
    responses: Mutex<Vec<String>>,
}

async fn serve(backend: Arc<Backend>) -> String {
    async fn start(State(_): State<Arc<Backend>>) -> impl IntoResponse {
        Json(serde_json::json!({ "session_id": "e2e" }))
    }
    async fn set_state(
        State(backend): State<Arc<Backend>>,
        Json(request): Json<SetStateRequest>,
    ) -> impl IntoResponse {
        backend.set_states.lock().unwrap().push(request);
        StatusCode::OK
    }
    async fn get_response(
        State(backend): State<Arc<Backend>>,
        Query(_): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let utterances: Vec<String> = backend.responses.lock().unwrap().drain(..).collect();
        Json(serde_json::json!({ "response": utterances, "state": "ok" }))
    }
    async fn stop(State(_): State<Arc<Backend>>) -> impl IntoResponse {
        StatusCode::OK
    }

    let app = Router::new()
        .route("/start_session", post(start))
        .route("/set_state", put(set_state))
        .route("/get_response", get(get_response))
        .route("/stop_session", delete(stop))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn test_config(base_url: &str) -> PerceptConfig {
    let toml = format!(
        r#"
        [perception]
        resolution_width = 9
        resolution_height = 9
        tick_delay_seconds = 0.01

        [backend]
        base_url = "{}"

        [session]
        start_delay_seconds = 0.05
        update_delay_seconds = 0.03
        "#,
        base_url
    );
    toml::from_str(&toml).unwrap()
}

#[tokio::test]
async fn agent_pushes_perceived_scene_and_relays_utterances() {
    let backend = Arc::new(Backend::default());
    backend
        .responses
        .lock()
        .unwrap()
        .push("Woof! A crate!".to_string());
    let base_url = serve(backend.clone()).await;

    let scene = Arc::new(StaticScene::new(vec![SceneObject::new(
        Vec3::new(0.0, 0.0, 3.0),
        0.5,
        u32::MAX,
        ObjectDescriptor::new("Crate")
            .with_name("Wooden crate")
            .into_shared(),
    )]));

    let config = test_config(&base_url);
    let bus = SpeechBus::new();
    let listener = bus.subscribe("Bystander");

    let agent = Agent::spawn(config.agent_settings("Rex", Pose::default()), &bus, scene);

    tokio::time::sleep(Duration::from_millis(300)).await;

    // The perception loop had warmed up before the first push
    let pushed = backend.set_states.lock().unwrap();
    assert!(!pushed.is_empty());
    assert_eq!(pushed[0].session_id, "e2e");
    assert!(pushed[0]
        .visual
        .contains("- Object 'Wooden crate' (Crate); \n"));
    assert!(pushed[0].episodic.contains("Rex"));
    drop(pushed);

    // The backend's utterance was spoken aloud to the other subscriber
    let digest = listener.digest(Duration::from_secs(20), chrono::Utc::now());
    assert_eq!(digest, "- Rex: Woof! A crate!\n");
    assert_eq!(*agent.display().borrow(), "Woof! A crate!");
    assert_eq!(*agent.backend_state().borrow(), "ok");

    agent.shutdown().await;
}
