use crate::agent::AgentSettings;
use crate::geometry::Pose;
use crate::perception::FieldSettings;
use crate::session::{RetryPolicy, SessionSettings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Complete percept configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerceptConfig {
    #[serde(default)]
    pub perception: PerceptionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// View cone configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PerceptionConfig {
    /// Full horizontal field of view in degrees (0–180)
    #[serde(default = "default_fov_degrees")]
    pub horizontal_fov_degrees: f32,
    /// Full vertical field of view in degrees (0–180)
    #[serde(default = "default_fov_degrees")]
    pub vertical_fov_degrees: f32,
    /// Ray grid columns (minimum 5)
    #[serde(default = "default_resolution_width")]
    pub resolution_width: u32,
    /// Ray grid rows (minimum 5)
    #[serde(default = "default_resolution_height")]
    pub resolution_height: u32,
    #[serde(default = "default_view_radius")]
    pub view_radius: f32,
    #[serde(default = "default_target_mask")]
    pub target_mask: u32,
    /// Seconds an object stays remembered after leaving the line of sight
    #[serde(default = "default_memory_seconds")]
    pub visual_memory_seconds: f64,
    /// Seconds between perception ticks
    #[serde(default = "default_perception_delay")]
    pub tick_delay_seconds: f64,
}

fn default_fov_degrees() -> f32 {
    180.0
}

fn default_resolution_width() -> u32 {
    640
}

fn default_resolution_height() -> u32 {
    360
}

fn default_view_radius() -> f32 {
    10.0
}

fn default_target_mask() -> u32 {
    u32::MAX
}

fn default_memory_seconds() -> f64 {
    20.0
}

fn default_perception_delay() -> f64 {
    0.5
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            horizontal_fov_degrees: default_fov_degrees(),
            vertical_fov_degrees: default_fov_degrees(),
            resolution_width: default_resolution_width(),
            resolution_height: default_resolution_height(),
            view_radius: default_view_radius(),
            target_mask: default_target_mask(),
            visual_memory_seconds: default_memory_seconds(),
            tick_delay_seconds: default_perception_delay(),
        }
    }
}

/// Speech memory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Seconds an overheard utterance stays in the context digest
    #[serde(default = "default_memory_seconds")]
    pub memory_seconds: f64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            memory_seconds: default_memory_seconds(),
        }
    }
}

/// Dialogue backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_type")]
    pub provider_type: String,
    #[serde(default = "default_person_id")]
    pub person_id: String,
    #[serde(default = "default_target_tickrate")]
    pub target_tickrate: u32,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_provider_type() -> String {
    "InstructLLM".to_string()
}

fn default_person_id() -> String {
    "1".to_string()
}

fn default_target_tickrate() -> u32 {
    20
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            provider_type: default_provider_type(),
            person_id: default_person_id(),
            target_tickrate: default_target_tickrate(),
        }
    }
}

/// Session scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds between context push/pull iterations
    #[serde(default = "default_update_delay")]
    pub update_delay_seconds: f64,
    /// Seconds before the create-session attempt
    #[serde(default = "default_start_delay")]
    pub start_delay_seconds: f64,
    /// Attempts per request (1 = observed fire-once behavior)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff seconds between attempts
    #[serde(default)]
    pub backoff_seconds: f64,
}

fn default_update_delay() -> f64 {
    5.0
}

fn default_start_delay() -> f64 {
    1.0
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            update_delay_seconds: default_update_delay(),
            start_delay_seconds: default_start_delay(),
            max_attempts: default_max_attempts(),
            backoff_seconds: 0.0,
        }
    }
}

/// Diagnostic overlay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Seconds between overlay refreshes
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: f64,
}

fn default_refresh_seconds() -> f64 {
    0.5
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_seconds: default_refresh_seconds(),
        }
    }
}

/// Agent identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Persona/scenario text; empty uses the built-in template
    #[serde(default)]
    pub episodic: String,
}

fn default_agent_name() -> String {
    "Bot".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            episodic: String::new(),
        }
    }
}

impl PerceptConfig {
    /// Assemble per-agent settings for the named agent
    pub fn agent_settings(&self, name: &str, pose: Pose) -> AgentSettings {
        AgentSettings {
            name: name.to_string(),
            episodic: self.agent.episodic.clone(),
            pose,
            perception_delay: Duration::from_secs_f64(self.perception.tick_delay_seconds),
            field: FieldSettings {
                horizontal_fov_deg: self.perception.horizontal_fov_degrees,
                vertical_fov_deg: self.perception.vertical_fov_degrees,
                resolution_width: self.perception.resolution_width,
                resolution_height: self.perception.resolution_height,
                view_radius: self.perception.view_radius,
                target_mask: self.perception.target_mask,
                memory_window: Duration::from_secs_f64(self.perception.visual_memory_seconds),
            },
            speech_window: Duration::from_secs_f64(self.speech.memory_seconds),
            session: SessionSettings {
                base_url: self.backend.base_url.clone(),
                provider_type: self.backend.provider_type.clone(),
                person_id: self.backend.person_id.clone(),
                target_tickrate: self.backend.target_tickrate,
                start_delay: Duration::from_secs_f64(self.session.start_delay_seconds),
                update_delay: Duration::from_secs_f64(self.session.update_delay_seconds),
            },
            retry: RetryPolicy {
                max_attempts: self.session.max_attempts.max(1),
                backoff: Duration::from_secs_f64(self.session.backoff_seconds),
            },
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<PerceptConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path))?;
    let config: PerceptConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse '{}'", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PerceptConfig::default();
        assert_eq!(config.perception.horizontal_fov_degrees, 180.0);
        assert_eq!(config.perception.resolution_width, 640);
        assert_eq!(config.perception.visual_memory_seconds, 20.0);
        assert_eq!(config.speech.memory_seconds, 20.0);
        assert_eq!(config.backend.provider_type, "InstructLLM");
        assert_eq!(config.backend.target_tickrate, 20);
        assert_eq!(config.session.update_delay_seconds, 5.0);
        assert_eq!(config.session.max_attempts, 1);
        assert_eq!(config.agent.name, "Bot");
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [perception]
            horizontal_fov_degrees = 90.0
            vertical_fov_degrees = 60.0
            resolution_width = 32
            resolution_height = 18
            view_radius = 25.0
            target_mask = 7
            visual_memory_seconds = 10.0
            tick_delay_seconds = 0.25

            [speech]
            memory_seconds = 15.0

            [backend]
            base_url = "http://dialogue.local:9000"
            provider_type = "TestLLM"
            person_id = "42"
            target_tickrate = 10

            [session]
            update_delay_seconds = 2.5
            start_delay_seconds = 0.5
            max_attempts = 3
            backoff_seconds = 0.1

            [display]
            refresh_seconds = 1.0

            [agent]
            name = "Rex"
            episodic = "You are Rex."
        "#;

        let config: PerceptConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.perception.horizontal_fov_degrees, 90.0);
        assert_eq!(config.perception.target_mask, 7);
        assert_eq!(config.backend.base_url, "http://dialogue.local:9000");
        assert_eq!(config.session.max_attempts, 3);
        assert_eq!(config.display.refresh_seconds, 1.0);
        assert_eq!(config.agent.name, "Rex");
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [backend]
            base_url = "http://localhost:1234"
        "#;

        let config: PerceptConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:1234");
        assert_eq!(config.backend.provider_type, "InstructLLM"); // Default
        assert_eq!(config.perception.resolution_width, 640); // Default
        assert_eq!(config.session.update_delay_seconds, 5.0); // Default
    }

    #[test]
    fn test_agent_settings_assembly() {
        let config = PerceptConfig::default();
        let settings = config.agent_settings("Rex", Pose::default());

        assert_eq!(settings.name, "Rex");
        assert_eq!(settings.field.memory_window, Duration::from_secs(20));
        assert_eq!(settings.session.update_delay, Duration::from_secs(5));
        assert_eq!(settings.retry.max_attempts, 1);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\nname = \"Fido\"").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.agent.name, "Fido");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/percept.toml").is_err());
    }
}
