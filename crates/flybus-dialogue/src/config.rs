use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Destination;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub session: SessionConfig,
    pub flight: FlightConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a session is treated as absent.
    pub ttl_minutes: u32,
    pub max_history: usize,
    /// Optimistic-commit attempts before a turn gives up.
    pub commit_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub europe_buffer_minutes: u32,
    pub us_canada_buffer_minutes: u32,
    /// Minimum gap between bus arrival and the check-in deadline.
    pub arrival_slack_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Confidence reported for a topic-continuation replay.
    pub continuation_confidence: f32,
    pub max_suggestions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            max_history: 40,
            commit_retries: 3,
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            europe_buffer_minutes: 150,
            us_canada_buffer_minutes: 180,
            arrival_slack_minutes: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            continuation_confidence: 0.6,
            max_suggestions: 8,
        }
    }
}

impl FlightConfig {
    pub fn buffer_minutes(&self, destination: Destination) -> u32 {
        match destination {
            Destination::Europe => self.europe_buffer_minutes,
            Destination::UsCanada => self.us_canada_buffer_minutes,
        }
    }
}

impl DialogueConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.session.ttl_minutes == 0 {
            return Err("session.ttl_minutes must be > 0".into());
        }
        if self.session.max_history == 0 {
            return Err("session.max_history must be > 0".into());
        }
        if self.session.commit_retries == 0 {
            return Err("session.commit_retries must be > 0".into());
        }
        for (name, value) in [
            ("flight.europe_buffer_minutes", self.flight.europe_buffer_minutes),
            ("flight.us_canada_buffer_minutes", self.flight.us_canada_buffer_minutes),
            ("flight.arrival_slack_minutes", self.flight.arrival_slack_minutes),
        ] {
            if value > 720 {
                return Err(format!("{} must be in [0, 720]", name));
            }
        }
        if !(0.0..=1.0).contains(&self.retrieval.continuation_confidence) {
            return Err("retrieval.continuation_confidence must be in [0.0, 1.0]".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/flybus-dialogue/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flybus-dialogue")
            .join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DialogueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.ttl_minutes, 30);
        assert_eq!(config.flight.buffer_minutes(Destination::Europe), 150);
        assert_eq!(config.flight.buffer_minutes(Destination::UsCanada), 180);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: DialogueConfig =
            serde_json::from_str(r#"{"session":{"ttl_minutes":10}}"#).unwrap();
        assert_eq!(config.session.ttl_minutes, 10);
        assert_eq!(config.session.max_history, 40);
        assert_eq!(config.flight.arrival_slack_minutes, 30);
    }

    #[test]
    fn test_validate_rejects_broken_values() {
        let mut config = DialogueConfig::default();
        config.session.ttl_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = DialogueConfig::default();
        config.retrieval.continuation_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = DialogueConfig::default();
        config.flight.europe_buffer_minutes = 900;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("flybus-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"retrieval":{"max_suggestions":3}}"#).unwrap();
        let config = DialogueConfig::from_file(&path).unwrap();
        assert_eq!(config.retrieval.max_suggestions, 3);
        std::fs::remove_file(&path).ok();

        assert!(DialogueConfig::from_file(Path::new("/nonexistent/flybus.json")).is_err());
    }

    #[test]
    fn test_default_path() {
        assert!(DialogueConfig::default_path().ends_with("flybus-dialogue/config.json"));
    }
}
