// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Bridge element configuration.
//!
//! Plain data, settable before activation and read-only while an endpoint
//! exists (enforced by the element, not here).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

pub const DEFAULT_NODE_NAME: &str = "gst_bus_bridge_node";
pub const DEFAULT_TOPIC: &str = "bridge";

/// How the bus node gets a chance to run its background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeService {
    /// A dedicated thread spins the node between Ready and Null.
    #[default]
    Thread,
    /// The embedding application calls `BridgeElement::service_node()`.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub node_name: String,
    /// Empty for the root namespace, otherwise `/segment[/segment...]`.
    pub node_namespace: String,
    pub topic: String,
    pub frame_id: String,
    pub node_service: NodeService,
    pub service_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            node_name: DEFAULT_NODE_NAME.to_string(),
            node_namespace: String::new(),
            topic: DEFAULT_TOPIC.to_string(),
            frame_id: String::new(),
            node_service: NodeService::Thread,
            service_interval_ms: 10,
        }
    }
}

impl BridgeConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::error!("Failed to read {}: {}", path.display(), e);
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            BridgeError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded bridge config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| BridgeError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_node_name(&self.node_name)?;
        validate_namespace(&self.node_namespace)?;
        validate_topic(&self.topic)?;
        if self.service_interval_ms == 0 {
            return Err(BridgeError::Configuration(
                "service_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the config survives a JSON round trip without losing fields.
    pub fn validate_round_trip(&self) -> Result<()> {
        let json = serde_json::to_value(self)
            .map_err(|e| BridgeError::Configuration(format!("serialization failed: {}", e)))?;
        let round_tripped: Self = serde_json::from_value(json)
            .map_err(|e| BridgeError::Configuration(format!("deserialization failed: {}", e)))?;
        if self != &round_tripped {
            return Err(BridgeError::Configuration(
                "config round-trip mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn validate_node_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(BridgeError::Configuration(format!(
            "invalid node name {:?}: must match [A-Za-z_][A-Za-z0-9_]*",
            name
        )))
    }
}

pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Ok(());
    }
    let valid = namespace
        .strip_prefix('/')
        .is_some_and(|rest| rest.split('/').all(is_identifier));
    if valid {
        Ok(())
    } else {
        Err(BridgeError::Configuration(format!(
            "invalid node namespace {:?}: must be empty or /segment[/segment...]",
            namespace
        )))
    }
}

pub fn validate_topic(topic: &str) -> Result<()> {
    let relative = topic.strip_prefix('/').unwrap_or(topic);
    if !relative.is_empty() && relative.split('/').all(is_identifier) {
        Ok(())
    } else {
        Err(BridgeError::Configuration(format!("invalid topic {:?}", topic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = BridgeConfig::default();
        config.validate().unwrap();
        config.validate_round_trip().unwrap();
        assert_eq!(config.node_name, DEFAULT_NODE_NAME);
        assert_eq!(config.node_namespace, "");
    }

    #[test]
    fn test_node_names() {
        assert!(validate_node_name("camera_node").is_ok());
        assert!(validate_node_name("_hidden").is_ok());
        assert!(validate_node_name("").is_err());
        assert!(validate_node_name("9lives").is_err());
        assert!(validate_node_name("has space").is_err());
        assert!(validate_node_name("a/b").is_err());
    }

    #[test]
    fn test_namespaces() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("/robot").is_ok());
        assert!(validate_namespace("/robot/front_camera").is_ok());
        assert!(validate_namespace("robot").is_err());
        assert!(validate_namespace("/").is_err());
        assert!(validate_namespace("/robot/").is_err());
        assert!(validate_namespace("//robot").is_err());
    }

    #[test]
    fn test_topics() {
        assert!(validate_topic("image_raw").is_ok());
        assert!(validate_topic("/audio/raw").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("/").is_err());
        assert!(validate_topic("bad topic").is_err());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            node_name = "gst_audio"
            node_namespace = "/robot"
            node_service = "manual"
            "#,
        )
        .unwrap();
        assert_eq!(config.node_name, "gst_audio");
        assert_eq!(config.node_namespace, "/robot");
        assert_eq!(config.node_service, NodeService::Manual);
        assert_eq!(config.topic, DEFAULT_TOPIC);
        assert_eq!(config.service_interval_ms, 10);
    }

    #[test]
    fn test_parse_rejects_invalid_identity() {
        let err = BridgeConfig::from_toml_str(r#"node_name = "1bad""#).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));

        let err = BridgeConfig::from_toml_str("service_interval_ms = 0").unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "topic = \"/camera/image_raw\"").unwrap();
        writeln!(file, "frame_id = \"camera_link\"").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.topic, "/camera/image_raw");
        assert_eq!(config.frame_id, "camera_link");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(
            matches!(&err, BridgeError::Io(io) if io.kind() == std::io::ErrorKind::NotFound),
            "{err}"
        );
    }

    #[test]
    fn test_load_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "topic = [").unwrap();
        let err = BridgeConfig::load(&path).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }
}
