// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Static element metadata and the configuration property table.

use crate::config::{DEFAULT_NODE_NAME, DEFAULT_TOPIC};

/// Registry-facing description of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMetadata {
    pub long_name: &'static str,
    pub classification: &'static str,
    pub description: &'static str,
    pub author: &'static str,
}

pub const BRIDGE_SINK_METADATA: ElementMetadata = ElementMetadata {
    long_name: "busbridgesink",
    classification: "Sink",
    description: "Republishes pipeline buffers as stamped bus messages",
    author: "Jonathan Fontanez <fontanezj1@gmail.com>",
};

pub const BRIDGE_SOURCE_METADATA: ElementMetadata = ElementMetadata {
    long_name: "busbridgesrc",
    classification: "Source",
    description: "Produces pipeline buffers from stamped bus messages",
    author: "Jonathan Fontanez <fontanezj1@gmail.com>",
};

/// One string-settable configuration property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub nick: &'static str,
    pub blurb: &'static str,
    pub default: &'static str,
}

pub const PROP_NODE_NAME: &str = "node-name";
pub const PROP_NODE_NAMESPACE: &str = "node-namespace";
pub const PROP_TOPIC: &str = "topic";
pub const PROP_FRAME_ID: &str = "frame-id";

/// Properties accepted by `BridgeElement::set_property`.
pub const PROPERTIES: [PropertySpec; 4] = [
    PropertySpec {
        name: PROP_NODE_NAME,
        nick: "node-name",
        blurb: "Name of the bus node",
        default: DEFAULT_NODE_NAME,
    },
    PropertySpec {
        name: PROP_NODE_NAMESPACE,
        nick: "node-namespace",
        blurb: "Namespace for the bus node",
        default: "",
    },
    PropertySpec {
        name: PROP_TOPIC,
        nick: "topic",
        blurb: "Topic to publish on or subscribe to",
        default: DEFAULT_TOPIC,
    },
    PropertySpec {
        name: PROP_FRAME_ID,
        nick: "frame-id",
        blurb: "Frame id stamped into message headers",
        default: "",
    },
];

pub fn find_property(name: &str) -> Option<&'static PropertySpec> {
    PROPERTIES.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    #[test]
    fn test_property_defaults_match_config() {
        let config = BridgeConfig::default();
        assert_eq!(find_property(PROP_NODE_NAME).unwrap().default, config.node_name);
        assert_eq!(find_property(PROP_NODE_NAMESPACE).unwrap().default, config.node_namespace);
        assert_eq!(find_property(PROP_TOPIC).unwrap().default, config.topic);
        assert_eq!(find_property(PROP_FRAME_ID).unwrap().default, config.frame_id);
        assert!(find_property("ros-name").is_none());
    }
}
