//! Traversal Configuration
//!
//! Settings that shape how a relationship graph reports on itself. They
//! never change the order vertices are applied in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`RelationshipGraph`](crate::graph::RelationshipGraph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Closed paths listed per cycle in a cycle report.
    #[serde(default = "default_report_paths")]
    pub report_paths: usize,

    /// Closed paths per cycle written to `cycles.dot`.
    #[serde(default = "default_dot_paths")]
    pub dot_paths: usize,

    /// Directory for Graphviz output. Nothing is written when unset.
    #[serde(default)]
    pub graph_dir: Option<PathBuf>,
}

fn default_report_paths() -> usize {
    1
}

fn default_dot_paths() -> usize {
    10
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            report_paths: default_report_paths(),
            dot_paths: default_dot_paths(),
            graph_dir: None,
        }
    }
}

impl TraversalConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = TraversalConfig::from_json("{}").unwrap();
        assert_eq!(config, TraversalConfig::default());
        assert_eq!(config.report_paths, 1);
        assert_eq!(config.dot_paths, 10);
        assert!(config.graph_dir.is_none());
    }

    #[test]
    fn parse_overrides_fields() {
        let json = r#"{
            "report_paths": 3,
            "graph_dir": "/var/lib/converge/graphs"
        }"#;

        let config = TraversalConfig::from_json(json).unwrap();
        assert_eq!(config.report_paths, 3);
        assert_eq!(config.dot_paths, 10);
        assert_eq!(config.graph_dir, Some(PathBuf::from("/var/lib/converge/graphs")));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = TraversalConfig::from_json(r#"{"report_paths": "many"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
