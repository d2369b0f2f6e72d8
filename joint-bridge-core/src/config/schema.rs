//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for joint-bridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Middleware topic names
    #[serde(default)]
    pub topics: TopicsConfig,
    /// Which joint the bridge forwards
    #[serde(default)]
    pub joint: JointConfig,
    /// External peer formatting
    #[serde(default)]
    pub peer: PeerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Middleware topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Topic the bridge subscribes to (middleware -> peer)
    #[serde(default = "default_inbound_topic")]
    pub inbound: String,
    /// Topic the bridge publishes on (peer -> middleware)
    #[serde(default = "default_outbound_topic")]
    pub outbound: String,
}

fn default_inbound_topic() -> String {
    "set_joints".to_string()
}

fn default_outbound_topic() -> String {
    "get_joints".to_string()
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            inbound: default_inbound_topic(),
            outbound: default_outbound_topic(),
        }
    }
}

/// Joint selection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JointConfig {
    /// Index into the inbound message's `position` array
    #[serde(default)]
    pub index: usize,
    /// Name attached to published messages
    #[serde(default)]
    pub name: Option<String>,
}

/// External peer formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Prompt shown before each read
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Whether the prompt is shown at all
    #[serde(default = "default_true")]
    pub echo_prompt: bool,
    /// Text written in front of every value sent to the peer
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

fn default_prompt() -> String {
    "Input from other: ".to_string()
}

fn default_output_prefix() -> String {
    "Output to other: ".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            echo_prompt: true,
            output_prefix: default_output_prefix(),
        }
    }
}
