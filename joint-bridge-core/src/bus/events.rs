//! Structured message carried over the middleware

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Joint state message exchanged with the middleware
///
/// The bridge only looks at one entry of `position`; the other fields are
/// carried so that messages round-trip through real middleware unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    /// Joint names (parallel to `position`)
    #[serde(default)]
    pub name: Vec<String>,
    /// Joint positions
    #[serde(default)]
    pub position: Vec<f64>,
    /// Joint velocities
    #[serde(default)]
    pub velocity: Vec<f64>,
    /// Joint efforts
    #[serde(default)]
    pub effort: Vec<f64>,
    /// Message timestamp
    pub stamp: DateTime<Utc>,
}

impl JointState {
    /// Create an empty message stamped now
    pub fn new() -> Self {
        Self {
            name: Vec::new(),
            position: Vec::new(),
            velocity: Vec::new(),
            effort: Vec::new(),
            stamp: Utc::now(),
        }
    }

    /// Create a message carrying a single position
    pub fn from_position(value: f64) -> Self {
        Self::new().with_position(value)
    }

    /// Append a joint position
    pub fn with_position(mut self, value: f64) -> Self {
        self.position.push(value);
        self
    }

    /// Append a joint name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name.push(name.into());
        self
    }

    /// Position of the joint at `index`, if present
    pub fn position_at(&self, index: usize) -> Option<f64> {
        self.position.get(index).copied()
    }
}

impl Default for JointState {
    fn default() -> Self {
        Self::new()
    }
}
