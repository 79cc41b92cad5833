//! Runtime configuration

use serde::{Deserialize, Serialize};

/// Configuration shared by a document and the references resolved against it.
///
/// `dev_checks` turns on the structural guards that are expected never to
/// fire in correct usage: detached-store emptiness around `remove` and
/// `insert_before_to`, and serializability of captured values. Release
/// builds leave them off by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeConfig {
    /// Enable development-time invariant checks
    pub dev_checks: bool,

    /// Log a warning when an attached virtual node is attached again
    pub warn_on_reattach: bool,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            dev_checks: cfg!(debug_assertions),
            warn_on_reattach: true,
        }
    }
}

impl ResumeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with development checks forced on.
    pub fn development() -> Self {
        Self {
            dev_checks: true,
            ..Default::default()
        }
    }

    /// Create a configuration with development checks forced off.
    pub fn production() -> Self {
        Self {
            dev_checks: false,
            ..Default::default()
        }
    }
}
