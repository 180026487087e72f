//! Capability catalog types.
//!
//! The catalog is supplied by the tool executor when an episode starts and
//! is presented unchanged on every turn.

use serde::{Deserialize, Serialize};

/// Name of the resource-creation capability.
///
/// Its history rendering differs from every other capability; see the
/// ledger's render module.
pub const WRITE_CAPABILITY: &str = "post_fhir_resource";

/// One entry of the capability menu shown to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Stable name the agent uses as `tool_name`.
    pub name: String,
    /// Human-readable description of what the capability does.
    pub description: String,
}

impl CapabilitySpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}
