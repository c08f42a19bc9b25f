//! Resolver configuration.

use serde::{Deserialize, Serialize};

/// Environment variable carrying the context label.
pub const CONTEXT_LABEL_ENV: &str = "UPSTREAM_REVISION_CONTEXT_LABEL";

/// Configuration of an [`UpstreamRevisionResolver`](crate::UpstreamRevisionResolver).
///
/// `context_label` identifies the configured trait in host tooling. The
/// decision never consults it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_label: Option<String>,
}

impl ResolverConfig {
    pub fn new(context_label: impl Into<String>) -> Self {
        Self {
            context_label: Some(context_label.into()),
        }
    }

    /// Load from `UPSTREAM_REVISION_CONTEXT_LABEL`. Unset or empty means no
    /// label.
    pub fn from_env() -> Self {
        let context_label = std::env::var(CONTEXT_LABEL_ENV)
            .ok()
            .filter(|label| !label.trim().is_empty());
        Self { context_label }
    }

    pub fn context_label(&self) -> Option<&str> {
        self.context_label.as_deref()
    }
}
