//! Decision report printed by `upstream-revision resolve`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use upstream_revision::{Decision, Resolution, RunId, StopReason};

#[derive(Debug, Clone, Serialize)]
pub struct DecisionReport {
    pub evaluated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_label: Option<String>,
    pub run: RunId,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    /// Lines written to the build console
    pub console: Vec<String>,
    /// Revision parameters added to the run
    pub parameters: Vec<String>,
}

impl DecisionReport {
    pub fn new(
        run: RunId,
        context_label: Option<String>,
        resolution: Resolution,
        console: Vec<String>,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            evaluated_at: Utc::now(),
            context_label,
            run,
            decision: resolution.decision,
            stop_reason: resolution.stop,
            console,
            parameters,
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match (&self.decision, &self.stop_reason) {
            (Decision::Adopt(record), _) => format!(
                "{}: adopt upstream revision {} ({})",
                self.run,
                record.pointer().unwrap_or("-"),
                record.head
            ),
            (Decision::NoOverride, Some(reason)) => {
                format!("{}: no override, {}", self.run, reason)
            }
            (Decision::NoOverride, None) => format!("{}: no override", self.run),
        }
    }
}
