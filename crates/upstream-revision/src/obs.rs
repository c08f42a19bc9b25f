//! Structured diagnostics for revision resolution.
//!
//! This module provides:
//! - A run-scoped tracing span via the `ResolveSpan` RAII guard
//! - Emission functions for resolution outcomes
//!
//! These go to `tracing` only. The build console is written by the resolver
//! through its `BuildListener`.

use tracing::{debug, info};

use crate::error::ResolutionError;
use crate::model::{JobId, RevisionRecord, RunId};
use crate::resolver::StopReason;

/// RAII guard that enters a run-scoped span for the duration of a
/// resolution.
///
/// ```ignore
/// let _span = ResolveSpan::enter(&run_id);
/// // every event below is tagged with run = <run_id>
/// ```
pub struct ResolveSpan {
    _span: tracing::span::EnteredSpan,
}

impl ResolveSpan {
    pub fn enter(run: &RunId) -> Self {
        let span = tracing::debug_span!("upstream_revision.resolve", run = %run);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: the upstream revision was adopted.
pub fn emit_revision_adopted(run: &RunId, record: &RevisionRecord) {
    info!(
        event = "revision.adopted",
        run = %run,
        head = %record.head,
        source_id = %record.source_id,
        pointer = record.pointer().unwrap_or_default(),
    );
}

/// Emit event: no override, with the condition that stopped the chain.
pub fn emit_revision_skipped(run: &RunId, reason: &StopReason) {
    debug!(event = "revision.skipped", run = %run, reason = %reason);
}

/// Emit event: a source lookup found no source with the requested id.
pub fn emit_source_unresolved(job: &JobId, error: &ResolutionError) {
    debug!(event = "source.unresolved", job = %job, error = %error);
}
