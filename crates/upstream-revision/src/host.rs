//! Host collaborator interfaces
//!
//! The resolver never walks host objects itself. Everything it reads goes
//! through these narrow, read-only accessors:
//! - `JobDirectory`: branch metadata, parent groups and configured sources
//! - `RunHistory`: triggering causes, upstream runs and recorded revisions
//! - `ParameterSink`: the single write, forcing a downstream checkout pointer
//! - `BuildListener`: the build console
//!
//! All traits are synchronous; the host is expected to have the data in
//! memory when a build starts. In-memory fakes are provided via the `fakes`
//! module.

use crate::error::HostResult;
use crate::model::{
    Branch, BuildContext, Group, JobId, RevisionRecord, RunId, SourceDescriptor, UpstreamCause,
};

/// Job metadata store.
pub trait JobDirectory {
    /// Branch metadata of a job. `None` when the job is not a branch of a
    /// branch-organized project.
    fn branch_metadata(&self, job: &JobId) -> HostResult<Option<Branch>>;

    /// The group containing the job.
    fn parent_group(&self, job: &JobId) -> HostResult<Group>;

    /// Look up a configured source of a group by its identifier.
    fn find_source(&self, group: &Group, source_id: &str)
        -> HostResult<Option<SourceDescriptor>>;
}

/// Run history of the host.
pub trait RunHistory {
    /// The upstream cause that triggered a run, if it was triggered by one.
    fn triggering_cause(&self, run: &RunId) -> HostResult<Option<UpstreamCause>>;

    /// The run an upstream cause points at. `None` if that run no longer
    /// exists.
    fn upstream_run(&self, cause: &UpstreamCause) -> HostResult<Option<BuildContext>>;

    /// The revision recorded on a run when its checkout was resolved.
    fn recorded_revision(&self, run: &RunId) -> HostResult<Option<RevisionRecord>>;
}

/// Build parameterization sink.
pub trait ParameterSink {
    /// Force the checkout of `run` to `pointer` (a commit hash).
    fn add_revision_parameter(&self, run: &RunId, pointer: &str) -> HostResult<()>;
}

/// Build console of the current run.
pub trait BuildListener {
    fn println(&self, line: &str);
}

impl<T: JobDirectory + ?Sized> JobDirectory for &T {
    fn branch_metadata(&self, job: &JobId) -> HostResult<Option<Branch>> {
        (**self).branch_metadata(job)
    }

    fn parent_group(&self, job: &JobId) -> HostResult<Group> {
        (**self).parent_group(job)
    }

    fn find_source(
        &self,
        group: &Group,
        source_id: &str,
    ) -> HostResult<Option<SourceDescriptor>> {
        (**self).find_source(group, source_id)
    }
}

impl<T: RunHistory + ?Sized> RunHistory for &T {
    fn triggering_cause(&self, run: &RunId) -> HostResult<Option<UpstreamCause>> {
        (**self).triggering_cause(run)
    }

    fn upstream_run(&self, cause: &UpstreamCause) -> HostResult<Option<BuildContext>> {
        (**self).upstream_run(cause)
    }

    fn recorded_revision(&self, run: &RunId) -> HostResult<Option<RevisionRecord>> {
        (**self).recorded_revision(run)
    }
}

impl<T: ParameterSink + ?Sized> ParameterSink for &T {
    fn add_revision_parameter(&self, run: &RunId, pointer: &str) -> HostResult<()> {
        (**self).add_revision_parameter(run, pointer)
    }
}

/// Listener that drops every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl BuildListener for NullListener {
    fn println(&self, _line: &str) {}
}

/// Listener that forwards console lines to `tracing` at info level.
#[derive(Debug, Clone)]
pub struct TracingListener {
    run: RunId,
}

impl TracingListener {
    pub fn new(run: RunId) -> Self {
        Self { run }
    }
}

impl BuildListener for TracingListener {
    fn println(&self, line: &str) {
        tracing::info!(event = "build.console", run = %self.run, "{}", line);
    }
}
