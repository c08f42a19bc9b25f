//! Upstream revision resolution.
//!
//! A downstream build reuses the revision of the build that triggered it
//! only if all of these hold:
//! - the current job is a branch of a branch-organized project with a
//!   GitHub-compatible source
//! - the current run was triggered by an upstream cause
//! - the upstream run is a pipeline run with a recorded revision
//! - the upstream source is GitHub-compatible with the same remote
//!   (case-insensitive)
//! - the branch head names match exactly (`PR-42` / `PR-42`)
//! - the recorded revision carries a commit pointer
//!
//! Any failed condition yields [`Decision::NoOverride`]. Only host errors
//! propagate.

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::error::{HostError, HostResult, ResolutionError};
use crate::host::{BuildListener, JobDirectory, ParameterSink, RunHistory};
use crate::model::{
    BuildContext, Decision, EngineKind, HeadName, JobId, RevisionKind, RevisionRecord, RunId,
    SourceDescriptor, SourceKind, UpstreamCause,
};
use crate::obs;

/// Console line printed when a pull request revision is adopted.
pub const PR_REVISION_LINE: &str = "Using upstream PR-revision";

/// Console line printed when a branch commit revision is adopted.
pub const GIT_REVISION_LINE: &str = "Using upstream git revision";

/// Why a resolution ended in [`Decision::NoOverride`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stop", rename_all = "snake_case")]
pub enum StopReason {
    NotABranchJob { job: JobId },
    CurrentSourceUnresolved { error: ResolutionError },
    CurrentSourceNotGitHub { kind: SourceKind },
    NoUpstreamCause,
    UpstreamRunMissing { cause: UpstreamCause },
    UpstreamNotPipeline { engine: EngineKind },
    NoRecordedRevision { upstream: RunId },
    UpstreamSourceUnresolved { error: ResolutionError },
    UpstreamSourceNotGitHub { kind: SourceKind },
    RemoteMismatch { current: String, upstream: String },
    HeadMismatch { current: HeadName, upstream: HeadName },
    NoRevisionPointer { description: String },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::NotABranchJob { job } => write!(f, "{job} has no branch metadata"),
            StopReason::CurrentSourceUnresolved { error } => {
                write!(f, "current source unresolved: {error}")
            }
            StopReason::CurrentSourceNotGitHub { kind } => {
                write!(f, "current source is not GitHub-compatible: {kind:?}")
            }
            StopReason::NoUpstreamCause => write!(f, "not triggered by an upstream build"),
            StopReason::UpstreamRunMissing { cause } => write!(
                f,
                "upstream run {}#{} no longer exists",
                cause.project, cause.build_number
            ),
            StopReason::UpstreamNotPipeline { engine } => {
                write!(f, "upstream run is not a pipeline run: {engine:?}")
            }
            StopReason::NoRecordedRevision { upstream } => {
                write!(f, "upstream run {upstream} has no recorded revision")
            }
            StopReason::UpstreamSourceUnresolved { error } => {
                write!(f, "upstream source unresolved: {error}")
            }
            StopReason::UpstreamSourceNotGitHub { kind } => {
                write!(f, "upstream source is not GitHub-compatible: {kind:?}")
            }
            StopReason::RemoteMismatch { current, upstream } => {
                write!(f, "remote mismatch: {current} vs {upstream}")
            }
            StopReason::HeadMismatch { current, upstream } => {
                write!(f, "head mismatch: {current} vs {upstream}")
            }
            StopReason::NoRevisionPointer { description } => {
                write!(f, "upstream revision has no commit pointer: {description}")
            }
        }
    }
}

/// Failure of a source descriptor lookup.
#[derive(Debug)]
pub enum ResolveFailure {
    /// Soft: the job has no resolvable source
    Unresolved(ResolutionError),
    /// Fatal: the host query itself failed
    Host(HostError),
}

impl From<HostError> for ResolveFailure {
    fn from(err: HostError) -> Self {
        ResolveFailure::Host(err)
    }
}

/// Decision plus the reason when no override applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub decision: Decision,
    pub stop: Option<StopReason>,
}

enum Halt {
    Skip(StopReason),
    Fatal(HostError),
}

impl From<HostError> for Halt {
    fn from(err: HostError) -> Self {
        Halt::Fatal(err)
    }
}

impl Halt {
    fn from_lookup(failure: ResolveFailure, stop: fn(ResolutionError) -> StopReason) -> Self {
        match failure {
            ResolveFailure::Unresolved(error) => Halt::Skip(stop(error)),
            ResolveFailure::Host(err) => Halt::Fatal(err),
        }
    }
}

/// Decides whether a downstream build adopts its upstream build's revision.
#[derive(Debug)]
pub struct UpstreamRevisionResolver<J, R, P> {
    config: ResolverConfig,
    jobs: J,
    runs: R,
    params: P,
}

impl<J, R, P> UpstreamRevisionResolver<J, R, P>
where
    J: JobDirectory,
    R: RunHistory,
    P: ParameterSink,
{
    pub fn new(config: ResolverConfig, jobs: J, runs: R, params: P) -> Self {
        Self {
            config,
            jobs,
            runs,
            params,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the revision for `current`.
    ///
    /// On adoption, prints exactly one console line and adds exactly one
    /// revision parameter to the current run. Every other path is silent
    /// on the console and has no side effect.
    pub fn resolve(
        &self,
        current: &BuildContext,
        listener: &dyn BuildListener,
    ) -> HostResult<Decision> {
        self.resolve_with_reason(current, listener)
            .map(|resolution| resolution.decision)
    }

    /// Like [`resolve`](Self::resolve), also reporting which condition
    /// stopped the chain.
    pub fn resolve_with_reason(
        &self,
        current: &BuildContext,
        listener: &dyn BuildListener,
    ) -> HostResult<Resolution> {
        let _span = obs::ResolveSpan::enter(&current.run);

        match self.evaluate(current, listener) {
            Ok(record) => {
                obs::emit_revision_adopted(&current.run, &record);
                Ok(Resolution {
                    decision: Decision::Adopt(record),
                    stop: None,
                })
            }
            Err(Halt::Skip(reason)) => {
                obs::emit_revision_skipped(&current.run, &reason);
                Ok(Resolution {
                    decision: Decision::NoOverride,
                    stop: Some(reason),
                })
            }
            Err(Halt::Fatal(err)) => Err(err),
        }
    }

    fn evaluate(
        &self,
        current: &BuildContext,
        listener: &dyn BuildListener,
    ) -> Result<RevisionRecord, Halt> {
        let branch = self
            .jobs
            .branch_metadata(&current.job)?
            .ok_or_else(|| {
                Halt::Skip(StopReason::NotABranchJob {
                    job: current.job.clone(),
                })
            })?;

        let current_source = self
            .scm_source(&current.job, &branch.source_id)
            .map_err(|f| {
                Halt::from_lookup(f, |error| StopReason::CurrentSourceUnresolved { error })
            })?;
        if !current_source.is_github() {
            return Err(Halt::Skip(StopReason::CurrentSourceNotGitHub {
                kind: current_source.kind,
            }));
        }

        // must be triggered as a downstream build
        let cause = self
            .runs
            .triggering_cause(&current.run)?
            .ok_or(Halt::Skip(StopReason::NoUpstreamCause))?;

        let upstream = self
            .runs
            .upstream_run(&cause)?
            .ok_or_else(|| Halt::Skip(StopReason::UpstreamRunMissing { cause }))?;
        if !upstream.is_pipeline() {
            return Err(Halt::Skip(StopReason::UpstreamNotPipeline {
                engine: upstream.engine,
            }));
        }

        let record = self
            .runs
            .recorded_revision(&upstream.run)?
            .ok_or_else(|| {
                Halt::Skip(StopReason::NoRecordedRevision {
                    upstream: upstream.run.clone(),
                })
            })?;

        let upstream_source = self
            .scm_source(&upstream.job, &record.source_id)
            .map_err(|f| {
                Halt::from_lookup(f, |error| StopReason::UpstreamSourceUnresolved { error })
            })?;
        if !upstream_source.is_github() {
            return Err(Halt::Skip(StopReason::UpstreamSourceNotGitHub {
                kind: upstream_source.kind,
            }));
        }
        if !current_source.same_remote(&upstream_source) {
            return Err(Halt::Skip(StopReason::RemoteMismatch {
                current: current_source.remote,
                upstream: upstream_source.remote,
            }));
        }

        if branch.head != record.head {
            return Err(Halt::Skip(StopReason::HeadMismatch {
                current: branch.head,
                upstream: record.head,
            }));
        }

        let (line, pointer) = match &record.kind {
            RevisionKind::PullRequest { pull_hash } => (PR_REVISION_LINE, pull_hash),
            RevisionKind::BranchCommit { hash } => (GIT_REVISION_LINE, hash),
            RevisionKind::Other { description } => {
                return Err(Halt::Skip(StopReason::NoRevisionPointer {
                    description: description.clone(),
                }))
            }
        };
        self.params.add_revision_parameter(&current.run, pointer)?;
        listener.println(line);

        Ok(record)
    }

    /// Source descriptor of `job`, looked up in its parent group.
    pub fn scm_source(
        &self,
        job: &JobId,
        source_id: &str,
    ) -> Result<SourceDescriptor, ResolveFailure> {
        let group = self.jobs.parent_group(job)?;
        let error = if !group.is_multi_branch() {
            ResolutionError::InappropriateContext { job: job.clone() }
        } else if let Some(source) = self.jobs.find_source(&group, source_id)? {
            return Ok(source);
        } else {
            ResolutionError::SourceNotFound {
                source_id: source_id.to_string(),
            }
        };
        obs::emit_source_unresolved(job, &error);
        Err(ResolveFailure::Unresolved(error))
    }
}
