//! In-memory host (testing and offline tooling)
//!
//! Provides `HostSnapshot`, a serde-friendly picture of host state, and
//! `MemoryHost`, which serves `JobDirectory`, `RunHistory` and
//! `ParameterSink` from a snapshot while recording every call it receives.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult, SnapshotError};
use crate::host::{BuildListener, JobDirectory, ParameterSink, RunHistory};
use crate::model::*;

// ---------------------------------------------------------------------------
// HostSnapshot
// ---------------------------------------------------------------------------

/// A job and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: JobId,
    pub group: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
}

/// A run with whatever the host recorded on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEntry {
    #[serde(flatten)]
    pub build: BuildContext,
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<UpstreamCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<RevisionRecord>,
}

impl RunEntry {
    /// Mark this run as triggered by `upstream`.
    pub fn triggered_by(&mut self, upstream: &RunEntry) -> &mut Self {
        self.cause = Some(upstream.as_cause());
        self
    }

    pub fn with_revision(&mut self, revision: RevisionRecord) -> &mut Self {
        self.revision = Some(revision);
        self
    }

    /// The cause a downstream run of this one would carry.
    pub fn as_cause(&self) -> UpstreamCause {
        UpstreamCause {
            project: self.build.job.clone(),
            build_number: self.number,
        }
    }
}

/// Serializable picture of the host state the resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSnapshot {
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Configured sources per group
    #[serde(default)]
    pub sources: BTreeMap<GroupId, Vec<SourceDescriptor>>,
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
    #[serde(default)]
    pub runs: Vec<RunEntry>,
}

impl HostSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn add_multi_branch_project(
        &mut self,
        group: impl Into<String>,
        sources: Vec<SourceDescriptor>,
    ) -> &mut Self {
        let id = GroupId::new(group);
        self.groups.push(Group {
            id: id.clone(),
            kind: GroupKind::MultiBranch,
        });
        self.sources.insert(id, sources);
        self
    }

    pub fn add_job(
        &mut self,
        group: impl Into<String>,
        job: impl Into<String>,
        branch: Option<Branch>,
    ) -> &mut Self {
        self.jobs.push(JobEntry {
            id: JobId::new(job),
            group: GroupId::new(group),
            branch,
        });
        self
    }

    pub fn add_branch_job(
        &mut self,
        group: impl Into<String>,
        job: impl Into<String>,
        source_id: impl Into<String>,
        head: impl Into<String>,
    ) -> &mut Self {
        let branch = Branch {
            source_id: source_id.into(),
            head: HeadName::new(head),
        };
        self.add_job(group, job, Some(branch))
    }

    /// Add a run, numbered after the runs already present for its job.
    pub fn add_run(&mut self, build: BuildContext) -> &mut RunEntry {
        let number = self.runs.iter().filter(|r| r.build.job == build.job).count() as u64 + 1;
        self.runs.push(RunEntry {
            build,
            number,
            cause: None,
            revision: None,
        });
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    pub fn run(&self, run: &RunId) -> Result<&RunEntry, SnapshotError> {
        self.runs
            .iter()
            .find(|r| &r.build.run == run)
            .ok_or_else(|| SnapshotError::UnknownRun(run.to_string()))
    }

    fn job(&self, job: &JobId) -> HostResult<&JobEntry> {
        self.jobs
            .iter()
            .find(|j| &j.id == job)
            .ok_or_else(|| HostError::Query {
                what: format!("job {job}"),
                reason: "unknown job".to_string(),
            })
    }

    fn run_entry(&self, run: &RunId) -> HostResult<&RunEntry> {
        self.run(run).map_err(|err| HostError::Query {
            what: format!("run {run}"),
            reason: err.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// In-memory host backed by a `HostSnapshot`.
#[derive(Debug, Default)]
pub struct MemoryHost {
    snapshot: HostSnapshot,
    calls: Mutex<Vec<String>>,
    parameters: Mutex<Vec<(RunId, String)>>,
    failing: Option<String>,
}

impl MemoryHost {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Make every call to `method` fail with a host error.
    pub fn failing_on(mut self, method: impl Into<String>) -> Self {
        self.failing = Some(method.into());
        self
    }

    pub fn snapshot(&self) -> &HostSnapshot {
        &self.snapshot
    }

    /// Every collaborator call received, in order, as `method(argument)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every revision parameter added, in order.
    pub fn parameters(&self) -> Vec<(RunId, String)> {
        self.parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Revision parameters added to `run`.
    pub fn parameters_for(&self, run: &RunId) -> Vec<String> {
        self.parameters()
            .into_iter()
            .filter(|(r, _)| r == run)
            .map(|(_, pointer)| pointer)
            .collect()
    }

    fn record(&self, method: &str, argument: impl std::fmt::Display) -> HostResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{method}({argument})"));
        if self.failing.as_deref() == Some(method) {
            return Err(HostError::Query {
                what: method.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl JobDirectory for MemoryHost {
    fn branch_metadata(&self, job: &JobId) -> HostResult<Option<Branch>> {
        self.record("branch_metadata", job)?;
        Ok(self.snapshot.job(job)?.branch.clone())
    }

    fn parent_group(&self, job: &JobId) -> HostResult<Group> {
        self.record("parent_group", job)?;
        let entry = self.snapshot.job(job)?;
        self.snapshot
            .groups
            .iter()
            .find(|g| g.id == entry.group)
            .cloned()
            .ok_or_else(|| HostError::Query {
                what: format!("group {}", entry.group),
                reason: "unknown group".to_string(),
            })
    }

    fn find_source(
        &self,
        group: &Group,
        source_id: &str,
    ) -> HostResult<Option<SourceDescriptor>> {
        self.record("find_source", format_args!("{}, {source_id}", group.id))?;
        Ok(self
            .snapshot
            .sources
            .get(&group.id)
            .and_then(|sources| sources.iter().find(|s| s.id == source_id))
            .cloned())
    }
}

impl RunHistory for MemoryHost {
    fn triggering_cause(&self, run: &RunId) -> HostResult<Option<UpstreamCause>> {
        self.record("triggering_cause", run)?;
        Ok(self.snapshot.run_entry(run)?.cause.clone())
    }

    fn upstream_run(&self, cause: &UpstreamCause) -> HostResult<Option<BuildContext>> {
        self.record(
            "upstream_run",
            format_args!("{}#{}", cause.project, cause.build_number),
        )?;
        Ok(self
            .snapshot
            .runs
            .iter()
            .find(|r| r.build.job == cause.project && r.number == cause.build_number)
            .map(|r| r.build.clone()))
    }

    fn recorded_revision(&self, run: &RunId) -> HostResult<Option<RevisionRecord>> {
        self.record("recorded_revision", run)?;
        Ok(self.snapshot.run_entry(run)?.revision.clone())
    }
}

impl ParameterSink for MemoryHost {
    fn add_revision_parameter(&self, run: &RunId, pointer: &str) -> HostResult<()> {
        self.record("add_revision_parameter", format_args!("{run}, {pointer}"))?;
        self.parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((run.clone(), pointer.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingListener
// ---------------------------------------------------------------------------

/// Build console that keeps every line.
#[derive(Debug, Default)]
pub struct RecordingListener {
    lines: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BuildListener for RecordingListener {
    fn println(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}
