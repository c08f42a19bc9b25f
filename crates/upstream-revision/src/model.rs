//! Data model shared by the resolver and its host collaborators.
//!
//! Everything here is plain data: identities of jobs, runs and groups,
//! configured source descriptors, recorded revisions and the final
//! [`Decision`]. Values are produced by the host and are read-only to the
//! resolver.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Full name of a job (e.g. `"org/repo/PR-42"`).
    JobId
);
string_id!(
    /// Identifier of a single build execution (e.g. `"org/repo/PR-42#7"`).
    RunId
);
string_id!(
    /// Full name of the item group a job lives in.
    GroupId
);

// ---------------------------------------------------------------------------
// Builds
// ---------------------------------------------------------------------------

/// Build engine that produced a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum EngineKind {
    /// Scripted/declarative pipeline run
    Pipeline,
    /// Classic freestyle project run
    Freestyle,
    Other(String),
}

/// One build execution, current or upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub run: RunId,
    /// The job this run belongs to
    pub job: JobId,
    pub engine: EngineKind,
}

impl BuildContext {
    pub fn pipeline(run: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            run: RunId::new(run),
            job: JobId::new(job),
            engine: EngineKind::Pipeline,
        }
    }

    pub fn is_pipeline(&self) -> bool {
        self.engine == EngineKind::Pipeline
    }
}

/// The event that triggered a run when that event was another build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamCause {
    /// Job of the upstream build
    pub project: JobId,
    pub build_number: u64,
}

// ---------------------------------------------------------------------------
// Jobs and groups
// ---------------------------------------------------------------------------

/// Name of a branch head as the branch-organized project sees it
/// (`"main"`, `"PR-42"`). Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadName(pub String);

impl HeadName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HeadName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch metadata attached to a job of a branch-organized project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Identifier of the source that discovered this branch
    pub source_id: String,
    pub head: HeadName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Branch-organized project: owns sources and one job per branch
    MultiBranch,
    Folder,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub kind: GroupKind,
}

impl Group {
    pub fn is_multi_branch(&self) -> bool {
        self.kind == GroupKind::MultiBranch
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum SourceKind {
    /// GitHub-compatible branch source
    GitHub,
    /// Plain git source
    Git,
    Other(String),
}

/// A configured source-control source bound to a branch-organized project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub kind: SourceKind,
    /// Remote location used as the source's identity
    pub remote: String,
}

impl SourceDescriptor {
    pub fn github(id: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: SourceKind::GitHub,
            remote: remote.into(),
        }
    }

    pub fn is_github(&self) -> bool {
        self.kind == SourceKind::GitHub
    }

    /// Remote identity match, ignoring case (Unicode simple case folding,
    /// char by char).
    pub fn same_remote(&self, other: &SourceDescriptor) -> bool {
        self.remote.chars().count() == other.remote.chars().count()
            && self
                .remote
                .chars()
                .zip(other.remote.chars())
                .all(|(a, b)| chars_eq_ignore_case(a, b))
    }
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_uppercase().eq(b.to_uppercase()) || a.to_lowercase().eq(b.to_lowercase())
}

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

/// Concrete form of a recorded revision.
///
/// Only the first two variants carry a pointer that a checkout can be
/// forced to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevisionKind {
    /// Pull request revision; `pull_hash` is the merge/test commit, not the
    /// head commit.
    PullRequest { pull_hash: String },
    /// Plain branch revision at a commit
    BranchCommit { hash: String },
    /// Any revision form without a usable commit pointer (tags, SCM-specific
    /// revisions, ...)
    Other { description: String },
}

/// The revision recorded on a build when its checkout was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub source_id: String,
    pub head: HeadName,
    pub kind: RevisionKind,
}

impl RevisionRecord {
    /// Commit pointer a downstream checkout should be forced to, if any.
    pub fn pointer(&self) -> Option<&str> {
        match &self.kind {
            RevisionKind::PullRequest { pull_hash } => Some(pull_hash),
            RevisionKind::BranchCommit { hash } => Some(hash),
            RevisionKind::Other { .. } => None,
        }
    }
}

/// Outcome of a resolver invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "revision", rename_all = "snake_case")]
pub enum Decision {
    /// Reuse the upstream revision.
    Adopt(RevisionRecord),
    /// Proceed with default revision resolution.
    NoOverride,
}

impl Decision {
    pub fn is_adopt(&self) -> bool {
        matches!(self, Decision::Adopt(_))
    }

    pub fn revision(&self) -> Option<&RevisionRecord> {
        match self {
            Decision::Adopt(record) => Some(record),
            Decision::NoOverride => None,
        }
    }
}
