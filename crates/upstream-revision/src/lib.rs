//! Upstream revision pinning
//!
//! Decides, for a downstream build triggered by an upstream build, whether
//! the downstream build should check out the exact revision the upstream
//! build used instead of resolving its own. Both stages of a multi-stage
//! pipeline then test the same commit.
//!
//! ## Key Components
//!
//! - `UpstreamRevisionResolver`: the decision chain
//! - `JobDirectory`, `RunHistory`, `ParameterSink`, `BuildListener`: host
//!   collaborators the resolver reads from and writes to
//! - `RevisionCustomization`: the seam hosts register customizations with
//! - `fakes::MemoryHost`: in-memory host for tests and offline tooling

mod config;
mod descriptor;
mod error;
pub mod fakes;
pub mod host;
mod model;
pub mod obs;
mod resolver;
pub mod telemetry;

pub use config::{ResolverConfig, CONTEXT_LABEL_ENV};
pub use descriptor::{
    by_precedence, BuilderKind, RevisionCustomization, TraitDescriptor, DEFAULT_PRECEDENCE,
};
pub use error::{HostError, HostResult, ResolutionError, SnapshotError};
pub use host::{
    BuildListener, JobDirectory, NullListener, ParameterSink, RunHistory, TracingListener,
};
pub use model::{
    Branch, BuildContext, Decision, EngineKind, Group, GroupId, GroupKind, HeadName, JobId,
    RevisionKind, RevisionRecord, RunId, SourceDescriptor, SourceKind, UpstreamCause,
};
pub use resolver::{
    Resolution, ResolveFailure, StopReason, UpstreamRevisionResolver, GIT_REVISION_LINE,
    PR_REVISION_LINE,
};
pub use telemetry::init_tracing;
