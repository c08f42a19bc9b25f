//! Revision customization seam and trait metadata.
//!
//! Hosts may register several revision customizations. Each exposes an
//! integer precedence; hosts order them with [`by_precedence`]. How the
//! decisions of several customizations combine is left to the host.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::error::HostResult;
use crate::host::{BuildListener, JobDirectory, ParameterSink, RunHistory};
use crate::model::{BuildContext, Decision, SourceKind};
use crate::resolver::UpstreamRevisionResolver;

/// Precedence of the upstream revision customization.
pub const DEFAULT_PRECEDENCE: i32 = 0;

/// Builder family a customization plugs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderKind {
    Git,
}

/// Static metadata describing a customization to host tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitDescriptor {
    pub display_name: &'static str,
    pub source_kind: SourceKind,
    pub builder_kind: BuilderKind,
}

impl TraitDescriptor {
    pub fn upstream_revision() -> Self {
        Self {
            display_name: "Use Upstream Revision if possible",
            source_kind: SourceKind::GitHub,
            builder_kind: BuilderKind::Git,
        }
    }

    /// Whether the customization can be configured on a source of `kind`.
    pub fn applies_to(&self, kind: &SourceKind) -> bool {
        &self.source_kind == kind
    }
}

/// A hook that may override the revision a pipeline run checks out.
pub trait RevisionCustomization {
    fn customize(
        &self,
        build: &BuildContext,
        listener: &dyn BuildListener,
    ) -> HostResult<Decision>;

    fn precedence(&self) -> i32 {
        DEFAULT_PRECEDENCE
    }

    fn descriptor(&self) -> TraitDescriptor;

    fn config(&self) -> &ResolverConfig;
}

impl<J, R, P> RevisionCustomization for UpstreamRevisionResolver<J, R, P>
where
    J: JobDirectory,
    R: RunHistory,
    P: ParameterSink,
{
    fn customize(
        &self,
        build: &BuildContext,
        listener: &dyn BuildListener,
    ) -> HostResult<Decision> {
        self.resolve(build, listener)
    }

    fn descriptor(&self) -> TraitDescriptor {
        TraitDescriptor::upstream_revision()
    }

    fn config(&self) -> &ResolverConfig {
        UpstreamRevisionResolver::config(self)
    }
}

/// Order two customizations by precedence, lowest first.
pub fn by_precedence(a: &dyn RevisionCustomization, b: &dyn RevisionCustomization) -> Ordering {
    a.precedence().cmp(&b.precedence())
}
