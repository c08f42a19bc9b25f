//! End-to-end resolution scenarios against the in-memory host.
//!
//! Each fixture starts from a matching pull request pipeline (adoption
//! expected) and breaks exactly one condition.

use upstream_revision::fakes::{HostSnapshot, MemoryHost, RecordingListener};
use upstream_revision::*;

const UPSTREAM_GROUP: &str = "org/repo-pr";
const UPSTREAM_JOB: &str = "org/repo-pr/PR-42";
const UPSTREAM_RUN: &str = "org/repo-pr/PR-42#1";
const CURRENT_GROUP: &str = "org/repo-verify";
const CURRENT_JOB: &str = "org/repo-verify/PR-42";
const CURRENT_RUN: &str = "org/repo-verify/PR-42#1";

struct Fixture {
    current_group_kind: GroupKind,
    current_source: SourceDescriptor,
    current_head: &'static str,
    upstream_group_kind: GroupKind,
    upstream_source: SourceDescriptor,
    upstream_engine: EngineKind,
    triggered: bool,
    revision: Option<RevisionRecord>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            current_group_kind: GroupKind::MultiBranch,
            current_source: SourceDescriptor::github("gh", "https://github.com/org/repo"),
            current_head: "PR-42",
            upstream_group_kind: GroupKind::MultiBranch,
            upstream_source: SourceDescriptor::github("gh-up", "https://GITHUB.com/org/repo"),
            upstream_engine: EngineKind::Pipeline,
            triggered: true,
            revision: Some(pr_revision("PR-42", "abc123")),
        }
    }
}

impl Fixture {
    fn build(&self) -> (MemoryHost, BuildContext) {
        let mut snapshot = HostSnapshot::default();
        for (group, kind, source) in [
            (UPSTREAM_GROUP, self.upstream_group_kind, &self.upstream_source),
            (CURRENT_GROUP, self.current_group_kind, &self.current_source),
        ] {
            snapshot.groups.push(Group {
                id: GroupId::new(group),
                kind,
            });
            snapshot
                .sources
                .insert(GroupId::new(group), vec![source.clone()]);
        }
        snapshot.add_branch_job(
            UPSTREAM_GROUP,
            UPSTREAM_JOB,
            self.upstream_source.id.clone(),
            "PR-42",
        );
        snapshot.add_branch_job(
            CURRENT_GROUP,
            CURRENT_JOB,
            self.current_source.id.clone(),
            self.current_head,
        );

        let upstream = snapshot.add_run(BuildContext {
            run: RunId::new(UPSTREAM_RUN),
            job: JobId::new(UPSTREAM_JOB),
            engine: self.upstream_engine.clone(),
        });
        if let Some(revision) = &self.revision {
            upstream.with_revision(revision.clone());
        }
        let upstream = upstream.clone();

        let current = snapshot.add_run(BuildContext::pipeline(CURRENT_RUN, CURRENT_JOB));
        if self.triggered {
            current.triggered_by(&upstream);
        }
        let build = current.build.clone();

        (MemoryHost::new(snapshot), build)
    }
}

fn pr_revision(head: &str, pull_hash: &str) -> RevisionRecord {
    RevisionRecord {
        source_id: "gh-up".into(),
        head: HeadName::new(head),
        kind: RevisionKind::PullRequest {
            pull_hash: pull_hash.into(),
        },
    }
}

fn run(host: &MemoryHost, build: &BuildContext) -> (Resolution, Vec<String>) {
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::default(), host, host, host);
    let listener = RecordingListener::new();
    let resolution = resolver.resolve_with_reason(build, &listener).unwrap();
    (resolution, listener.lines())
}

fn assert_silent_no_override(fixture: Fixture) -> StopReason {
    let (host, build) = fixture.build();
    let (resolution, lines) = run(&host, &build);

    assert_eq!(resolution.decision, Decision::NoOverride);
    assert!(lines.is_empty(), "unexpected console output: {lines:?}");
    assert!(host.parameters().is_empty());
    resolution.stop.expect("no-override must carry a stop reason")
}

// ===========================================================================
// Adoption
// ===========================================================================

#[test]
fn pull_request_revision_is_adopted() {
    let (host, build) = Fixture::default().build();
    let (resolution, lines) = run(&host, &build);

    assert_eq!(
        resolution.decision,
        Decision::Adopt(pr_revision("PR-42", "abc123"))
    );
    assert_eq!(resolution.stop, None);
    assert_eq!(lines, vec![PR_REVISION_LINE]);
    assert_eq!(host.parameters_for(&build.run), vec!["abc123"]);
    assert_eq!(host.parameters().len(), 1);
}

#[test]
fn branch_commit_revision_is_adopted() {
    let revision = RevisionRecord {
        source_id: "gh-up".into(),
        head: HeadName::new("PR-42"),
        kind: RevisionKind::BranchCommit {
            hash: "def456".into(),
        },
    };
    let (host, build) = Fixture {
        revision: Some(revision.clone()),
        ..Fixture::default()
    }
    .build();
    let (resolution, lines) = run(&host, &build);

    assert_eq!(resolution.decision, Decision::Adopt(revision));
    assert_eq!(lines, vec![GIT_REVISION_LINE]);
    assert_eq!(host.parameters_for(&build.run), vec!["def456"]);
}

#[test]
fn remote_comparison_ignores_case() {
    let (host, build) = Fixture {
        current_source: SourceDescriptor::github("gh", "HTTPS://GITHUB.COM/ORG/REPO"),
        upstream_source: SourceDescriptor::github("gh-up", "https://github.com/org/repo"),
        ..Fixture::default()
    }
    .build();
    let (resolution, _) = run(&host, &build);

    assert!(resolution.decision.is_adopt());
}

#[test]
fn resolve_is_idempotent() {
    let (host, build) = Fixture::default().build();
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::default(), &host, &host, &host);

    let first = resolver.resolve(&build, &NullListener).unwrap();
    let second = resolver.resolve(&build, &NullListener).unwrap();

    assert_eq!(first, second);
    // the host's parameter layer sees the duplicate
    assert_eq!(host.parameters_for(&build.run), vec!["abc123", "abc123"]);
}

#[test]
fn resolver_works_through_customization_seam() {
    let (host, build) = Fixture::default().build();
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::new("verify"), &host, &host, &host);
    let hook: &dyn RevisionCustomization = &resolver;

    let decision = hook.customize(&build, &NullListener).unwrap();
    assert!(decision.is_adopt());
    assert_eq!(hook.precedence(), DEFAULT_PRECEDENCE);
}

// ===========================================================================
// No override
// ===========================================================================

#[test]
fn head_mismatch_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        revision: Some(pr_revision("PR-43", "abc123")),
        ..Fixture::default()
    });
    assert!(matches!(stop, StopReason::HeadMismatch { .. }));
}

#[test]
fn head_comparison_is_case_sensitive() {
    let stop = assert_silent_no_override(Fixture {
        revision: Some(pr_revision("pr-42", "abc123")),
        ..Fixture::default()
    });
    assert_eq!(
        stop,
        StopReason::HeadMismatch {
            current: HeadName::new("PR-42"),
            upstream: HeadName::new("pr-42"),
        }
    );
}

#[test]
fn current_source_not_github_is_no_override() {
    let (host, build) = Fixture {
        current_source: SourceDescriptor {
            id: "gh".into(),
            kind: SourceKind::Git,
            remote: "https://github.com/org/repo".into(),
        },
        ..Fixture::default()
    }
    .build();
    let (resolution, lines) = run(&host, &build);

    assert_eq!(resolution.decision, Decision::NoOverride);
    assert!(matches!(
        resolution.stop,
        Some(StopReason::CurrentSourceNotGitHub { .. })
    ));
    assert!(lines.is_empty());
    assert!(!host
        .calls()
        .iter()
        .any(|c| c.starts_with("triggering_cause")));
}

#[test]
fn missing_upstream_cause_stops_after_source_lookup() {
    let (host, build) = Fixture {
        triggered: false,
        ..Fixture::default()
    }
    .build();
    let (resolution, lines) = run(&host, &build);

    assert_eq!(resolution.decision, Decision::NoOverride);
    assert_eq!(resolution.stop, Some(StopReason::NoUpstreamCause));
    assert!(lines.is_empty());
    assert_eq!(
        host.calls(),
        vec![
            format!("branch_metadata({CURRENT_JOB})"),
            format!("parent_group({CURRENT_JOB})"),
            format!("find_source({CURRENT_GROUP}, gh)"),
            format!("triggering_cause({CURRENT_RUN})"),
        ]
    );
}

#[test]
fn unrecognized_revision_kind_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        revision: Some(RevisionRecord {
            source_id: "gh-up".into(),
            head: HeadName::new("PR-42"),
            kind: RevisionKind::Other {
                description: "tag v1.0".into(),
            },
        }),
        ..Fixture::default()
    });
    assert_eq!(
        stop,
        StopReason::NoRevisionPointer {
            description: "tag v1.0".into()
        }
    );
}

#[test]
fn remote_mismatch_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        upstream_source: SourceDescriptor::github("gh-up", "https://github.com/fork/repo"),
        ..Fixture::default()
    });
    assert!(matches!(stop, StopReason::RemoteMismatch { .. }));
}

#[test]
fn upstream_source_not_github_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        upstream_source: SourceDescriptor {
            id: "gh-up".into(),
            kind: SourceKind::Other("bitbucket".into()),
            remote: "https://github.com/org/repo".into(),
        },
        ..Fixture::default()
    });
    assert!(matches!(stop, StopReason::UpstreamSourceNotGitHub { .. }));
}

#[test]
fn freestyle_upstream_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        upstream_engine: EngineKind::Freestyle,
        ..Fixture::default()
    });
    assert_eq!(
        stop,
        StopReason::UpstreamNotPipeline {
            engine: EngineKind::Freestyle
        }
    );
}

#[test]
fn upstream_without_recorded_revision_is_no_override() {
    let stop = assert_silent_no_override(Fixture {
        revision: None,
        ..Fixture::default()
    });
    assert_eq!(
        stop,
        StopReason::NoRecordedRevision {
            upstream: RunId::new(UPSTREAM_RUN)
        }
    );
}

#[test]
fn unknown_upstream_source_id_is_caught() {
    let mut revision = pr_revision("PR-42", "abc123");
    revision.source_id = "ghost".into();
    let stop = assert_silent_no_override(Fixture {
        revision: Some(revision),
        ..Fixture::default()
    });
    assert_eq!(
        stop,
        StopReason::UpstreamSourceUnresolved {
            error: ResolutionError::SourceNotFound {
                source_id: "ghost".into()
            }
        }
    );
}

#[test]
fn upstream_outside_multi_branch_project_is_caught() {
    let stop = assert_silent_no_override(Fixture {
        upstream_group_kind: GroupKind::Folder,
        ..Fixture::default()
    });
    assert!(matches!(
        stop,
        StopReason::UpstreamSourceUnresolved {
            error: ResolutionError::InappropriateContext { .. }
        }
    ));
}

#[test]
fn current_outside_multi_branch_project_is_caught() {
    let stop = assert_silent_no_override(Fixture {
        current_group_kind: GroupKind::Other,
        ..Fixture::default()
    });
    assert!(matches!(
        stop,
        StopReason::CurrentSourceUnresolved {
            error: ResolutionError::InappropriateContext { .. }
        }
    ));
}

#[test]
fn deleted_upstream_run_is_no_override() {
    let (mut host, build) = Fixture::default().build();
    let mut snapshot = host.snapshot().clone();
    snapshot.runs.retain(|r| r.build.run.as_str() != UPSTREAM_RUN);
    host = MemoryHost::new(snapshot);

    let (resolution, lines) = run(&host, &build);
    assert_eq!(resolution.decision, Decision::NoOverride);
    assert!(matches!(
        resolution.stop,
        Some(StopReason::UpstreamRunMissing { .. })
    ));
    assert!(lines.is_empty());
}

// ===========================================================================
// Host errors
// ===========================================================================

#[test]
fn host_error_from_run_history_propagates() {
    let (host, build) = Fixture::default().build();
    let host = MemoryHost::new(host.snapshot().clone()).failing_on("recorded_revision");
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::default(), &host, &host, &host);

    let err = resolver.resolve(&build, &NullListener).unwrap_err();
    assert!(matches!(err, HostError::Query { ref what, .. } if what == "recorded_revision"));
}

#[test]
fn host_error_from_parameter_sink_propagates() {
    let (host, build) = Fixture::default().build();
    let host = MemoryHost::new(host.snapshot().clone()).failing_on("add_revision_parameter");
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::default(), &host, &host, &host);

    let listener = RecordingListener::new();

    assert!(resolver.resolve(&build, &listener).is_err());
    assert!(host.parameters().is_empty());
    assert!(listener.lines().is_empty(), "console: {:?}", listener.lines());
}

#[test]
fn host_error_during_source_lookup_is_not_swallowed() {
    let (host, build) = Fixture::default().build();
    let host = MemoryHost::new(host.snapshot().clone()).failing_on("parent_group");
    let resolver = UpstreamRevisionResolver::new(ResolverConfig::default(), &host, &host, &host);

    assert!(resolver.resolve(&build, &NullListener).is_err());
}
