//! Log output for processes that embed the resolver.
//!
//! The resolver reports why a run did or did not adopt its upstream
//! revision through `tracing` events (`revision.adopted`,
//! `revision.skipped`, `source.unresolved`). [`init_tracing`] installs the
//! subscriber that renders them. Output goes to stderr so a host or the CLI
//! can print decision reports on stdout. Only the first call installs a
//! subscriber.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber for resolver diagnostics.
///
/// Stop reasons are emitted at debug level, adoptions at info level, so
/// pass `Level::DEBUG` to see why a run kept its default revision.
///
/// * `json`: emit newline-delimited JSON log lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
///
/// Logs go to stderr so stdout stays free for reports.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

