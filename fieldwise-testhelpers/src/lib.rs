#![warn(missing_docs)]
//! Test setup shared by the fieldwise crates.
//!
//! [`setup`] routes the engine's `tracing` events through the test harness,
//! so they only show up for failing tests (or under `--nocapture`).
//!
//! `FIELDWISE_LOG` picks what gets logged, as a target filter such as
//! `fieldwise=debug` or `fieldwise::engine=trace,fieldwise_axum=debug`.
//! When it is unset or does not parse, the fieldwise crates log at `TRACE`
//! and everything else at `WARN`.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const FILTER_VAR: &str = "FIELDWISE_LOG";

fn filter() -> Targets {
    std::env::var(FILTER_VAR)
        .ok()
        .and_then(|directives| directives.parse().ok())
        .unwrap_or_else(|| {
            Targets::new()
                .with_target("fieldwise", Level::TRACE)
                .with_target("fieldwise_axum", Level::TRACE)
                .with_default(Level::WARN)
        })
}

/// Installs the tracing subscriber for tests.
///
/// Call it first thing in every test. Only the first call installs
/// anything, and a global subscriber set up elsewhere is left in place.
pub fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_timer(Uptime::default())
                    .with_file(true)
                    .with_line_number(true)
                    .compact(),
            )
            .with(filter())
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_can_run_repeatedly() {
        setup();
        setup();
        tracing::trace!(target: "fieldwise::engine", "still one subscriber");
    }
}
