//! Stderr logging for tools and examples.
//!
//! Records from `tagquad*` targets pass at the requested level; everything
//! else is capped at `warn`. Lines look like `[elapsed LEVEL target] message`.
//! With the `tracing` feature, [`init_tracing`] installs a
//! `tracing-subscriber` formatter with the same default filtering.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`level_from_env`].
pub const LOG_ENV: &str = "TAGQUAD_LOG";

const OWN_TARGET: &str = "tagquad";
const FOREIGN_CAP: Level = Level::Warn;

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn passes(&self, level: Level, target: &str) -> bool {
        if target.starts_with(OWN_TARGET) {
            level <= self.level
        } else {
            level <= self.level && level <= FOREIGN_CAP
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.passes(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.4}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the given level filter.
///
/// Repeated calls after the first successful one do nothing.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Level named by `TAGQUAD_LOG` (`off`, `error` .. `trace`), or `default`
/// when unset or unparsable.
pub fn level_from_env(default: LevelFilter) -> LevelFilter {
    parse_level(std::env::var(LOG_ENV).ok().as_deref(), default)
}

fn parse_level(raw: Option<&str>, default: LevelFilter) -> LevelFilter {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Install a `tracing` subscriber. `RUST_LOG` overrides the default filter
/// (`tagquad` crates at `info`, everything else at `warn`).
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tagquad=info,tagquad_core=info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
