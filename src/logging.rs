// src/logging.rs

//! Logging setup for `parbuild` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PARBUILD_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR. Every line carries a fixed-width header naming
//! the thread that emitted it (see [`ThreadAwareFormat`]), so output from
//! targets running in parallel stays attributable.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::cli::LogLevel;

/// Width the `Thread<n>:` header is padded to.
const HEADER_WIDTH: usize = 10;

static NEXT_THREAD_NUMBER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_NUMBER: u64 = NEXT_THREAD_NUMBER.fetch_add(1, Ordering::Relaxed);
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("PARBUILD_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .event_format(ThreadAwareFormat)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

/// Event formatter that prefixes every physical line of a log message with
/// `Thread<n>:` padded to a fixed width, where `<n>` is a small number
/// assigned to each thread on its first log line.
///
/// Multi-line messages (e.g. captured command output) get the header
/// repeated after each embedded line break.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadAwareFormat;

impl<S, N> FormatEvent<S, N> for ThreadAwareFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut body = String::new();
        write!(body, "{:>5} {}: ", meta.level(), meta.target())?;
        ctx.format_fields(Writer::new(&mut body), event)?;

        writeln!(writer, "{}", prefix_lines(&thread_header(), &body))
    }
}

/// Header for the calling thread, e.g. `"Thread3:  "`.
pub fn thread_header() -> String {
    let number = THREAD_NUMBER.with(|n| *n);
    format!("{:<width$}", format!("Thread{number}:"), width = HEADER_WIDTH)
}

/// Prefix `header` to the first line of `message` and to every line after an
/// embedded line break.
pub fn prefix_lines(header: &str, message: &str) -> String {
    let mut out = String::with_capacity(message.len() + header.len());
    for (i, line) in message.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(header);
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    out
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
