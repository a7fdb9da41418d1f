//! Tracing installation and panic forwarding.

use std::io::{self, Write};
use std::panic;
use std::str::FromStr;
use std::sync::{Once, OnceLock};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const TRACING_PREFIX: &str = "[trellis] ";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;
const MAX_PANIC_LINES: usize = 8;

// ============================================================================
// Global State
// ============================================================================

static PANIC_HOOK_INSTALLED: Once = Once::new();
static TRACING_INSTALLED: Once = Once::new();
static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Replaces the active filter with a single level (`error`, `warn`, `info`, `debug`,
/// `trace` or `off`). Unknown levels fall back to `info`.
///
/// Does nothing before [`install_tracing`].
pub fn set_log_level(level: &str) {
    let parsed = LevelFilter::from_str(level).unwrap_or(DEFAULT_LOG_LEVEL);
    if let Some(handle) = FILTER_HANDLE.get() {
        if let Err(error) = handle.reload(EnvFilter::new(parsed.to_string())) {
            tracing::warn!(%error, "failed to change log level");
        }
    }
}

// ============================================================================
// Installation
// ============================================================================

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `info`). Idempotent.
pub fn install_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL.to_string()));
        let (filter, handle) = reload::Layer::new(filter);

        let console = fmt::layer()
            .event_format(PanicAwareFormatter)
            .with_writer(PrefixedWriter)
            .with_ansi(false);

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init();

        if result.is_err() {
            eprintln!("{TRACING_PREFIX}a global tracing subscriber is already installed");
        } else {
            let _ = FILTER_HANDLE.set(handle);
        }
    });
}

/// Re-emits panics as `tracing` errors before running the previous hook. Idempotent.
pub fn install_panic_forwarder() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            tracing_panic::panic_hook(info);
            previous(info);
        }));
    });
}

// ============================================================================
// Console Output Formatter
// ============================================================================

#[derive(Clone, Default)]
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedWriterInner<std::io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedWriterInner {
            inner: std::io::stderr(),
            wrote_prefix: false,
        }
    }
}

struct PrefixedWriterInner<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedWriterInner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(TRACING_PREFIX.as_bytes())?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Clone, Default)]
struct PanicAwareFormatter;

impl<S, N> FormatEvent<S, N> for PanicAwareFormatter
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = PanicFieldVisitor::default();
        event.record(&mut visitor);

        let Some(payload) = visitor.payload else {
            let level = event.metadata().level();
            let target = event.metadata().target();
            write!(writer, "{level} {target}: ")?;
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            return writeln!(writer);
        };

        write!(writer, "PANIC: {payload}")?;
        if let Some(location) = visitor.location {
            write!(writer, " at {location}")?;
        }
        if let Some(backtrace) = visitor.backtrace.as_deref() {
            write!(writer, "\nStack:")?;
            for line in truncate_backtrace(backtrace) {
                write!(writer, "\n  {line}")?;
            }
        }
        writeln!(writer)
    }
}

fn truncate_backtrace(backtrace: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = backtrace.lines().take(MAX_PANIC_LINES).collect();
    if backtrace.lines().count() > MAX_PANIC_LINES {
        lines.push("... (truncated)");
    }
    lines
}

#[derive(Default)]
struct PanicFieldVisitor {
    payload: Option<String>,
    location: Option<String>,
    backtrace: Option<String>,
}

impl PanicFieldVisitor {
    fn record(&mut self, name: &str, value: String) {
        match name {
            "panic.payload" => self.payload = Some(value),
            "panic.location" => self.location = Some(value),
            "panic.backtrace" => self.backtrace = Some(value),
            _ => {}
        }
    }
}

impl tracing::field::Visit for PanicFieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record(field.name(), value.to_string());
    }
}
