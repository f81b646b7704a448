//! Tracing subscriber: console and log-file rendering of lnk's events.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target of [`super::Logger::stage`] events.
pub(super) const STAGE_TARGET: &str = "lnk::stage";
/// Target of [`super::Logger::dry_run`] events.
pub(super) const DRY_RUN_TARGET: &str = "lnk::dry_run";

/// Environment variable overriding the console filter, in `EnvFilter` syntax.
const LOG_ENV: &str = "LNK_LOG";

/// How an event is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(level: Level, target: &str) -> Self {
        match (level, target) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31merror:\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mwarning:\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    fn file(self, ts: &str, msg: &str) -> String {
        let tag = match self {
            Self::Stage => return format!("[{ts}] ==> {msg}"),
            Self::DryRun => "[dry run] ",
            Self::Error => "[error] ",
            Self::Warn => "[warn] ",
            Self::Info => "",
            Self::Debug => "[debug] ",
        };
        format!("[{ts}]     {tag}{msg}")
    }
}

#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl Visit for MessageExtractor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn classify(event: &tracing::Event<'_>) -> (Kind, String) {
    let metadata = event.metadata();
    let mut extractor = MessageExtractor::default();
    event.record(&mut extractor);
    (
        Kind::of(*metadata.level(), metadata.target()),
        extractor.message,
    )
}

/// Appends every event to `$XDG_CACHE_HOME/lnk/<command>.log`, timestamped
/// and without ANSI codes.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command` and write a run header.  `None` if the
    /// cache directory is unusable.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("LNK_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        fs::write(
            &path,
            format!("# lnk {version} {command} {}\n", format_utc_datetime()),
        )
        .ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let (kind, msg) = classify(event);
        let line = kind.file(&format_utc_time(), &strip_ansi(&msg));
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

struct LnkFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for LnkFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (kind, msg) = classify(event);
        writeln!(writer, "{}", kind.console(&msg))
    }
}

/// Console filter: [`LOG_ENV`] when set and valid, otherwise `info`, or
/// `debug` with `verbose`.
fn console_filter(verbose: bool, env: Option<&str>) -> EnvFilter {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(default.into()))
}

/// Install the global subscriber.  Call once, before any logging.
///
/// Warnings and errors go to stderr, everything else to stdout.  The log
/// file always receives `debug` and above.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let env = std::env::var(LOG_ENV).ok();
    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));
    let console_layer = fmt::layer()
        .event_format(LnkFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter(verbose, env.as_deref()));
    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
