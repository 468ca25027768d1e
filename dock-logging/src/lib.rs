//! Tracing setup for the dock tools.
//!
//! Output goes to stderr, to a daily-rolled file, or to both through a tee
//! writer. `RUST_LOG` takes precedence over the configured level.

use std::{
    env,
    ffi::OsStr,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: PathBuf::from("/var/log/dock/dock.log"),
        }
    }
}

impl LogSettings {
    /// Applies `DOCK_LOG_LEVEL`, `DOCK_LOG_FORMAT`, `DOCK_LOG_OUTPUT` and `DOCK_LOG_FILE`.
    ///
    /// Unrecognised values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = env::var("DOCK_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = env::var("DOCK_LOG_FORMAT").ok().and_then(|v| parse_format(&v)) {
            self.format = format;
        }
        if let Some(output) = env::var("DOCK_LOG_OUTPUT").ok().and_then(|v| parse_output(&v)) {
            self.output = output;
        }
        if let Ok(file) = env::var("DOCK_LOG_FILE") {
            self.file = PathBuf::from(file);
        }
        self
    }
}

fn parse_format(value: &str) -> Option<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "human" | "pretty" => Some(LogFormat::Human),
        "compact" => Some(LogFormat::Compact),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

fn parse_output(value: &str) -> Option<LogOutput> {
    match value.trim().to_ascii_lowercase().as_str() {
        "console" => Some(LogOutput::Console),
        "file" => Some(LogOutput::File),
        "both" => Some(LogOutput::Both),
        "none" => Some(LogOutput::None),
        _ => None,
    }
}

// --- Tee writer ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A, B> Write for Tee<A, B>
where
    A: Write,
    B: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res_a = self.a.write(buf);
        let res_b = self.b.write(buf);
        res_a.or(res_b)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a>,
    B: MakeWriter<'a>,
{
    type Writer = Tee<A::Writer, B::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

fn fmt_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    match format {
        LogFormat::Json => layer.with_ansi(false).json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Human => layer.pretty().boxed(),
    }
}

fn file_writer(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or(OsStr::new("dock.log"));
    let appender = tracing_appender::rolling::daily(dir, file_name);
    tracing_appender::non_blocking(appender)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber described by `settings`.
///
/// The returned guard must be kept alive for file output to be flushed.
pub fn init_subscriber(settings: &LogSettings) -> Result<Option<WorkerGuard>, TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(&settings.level));

    match settings.output {
        LogOutput::Console => {
            registry
                .with(fmt_layer(settings.format, io::stderr))
                .try_init()?;
            Ok(None)
        }
        LogOutput::File => {
            let (writer, guard) = file_writer(&settings.file);
            registry.with(fmt_layer(settings.format, writer)).try_init()?;
            Ok(Some(guard))
        }
        LogOutput::Both => {
            let (writer, guard) = file_writer(&settings.file);
            let tee = MakeTee {
                make_a: io::stderr,
                make_b: writer,
            };
            registry.with(fmt_layer(settings.format, tee)).try_init()?;
            Ok(Some(guard))
        }
        LogOutput::None => {
            registry.try_init()?;
            Ok(None)
        }
    }
}
