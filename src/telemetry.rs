//! Logging initialization.
//!
//! Controlled by `GITDB_LOG_FORMAT`:
//! - unset or `"pretty"` → human-readable events to stderr
//! - `"json"` → JSON lines to stderr, one per event plus span close
//! - `"off"` → no subscriber is installed
//!
//! Filtering follows `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable selecting the output format.
pub const FORMAT_VAR: &str = "GITDB_LOG_FORMAT";

/// Output format for log events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Off,
}

impl LogFormat {
    /// Interpret a `GITDB_LOG_FORMAT` value. Unknown values fall back to
    /// [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            Some(v) if v.eq_ignore_ascii_case("off") => Self::Off,
            _ => Self::Pretty,
        }
    }

    fn from_env() -> Self {
        Self::parse(std::env::var(FORMAT_VAR).ok().as_deref())
    }
}

/// Install the global subscriber according to `GITDB_LOG_FORMAT`.
///
/// Calling this more than once, or after another subscriber was installed,
/// leaves the existing subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match LogFormat::from_env() {
        LogFormat::Off => return,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init(),
    };
    if let Err(e) = installed {
        eprintln!("warning: logging already initialized: {e}");
    }
}
