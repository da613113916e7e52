//! Logging setup shared by every subcommand.
//!
//! Diagnostics go through `tracing` to stderr; the claim progress lines are
//! plain stdout. `RUST_LOG` overrides the level picked from `-v`/`-q`.

use tracing_subscriber::EnvFilter;

/// Diagnostic level, quietest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const LADDER: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    /// Steps up from `Info` once per `-v` and down once per `-q`, clamped at
    /// `Trace` and `Error`.
    pub fn from_flags(verbose: u8, quiet: u8) -> Self {
        let step = LogLevel::Info as i16 + i16::from(verbose) - i16::from(quiet);
        let index = step.clamp(0, Self::LADDER.len() as i16 - 1) as usize;
        Self::LADDER[index]
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Installs the global stderr subscriber. Fails if one is already set.
pub fn try_init(level: LogLevel) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| e.to_string())
}
