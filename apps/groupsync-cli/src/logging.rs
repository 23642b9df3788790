//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for the emitted groups.

use tracing_subscriber::EnvFilter;

use crate::args::{Cli, LogFormat};

/// Logging options derived from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub verbose: bool,
    pub keycloak_debug: bool,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbose: cli.verbose,
            keycloak_debug: cli.keycloak_debug,
            format: cli.log_format,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    pub fn directives(&self) -> String {
        let mut directives = String::from(if self.verbose { "debug" } else { "info" });
        if self.keycloak_debug {
            directives.push_str(",groupsync_keycloak=trace");
        }
        directives
    }

    /// Installs the global subscriber. A subscriber that is already set wins.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directives()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let _ = match self.format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    }
}
