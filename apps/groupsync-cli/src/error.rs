//! CLI error types and exit codes

use std::path::PathBuf;

use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 100: No configuration file given
/// - 101: Configuration file not found
/// - 102: Configuration unreadable or invalid
/// - 103: No realms configured
/// - 104: Baseline groups unreadable
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No configuration file given")]
    NoConfig,

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("No realms configured")]
    NoRealms,

    #[error("Could not read baseline groups: {0}")]
    Baseline(String),

    #[error("Could not write output: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NoConfig => 100,
            CliError::ConfigNotFound(_) => 101,
            CliError::ConfigInvalid(_) => 102,
            CliError::NoRealms => 103,
            CliError::Baseline(_) => 104,
            CliError::Output(_) | CliError::Io(_) => 1,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NoConfig | CliError::ConfigNotFound(_) => {
                Some("Pass a realm configuration with --config <file>")
            }
            CliError::NoRealms => Some("Add at least one entry under 'realms:'"),
            _ => None,
        }
    }

    /// Prints the error (and a hint, when there is one) to stderr.
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }
}
