//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Synchronize Keycloak groups into OpenShift groups
#[derive(Parser, Debug)]
#[command(name = "groupsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Realm configuration file
    #[arg(short = 'c', long = "config", default_value = "groupsync.yml", env = "GROUPSYNC_CONFIG")]
    pub config: PathBuf,

    /// Current OpenShift groups (file path, or - for stdin)
    #[arg(short = 'g', long = "groups")]
    pub groups: Option<String>,

    /// Trace every Keycloak request
    #[arg(short = 'D', long = "keycloak-debug")]
    pub keycloak_debug: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Log line format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Output document format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// Write groups to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["groupsync"]);
        assert_eq!(cli.config, PathBuf::from("groupsync.yml"));
        assert!(cli.groups.is_none());
        assert!(!cli.keycloak_debug);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "groupsync", "-c", "sync.yml", "-g", "-", "-D", "-o", "out.json",
        ]);
        assert_eq!(cli.config, PathBuf::from("sync.yml"));
        assert_eq!(cli.groups.as_deref(), Some("-"));
        assert!(cli.keycloak_debug);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_formats() {
        let cli = Cli::parse_from([
            "groupsync",
            "--log-format",
            "json",
            "--output-format",
            "yaml",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.output_format, OutputFormat::Yaml);
    }
}
