//! groupsync - reconcile Keycloak realm groups into OpenShift groups.

use clap::Parser;
use groupsync_cli::{logging, run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::LogConfig::from_cli(&cli).init();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}
