pub mod cli;
pub mod commands;
pub mod error;

use crate::cli::Cli;

/// Initialize tracing/logging with the given directives
pub fn init_logging(directives: &[&str]) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in directives {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive '{}': {}", directive, e),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run a command line invocation. Returns the process exit status.
pub fn run(cli: Cli) -> i32 {
    init_logging(&["docsort=info", "docsort_lib=info", "docsort_core=info"]);
    tracing::info!("Starting Docsort");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {}", e);
            return 1;
        }
    };

    match rt.block_on(commands::execute(cli.command)) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Failed to render summary: {}", e),
            }
            0
        }
        Err(e) => {
            tracing::error!("{}", e);
            if let Ok(json) = serde_json::to_string(&e) {
                eprintln!("{}", json);
            }
            e.exit_code()
        }
    }
}
