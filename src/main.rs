//! Thin composition layer (grounded on the teacher's `main.rs`): parse
//! arguments, initialize the app, dispatch, and present fatal errors.

use agent_pipeline_tracker::app::{handle_fatal_error, initialize_app, AppConfig};
use agent_pipeline_tracker::cli::{execute_command, Cli};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::new(cli.verbose);
    initialize_app(&app_config);

    match execute_command(cli.command, cli.project_root) {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_fatal_error(e, cli.verbose),
    }
}
