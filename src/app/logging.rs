//! Tracing initialization (grounded on the teacher's `app::logging`).

use super::config::AppConfig;
use tracing::debug;

pub fn init_logging(config: &AppConfig) {
    let log_level = config.log_level();
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(config.verbose >= 2)
        .with_thread_ids(config.verbose >= 3)
        .with_line_number(config.verbose >= 3)
        .init();
    debug!("agent-tracker started with verbosity level: {}", config.verbose);
}
