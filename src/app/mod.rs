//! Application composition layer (grounded on the teacher's `app` module):
//! process-wide config, logging setup, and fatal-error presentation.

pub mod config;
pub mod error_handling;
pub mod logging;

pub use config::AppConfig;
pub use error_handling::handle_fatal_error;
pub use logging::init_logging;

/// One-time process initialization: logging first, then anything that must
/// run before the first tracker operation.
pub fn initialize_app(config: &AppConfig) {
    init_logging(config);
}
