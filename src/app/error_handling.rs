//! Fatal error presentation at the CLI boundary (grounded on the teacher's
//! `app::error_handling::handle_fatal_error`).

use crate::error::TrackerError;

/// Print a single-line diagnostic to stderr and exit with the error kind's
/// code (§7: "a validation or store error prints a single-line diagnostic
/// to stderr and exits non-zero").
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    match error.downcast_ref::<TrackerError>() {
        Some(tracker_error) => {
            eprintln!("error: {tracker_error}");
            if verbose > 0 {
                eprintln!("{error:?}");
            }
            std::process::exit(tracker_error.exit_code());
        }
        None => {
            eprintln!("error: {error}");
            if verbose > 0 {
                eprintln!("{error:?}");
            }
            std::process::exit(1);
        }
    }
}
