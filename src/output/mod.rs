//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Stream progress observation and progress bars

pub mod console;
pub mod progress;

pub use console::{
    format_mebibytes, print_banner, print_error, print_info, print_source_summary, print_success,
    print_warning,
};
pub use progress::{observe, BarReporter, NoProgress, ProgressObserver, ProgressState};
