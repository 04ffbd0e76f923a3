//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application header.
pub fn print_banner() {
    println!(
        "{}",
        style(format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))).cyan()
    );
    println!();
}

/// Print what is known about the source before the transfer starts.
pub fn print_source_summary(total_bytes: u64, duration_secs: Option<f64>) {
    println!("Video file size is {} Mb", format_mebibytes(total_bytes));
    if let Some(secs) = duration_secs {
        println!("Video file duration is {} minutes", round2(secs / 60.0));
    }
}

/// Bytes as MiB rounded to two decimals.
pub fn format_mebibytes(bytes: u64) -> f64 {
    round2(bytes as f64 / (1024.0 * 1024.0))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mebibytes() {
        assert_eq!(format_mebibytes(10_485_760), 10.0);
        assert_eq!(format_mebibytes(1_572_864), 1.5);
        assert_eq!(format_mebibytes(1_000_000), 0.95);
    }
}
