//! Output filename sanitizing and extension handling.

use crate::config::MediaMode;
use crate::error::{Error, Result};

/// Maximum length of a sanitized name, in characters, before the extension.
const MAX_NAME_LENGTH: usize = 200;

/// Turn free-text user input into a safe single path component.
///
/// Path separators, reserved characters and control characters are replaced
/// with underscores rather than rejected.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_NAME_LENGTH)
        .collect();

    // Windows silently drops trailing dots and spaces
    let sanitized = sanitized.trim_end_matches(|c: char| c == '.' || c == ' ').to_string();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Append the extension for `mode` unless the name already ends with it.
///
/// The comparison ignores case. A different extension is kept and the
/// forced one appended after it.
pub fn with_forced_extension(name: &str, mode: MediaMode) -> String {
    let extension = mode.extension();
    if name.to_lowercase().ends_with(extension) {
        name.to_string()
    } else {
        format!("{}{}", name, extension)
    }
}

/// Sanitize user input and force the extension for `mode`.
pub fn output_file_name(input: &str, mode: MediaMode) -> Result<String> {
    let sanitized = sanitize_filename(input)?;
    Ok(with_forced_extension(&sanitized, mode))
}
