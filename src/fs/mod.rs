//! Filesystem module.
//!
//! Provides:
//! - Output filename sanitizing and extension forcing
//! - Local path helpers and directory reveal

pub mod naming;
pub mod paths;

pub use naming::{output_file_name, sanitize_filename, with_forced_extension};
pub use paths::{local_output_path, remove_local_file, reveal_directory};
