//! Source resolution: link validation and the initial request.

pub mod link;
pub mod resolver;

pub use link::{SourceLink, EXPECTED_MIME};
pub use resolver::{resolve, ResolvedSource};
