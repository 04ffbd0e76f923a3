//! Command-line interface: arguments and interactive prompts.

pub mod args;
pub mod prompt;

pub use args::{Args, DeliveryModeArg, SessionArgs};
pub use prompt::{wait_for_key, Prompter};
