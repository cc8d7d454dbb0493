//! Command-line interface module.

mod args;
pub mod inspect;
pub mod pack;
pub mod watch;

pub use args::{Cli, Commands};
