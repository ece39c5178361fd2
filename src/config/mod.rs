//! CLI arguments and TOML configuration

mod args;
mod file;

pub use args::{Args, Command};
pub use file::{ConfigError, RingConfig};
