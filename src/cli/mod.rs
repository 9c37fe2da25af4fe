pub mod args;
pub mod commands;

pub use args::{Cli, Commands, RangeArgs};
pub use commands::run;
