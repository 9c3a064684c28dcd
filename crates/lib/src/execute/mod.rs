//! Stage subprocess execution.

mod runner;
mod types;

pub use runner::{CommandRunner, SystemRunner};
pub use types::{ExecuteError, StageCommand};
