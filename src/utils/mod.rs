pub mod error;
pub mod prompt;
pub mod command;

pub use command::run_with_timeout;
pub use error::DeployError;
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
