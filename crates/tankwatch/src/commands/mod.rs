//! Command dispatch: bridges CLI args -> API/monitor calls -> output formatting.

pub mod config_cmd;
pub mod level;
pub mod orders;
pub mod session;
pub mod watch;

use tankwatch_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(args, cfg, global).await,
        Command::Level => level::handle(cfg, global).await,
        Command::Orders(args) => orders::handle(args, cfg, global).await,
        // Local commands are handled before dispatch.
        Command::Session(args) => session::handle(args, global),
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(_) => Ok(()),
    }
}
