//! Config command handlers.

use tankwatch_config::{config_path, init_config, session_path};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = global.config.clone().unwrap_or_else(config_path);
            init_config(&path, force)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            output::print_output(cfg.to_toml()?.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let cfg_path = global.config.clone().unwrap_or_else(config_path);
            output::print_output(
                &format!("{}\n{}", cfg_path.display(), session_path().display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
