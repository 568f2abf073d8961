//! Station identity commands. Local only, no service calls.

use serde::Serialize;

use tankwatch_config::{clear_session, load_session, save_session, session_path};
use tankwatch_core::SessionIdentity;

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct SessionView {
    station: Option<u64>,
    email: Option<String>,
    path: String,
}

impl SessionView {
    fn new(identity: SessionIdentity) -> Self {
        Self {
            station: identity.station,
            email: identity.email,
            path: session_path().display().to_string(),
        }
    }
}

fn detail(v: &SessionView) -> String {
    let unset = || "(not set)".to_owned();
    format!(
        "Station:  {}\nEmail:    {}\nFile:     {}",
        v.station.map_or_else(unset, |s| s.to_string()),
        v.email.clone().unwrap_or_else(unset),
        v.path
    )
}

fn plain(v: &SessionView) -> String {
    format!(
        "{}\t{}",
        v.station.map(|s| s.to_string()).unwrap_or_default(),
        v.email.clone().unwrap_or_default()
    )
}

pub fn handle(args: SessionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Show => {
            let view = SessionView::new(load_session()?);
            let rendered = output::render_single(global.output, &view, detail, plain)?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        SessionCommand::Set { station, email } => {
            if station.is_none() && email.is_none() {
                return Err(CliError::Validation {
                    field: "session".into(),
                    reason: "pass --station and/or --email".into(),
                });
            }
            let stored = save_session(&session_path(), &SessionIdentity { station, email })?;
            let view = SessionView::new(stored);
            let rendered = output::render_single(global.output, &view, detail, plain)?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        SessionCommand::Clear => {
            let path = session_path();
            let removed = clear_session(&path)?;
            if !global.quiet {
                if removed {
                    eprintln!("Removed {}", path.display());
                } else {
                    eprintln!("No session stored");
                }
            }
            Ok(())
        }
    }
}
