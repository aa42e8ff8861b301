//! Main application entry point.
//!
//! Parses the command line and dispatches to the monitoring loop or a one-shot
//! command. Configuration errors have already been logged by the time they
//! reach this point and end the process with exit status 1; anything else
//! propagates out of `main`.

use anyhow::Result;
use birdorsquirrel::{
    BirdOrSquirrel,
    args::{self, CliAction, ParsedArgs},
    commands,
    common::constants::EXIT_FAILURE,
    error::find_config_error,
};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    // Whether a failure has already been reported through the logger
    let mut logged = false;

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError { reason } => {
            eprintln!("{reason}\n");
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            logged = true;
            BirdOrSquirrel::new(debug_enabled)
                .with_config_dir(config_dir)
                .run()
        }
        CliAction::Status { config_dir, .. } => {
            commands::status::handle_status_command(config_dir.as_deref())
        }
    };

    if let Err(e) = &result
        && let Some(config_error) = find_config_error(e)
    {
        if !logged {
            eprintln!("Configuration error: {config_error}");
        }
        std::process::exit(EXIT_FAILURE);
    }

    result
}
