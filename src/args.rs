//! Command-line argument parsing and processing.
//!
//! The surface is small enough to parse by hand: an optional command (`run`,
//! the default, or `status`) plus `--config`, `--debug`, `--help` and
//! `--version`. Help and version win over everything else; an unknown
//! argument turns into help with an explanation.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Watch for motion and publish pictures
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print location, today's daylight window and instance state
    Status {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit
    ShowHelpDueToError { reason: String },
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

#[derive(Clone, Copy, PartialEq)]
enum Command {
    Run,
    Status,
}

impl ParsedArgs {
    /// Parse command-line arguments (including the program name) into an action.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut config_dir: Option<String> = None;
        let mut command: Option<Command> = None;
        let mut error: Option<String> = None;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut iter = args_vec.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => match iter.next() {
                    Some(dir) if !dir.starts_with('-') => config_dir = Some(dir.clone()),
                    _ => {
                        error.get_or_insert_with(|| {
                            "--config requires a directory argument".to_string()
                        });
                    }
                },
                "run" | "status" => {
                    let parsed = if arg == "run" {
                        Command::Run
                    } else {
                        Command::Status
                    };
                    if command.is_some() {
                        error.get_or_insert_with(|| {
                            format!("Cannot use multiple commands at once: '{arg}'")
                        });
                    }
                    command = Some(parsed);
                }
                other => {
                    error.get_or_insert_with(|| format!("Unknown argument: {other}"));
                }
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if let Some(reason) = error {
            CliAction::ShowHelpDueToError { reason }
        } else {
            match command.unwrap_or(Command::Run) {
                Command::Run => CliAction::Run {
                    debug_enabled,
                    config_dir,
                },
                Command::Status => CliAction::Status {
                    debug_enabled,
                    config_dir,
                },
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information.
pub fn display_version_info() {
    println!("┏ birdorsquirrel v{} ━━╸", env!("CARGO_PKG_VERSION"));
    println!("┃");
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays the help message.
pub fn display_help() {
    println!("┏ birdorsquirrel v{} ━━╸", env!("CARGO_PKG_VERSION"));
    println!("┃");
    println!("┣ {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("┃");
    println!("┣ Usage:");
    println!("┃   birdorsquirrel [OPTIONS] [COMMAND]");
    println!("┃");
    println!("┣ Options:");
    println!("┃   -c, --config <dir>     Use custom configuration directory");
    println!("┃   -d, --debug            Enable detailed debug output");
    println!("┃   -h, --help             Print help information");
    println!("┃   -V, --version          Print version information");
    println!("┃");
    println!("┣ Commands:");
    println!("┃   run                    Watch for motion and post pictures (default)");
    println!("┃   status                 Show location and today's daylight window");
    println!("┃");
    println!("┣ Environment:");
    println!("┃   TWITTER_CONSUMER_KEY, TWITTER_CONSUMER_SECRET,");
    println!("┃   TWITTER_ACCESS_TOKEN, TWITTER_ACCESS_TOKEN_SECRET, CITY");
    println!("╹");
}
