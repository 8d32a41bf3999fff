// File: ./src/cli.rs
//! Command-line parsing and help text.
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Extract, normalize and sync (default).
    #[default]
    Sync,
    /// Extract and normalize only; print events as JSON.
    Extract,
    /// Write a template config file.
    Init,
    /// Validate the configuration.
    Check,
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Args {
    pub command: Command,
    pub root: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse_args<I, S>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Args::default();
    let mut command: Option<Command> = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        let next_command = match arg {
            "-h" | "--help" | "help" => Some(Command::Help),
            "-V" | "--version" => Some(Command::Version),
            "-v" | "--verbose" => {
                parsed.verbose = true;
                None
            }
            "-r" | "--root" => {
                let path = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a path", arg))?;
                parsed.root = Some(PathBuf::from(path.as_ref()));
                None
            }
            "sync" => Some(Command::Sync),
            "extract" => Some(Command::Extract),
            "init" => Some(Command::Init),
            "check" => Some(Command::Check),
            other => return Err(format!("Unknown argument '{}'", other)),
        };

        if let Some(c) = next_command {
            match command {
                // Help and version win over anything else on the line.
                Some(Command::Help) | Some(Command::Version) => {}
                Some(_) if c != Command::Help && c != Command::Version => {
                    return Err("Only one command may be given".to_string());
                }
                _ => command = Some(c),
            }
        }
    }

    parsed.command = command.unwrap_or_default();
    Ok(parsed)
}

pub fn print_help(binary_name: &str) {
    println!(
        "Skysync v{} - Sync a student calendar into a Notion database",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [sync]              Scrape the calendar and sync new events", binary_name);
    println!("    {} extract             Print the scraped events as JSON", binary_name);
    println!("    {} init                Write a template config file", binary_name);
    println!("    {} check               Validate the configuration", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, --verbose         Print debug output.");
    println!("    -V, --version         Print the version.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("CONFIGURATION:");
    println!("    Values are read from config.toml in the config directory and may be");
    println!("    overridden by environment variables named SKYSYNC_<KEY>, e.g.");
    println!("    SKYSYNC_PASSWORD or SKYSYNC_NOTION_TOKEN.");
    println!();
    println!("    Required: auth_url, calendar_url, username, password,");
    println!("              notion_token, database_id");
    println!("    Optional: webdriver_url (http://localhost:9515), headless (true),");
    println!("              login_timeout_secs (10), calendar_timeout_secs (30),");
    println!("              render_timeout_secs (30), max_retries (3)");
    println!();
    println!("    A WebDriver server (e.g. chromedriver) must be listening on webdriver_url.");
}
