use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use iam_dispatch::config::Settings;
use iam_dispatch::logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "iam")]
#[command(version)]
#[command(about = "Error dispatch core for the iam chat bot")]
struct Cli {
    /// Path to a TOML settings file (environment variables are always applied)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short, action = ArgAction::Count, conflicts_with = "quiet", global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load settings, bootstrap logging and the dispatcher, and print a summary
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::from_env(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut logging = settings.logging_config();
    if cli.quiet {
        logging = logging.with_level(LogLevel::Error);
    } else if cli.verbose > 0 {
        logging = logging.with_level(LogLevel::from(cli.verbose));
    }

    match cli.command {
        Commands::Check => {
            let _dispatcher = iam_dispatch::bootstrap(logging);
            println!("{}", settings.summary());
            if settings.token.is_none() {
                eprintln!("Warning: no bot token configured (set `token` or IAM_TOKEN)");
            }
            ExitCode::SUCCESS
        }
    }
}
