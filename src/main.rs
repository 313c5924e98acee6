use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;
use sortwise::cli::{SortOptions, level_filter, run_cancel, run_list, run_sort};
use sortwise::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sort files into folders chosen by ordered, configurable rules.
#[derive(Parser, Debug)]
#[command(name = "sortwise", version, about)]
struct Cli {
    /// Increase logging verbosity (-v warnings, -vv info, -vvv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable logging entirely
    #[arg(short, long, global = true)]
    silent: bool,

    /// Configuration file to use instead of the default lookup
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Cancel file to write (sort) or replay (cancel)
    #[arg(long, global = true, value_name = "FILE")]
    cancel_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sort the files of a folder
    Sort {
        /// Folder whose files are sorted
        folder: PathBuf,

        /// Destination root (defaults to the sorted folder)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Operation set to apply (defaults to general.default_operations)
        #[arg(short = 'c', long, value_name = "NAME")]
        operations: Option<String>,

        /// Show what would be moved without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// List the configured operation sets
    List,
    /// Move files back according to a cancel file
    Cancel,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = level_filter(cli.verbose, cli.silent);
    env_logger::Builder::from_env(Env::default().default_filter_or(level.as_str())).init();

    let result = match cli.command {
        Commands::Sort {
            folder,
            output,
            operations,
            dry_run,
        } => match run_sort(&SortOptions {
            folder,
            output,
            operations,
            dry_run,
            config: cli.config,
            cancel_file: cli.cancel_file,
            progress: !cli.silent,
        }) {
            // The ledger was printed instead of saved.
            Ok(outcome) if outcome.cancel_error.is_some() => return ExitCode::FAILURE,
            result => result.map(|_| ()),
        },
        Commands::List => run_list(cli.config.as_deref(), cli.verbose > 0).map(|_| ()),
        Commands::Cancel => match cli.cancel_file {
            Some(cancel_file) => run_cancel(&PathBuf::from(cancel_file)).map(|_| ()),
            None => {
                OutputFormatter::error("cancel needs --cancel-file <FILE>");
                return ExitCode::FAILURE;
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
