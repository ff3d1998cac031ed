use anyhow::Context;
use clap::{Parser, Subcommand};
use hisab_core::calendar::{self, Calendar};
use hisab_core::TransactionId;
use hisab_storage::JsonFileStore;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{AppState, EditInput, FilterInput, TransactionInput};
use config::Config;

/// Personal income and expense tracker with Bikram Sambat dates.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file [default: platform config dir]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the transaction file. Overrides HISAB_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new transaction
    Add(TransactionInput),
    /// Change an existing transaction
    Edit {
        id: String,
        #[command(flatten)]
        input: EditInput,
    },
    /// Remove a transaction
    Delete { id: String },
    /// Show the newest transactions
    Recent {
        #[arg(long)]
        limit: Option<usize>,
        /// Calendar to show dates in
        #[arg(long)]
        show: Option<Calendar>,
    },
    /// Browse transactions, optionally filtered
    List {
        #[command(flatten)]
        filters: FilterInput,
        /// Calendar to show dates in
        #[arg(long)]
        show: Option<Calendar>,
    },
    /// Total income, expenses and net balance
    Summary,
    /// Write transactions to a CSV file
    Export {
        /// Export only transactions matching the filters, with BS and AD dates
        #[arg(long)]
        filtered: bool,
        #[command(flatten)]
        filters: FilterInput,
        /// Output file or directory [default: current directory]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a date between BS and AD
    Convert {
        /// Date as YYYY-MM-DD
        date: String,
        /// Calendar `date` is written in
        #[arg(long, default_value = "bs")]
        from: Calendar,
    },
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_state(cli_config: Option<&PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<AppState<JsonFileStore>> {
    let config = Config::load(cli_config.map(PathBuf::as_path))?;
    let data_dir = config.resolve_data_dir(data_dir)?;
    let backend = JsonFileStore::open(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
    tracing::debug!("Using data directory {}", data_dir.display());
    Ok(AppState::new(config, backend))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let config = cli.config;
    let data_dir = cli.data_dir;
    // Conversion needs neither config nor storage.
    let open = move || open_state(config.as_ref(), data_dir);

    match cli.command {
        Command::Convert { date, from } => {
            commands::convert(&date, from, &mut out)?;
        }
        Command::Add(input) => {
            commands::add(&mut open()?, input, &mut out)?;
        }
        Command::Edit { id, input } => {
            commands::edit(&mut open()?, &TransactionId::from(id), input, &mut out)?;
        }
        Command::Delete { id } => {
            commands::delete(&mut open()?, &TransactionId::from(id), &mut out)?;
        }
        Command::Recent { limit, show } => commands::recent(&open()?, limit, show, &mut out)?,
        Command::List { filters, show } => {
            commands::list(&open()?, &filters, show, &mut out)?;
        }
        Command::Summary => commands::summary(&open()?, &mut out)?,
        Command::Export {
            filtered,
            filters,
            output,
        } => {
            let filters = filtered.then_some(&filters);
            commands::export(&open()?, filters, output, calendar::today(), &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {e:?}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_defaults() {
        let cli = Cli::try_parse_from(["hisab", "add", "--source", "Tea", "--amount", "20"]).unwrap();
        let Command::Add(input) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(input.calendar, Calendar::Bs);
        assert_eq!(input.kind, hisab_core::TransactionType::Expense);
        assert_eq!(input.date, None);
    }

    #[test]
    fn parses_filtered_export() {
        let cli = Cli::try_parse_from([
            "hisab", "export", "--filtered", "--type", "income", "--from", "2080-01-01", "-o", "out.csv",
        ])
        .unwrap();
        let Command::Export { filtered, filters, output } = cli.command else {
            panic!("expected export");
        };
        assert!(filtered);
        assert_eq!(filters.kind, hisab_core::TypeSelector::Income);
        assert_eq!(filters.from.as_deref(), Some("2080-01-01"));
        assert_eq!(output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Cli::try_parse_from(["hisab", "list", "--type", "transfer"]).is_err());
    }

    #[test]
    fn global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["hisab", "summary", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
