use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use potledger::cli::{
    handle_account_command, handle_income_command, handle_log_command, handle_payment_command,
    handle_pot_command, handle_process_command, handle_reduce_command, handle_reset_command,
    handle_transaction_command, handle_transfer_command,
};
use potledger::config::settings::SETTING_KEYS;
use potledger::config::{LedgerPaths, Settings};
use potledger::state::LedgerState;
use potledger::storage::{encode, write_atomic};
use potledger::{LedgerEngine, LedgerError, LedgerResult};

/// Environment variable holding the log filter (e.g. `debug`, `potledger=info`)
const LOG_ENV: &str = "POTLEDGER_LOG";

#[derive(Parser)]
#[command(
    name = "potledger",
    author = "Kaylee Beyene",
    version,
    about = "Personal-finance ledger with pots and recurring schedules",
    long_about = "potledger keeps accounts and the pots inside them, runs income, \
                  transfer, monthly and yearly schedules against them, and records \
                  every execution so history can be inspected later."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, settings and an empty ledger
    Init,

    /// Show or change settings
    Config {
        /// Setting name
        key: Option<String>,
        /// New value
        value: Option<String>,
    },

    /// Account management commands
    #[command(subcommand)]
    Account(potledger::cli::AccountCommands),

    /// Pot management commands
    #[command(subcommand)]
    Pot(potledger::cli::PotCommands),

    /// Monthly scheduled payments
    #[command(subcommand)]
    Payment(potledger::cli::PaymentCommands),

    /// Income schedules
    #[command(subcommand)]
    Income(potledger::cli::IncomeCommands),

    /// Transfer schedules
    #[command(subcommand)]
    Transfer(potledger::cli::TransferCommands),

    /// Transaction records, yearly items and card charges
    #[command(subcommand, alias = "txn")]
    Transaction(potledger::cli::TransactionCommands),

    /// Execute everything due, then the monthly reduction if it is due
    Process {
        /// Processing date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<String>,
    },

    /// Zero every balance not excluded from reset
    Reset {
        #[arg(long)]
        yes: bool,
    },

    /// Apply this month's balance reduction now
    Reduce {
        #[arg(long)]
        date: Option<String>,
    },

    /// Processed-transaction and reduction logs
    #[command(subcommand)]
    Logs(potledger::cli::LogCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    run(cli)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}

async fn run(cli: Cli) -> LedgerResult<()> {
    // Initialize paths and settings
    let paths = LedgerPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("potledger - pots, schedules and yearly transactions");
        println!();
        println!("Run 'potledger --help' for usage information.");
        println!("Run 'potledger init' to get started.");
        return Ok(());
    };

    match command {
        Commands::Init => handle_init(&paths, &settings),
        Commands::Config { key, value } => handle_config(&paths, &mut settings, key, value),
        other => dispatch(&paths, &settings, other).await,
    }
}

async fn dispatch(paths: &LedgerPaths, settings: &Settings, command: Commands) -> LedgerResult<()> {
    let engine = LedgerEngine::open_file(paths.ledger_file()).await?;

    match command {
        Commands::Account(cmd) => handle_account_command(&engine, settings, cmd).await,
        Commands::Pot(cmd) => handle_pot_command(&engine, settings, cmd).await,
        Commands::Payment(cmd) => handle_payment_command(&engine, settings, cmd).await,
        Commands::Income(cmd) => handle_income_command(&engine, settings, cmd).await,
        Commands::Transfer(cmd) => handle_transfer_command(&engine, settings, cmd).await,
        Commands::Transaction(cmd) => handle_transaction_command(&engine, settings, cmd).await,
        Commands::Process { date } => handle_process_command(&engine, settings, date).await,
        Commands::Reset { yes } => handle_reset_command(&engine, yes).await,
        Commands::Reduce { date } => handle_reduce_command(&engine, date).await,
        Commands::Logs(cmd) => handle_log_command(&engine, cmd).await,
        Commands::Init | Commands::Config { .. } => Ok(()),
    }
}

fn handle_init(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<()> {
    println!("Initializing potledger at: {}", paths.base_dir().display());
    paths.ensure_directories()?;
    settings.save(paths)?;

    let ledger = paths.ledger_file();
    if ledger.exists() {
        println!("Existing ledger kept: {}", ledger.display());
    } else {
        write_atomic(&ledger, &encode(&LedgerState::new())?)?;
        println!("Created empty ledger: {}", ledger.display());
    }

    println!("Initialization complete!");
    println!();
    println!("Run 'potledger account create <name>' to add your first account.");
    Ok(())
}

fn handle_config(
    paths: &LedgerPaths,
    settings: &mut Settings,
    key: Option<String>,
    value: Option<String>,
) -> LedgerResult<()> {
    match (key, value) {
        (None, _) => {
            println!("potledger Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Ledger file:    {}", paths.ledger_file().display());
            println!();
            println!("Settings:");
            for key in SETTING_KEYS {
                println!("  {} = {}", key, settings.get(key).unwrap_or_default());
            }
        }
        (Some(key), None) => {
            let value = settings
                .get(&key)
                .ok_or_else(|| LedgerError::Config(format!("Unknown setting '{}'", key)))?;
            println!("{}", value);
        }
        (Some(key), Some(value)) => {
            settings.set(&key, &value)?;
            settings.save(paths)?;
            println!("{} = {}", key, settings.get(&key).unwrap_or_default());
        }
    }
    Ok(())
}
