use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use finvault::cli::{
    handle_backup_command, handle_decrypt, handle_export, handle_import,
    handle_passphrase_command, handle_status, handle_wipe, BackupCommands, PassphraseCommands,
};
use finvault::config::{Settings, VaultPaths};
use finvault::storage::Store;

/// Environment variable holding the log filter
const LOG_ENV: &str = "FINVAULT_LOG";

#[derive(Parser)]
#[command(
    name = "finvault",
    author = "Kaylee Beyene",
    version,
    about = "Local personal-finance record store with encrypted backups",
    long_about = "finvault keeps accounts, transactions, loans, subscriptions, budgets, \
                  goals, recurring rules and credit cards in a local data directory, \
                  and moves them in and out as versioned JSON exports, optionally \
                  encrypted with a passphrase."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show paths, schema version and record counts
    Status,

    /// Export every table as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encrypt the export with a passphrase
        #[arg(short, long)]
        encrypt: bool,
    },

    /// Merge an export file into the store
    Import {
        /// Export file (plaintext or encrypted)
        file: PathBuf,
    },

    /// Decrypt an encrypted export
    Decrypt {
        /// Encrypted export file
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every record and the local settings
    Wipe {
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },

    /// Backup file management
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Passphrase verifier management
    #[command(subcommand)]
    Passphrase(PassphraseCommands),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        println!("finvault - local personal-finance records");
        println!();
        println!("Run 'finvault --help' for usage information.");
        return Ok(());
    };

    // Decrypting a file needs no store
    if let Commands::Decrypt { file, output } = &command {
        handle_decrypt(file, output.as_deref())?;
        return Ok(());
    }

    let paths = VaultPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    let store = Store::open(paths.clone())?;

    match command {
        Commands::Status => handle_status(&store, &paths, &settings)?,
        Commands::Export { output, encrypt } => handle_export(&store, output.as_deref(), encrypt)?,
        Commands::Import { file } => handle_import(&store, &file)?,
        Commands::Wipe { force } => handle_wipe(&store, force)?,
        Commands::Backup(cmd) => handle_backup_command(&store, &paths, &settings, cmd)?,
        Commands::Passphrase(cmd) => handle_passphrase_command(&paths, &mut settings, cmd)?,
        Commands::Decrypt { .. } => {}
    }

    store.close()?;
    Ok(())
}
