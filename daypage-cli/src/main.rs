use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use daypage_core::{
    backup::{encrypt_backup, export_backup, read_backup},
    journal::markup::{is_blank, plain_to_markup, strip_markup, timestamp_markup},
    AppContext, AuthGate, EntryStore, JournalConfig, PasswordInput,
};
use dialoguer::Password;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const MAX_UNLOCK_ATTEMPTS: usize = 3;

/// Daypage - a local-first journal with one page per day
#[derive(Parser)]
#[command(name = "daypage")]
#[command(about = "Local-first daily journal", long_about = None)]
struct Cli {
    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show password and journal status
    Status,

    /// Protect the journal with a password
    SetPassword,

    /// Replace the current password
    ChangePassword,

    /// Remove the password gate
    RemovePassword,

    /// Append text to a day's entry (reads stdin when no text is given)
    Write {
        /// Day to write to (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Text to append
        text: Vec<String>,
    },

    /// Print a day's entry as plain text
    Show {
        /// Day to show (YYYY-MM-DD), the selected day by default
        date: Option<NaiveDate>,
    },

    /// List all entries, newest first
    List,

    /// Export all entries to a backup file
    Export {
        /// Output file
        path: PathBuf,

        /// Wrap the backup in the encrypted envelope
        #[arg(long)]
        encrypt: bool,
    },

    /// Merge a backup file into the journal
    Import {
        /// Backup file, plain or encrypted
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let config = match &cli.config {
        Some(path) => JournalConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => JournalConfig::load().context("Failed to load config")?,
    };
    debug!("Using store at {}", config.store_path().display());

    let ctx = AppContext::open(config).context("Failed to open journal store")?;
    let mut gate = AuthGate::new(&ctx).context("Failed to initialize password gate")?;

    match cli.command {
        Commands::Status => handle_status(&ctx, &gate),
        Commands::SetPassword => handle_set_password(&mut gate).await,
        Commands::ChangePassword => handle_change_password(&mut gate).await,
        Commands::RemovePassword => {
            unlock(&mut gate).await?;
            gate.remove_password()?;
            println!("Password removed.");
            Ok(())
        }
        Commands::Write { date, text } => {
            unlock(&mut gate).await?;
            handle_write(&ctx, date, text)
        }
        Commands::Show { date } => {
            unlock(&mut gate).await?;
            handle_show(&ctx, date)
        }
        Commands::List => {
            unlock(&mut gate).await?;
            handle_list(&ctx)
        }
        Commands::Export { path, encrypt } => {
            unlock(&mut gate).await?;
            handle_export(&ctx, &path, encrypt)
        }
        Commands::Import { path } => {
            unlock(&mut gate).await?;
            handle_import(&ctx, &path)
        }
    }
}

/// Prompt until the gate opens or attempts run out
async fn unlock(gate: &mut AuthGate) -> Result<()> {
    if !gate.is_locked() {
        return Ok(());
    }

    for _ in 0..MAX_UNLOCK_ATTEMPTS {
        if let Some(seconds) = gate.lockout_remaining_seconds() {
            bail!("Too many failed attempts; try again in {}s", seconds);
        }

        let typed = Password::new().with_prompt("Password").interact()?;
        let mut input = PasswordInput::from(typed.as_str());
        drop(typed);

        if gate.handle_password_submit(&mut input).await? {
            info!("Journal unlocked");
            return Ok(());
        }
        eprintln!("Incorrect password.");
    }

    bail!("Journal is locked")
}

fn prompt_new_password() -> Result<String> {
    Ok(Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?)
}

fn handle_status(ctx: &AppContext, gate: &AuthGate) -> Result<()> {
    println!("Store:    {}", ctx.config.store_path().display());
    println!(
        "Password: {}",
        if gate.has_password() { "set" } else { "not set" }
    );
    if gate.has_password() {
        // Entry details stay behind the gate
        return Ok(());
    }

    let store = EntryStore::open(ctx)?;
    println!("Entries:  {}", store.entries().len());
    println!("Selected: {}", store.selected_date());
    Ok(())
}

async fn handle_set_password(gate: &mut AuthGate) -> Result<()> {
    if gate.has_password() {
        bail!("A password is already set; use change-password");
    }

    let password = prompt_new_password()?;
    if !gate.set_password(&password).await? {
        bail!("Password must not be empty");
    }
    println!("Password set.");
    Ok(())
}

async fn handle_change_password(gate: &mut AuthGate) -> Result<()> {
    if !gate.has_password() {
        return handle_set_password(gate).await;
    }

    let old = Password::new().with_prompt("Current password").interact()?;
    let new = prompt_new_password()?;
    if !gate.change_password(&old, &new).await? {
        bail!("Current password is incorrect or the new one is empty");
    }
    println!("Password changed.");
    Ok(())
}

fn handle_write(ctx: &AppContext, date: Option<NaiveDate>, text: Vec<String>) -> Result<()> {
    let text = if text.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        text.join(" ")
    };
    if text.trim().is_empty() {
        bail!("Nothing to write");
    }

    let mut store = EntryStore::open(ctx)?;
    let date = date.unwrap_or_else(|| ctx.clock.today());
    let now = ctx.clock.now_millis();

    let mut content = store.content_for(date);
    if !is_blank(&content) && store.needs_timestamp()? {
        content.push_str(&timestamp_markup(now));
    }
    content.push_str(&plain_to_markup(text.trim_end()));

    store.save_entry_for(date, &content, Some(now))?;
    println!("Saved entry for {}.", date);
    Ok(())
}

fn handle_show(ctx: &AppContext, date: Option<NaiveDate>) -> Result<()> {
    let store = EntryStore::open(ctx)?;
    let date = date.unwrap_or_else(|| store.selected_date());

    match store.entry(date) {
        Some(entry) if !is_blank(&entry.content) => {
            println!("{}\n", date.format("%A, %B %-d, %Y"));
            println!("{}", strip_markup(&entry.content).trim());
        }
        _ => println!("No entry for {}.", date),
    }
    Ok(())
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let store = EntryStore::open(ctx)?;
    for entry in store.entries() {
        let text = strip_markup(&entry.content);
        let preview = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        let preview: String = preview.chars().take(60).collect();
        println!("{}  {}", entry.date, preview);
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, path: &Path, encrypt: bool) -> Result<()> {
    let store = EntryStore::open(ctx)?;
    let mut document = export_backup(store.entries());
    if encrypt {
        document = encrypt_backup(&document)?;
    }

    std::fs::write(path, document)
        .with_context(|| format!("Failed to write backup to {}", path.display()))?;
    let written = store
        .entries()
        .iter()
        .filter(|e| !is_blank(&e.content))
        .count();
    println!("Exported {} entries to {}.", written, path.display());
    Ok(())
}

fn handle_import(ctx: &AppContext, path: &Path) -> Result<()> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup from {}", path.display()))?;
    let imported = read_backup(&document).context("Failed to read backup")?;

    let mut store = EntryStore::open(ctx)?;
    let report = store.import_backup(&imported, ctx.clock.now_millis())?;
    println!(
        "Imported {} days: {} new, {} merged, {} unchanged.",
        imported.len(),
        report.inserted,
        report.merged,
        report.unchanged
    );
    Ok(())
}
