use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use hkutils::{Config, FileStore, Preferences, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hkutils")]
#[command(about = "Preference, file, JSON, hashing and date utilities")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/hkutils/config.yml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate version-4 UUIDs
    Uuid {
        /// How many to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Print the MD5 hex digest of a string
    Md5 { text: String },

    /// Format a timestamp in UTC (default: now)
    Date {
        /// RFC 3339 timestamp to format
        #[arg(long)]
        at: Option<String>,

        /// Print only YYYY-MM-DD
        #[arg(long)]
        date_only: bool,
    },

    /// Coerce an archived value (tagged JSON) into a plain JSON tree
    Json { value: String },

    /// Preference store operations
    Pref {
        #[command(subcommand)]
        command: PrefCommands,
    },

    /// File archive operations
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Show the OS version, optionally comparing it to a threshold
    Version {
        #[arg(long)]
        at_least: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrefCommands {
    /// Print the object saved under a key
    Get { key: String },
    /// Save a JSON value under a key
    Set { key: String, json: String },
    /// Remove the object saved under a key
    Remove { key: String },
    /// List object keys
    Keys,
    /// Print the boolean saved under a key
    GetBool { key: String },
    /// Save a boolean under a key
    SetBool {
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Remove every boolean entry
    ClearBools,
}

#[derive(Subcommand)]
enum FileCommands {
    /// Save a JSON value to a file
    Save { filename: String, json: String },
    /// Print the JSON value stored in a file
    Load { filename: String },
    /// Delete a file
    Remove { filename: String },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Uuid { count } => {
            for _ in 0..count {
                println!("{}", hkutils::generate_uuid());
            }
        }
        Commands::Md5 { text } => {
            println!("{}", hkutils::md5_from_string(&text));
        }
        Commands::Date { at, date_only } => {
            let date = match at {
                Some(s) => DateTime::parse_from_rfc3339(&s)
                    .with_context(|| format!("Invalid RFC 3339 timestamp: {}", s))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            println!("{}", hkutils::string_from_date_with(Some(&date), date_only));
        }
        Commands::Json { value } => {
            let value: Value = serde_json::from_str(&value).context("Invalid archived value")?;
            println!("{}", serde_json::to_string_pretty(&hkutils::json_value(&value))?);
        }
        Commands::Pref { command } => run_pref(&config, command)?,
        Commands::File { command } => run_file(&config, command)?,
        Commands::Version { at_least } => {
            let version = hkutils::system_version();
            println!("System version: {}", version.unwrap_or("unknown"));

            if let Some(target) = at_least {
                if hkutils::system_version_gte!(&target) {
                    println!("{} {} >= {}", "Yes:".green().bold(), version.unwrap_or("unknown"), target);
                } else {
                    println!("{} {} < {}", "No:".yellow().bold(), version.unwrap_or("unknown"), target);
                }
            }
        }
    }

    Ok(())
}

fn run_pref(config: &Config, command: PrefCommands) -> Result<()> {
    let prefs = Preferences::open(config.preferences_path())?;

    match command {
        PrefCommands::Get { key } => match prefs.object::<serde_json::Value>(&key)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("{}", "(not set)".dimmed()),
        },
        PrefCommands::Set { key, json } => {
            let value: serde_json::Value = serde_json::from_str(&json).context("Invalid JSON value")?;
            prefs.set_object(&key, &value)?;
            println!("{} {}", "Saved".green().bold(), key);
        }
        PrefCommands::Remove { key } => {
            if prefs.remove_object(&key)? {
                println!("{} {}", "Removed".green().bold(), key);
            } else {
                println!("{}", "(not set)".dimmed());
            }
        }
        PrefCommands::Keys => {
            for key in prefs.object_keys()? {
                println!("{}", key);
            }
        }
        PrefCommands::GetBool { key } => println!("{}", prefs.bool(&key)?),
        PrefCommands::SetBool { key, value } => {
            prefs.set_bool(&key, value)?;
            println!("{} {} = {}", "Saved".green().bold(), key, value);
        }
        PrefCommands::ClearBools => {
            let removed = prefs.clear_bools()?;
            println!("{} {} boolean entries", "Cleared".green().bold(), removed);
        }
    }

    Ok(())
}

fn run_file(config: &Config, command: FileCommands) -> Result<()> {
    let store = FileStore::open(config.files_path())?;

    match command {
        FileCommands::Save { filename, json } => {
            let value: serde_json::Value = serde_json::from_str(&json).context("Invalid JSON value")?;
            store.save(&value, &filename)?;
            println!("{} {}", "Saved".green().bold(), store.path_for(&filename)?.display());
        }
        FileCommands::Load { filename } => match store.load::<serde_json::Value>(&filename)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("{}", "(no such file)".dimmed()),
        },
        FileCommands::Remove { filename } => {
            if store.remove(&filename)? {
                println!("{} {}", "Removed".green().bold(), filename);
            } else {
                println!("{}", "(no such file)".dimmed());
            }
        }
    }

    Ok(())
}
