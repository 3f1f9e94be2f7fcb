use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use common::ocr::ImageUpload;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use auth::validation::Criterion;
use auth::{SessionError, evaluate_password};
use history::config::ClientConfig;
use history::{AppContext, SavedTo, export};

/// Convert handwriting images to text and manage conversion history
#[derive(Parser)]
#[command(name = "ink2text", version)]
struct Cli {
    /// Configuration file (default: ./ink2text.toml)
    #[arg(long, global = true, env = "INK2TEXT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INK2TEXT_PASSWORD")]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check a password against the strength rules
    Strength { password: String },
    /// Extract text from an image
    Convert {
        image: PathBuf,
        /// Also write the text to this file or directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Browse or clear conversion history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List past conversions, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the text of one conversion
    Show {
        id: String,
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Delete all history
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.clone())?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let context = AppContext::from_config(config)?;
    info!("ink2text client started");

    run(cli.command, &context).await
}

async fn run(command: Command, context: &AppContext) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let record = report_session(context.sessions.start_session(&email, &password).await)?;
            println!("Login successful! Welcome, {}", record.display_name());
        }
        Command::Signup {
            name,
            email,
            password,
            confirm,
        } => {
            let record = report_session(
                context
                    .sessions
                    .sign_up(name.as_deref(), &email, &password, &confirm)
                    .await,
            )?;
            println!("Account created successfully! Welcome, {}", record.display_name());
        }
        Command::Logout => {
            context.sessions.end_session().await?;
            println!("Logged out successfully");
        }
        Command::Whoami => match context.sessions.current().await {
            Some(record) => println!("{} <{}>", record.display_name(), record.email),
            None => println!("Not logged in"),
        },
        Command::Strength { password } => {
            let evaluation = evaluate_password(&password);
            println!("{}: {}", evaluation.strength, evaluation.message);
        }
        Command::Convert { image, save } => {
            let upload = ImageUpload::from_path(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let conversion = context.converter.convert(upload).await?;

            println!("{}", conversion.text);
            match conversion.saved_to {
                SavedTo::Remote(_) => eprintln!("Text extracted and saved to database!"),
                SavedTo::Local => eprintln!("Text extracted! (Saved locally)"),
            }

            if let Some(target) = save {
                let path =
                    export::save_text(&target, &conversion.text, Local::now().date_naive()).await?;
                eprintln!("Saved to {}", path.display());
            }
        }
        Command::History { action } => run_history(action, context).await?,
    }

    Ok(())
}

async fn run_history(action: HistoryAction, context: &AppContext) -> Result<()> {
    if !context.sessions.is_signed_in().await {
        anyhow::bail!("Please login to view history");
    }

    match action {
        HistoryAction::List { json } => {
            let entries = context.history.list_history().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No history yet. Start converting images!");
            } else {
                for entry in &entries {
                    println!(
                        "{:>14}  {:<20}  {}  {}",
                        entry.id.to_string(),
                        entry.origin_file_name,
                        entry.created_at,
                        entry.preview(50)
                    );
                }
            }
        }
        HistoryAction::Show { id, save } => {
            let text = context
                .history
                .load_entry(&id)
                .await
                .with_context(|| format!("No history entry {}", id))?;
            println!("{}", text);

            if let Some(target) = save {
                let path = export::save_text(&target, &text, Local::now().date_naive()).await?;
                eprintln!("Saved to {}", path.display());
            }
        }
        HistoryAction::Clear => {
            let summary = context.history.clear_history().await;
            if summary.is_complete() {
                println!("History cleared");
            } else {
                for (id, reason) in &summary.failed {
                    eprintln!("Could not delete {}: {}", id, reason);
                }
                anyhow::bail!(
                    "History partially cleared ({} of {} remote entries deleted)",
                    summary.succeeded.len(),
                    summary.succeeded.len() + summary.failed.len()
                );
            }
        }
    }

    Ok(())
}

/// Print the per-criterion breakdown when a password is refused
fn report_session<T>(result: Result<T, SessionError>) -> Result<T> {
    if let Err(SessionError::WeakPassword(evaluation)) = &result {
        for criterion in Criterion::ALL {
            let met = evaluation.requirements.is_met(criterion);
            eprintln!("  [{}] {}", if met { "x" } else { " " }, criterion.requirement());
        }
    }
    Ok(result?)
}
