use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use arena_admin::api::client::HttpReportsApi;
use arena_admin::config::{Config, Mode};
use arena_admin::output::terminal;
use arena_admin::reports::models::{ReportFilters, ReportStatus};
use arena_admin::reports::patch::ReportPatch;
use arena_admin::store::{FetchOutcome, ReportsStore, StoreOptions};
use arena_admin::sync::fallback::{ErrorFallback, FallbackPolicy, PlaceholderFallback};

/// arena-admin: report moderation for the sports-events platform.
///
/// Lists reported users, shows the reports filed against them, and
/// updates, removes or acts on those reports through the admin API.
#[derive(Parser)]
#[command(name = "arena-admin", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Reviewed,
}

impl From<StatusArg> for ReportStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => ReportStatus::Pending,
            StatusArg::Reviewed => ReportStatus::Reviewed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List reported users, one row per user
    Reports {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Rows per page (default: ADMIN_PAGE_LIMIT or 10)
        #[arg(long)]
        limit: Option<u32>,

        /// Only reports with this status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },

    /// Show every report filed against one user
    Subject {
        /// The reported user's id
        id: String,
    },

    /// Set admin notes and/or status on a report
    Update {
        /// The report id
        id: String,

        /// Admin notes; non-empty marks the report reviewed, empty marks it pending
        #[arg(long)]
        notes: Option<String>,

        /// Explicit status (overridden by --notes)
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Delete a report
    Remove {
        /// The report id
        id: String,
    },

    /// Block a reported user
    Block {
        /// The reported user's id
        id: String,

        /// Reason shown to the user
        #[arg(long)]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("arena_admin=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let store = build_store(&config)?;
    store.init().await;

    match cli.command {
        Commands::Reports {
            page,
            limit,
            status,
            search,
        } => {
            let filters = ReportFilters {
                status: status.map(ReportStatus::from),
                search,
            };
            if filters != ReportFilters::default() {
                // Filters reset the page, so apply them before paging.
                let spinner = spinner("Applying filters…");
                let outcome = store.set_filters(filters).await;
                spinner.finish_and_clear();
                check_outcome(&store, &outcome).await?;
            }

            let spinner = spinner("Fetching reports…");
            let (subjects, page_state, outcome) = store
                .get_reported_subjects(page, limit.unwrap_or(config.page_limit))
                .await;
            spinner.finish_and_clear();
            check_outcome(&store, &outcome).await?;

            terminal::display_subject_list(&subjects, &page_state);
        }

        Commands::Subject { id } => {
            let spinner = spinner("Fetching subject reports…");
            let outcome = store.select_subject(&id).await?;
            spinner.finish_and_clear();
            check_outcome(&store, &outcome).await?;

            let snapshot = store.snapshot().await;
            if let Some(detail) = snapshot.selected {
                terminal::display_subject_reports(&detail.subject_id, &detail.reports);
            }
        }

        Commands::Update { id, notes, status } => {
            let patch = ReportPatch {
                admin_notes: notes,
                status: status.map(ReportStatus::from),
            };
            store.update_report(&id, patch).await?;
            println!("{} Report {} updated", "✓".green(), id.bold());
        }

        Commands::Remove { id } => {
            store.remove_report(&id).await?;
            println!("{} Report {} removed", "✓".green(), id.bold());
        }

        Commands::Block { id, reason } => {
            store.block_subject(&id, &reason).await?;
            println!("{} User {} blocked", "✓".green(), id.bold());
        }
    }

    store.dispose().await;
    Ok(())
}

/// Wire the HTTP API, fallback policy and options into a store.
fn build_store(config: &Config) -> Result<ReportsStore> {
    let api = HttpReportsApi::new(&config.api_url, config.api_token.clone())?;
    let policy: Arc<dyn FallbackPolicy> = match config.mode {
        Mode::Development => {
            info!("Development mode: timed-out fetches show sample data");
            Arc::new(PlaceholderFallback::development())
        }
        Mode::Production => Arc::new(ErrorFallback),
    };
    Ok(ReportsStore::new(
        Arc::new(api),
        policy,
        StoreOptions::from_config(config),
    ))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Turn a failed fetch into an error for the CLI. A stale outcome means
/// the timeout fallback ran first, so its error (if any) is reported.
async fn check_outcome(store: &ReportsStore, outcome: &FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Failed(message) => anyhow::bail!("{message}"),
        FetchOutcome::Inactive => anyhow::bail!("store is not initialized"),
        FetchOutcome::Stale => match store.snapshot().await.error {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}
