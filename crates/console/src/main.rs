//! `stakeboard` -- admin console for today's profit distribution.
//!
//! Shows today's distribution status, queues/modifies/cancels the single
//! daily distribution, and edits the multi-slot ROS allocation.  `watch`
//! keeps polling with a live countdown until interrupted.
//!
//! # Environment variables
//!
//! | Variable               | Default                     | Description                  |
//! |------------------------|-----------------------------|------------------------------|
//! | `STAKEBOARD_API_URL`   | `http://localhost:4000/api` | Platform API base URL        |
//! | `STAKEBOARD_API_TOKEN` | --                          | Admin bearer token           |
//! | `STAKEBOARD_2FA_CODE`  | --                          | 2FA code sent with mutations |
//! | `STAKEBOARD_DRAFT_DIR` | `.stakeboard`               | Local draft cache directory  |
//! | `REQUEST_TIMEOUT_SECS` | `30`                        | HTTP request timeout         |
//!
//! All variables are optional.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stakeboard_client::two_factor::{NoTwoFactor, StaticCode};
use stakeboard_client::{DistributionApiClient, DistributionService, TwoFactorProvider};
use stakeboard_console::config::ConsoleConfig;
use stakeboard_console::countdown::spawn_countdown;
use stakeboard_console::draft::DraftStore;
use stakeboard_console::error::ConsoleError;
use stakeboard_console::notify::{Notifier, Toast};
use stakeboard_console::poller::StatusPoller;
use stakeboard_console::render::{render_slots, render_status, render_toast};
use stakeboard_console::slots::SlotAllocationWorkflow;
use stakeboard_console::workflow::TodayDistributionWorkflow;

#[derive(Parser, Debug)]
#[command(name = "stakeboard")]
#[command(version)]
#[command(about = "Schedule and monitor today's profit distribution")]
#[command(propagate_version = true)]
struct Args {
    /// Platform API base URL (overrides STAKEBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Admin bearer token (overrides STAKEBOARD_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// 2FA code for mutations (overrides STAKEBOARD_2FA_CODE)
    #[arg(long, global = true)]
    otp: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show today's distribution status
    Status {
        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },

    /// Poll status with a live countdown until Ctrl-C
    Watch,

    /// Queue today's distribution
    Queue(ValueArgs),

    /// Modify today's queued distribution
    Modify(ValueArgs),

    /// Cancel today's queued distribution
    Cancel {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Multi-slot ROS allocation
    Slots {
        /// Current total stakes, for per-slot payout estimates
        #[arg(long)]
        stakes: Option<f64>,

        #[command(subcommand)]
        command: SlotCommands,
    },
}

// =============================================================================
// Command Arguments
// =============================================================================

#[derive(clap::Args, Debug)]
struct ValueArgs {
    /// ROS percentage (0-100)
    #[arg(long)]
    ros: Option<f64>,

    /// Premium pool amount
    #[arg(long)]
    premium: Option<f64>,

    /// Performance pool amount
    #[arg(long)]
    performance: Option<f64>,

    /// Free-form description
    #[arg(long)]
    description: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum SlotCommands {
    /// Show configured slots with today's allocations
    Show,

    /// Set one slot's ROS percentage and save
    Set {
        /// Slot number (1-based)
        #[arg(long)]
        slot: u32,

        /// ROS percentage (0-100)
        #[arg(long)]
        ros: f64,
    },

    /// Set every unlocked slot and save
    SetAll {
        /// ROS percentage (0-100)
        #[arg(long)]
        ros: f64,
    },

    /// Zero every unlocked slot and save
    Clear,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stakeboard=info,stakeboard_console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = ConsoleConfig::from_env().context("failed to load configuration")?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(token) = args.token {
        config.api_token = Some(token);
    }
    if let Some(otp) = args.otp {
        config.two_factor_code = Some(otp);
    }

    tracing::info!(api_url = %config.api_url, "Starting stakeboard");

    let api = build_client(&config).context("failed to build API client")?;
    let notifier = Notifier::default();
    let mut toasts = notifier.subscribe();

    let result = match args.command {
        Commands::Status { output } => status(api, notifier, output).await,
        Commands::Watch => watch(api, notifier, &mut toasts).await,
        Commands::Queue(values) => queue(api, notifier, &config, values).await,
        Commands::Modify(values) => modify(api, notifier, &config, values).await,
        Commands::Cancel { yes } => cancel(api, notifier, yes).await,
        Commands::Slots { stakes, command } => slots(api, notifier, stakes, command).await,
    };

    print_pending_toasts(&mut toasts);

    if let Err(e) = result {
        // Already reported as a toast.
        tracing::debug!(error = %e, "Command failed");
        std::process::exit(1);
    }
    Ok(())
}

fn build_client(config: &ConsoleConfig) -> Result<Arc<dyn DistributionService>, ConsoleError> {
    let two_factor: Arc<dyn TwoFactorProvider> = match &config.two_factor_code {
        Some(code) => Arc::new(StaticCode::new(code.clone())),
        None => Arc::new(NoTwoFactor),
    };

    let mut client =
        DistributionApiClient::with_timeout(config.api_url.clone(), config.request_timeout)?
            .with_two_factor(two_factor);
    if let Some(token) = &config.api_token {
        client = client.with_bearer_token(token.clone());
    }
    Ok(Arc::new(client))
}

// =============================================================================
// Commands
// =============================================================================

async fn status(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    output: OutputFormat,
) -> Result<(), ConsoleError> {
    let mut workflow = TodayDistributionWorkflow::new(api, notifier);
    workflow.refresh().await?;

    if let Some(status) = workflow.status() {
        match output {
            OutputFormat::Table => {
                let countdown = stakeboard_core::countdown::countdown(status, chrono::Utc::now());
                print!("{}", render_status(status, countdown.as_ref()));
            }
            OutputFormat::Json => match serde_json::to_string_pretty(status) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "Failed to encode status"),
            },
        }
    }
    Ok(())
}

async fn watch(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    toasts: &mut broadcast::Receiver<Toast>,
) -> Result<(), ConsoleError> {
    let cancel = CancellationToken::new();
    let poller = StatusPoller::new(api, notifier).spawn(cancel.child_token());
    let countdown = spawn_countdown(poller.subscribe(), poller.refetch(), cancel.child_token());

    let mut status_rx = poller.subscribe();
    let mut countdown_rx = countdown.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = status_rx.borrow_and_update().clone();
                if let Some(status) = latest {
                    print!("{}", render_status(&status, countdown.current().as_ref()));
                }
            }
            changed = countdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let display = countdown_rx.borrow_and_update().clone();
                if let Some(display) = display {
                    println!("  Executes in: {}", display.text());
                }
            }
            toast = toasts.recv() => {
                match toast {
                    Ok(toast) => eprintln!("{}", render_toast(&toast)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Dropped toasts");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    cancel.cancel();
    countdown.stop().await;
    poller.stop().await;
    Ok(())
}

async fn queue(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    config: &ConsoleConfig,
    values: ValueArgs,
) -> Result<(), ConsoleError> {
    let mut workflow = TodayDistributionWorkflow::new(api, notifier)
        .with_draft_store(DraftStore::new(&config.draft_dir));
    workflow.refresh().await?;
    apply_values(&mut workflow, values)?;
    workflow.submit().await?;
    print_workflow_status(&workflow);
    Ok(())
}

async fn modify(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    config: &ConsoleConfig,
    values: ValueArgs,
) -> Result<(), ConsoleError> {
    let mut workflow = TodayDistributionWorkflow::new(api, notifier)
        .with_draft_store(DraftStore::new(&config.draft_dir));
    workflow.refresh().await?;
    if !workflow.is_editing() {
        workflow.start_editing()?;
    }
    apply_values(&mut workflow, values)?;
    workflow.submit().await?;
    print_workflow_status(&workflow);
    Ok(())
}

async fn cancel(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    yes: bool,
) -> Result<(), ConsoleError> {
    let mut workflow = TodayDistributionWorkflow::new(api, notifier);
    workflow.refresh().await?;

    let prompt = workflow.request_cancel()?;
    if !yes && !confirm(prompt) {
        workflow.dismiss_cancel();
        println!("Cancellation aborted.");
        return Ok(());
    }

    workflow.confirm_cancel().await?;
    print_workflow_status(&workflow);
    Ok(())
}

async fn slots(
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    stakes: Option<f64>,
    command: SlotCommands,
) -> Result<(), ConsoleError> {
    let mut workflow = SlotAllocationWorkflow::load(api, notifier).await?;
    if let Some(stakes) = stakes {
        workflow = workflow.with_total_stakes(stakes);
    }

    match command {
        SlotCommands::Show => {}
        SlotCommands::Set { slot, ros } => {
            workflow.set_percentage(slot, ros)?;
            workflow.submit().await?;
        }
        SlotCommands::SetAll { ros } => {
            workflow.set_all(ros);
            workflow.submit().await?;
        }
        SlotCommands::Clear => {
            workflow.clear();
            workflow.submit().await?;
        }
    }

    print!(
        "{}",
        render_slots(&workflow.rows(), workflow.editor().total(), workflow.total_warning())
    );
    Ok(())
}

// ---- private helpers ----

fn apply_values(
    workflow: &mut TodayDistributionWorkflow,
    values: ValueArgs,
) -> Result<(), ConsoleError> {
    workflow.update_form(|form| {
        if let Some(ros) = values.ros {
            form.ros_percentage = ros;
        }
        if let Some(premium) = values.premium {
            form.premium_pool_amount = premium;
        }
        if let Some(performance) = values.performance {
            form.performance_pool_amount = performance;
        }
        if let Some(description) = values.description {
            form.description = description;
        }
    })
}

fn print_workflow_status(workflow: &TodayDistributionWorkflow) {
    if let Some(status) = workflow.status() {
        let countdown = stakeboard_core::countdown::countdown(status, chrono::Utc::now());
        print!("{}", render_status(status, countdown.as_ref()));
    }
}

fn print_pending_toasts(toasts: &mut broadcast::Receiver<Toast>) {
    while let Ok(toast) = toasts.try_recv() {
        eprintln!("{}", render_toast(&toast));
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
