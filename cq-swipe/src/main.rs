//! cq-swipe - terminal swipe client
//!
//! Fetches one candidate queue from the matching backend and lets the user
//! decide on each card from stdin. Events are printed as they happen;
//! pending commits are awaited before exit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cq_common::config::{ClientConfig, ConfigOverrides};
use cq_common::events::{EventBus, MatchMode, SessionState};
use cq_swipe::cli::{self, TerminalCommand};
use cq_swipe::{Classification, HttpMatchApi, SessionController, SessionSettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cq-swipe
#[derive(Parser, Debug)]
#[command(name = "cq-swipe")]
#[command(about = "Swipe through CollabQuest match candidates")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "CQ_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long)]
    token: Option<String>,

    /// What to swipe on: users or projects
    #[arg(short, long, default_value = "users")]
    mode: MatchMode,

    /// Project to recruit for (users mode)
    #[arg(short, long)]
    project_id: Option<String>,

    /// Drag release threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Emit spoken announcements for each card
    #[arg(long)]
    tts: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_path: args.config.clone(),
        api_url: args.api_url.clone(),
        token: args.token.clone(),
        swipe_threshold: args.threshold,
        tts_enabled: args.tts.then_some(true),
        log_level: args.log_level.clone(),
    };
    let config = ClientConfig::resolve(&overrides).context("Failed to load configuration")?;

    // Logs go to stderr; stdout is the card view
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cq_swipe={level},cq_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cq-swipe {}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.api_url);

    let api = Arc::new(HttpMatchApi::new(&config).context("Failed to build HTTP client")?);
    let events = Arc::new(EventBus::new(config.event_capacity));
    let settings = SessionSettings::from_config(&config, args.mode, args.project_id.clone());
    let mut session = SessionController::new(api, settings, Arc::clone(&events));

    let printer = tokio::spawn(print_events(session.subscribe()));

    let run_result = run(&mut session).await;

    let summary = session.settle_all().await;
    drop(session);
    drop(events);
    if let Err(e) = printer.await {
        warn!("Event printer ended abnormally: {}", e);
    }

    run_result?;
    println!(
        "Done: {} decisions, {} matches, {} not saved",
        summary.total, summary.matches, summary.failed
    );
    Ok(())
}

async fn run(session: &mut SessionController) -> Result<()> {
    session.start().await.context("Failed to load candidates")?;
    if session.state() == SessionState::Exhausted {
        println!("No candidates right now.");
        return Ok(());
    }
    println!("{}", cli::render_snapshot(&session.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while session.state() == SessionState::Active {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match cli::parse_line(&line) {
                    None => {}
                    Some(TerminalCommand::Quit) => break,
                    Some(TerminalCommand::Help) => println!("{}", cli::HELP),
                    Some(TerminalCommand::Status) => {
                        println!("{}", cli::render_snapshot(&session.snapshot()));
                    }
                    Some(TerminalCommand::Intent(intent)) => match session.handle_intent(intent) {
                        Classification::Tracking(offset) => {
                            let feedback = session.snapshot().feedback;
                            println!(
                                "offset {:.0}, tilt {:.1}°, accept {:.0}%, reject {:.0}%",
                                offset,
                                feedback.rotation_deg,
                                feedback.accept_opacity * 100.0,
                                feedback.reject_opacity * 100.0
                            );
                        }
                        Classification::SpringBack => println!("(card springs back)"),
                        Classification::Ignored(reason) => debug!("Input ignored: {:?}", reason),
                        Classification::Decided(_) => {}
                    },
                }
            }
            Some(decision) = session.next_outcome(), if session.has_pending() => {
                debug!(position = decision.position, state = ?decision.state, "Commit settled");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, finishing");
                break;
            }
        }
    }

    if session.state() == SessionState::Exhausted {
        println!("That's everyone for now.");
    }
    Ok(())
}

async fn print_events(mut rx: tokio::sync::broadcast::Receiver<cq_common::events::SwipeEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => println!("{}", cli::render_event(&event)),
            Err(RecvError::Lagged(skipped)) => debug!("Event printer skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}
