mod adaptation;
mod config;
mod error;
mod models;
mod orchestrator;
mod presenter;
mod request;
mod service;
mod state;
mod topics;
mod tui;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use adaptation::AdaptationEngine;
use config::Config;
use error::PlannerError;
use models::JsonOutput;
use orchestrator::PlanOrchestrator;
use presenter::{ConsolePresenter, Presenter};
use service::HttpSchedulingService;
use state::{BehaviorEvent, ProfileField, SessionStore};

#[derive(Parser)]
#[command(name = "studyplan")]
#[command(about = "Adaptive study planner backed by a scheduling service")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the request that would be sent, without sending it
    Preview {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Generate a study plan
    Plan {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Generate a plan, then replay behavior events against it
    Simulate {
        /// Events to apply in order: missed/aced/distracted
        #[arg(required = true)]
        events: Vec<String>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Launch interactive terminal UI
    Tui {
        #[command(flatten)]
        session: SessionArgs,
    },
}

/// Overrides applied on top of the configured session
#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Student name
    #[arg(long)]
    name: Option<String>,

    /// College or institution
    #[arg(long)]
    college: Option<String>,

    /// Branch or major
    #[arg(long)]
    branch: Option<String>,

    /// Graduation year
    #[arg(long)]
    year: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Daily study hours
    #[arg(long)]
    hours: Option<String>,

    /// Preferred study time: morning/afternoon/evening/night
    #[arg(long)]
    time: Option<String>,

    /// Subject name, repeatable; replaces the configured subjects
    #[arg(long = "subject", short)]
    subjects: Vec<String>,
}

impl SessionArgs {
    fn apply(&self, store: &mut SessionStore) -> Result<(), PlannerError> {
        let fields = [
            (ProfileField::Name, &self.name),
            (ProfileField::Institution, &self.college),
            (ProfileField::Branch, &self.branch),
            (ProfileField::Year, &self.year),
            (ProfileField::Email, &self.email),
            (ProfileField::DailyStudyHours, &self.hours),
            (ProfileField::PreferredTime, &self.time),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                store.set_profile_field(field, value)?;
            }
        }

        if !self.subjects.is_empty() {
            let existing: Vec<String> = store.subjects().iter().map(|s| s.id.clone()).collect();
            for id in existing {
                store.remove_subject(&id);
            }
            for name in &self.subjects {
                store.add_subject(name)?;
            }
        }
        Ok(())
    }
}

impl Commands {
    fn session(&self) -> &SessionArgs {
        match self {
            Commands::Preview { session }
            | Commands::Plan { session }
            | Commands::Simulate { session, .. }
            | Commands::Tui { session } => session,
        }
    }
}

fn setup_logging(
    cli_log_level: Option<&str>,
    config_log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studyplan")
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    // --log-level > config file > RUST_LOG > INFO
    let filter = match cli_log_level.or(config_log_level) {
        Some(level) => {
            let level: tracing::Level = level
                .parse()
                .map_err(|_| format!("Unknown log level '{}'", level))?;
            EnvFilter::default().add_directive(level.into())
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let log_file = fs::File::create(log_dir.join("studyplan.log"))?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    info!("Logging initialized");
    Ok(())
}

fn parse_events(events: &[String]) -> Result<Vec<BehaviorEvent>, PlannerError> {
    events
        .iter()
        .map(|e| {
            BehaviorEvent::from_str(e).ok_or_else(|| {
                PlannerError::validation(format!(
                    "Invalid event '{}'. Use: missed, aced, distracted",
                    e
                ))
            })
        })
        .collect()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        // Service failures have already been shown by the presenter
        let reported = e
            .downcast_ref::<PlannerError>()
            .is_some_and(PlannerError::is_transport);
        if !reported {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config.as_ref())?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref())?;

    let mut session = config.session_store()?;
    cli.command.session().apply(&mut session)?;

    let timeout = Duration::from_millis(config.service.timeout_ms);
    let min_visible = Duration::from_millis(config.service.min_visible_ms);
    let connect = || -> Result<Arc<HttpSchedulingService>, PlannerError> {
        let service = HttpSchedulingService::from_config(&config.service)?;
        info!(endpoint = service.endpoint(), "Using scheduling service");
        Ok(Arc::new(service))
    };

    match cli.command {
        Commands::Preview { .. } => {
            let request = request::build(&session)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&request))?);
            } else {
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
        }

        Commands::Plan { .. } => {
            let presenter: Arc<dyn Presenter> = Arc::new(ConsolePresenter::new(cli.json));
            let orchestrator =
                PlanOrchestrator::new(state::shared(session), connect()?, presenter, timeout);
            orchestrator.request_plan().await?;
        }

        Commands::Simulate { events, .. } => {
            let events = parse_events(&events)?;
            let presenter: Arc<dyn Presenter> = Arc::new(ConsolePresenter::new(cli.json));
            let orchestrator = Arc::new(PlanOrchestrator::new(
                state::shared(session),
                connect()?,
                presenter.clone(),
                timeout,
            ));
            let adaptation = AdaptationEngine::new(orchestrator.clone(), presenter);

            orchestrator.request_plan().await?;
            for event in events {
                debug!(event = event.as_str(), "simulate: applying event");
                adaptation.trigger(event).await?;
            }
        }

        Commands::Tui { .. } => {
            let store = state::shared(session);
            let (tx, rx) = tui::channel();
            let presenter: Arc<dyn Presenter> = Arc::new(tui::ChannelPresenter::new(tx.clone()));
            let orchestrator = Arc::new(
                PlanOrchestrator::new(store.clone(), connect()?, presenter.clone(), timeout)
                    .with_min_visible(min_visible),
            );
            let adaptation = Arc::new(AdaptationEngine::new(orchestrator.clone(), presenter));
            tui::run(store, orchestrator, adaptation, tx, rx)?;
        }
    }

    Ok(())
}
