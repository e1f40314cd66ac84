//! Pulse CLI - survey analysis for administrators.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use pulse_core::{
    AnalysisId, AnalysisMethod, AnalysisPayload, AnalysisResult, Language, PulseConfig, SurveyId,
    UniversityId,
};
use pulse_storage::{export_to_file, import_from_file, CloudBackupClient, JsonStorage, Storage};
use pulse_ai::{AnalysisDispatcher, AuthoringAssistant, GeminiClient, GenerationService};
use pulse_analysis::{
    draw_winners, overviews, priority_fixes, render_markdown_report, AnalysisSession,
    InvokeOutcome,
};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Survey analysis for institutional satisfaction surveys", long_about = None)]
struct Cli {
    /// Data directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true, default_value = "pulse.json")]
    config: PathBuf,

    /// Output language: ko or en (overrides config)
    #[arg(long, global = true)]
    language: Option<Language>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List surveys with response counts and scores
    Surveys {
        /// Only surveys linked to this university
        #[arg(long)]
        university: Option<String>,
    },
    /// Show per-question statistics
    Stats {
        /// Survey ID
        survey: String,
    },
    /// Run (or show) an analysis method
    Analyze {
        /// Survey ID
        survey: String,
        /// Method: basic, ipa, boxplot, mca, demographic, vision
        #[arg(long, default_value = "basic")]
        method: AnalysisMethod,
    },
    /// Regenerate the latest (or given) analysis
    Retry {
        /// Survey ID
        survey: String,
        /// Method to regenerate instead of the latest record
        #[arg(long)]
        method: Option<AnalysisMethod>,
    },
    /// Open a survey's analysis view, running the default analysis on first visit
    Show {
        /// Survey ID
        survey: String,
        /// Focus a specific history record
        #[arg(long)]
        analysis: Option<String>,
    },
    /// Show analysis history
    History {
        /// Survey ID
        survey: String,
    },
    /// Render a completed analysis as Markdown
    Report {
        /// Survey ID
        survey: String,
        /// Analysis ID (defaults to the latest record)
        #[arg(long)]
        analysis: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Draw prize winners among respondents
    Draw {
        /// Survey ID
        survey: String,
        /// Number of winners
        #[arg(long)]
        count: usize,
        /// Prize name
        #[arg(long)]
        prize: Option<String>,
    },
    /// Draft survey questions and a welcome message
    Draft {
        /// Survey topic
        topic: String,
        /// Context for the questions
        #[arg(long, default_value = "")]
        description: String,
        /// Number of questions
        #[arg(long, default_value = "7")]
        count: usize,
    },
    /// Backup and restore
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write all data to a JSON file
    Export {
        /// Output file
        file: PathBuf,
    },
    /// Restore data from a JSON file
    Import {
        /// Input file
        file: PathBuf,
    },
    /// Upload a snapshot to the cloud backup endpoint
    Push,
    /// Restore from the cloud backup endpoint
    Pull,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PulseConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(language) = cli.language {
        config.language = language;
    }

    let storage = JsonStorage::new(&config.data_dir)
        .await
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;
    let store = Arc::new(Mutex::new(storage));

    match cli.command {
        Commands::Surveys { university } => {
            let filter = university.as_deref().map(parse_university).transpose()?;
            let store = store.lock().await;
            let surveys = store.list_surveys().await?;
            let responses = store.list_all_responses().await?;
            let universities = store.list_universities().await?;

            let rows = overviews(&surveys, &responses, &universities, filter);
            println!("Surveys ({})", rows.len());
            for row in rows {
                println!(
                    "  {} | {:>3} | {:>4} responses | {} | {}",
                    row.survey_id,
                    row.score,
                    row.response_count,
                    row.university_name.as_deref().unwrap_or("-"),
                    row.title,
                );
            }
        }
        Commands::Stats { survey } => {
            let session = session(&config, store);
            let stats = session.statistics(parse_survey(&survey)?).await?;
            for s in stats {
                println!("  Q{} {:<40} mean {:.2}  sd {:.2}  n {}", s.index, s.question, s.mean, s.std_dev, s.count);
            }
        }
        Commands::Analyze { survey, method } => {
            let session = session(&config, Arc::clone(&store));
            let survey_id = parse_survey(&survey)?;
            let outcome = session.invoke(survey_id, method).await?;
            show_outcome(&store, survey_id, outcome).await?;
        }
        Commands::Retry { survey, method } => {
            let session = session(&config, Arc::clone(&store));
            let survey_id = parse_survey(&survey)?;
            let outcome = match method {
                Some(method) => session.regenerate(survey_id, method).await?,
                None => session.retry(survey_id).await?,
            };
            show_outcome(&store, survey_id, outcome).await?;
        }
        Commands::Show { survey, analysis } => {
            let session = session(&config, Arc::clone(&store));
            let survey_id = parse_survey(&survey)?;
            match analysis {
                Some(id) => session.select(survey_id, parse_analysis(&id)?).await?,
                None => {
                    if let Some(outcome) = session.open(survey_id).await? {
                        outcome.finished().await;
                    }
                }
            }

            let view = session.project(survey_id).await?;
            match &view.record {
                Some(record) => print_record(record),
                None => println!("No analyses yet"),
            }
            if !view.performed.is_empty() {
                let tags: Vec<&str> = view.performed.iter().map(|m| m.tag()).collect();
                println!("Performed: {}", tags.join(", "));
            }
            println!("Export: {}  Regenerate: {}", yes_no(view.can_export), yes_no(view.can_regenerate));
        }
        Commands::History { survey } => {
            let survey_id = parse_survey(&survey)?;
            let survey = load_survey(&store, survey_id).await?;
            println!("Analysis history for {} ({})", survey.title, survey.analysis_history.len());
            for record in &survey.analysis_history {
                println!(
                    "  {} | {:<11} | {:<9} | {}",
                    record.id,
                    record.method.tag(),
                    record.status(),
                    record.created_at.format("%Y-%m-%d %H:%M"),
                );
            }
        }
        Commands::Report { survey, analysis, output } => {
            let survey_id = parse_survey(&survey)?;
            let survey = load_survey(&store, survey_id).await?;
            let record = match analysis {
                Some(id) => survey.analysis(parse_analysis(&id)?).context("analysis not found")?,
                None => survey.analysis_history.first().context("survey has no analyses")?,
            };
            let session = session(&config, Arc::clone(&store));
            let stats = session.statistics(survey_id).await?;
            let markdown = render_markdown_report(&survey, &stats, record)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, markdown)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Report written to {}", path.display());
                }
                None => print!("{}", markdown),
            }
        }
        Commands::Draw { survey, count, prize } => {
            let survey_id = parse_survey(&survey)?;
            let mut store = store.lock().await;
            let survey = store.load_survey(survey_id).await?.context("survey not found")?;
            let responses = store.list_responses(survey_id).await?;

            let record = draw_winners(&survey, &responses, count, prize)?;
            store.save_prize_draw(&record).await?;

            println!("Drew {} of {} requested winners for {}", record.winners.len(), record.winner_count, record.survey_title);
            for winner in &record.winners {
                println!("  {} (submitted {})", winner.id, winner.submitted_at.format("%Y-%m-%d %H:%M"));
            }
        }
        Commands::Draft { topic, description, count } => {
            let assistant = AuthoringAssistant::new(generator(&config), config.retry.clone());
            let intro = assistant.generate_intro_message(&topic, &description, config.language).await;
            let questions = assistant
                .generate_survey_questions(&topic, &description, config.language, count)
                .await;

            if !intro.is_empty() {
                println!("{}\n", intro);
            }
            for (i, q) in questions.iter().enumerate() {
                println!("  {}. [{:?}] {}", i + 1, q.question_type, q.text);
                for option in &q.options {
                    println!("       - {}", option);
                }
            }
        }
        Commands::Backup { action } => match action {
            BackupAction::Export { file } => {
                let snapshot = store.lock().await.snapshot().await?;
                export_to_file(&snapshot, &file).await?;
                println!("Exported backup to {}", file.display());
            }
            BackupAction::Import { file } => {
                let snapshot = import_from_file(&file)
                    .await
                    .with_context(|| format!("failed to read backup {}", file.display()))?;
                store.lock().await.restore(snapshot).await?;
                println!("Restored backup from {}", file.display());
            }
            BackupAction::Push => {
                let client = cloud_client(&config)?;
                let snapshot = store.lock().await.snapshot().await?;
                client.push(&snapshot).await?;
                println!("Uploaded backup to {}", client.url());
            }
            BackupAction::Pull => {
                let client = cloud_client(&config)?;
                let snapshot = client.pull().await?;
                store.lock().await.restore(snapshot).await?;
                println!("Restored backup from {}", client.url());
            }
        },
    }

    Ok(())
}

fn generator(config: &PulseConfig) -> Arc<dyn GenerationService> {
    Arc::new(GeminiClient::new(&config.generation))
}

fn session(config: &PulseConfig, store: Arc<Mutex<JsonStorage>>) -> AnalysisSession<JsonStorage> {
    if config.generation.resolve_api_key().is_none() {
        warn!("No API key configured; set GEMINI_API_KEY to run analyses");
    }
    let dispatcher = AnalysisDispatcher::new(generator(config), config.retry.clone());
    AnalysisSession::new(store, dispatcher).with_language(config.language)
}

fn cloud_client(config: &PulseConfig) -> Result<CloudBackupClient> {
    match &config.cloud_backup_url {
        Some(url) => Ok(CloudBackupClient::new(url.clone())),
        None => bail!("cloud_backup_url is not configured"),
    }
}

fn parse_survey(s: &str) -> Result<SurveyId> {
    s.parse().with_context(|| format!("invalid survey ID: {}", s))
}

fn parse_analysis(s: &str) -> Result<AnalysisId> {
    s.parse().with_context(|| format!("invalid analysis ID: {}", s))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn parse_university(s: &str) -> Result<UniversityId> {
    s.parse().with_context(|| format!("invalid university ID: {}", s))
}

async fn load_survey(store: &Mutex<JsonStorage>, id: SurveyId) -> Result<pulse_core::Survey> {
    store
        .lock()
        .await
        .load_survey(id)
        .await?
        .with_context(|| format!("survey not found: {}", id))
}

/// Wait for a dispatched request, then print the record it left in history.
async fn show_outcome(store: &Mutex<JsonStorage>, survey_id: SurveyId, outcome: InvokeOutcome) -> Result<()> {
    let id = outcome.analysis_id();
    match &outcome {
        InvokeOutcome::Reused(_) => info!("Showing existing analysis {}", id),
        InvokeOutcome::Failed(_) => {}
        InvokeOutcome::Dispatched { token, .. } => info!("Running {}...", token),
    }
    outcome.finished().await;

    let survey = load_survey(store, survey_id).await?;
    let record = survey.analysis(id).context("analysis not found in history")?;
    print_record(record);
    Ok(())
}

fn print_record(record: &AnalysisResult) {
    println!("{} [{}] {}", record.method.display_name(), record.status(), record.id);
    if !record.summary.is_empty() {
        println!("\n{}\n", record.summary);
    }
    if let Some(AnalysisPayload::ImportancePerformance(points)) = record.payload() {
        for p in priority_fixes(points) {
            println!("  Priority fix: {} (importance {:.1}, performance {:.1})", p.label, p.importance, p.performance);
        }
    }
}
