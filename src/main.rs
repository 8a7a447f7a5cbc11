use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use meeting_analyzer::{
    AnalysisOrchestrator, AnalysisReport, AnalyzerConfig, MeetingInfo, PromptTemplates,
    RenderTargets, SchemaDescriptor, Stage3Config, execute_stage3, read_transcript_file,
};

#[derive(Parser)]
#[command(name = "meeting-analyzer")]
#[command(author, version, about = "Retrieval-augmented meeting transcript analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Prompt and schema set used for an analysis
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// General corporate meeting
    Meeting,
    /// Sales call with SPIN scoring and objections
    Sales,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a meeting transcript
    Analyze {
        /// Input transcript file (.txt or .md)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the JSON report
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a markdown report
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Output file for the action list (CSV)
        #[arg(long)]
        actions_csv: Option<PathBuf>,

        /// Add an executive summary to the report
        #[arg(long)]
        summary: bool,

        #[arg(long, value_enum, default_value = "meeting")]
        profile: Profile,

        /// Meeting date, as free text
        #[arg(long)]
        date: Option<String>,

        /// Meeting time, as free text
        #[arg(long)]
        time: Option<String>,

        /// Meeting type (e.g. Planejamento, Status, Venda)
        #[arg(long)]
        meeting_type: Option<String>,

        /// Participant names, comma separated
        #[arg(long, value_delimiter = ',')]
        participants: Vec<String>,

        /// Meeting objective
        #[arg(long)]
        objective: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract date, participants and topics from a transcript
    Metadata {
        /// Input transcript file (.txt or .md)
        #[arg(short, long)]
        input: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate configuration from the environment
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            markdown,
            actions_csv,
            summary,
            profile,
            date,
            time,
            meeting_type,
            participants,
            objective,
            verbose,
        } => {
            setup_logging(verbose);
            let meeting_info = MeetingInfo {
                date,
                time,
                meeting_type,
                participants,
                objective,
            };
            let targets = RenderTargets {
                json: Some(output.as_path()),
                markdown: markdown.as_deref(),
                actions_csv: actions_csv.as_deref(),
            };
            analyze_transcript(&input, targets, meeting_info, profile, summary).await
        }
        Commands::Metadata { input, verbose } => {
            setup_logging(verbose);
            extract_metadata(&input).await
        }
        Commands::CheckConfig => {
            setup_logging(false);
            check_config()
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config() -> Result<AnalyzerConfig> {
    AnalyzerConfig::from_env().context("Failed to load configuration")
}

async fn analyze_transcript(
    input: &Path,
    targets: RenderTargets<'_>,
    meeting_info: MeetingInfo,
    profile: Profile,
    with_summary: bool,
) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let transcript = read_transcript_file(input).context("Failed to read input transcript")?;
    info!("Loaded {} characters", transcript.chars().count());

    let config = load_config()?;
    let (templates, schema) = match profile {
        Profile::Meeting => (PromptTemplates::meeting(), SchemaDescriptor::meeting_record()),
        Profile::Sales => (PromptTemplates::sales_call(), SchemaDescriptor::sales_call()),
    };
    let orchestrator = AnalysisOrchestrator::from_config(&config)?
        .with_templates(templates)
        .with_schema(schema);

    let result = orchestrator.analyze(&transcript, Some(&meeting_info)).await?;

    let mut summary = None;
    if with_summary {
        match orchestrator.executive_summary(&result.narrative).await {
            Ok(text) => summary = Some(text),
            Err(e) => warn!("Executive summary skipped: {}", e),
        }
    }

    let source = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut report = AnalysisReport::new(source, Some(meeting_info), result);
    if let Some(text) = summary {
        report = report.with_summary(text);
    }

    let rendered = execute_stage3(&report, targets, &Stage3Config::default())?;
    info!("Report written to {:?}", rendered.json_path);
    if let Some(path) = rendered.markdown_path {
        info!("Markdown report written to {:?}", path);
    }
    if let Some(path) = rendered.actions_csv_path {
        info!("Action list written to {:?}", path);
    }

    let record = &report.structured;
    if record.is_fallback() {
        warn!("Structured extraction fell back to defaults; see diagnostic in the report");
    }
    info!(
        "Complete: {} agreements, {} tasks, {} deliverables, {} reference documents",
        record.agreements.len(),
        record.tasks.len(),
        record.deliverables.len(),
        report.retrieval_count
    );

    Ok(())
}

async fn extract_metadata(input: &Path) -> Result<()> {
    let transcript = read_transcript_file(input).context("Failed to read input transcript")?;
    let config = load_config()?;
    let orchestrator = AnalysisOrchestrator::from_config(&config)?;

    let metadata = orchestrator.extract_metadata(&transcript).await;

    println!("Meeting Metadata");
    println!("================");
    println!("Date: {}", metadata.date);
    println!("Time: {}", metadata.time);
    println!("Objective: {}", metadata.objective);
    println!("Participants: {}", metadata.participants.join(", "));
    println!("Topics:");
    for topic in &metadata.topics {
        println!("  - {}", topic);
    }

    Ok(())
}

fn check_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!(
        "Embeddings: {} ({} dimensions)",
        config.embedding.model, config.embedding.dimensions
    );
    println!(
        "Vector store: {}/{}",
        config.vector_store.namespace, config.vector_store.collection
    );
    println!(
        "Completion: {} / {}",
        config.completion.provider, config.completion.model
    );
    println!(
        "Transcript cap: {} chars, retrieval limit: {}",
        config.analysis.transcript_char_cap, config.analysis.retrieval_limit
    );

    Ok(())
}
