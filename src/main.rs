use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use quizreel::{
    Error,
    config::{Config, DEFAULT_CONFIG_PATH},
    core::selector::QuestionSelector,
    logging,
    pipeline::{
        MarkPolicy, Pipeline, RunOutcome,
        command::CommandRenderer,
        stages::{DryRunPublisher, LogNotifier},
    },
    publish::{PublishMetadata, solution_text},
};

#[derive(Parser)]
#[command(name = "quizreel")]
#[command(about = "Pick, publish, and track daily quiz questions")]
struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Usage counts, overall and by difficulty.
    Stats,
    /// Show the question the next run would publish.
    Next,
    /// Show one question with its publish metadata.
    Show { id: i64 },
    /// Record a question as published.
    Mark { id: i64 },
    /// Forget every usage record.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Write unused questions to a JSON file.
    Export { destination: PathBuf },
    /// Load and validate the question file.
    Validate,
    /// Run the pipeline once with dry-run uploads. Nothing is marked unless asked.
    Run {
        /// Record the question as used even though no upload really happened.
        #[arg(long)]
        mark_dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("error: cannot open run log: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> anyhow::Result<ExitCode> {
    let store = config.load_store()?;

    match command {
        Commands::Validate => {
            println!("{} questions valid", store.len());
            for skipped in store.skipped() {
                println!("skipped: {skipped}");
            }
        }
        Commands::Stats => {
            let ledger = config.open_ledger()?;
            let stats = QuestionSelector::new(&store, &ledger).get_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Next => {
            let ledger = config.open_ledger()?;
            match QuestionSelector::new(&store, &ledger).select_next() {
                Ok(question) => println!("{}", serde_json::to_string_pretty(question)?),
                Err(err @ Error::Exhausted { .. }) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::from(2));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Show { id } => {
            let Some(question) = store.get(id) else {
                bail!("no question with id {id} in {}", config.data.questions.display());
            };
            let metadata = PublishMetadata::with_strategies(
                question,
                &config.pipeline.caption_variant,
                &config.pipeline.description_variant,
            );
            println!("{}", serde_json::to_string_pretty(question)?);
            println!("\ncaption: {}\n\n{}\n\n{}", metadata.caption, metadata.full_description(), solution_text(question));
        }
        Commands::Mark { id } => {
            if !store.contains(id) {
                bail!("no question with id {id} in {}", config.data.questions.display());
            }
            let mut ledger = config.open_ledger()?;
            if ledger.mark_used(id)? {
                println!("marked {id} as used");
            } else {
                println!("{id} was already marked");
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("reset makes every question eligible again; pass --yes to confirm");
            }
            config.open_ledger()?.reset()?;
            println!("usage ledger cleared");
        }
        Commands::Export { destination } => {
            let ledger = config.open_ledger()?;
            let count = ledger.export_unused(&store, &destination)?;
            println!("exported {count} unused questions to {}", destination.display());
        }
        Commands::Run { mark_dry_run } => {
            let renderer = config
                .renderer
                .as_ref()
                .context("no [renderer] section in config; cannot produce media")?;
            let mut pipeline_config = config.pipeline.clone();
            if !mark_dry_run {
                pipeline_config.mark_policy = MarkPolicy::Never;
            }
            let ledger = config.open_ledger()?;
            let mut pipeline = Pipeline::new(
                store,
                ledger,
                CommandRenderer::new(renderer, &config.pipeline),
                LogNotifier,
                pipeline_config,
            )
            .with_publisher(DryRunPublisher::new("facebook"))
            .with_publisher(DryRunPublisher::new("youtube"));

            match pipeline.run_once().await? {
                RunOutcome::Published(report) => {
                    println!("question {} dry-run published and marked as used", report.question_id)
                }
                RunOutcome::NotMarked(report) => {
                    println!("question {} dry-run published, not marked", report.question_id)
                }
                RunOutcome::Exhausted { total } => println!("all {total} questions used; nothing to publish"),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
