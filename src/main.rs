//! Course Coach - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use coursecoach::alias::{AliasExtractor, MemoryAliasCache};
use coursecoach::answer::AnswerService;
use coursecoach::cli::{Args, Commands};
use coursecoach::config::Config;
use coursecoach::content::{IngestOptions, IngestPipeline, IngestSummary};
use coursecoach::llm::LlmClient;
use coursecoach::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    match args.command {
        Commands::Ingest {
            course,
            source,
            day,
            dry_run,
        } => {
            let store = Arc::new(MemoryStore::new());
            let pipeline = build_pipeline(&config, store);
            let options = IngestOptions {
                course_id: course,
                day_filter: day,
                dry_run,
            };

            let spinner = progress_spinner("Atomizing course documents...");
            let summary = pipeline.ingest_dir(&source, &options).await?;
            spinner.finish_and_clear();

            print_summary(&summary);
        }

        Commands::Ask {
            question,
            course,
            learner,
            source,
        } => {
            let store = Arc::new(MemoryStore::new());

            // The in-memory store starts empty each run; ingest the
            // source documents first when a directory is given.
            if let Some(dir) = source.as_deref() {
                ingest_for_ask(&config, store.clone(), &course, dir).await?;
            }

            let llm = build_llm(&config);
            let service = AnswerService::new(store, llm);
            let response = service.answer(&question, &course, &learner).await;

            println!("\n{}", response.answer);
            if !response.references.is_empty() {
                println!("\n{}", "References:".bold());
                for reference in &response.references {
                    let marker = if reference.is_primary {
                        "primary".green().to_string()
                    } else {
                        "related".dimmed().to_string()
                    };
                    println!(
                        "  [{}] {} - Day {}, {} ({})",
                        marker,
                        reference.canonical_ref,
                        reference.day,
                        reference.container_title,
                        reference.container_type.as_str(),
                    );
                    if let Some(disclaimer) = &reference.disclaimer {
                        println!("      {}", disclaimer.yellow());
                    }
                }
            }
            if response.escalated {
                let id = response.escalation_id.as_deref().unwrap_or("unknown");
                println!(
                    "\n{} {}",
                    "This question was escalated to a trainer. Follow-up id:".yellow(),
                    id
                );
            }
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            println!("# config file: {}", Config::config_path()?.display());
        }
    }

    Ok(())
}

fn build_llm(config: &Config) -> Option<Arc<LlmClient>> {
    let llm_config = config.llm_config();
    if llm_config.api_key.is_none() {
        return None;
    }
    LlmClient::new(llm_config).ok().map(Arc::new)
}

fn build_pipeline(config: &Config, store: Arc<MemoryStore>) -> IngestPipeline {
    let source = build_llm(config).map(|c| c as Arc<dyn coursecoach::alias::AliasSource>);
    let extractor = AliasExtractor::new(Arc::new(MemoryAliasCache::new()), source);
    IngestPipeline::new(store, extractor)
}

async fn ingest_for_ask(
    config: &Config,
    store: Arc<MemoryStore>,
    course: &str,
    dir: &Path,
) -> Result<()> {
    let pipeline = build_pipeline(config, store);
    let options = IngestOptions {
        course_id: course.to_string(),
        day_filter: None,
        dry_run: false,
    };
    let summary = pipeline.ingest_dir(dir, &options).await?;
    if summary.processed == 0 {
        println!(
            "{}",
            "Warning: no course documents were ingested; answers will escalate.".yellow()
        );
    }
    Ok(())
}

fn progress_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner
}

fn print_summary(summary: &IngestSummary) {
    let mode = if summary.dry_run { " (dry run)" } else { "" };
    println!("{}{}", "Ingestion summary".bold(), mode);
    println!("  processed: {}", summary.processed.to_string().green());
    println!("  skipped:   {}", summary.skipped);
    println!("  failed:    {}", summary.failed.to_string().red());
    println!("  nodes:     {}", summary.nodes_written);

    let grouped = summary.failures_by_cause();
    if !grouped.is_empty() {
        println!("\n{}", "Failures by cause:".bold());
        for (cause, files) in grouped {
            println!("  {} ({})", cause.yellow(), files.len());
            for file in files {
                println!("    - {}", file);
            }
        }
    }
}
