//! Campaign Letter command line interface.
//!
//! ```bash
//! # Render the configured letter to a static page
//! campaign-letter render --out letter.html
//!
//! # Inspect the knowledge base
//! campaign-letter lookup item netherese_stones
//! campaign-letter search dragon
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use campaign_letter::app::{AppContext, LetterApp};
use campaign_letter::config::AppConfig;
use campaign_letter::core::knowledge_base::EntityKind;
use campaign_letter::core::logging;
use campaign_letter::core::tooltip::TooltipContent;

#[derive(Parser)]
#[command(name = "campaign-letter")]
#[command(version)]
#[command(about = "Render campaign letters with annotated entity references")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, short, global = true, env = "LETTER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the letter into a complete HTML page
    Render {
        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show one knowledge base entry as its tooltip would
    Lookup {
        /// character, location, item or event
        kind: EntityKind,
        /// Identifier as written in reference tags
        id: String,
    },

    /// Find entries whose name, type or description contains a term
    Search {
        term: String,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let _log_guard = logging::init(&config.logging.log_dir(), &config.logging.level);
    log::info!("{} v{} starting", campaign_letter::NAME, campaign_letter::VERSION);

    let context = AppContext::load(config).await;

    match cli.command {
        Commands::Render { out } => cmd_render(context, out).await,
        Commands::Lookup { kind, id } => cmd_lookup(&context, kind, &id),
        Commands::Search { term } => cmd_search(&context, &term),
    }
}

async fn cmd_render(context: AppContext, out: Option<PathBuf>) -> anyhow::Result<()> {
    let mut app = LetterApp::new(context);
    let (doc, outcome) = app.render_page().await;
    if let Err(e) = &outcome {
        // The page still carries the error notice; write it anyway.
        tracing::warn!(error = %e, "Rendered page contains an error message");
    }

    let html = doc.to_html();
    match out {
        Some(path) => {
            tokio::fs::write(&path, html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{html}"),
    }

    outcome.context("Letter page could not be wired")
}

fn cmd_lookup(context: &AppContext, kind: EntityKind, id: &str) -> anyhow::Result<()> {
    let record = context.knowledge.get(kind, id);
    if record.is_placeholder() {
        tracing::warn!(kind = %kind, id, "No such entry; showing placeholder");
    }

    let content = TooltipContent::for_entity(&record);
    println!("{} [{}]", content.title, content.category);
    println!("{}", content.type_label);
    println!("{}", content.description);
    if !content.details.is_empty() {
        println!("{}", content.details);
    }
    Ok(())
}

fn cmd_search(context: &AppContext, term: &str) -> anyhow::Result<()> {
    let hits = context.knowledge.search(term);
    if hits.is_empty() {
        println!("No entries match \"{term}\"");
        return Ok(());
    }
    for record in hits {
        println!("{{{}:{}}}\t{}\t{}", record.kind, record.id, record.name, record.entity_type);
    }
    Ok(())
}
