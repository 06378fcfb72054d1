//! Halo - Entry Point
//!
//! Text stand-in for the voice loop: each stdin line is treated as one
//! transcribed utterance, run through a full cycle, and the reply plus any
//! action messages are printed.

use halo_core::command::ActionRegistry;
use halo_core::core::config::HaloConfig;
use halo_core::core::error::Result;
use halo_core::llm::client::LlmClient;
use halo_core::llm::prompt::load_personality;
use halo_core::pipeline::Pipeline;
use halo_core::skills::SkillSet;

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "halo")]
#[command(about = "Interactive text host for the Halo assistant core")]
struct Args {
    /// Configuration file (TOML); defaults are used if it does not exist
    #[arg(long, default_value = "halo.toml")]
    config: PathBuf,

    /// Action map to load instead of `paths.action_map`
    #[arg(long)]
    action_map: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.verbose {
        "halo_core=debug"
    } else {
        "halo_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    tracing::info!("Halo starting...");

    let config = HaloConfig::load(&args.config)?;

    let action_map = args.action_map.unwrap_or_else(|| config.paths.action_map.clone());
    let registry = ActionRegistry::load(&action_map);
    let skills = SkillSet::builtin();
    for (action, e) in registry.unresolved(&skills) {
        tracing::warn!("Action '{}' will not dispatch: {}", action, e);
    }

    let personality = load_personality(config.paths.personality.as_deref());
    let client = LlmClient::from_config(&config.llm);
    tracing::info!(
        "Using model {} ({:?}) at {}",
        client.model(),
        client.api_format(),
        config.llm.api_url
    );

    let pipeline = Pipeline::new(
        &client,
        &registry,
        &skills,
        personality,
        config.pipeline.clone(),
    );

    // Create the async runtime for model calls
    let rt = Runtime::new()?;

    println!("\n=== HALO ===");
    println!("Type what you would say out loud. {} action(s) available.", registry.len());
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        let outcome = rt.block_on(pipeline.run_cycle(input));

        println!("Halo: {}", outcome.reply);
        for message in &outcome.messages {
            println!("  - {}", message);
        }
    }

    println!("\nGoodbye!");
    Ok(())
}
