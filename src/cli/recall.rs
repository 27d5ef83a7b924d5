use clap::Args;
use cortex::memory::types::{MemoryType, TrustLevel};
use cortex::{Engine, Result};

#[derive(Args)]
pub struct RecallArgs {
    pub query: String,
    /// Maximum results (default from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
    /// Minimum score (default from config)
    #[arg(long)]
    pub min_score: Option<f64>,
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<MemoryType>,
    /// Match memories carrying any of these tags
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Trust levels to include (default: validated, proven)
    #[arg(long = "trust", value_name = "LEVEL")]
    pub trust_levels: Vec<TrustLevel>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub topic_prefix: Option<String>,
}

pub fn recall(engine: &mut Engine, args: RecallArgs, json: bool) -> Result<()> {
    let mut options = engine.recall_options();
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if let Some(min_score) = args.min_score {
        options.min_score = min_score;
    }
    options.types = args.types;
    options.tags = args.tags;
    if !args.trust_levels.is_empty() {
        options.trust_levels = args.trust_levels;
    }
    options.project = args.project;
    options.topic_key_prefix = args.topic_prefix;

    let hits = engine.recall(&args.query, &options)?;

    if json {
        return super::print_json(&hits);
    }

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "  {}. [{}/{}] {} (score: {:.3}{})",
            i + 1,
            hit.memory.memory_type,
            hit.memory.trust,
            hit.memory.id,
            hit.score,
            if hit.match_type == cortex::memory::types::MatchType::Hybrid {
                ", keyword"
            } else {
                ""
            }
        );
        println!("     {}", super::preview(&hit.memory.content, 120));
        println!();
    }
    Ok(())
}
