use clap::Args;
use cortex::memory::types::{ListOptions, MemoryType, TrustLevel};
use cortex::{Engine, Result};

#[derive(Args)]
pub struct ListArgs {
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<MemoryType>,
    #[arg(long = "trust", value_name = "LEVEL")]
    pub trust_levels: Vec<TrustLevel>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub topic_prefix: Option<String>,
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn list(engine: &mut Engine, args: ListArgs, json: bool) -> Result<()> {
    let memories = engine.list(&ListOptions {
        types: args.types,
        trust_levels: args.trust_levels,
        project: args.project,
        topic_key_prefix: args.topic_prefix,
        limit: args.limit,
    })?;

    if json {
        return super::print_json(&memories);
    }

    if memories.is_empty() {
        println!("No memories.");
        return Ok(());
    }
    for memory in &memories {
        println!("{}", super::memory_line(memory));
    }
    Ok(())
}
