use clap::Args;
use cortex::memory::types::{MemoryType, StoreOptions, TrustLevel};
use cortex::{Engine, Result};

#[derive(Args)]
pub struct StoreArgs {
    /// The memory text
    pub content: String,
    /// Logical-evolution key; storing again under it updates the same memory
    #[arg(long)]
    pub topic_key: Option<String>,
    /// Memory type
    #[arg(long = "type", value_name = "TYPE")]
    pub memory_type: Option<MemoryType>,
    #[arg(long)]
    pub trust: Option<TrustLevel>,
    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    /// Extra metadata as KEY=VALUE (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = super::parse_key_val)]
    pub meta: Vec<(String, String)>,
}

pub fn store(engine: &mut Engine, args: StoreArgs, json: bool) -> Result<()> {
    let options = StoreOptions {
        topic_key: args.topic_key,
        // No --tag flags means "leave tags alone" on an update.
        tags: (!args.tags.is_empty()).then_some(args.tags),
        memory_type: args.memory_type,
        trust: args.trust,
        project: args.project,
        source: args.source,
        author: args.author,
        extra: args.meta.into_iter().collect(),
    };

    let outcome = engine.store(&args.content, &options)?;

    if json {
        return super::print_json(&outcome);
    }

    let verb = if outcome.updated { "Updated" } else { "Stored" };
    println!("{verb} {}", outcome.memory.id);
    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {warning} (run `cortex reindex` to retry)");
    }
    Ok(())
}
