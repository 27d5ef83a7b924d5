use clap::Args;
use cortex::memory::types::RelationType;
use cortex::{Engine, Result};

#[derive(Args)]
pub struct RelateArgs {
    pub from_id: String,
    /// causes, solves, replaces, requires, related_to, part_of, contradicts
    #[arg(value_name = "TYPE")]
    pub relation_type: RelationType,
    pub to_id: String,
    #[arg(long)]
    pub note: Option<String>,
}

pub fn relate(engine: &mut Engine, args: RelateArgs, json: bool) -> Result<()> {
    let relation = engine.relate(
        &args.from_id,
        &args.to_id,
        args.relation_type,
        args.note.as_deref(),
    )?;

    if json {
        return super::print_json(&relation);
    }
    println!(
        "Related {} -[{}]-> {} ({})",
        relation.from_id, relation.relation_type, relation.to_id, relation.id
    );
    Ok(())
}
