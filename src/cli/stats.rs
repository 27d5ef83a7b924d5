use cortex::{Engine, Result};

/// Display memory statistics in the terminal.
pub fn stats(engine: &mut Engine, json: bool) -> Result<()> {
    let stats = engine.stats()?;

    if json {
        return super::print_json(&stats);
    }

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Memories:            {}", stats.memories);
    println!("  Relations:           {}", stats.relations);
    println!("  Embeddings:          {}", stats.embeddings);
    println!("  Missing from index:  {}", stats.missing_index);
    println!(
        "  Index model:         {}",
        stats.embedding_model.as_deref().unwrap_or("(none)")
    );
    if let Some(active) = &stats.active_model {
        println!("  Active model:        {}", active);
    }
    println!();

    println!("By Type:");
    for (t, count) in &stats.by_type {
        println!("  {:<12} {}", t, count);
    }
    println!();

    println!("By Trust:");
    for (t, count) in &stats.by_trust {
        println!("  {:<12} {}", t, count);
    }

    if stats.missing_index > 0 {
        println!();
        println!("Run `cortex reindex` to make unindexed memories recallable.");
    }
    if stats.model_mismatch() {
        println!();
        println!("The index was built with another model. Run `cortex reindex` to re-embed.");
    }
    Ok(())
}
