use cortex::memory::types::{Direction, Memory, Relation};
use cortex::{Engine, Result};
use serde::Serialize;

#[derive(Serialize)]
struct ShowOutput<'a> {
    memory: &'a Memory,
    relations: &'a [Relation],
}

pub fn show(engine: &mut Engine, id: &str, json: bool) -> Result<()> {
    let memory = engine.get(id)?;
    let relations = engine.get_relations(id)?;

    if json {
        return super::print_json(&ShowOutput {
            memory: &memory,
            relations: &relations,
        });
    }

    println!("ID:        {}", memory.id);
    println!("Type:      {}", memory.memory_type);
    println!("Trust:     {}", memory.trust);
    if let Some(key) = &memory.topic_key {
        println!("Topic key: {key}");
    }
    if !memory.tags.is_empty() {
        println!("Tags:      {}", memory.tags.join(", "));
    }
    if let Some(project) = &memory.metadata.project {
        println!("Project:   {project}");
    }
    println!("Created:   {}", memory.created_at);
    println!("Updated:   {}", memory.updated_at);
    println!("Accessed:  {} time(s)", memory.access_count);
    println!();
    println!("{}", memory.content);

    if !relations.is_empty() {
        println!();
        println!("Relations:");
        for rel in &relations {
            let arrow = match rel.direction_from(&memory.id) {
                Some(Direction::Incoming) => "<-",
                _ => "->",
            };
            print!("  {arrow} {} {}", rel.relation_type, rel.other_end(&memory.id));
            match &rel.note {
                Some(note) => println!("  # {note}"),
                None => println!(),
            }
        }
    }
    Ok(())
}
