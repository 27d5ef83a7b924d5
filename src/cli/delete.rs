use cortex::{Engine, Result};

pub fn delete(engine: &mut Engine, id: &str, json: bool) -> Result<()> {
    engine.delete(id)?;

    if json {
        return super::print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted {id}");
    Ok(())
}
