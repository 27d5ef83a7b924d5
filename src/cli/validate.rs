use cortex::memory::types::TrustLevel;
use cortex::{Engine, Result};

pub fn validate(engine: &mut Engine, id: &str, trust: Option<TrustLevel>, json: bool) -> Result<()> {
    engine.validate(id, trust)?;
    let memory = engine.get(id)?;

    if json {
        return super::print_json(&memory);
    }
    println!("{} is now {}", memory.id, memory.trust);
    Ok(())
}
