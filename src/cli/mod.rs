//! Terminal front-end. Each subcommand builds option values from flags, calls
//! the engine, and prints either text or JSON.

pub mod delete;
pub mod list;
pub mod recall;
pub mod reindex;
pub mod relate;
pub mod show;
pub mod stats;
pub mod store;
pub mod validate;

use cortex::memory::types::Memory;
use cortex::Result;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary used by list-style output.
pub fn memory_line(memory: &Memory) -> String {
    let topic = memory
        .topic_key
        .as_deref()
        .map(|k| format!(" ({k})"))
        .unwrap_or_default();
    format!(
        "{} [{}/{}]{} {}",
        memory.id,
        memory.memory_type,
        memory.trust,
        topic,
        preview(&memory.content, 100)
    )
}

/// First line of `content`, cut to `max_chars` characters with "..." appended.
pub fn preview(content: &str, max_chars: usize) -> String {
    let line = content.lines().next().unwrap_or_default();
    match line.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None if line.len() < content.trim_end().len() => format!("{line}..."),
        None => line.to_string(),
    }
}

/// Parse a `key=value` flag.
pub fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("first\nsecond", 80), "first...");
    }

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("ticket=ENG-1").unwrap(),
            ("ticket".to_string(), "ENG-1".to_string())
        );
        assert_eq!(parse_key_val("a=b=c").unwrap().1, "b=c");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
