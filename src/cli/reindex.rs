//! `reindex` command: restore and re-embed vector-index entries.

use cortex::{Engine, Result};
use indicatif::{ProgressBar, ProgressStyle};

pub fn reindex(engine: &mut Engine, force: bool, json: bool) -> Result<()> {
    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    if let Ok(style) = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} ({eta})") {
        pb.set_style(style.progress_chars("##-"));
    }

    let report = engine.reindex(force, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    if json {
        return super::print_json(&report);
    }

    println!(
        "Restored {} from cache, embedded {}, failed {}.",
        report.restored, report.embedded, report.failed
    );
    if report.failed > 0 {
        eprintln!("Some memories could not be embedded; check the provider and run again.");
    }
    Ok(())
}
