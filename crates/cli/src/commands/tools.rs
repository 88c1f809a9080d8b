//! `crossclaw tools`: print the tool catalogue.

use crossclaw_tools::crossword_registry;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&catalogue()?)?);
    Ok(())
}

fn catalogue() -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(crossword_registry().definitions())
}
