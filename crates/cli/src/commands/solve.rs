//! `crossclaw solve`: run the solver against a puzzle file.

use super::console::{ConsoleListener, summary_line};
use crossclaw_agent::{CrosswordSolver, EventFeed};
use crossclaw_config::AppConfig;
use crossclaw_core::event::EventBus;
use crossclaw_providers::build_from_config;
use crossclaw_puzzle::Puzzle;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Returns whether the puzzle was solved.
pub async fn run(
    path: &Path,
    max_iterations: Option<u32>,
    model: Option<String>,
    events: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(model) = model {
        config.default_model = model;
    }
    if let Some(max) = max_iterations {
        config.solver.max_iterations = max;
    }
    config.validate()?;

    // Fail early with a clear message when no key is set
    if !config.has_api_key() {
        eprintln!("No API key configured. Set CROSSCLAW_API_KEY, AZURE_OPENAI_API_KEY or OPENAI_API_KEY,");
        eprintln!("or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
        return Err("No API key found".into());
    }

    let puzzle = Puzzle::from_path(path)?;
    let router = build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", router.default_name()))?;

    let mut solver = CrosswordSolver::from_config(provider, &config);
    let printer = if events {
        let bus = EventBus::new(config.events.capacity);
        let mut rx = bus.subscribe();
        let session_id = solver.session_id().to_string();
        solver = solver.with_listener(Arc::new(EventFeed::new(bus, session_id)));
        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => match serde_json::to_string(event.as_ref()) {
                        Ok(line) => println!("{line}"),
                        Err(e) => tracing::warn!("Failed to encode event: {e}"),
                    },
                    Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "Event printer lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    } else {
        solver = solver.with_listener(Arc::new(ConsoleListener));
        None
    };

    let mut dispatcher = solver.dispatcher_for(puzzle);
    let outcome = solver.solve(&mut dispatcher).await;

    // Dropping the solver and dispatcher closes the event bus
    let puzzle = dispatcher.into_puzzle();
    drop(solver);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    if !events {
        println!();
        println!("{}", puzzle.render());
        println!();
        println!("{}", summary_line(&outcome));
    }
    Ok(outcome.success)
}
