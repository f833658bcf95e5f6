//! Example showing nested progress indicators mirrored to the console

use color_eyre::Result;
use comfy_table::Table;
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stprogress::ui::{Element, MemoryContainer};
use stprogress::{Config, ProgressIteratorExt, StProgress};

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Every indicator created below renders into this container and the console.
    let container = MemoryContainer::new();
    stprogress::set_default_config(
        Config::new()
            .st_container(Arc::new(container.clone()))
            .backend(true),
    );

    let mut rng = rand::rng();
    for epoch in StProgress::builder(1..=3).desc("Epochs").build() {
        let _scope = stprogress::scope(Config::new().desc(format!("Epoch {epoch}")));
        for _batch in (0..20).st_progress() {
            thread::sleep(Duration::from_millis(rng.random_range(10..50)));
        }
    }

    // Inner indicators cleared themselves; only the outer one is left.
    let mut table = Table::new();
    table.set_header(vec!["Widget", "Element", "Calls", "Cleared"]);
    for (index, record) in container.widgets().iter().enumerate() {
        let element = match &record.element {
            Some(Element::Progress { value, text }) => {
                format!("progress {:.0}% {}", value * 100.0, text.as_deref().unwrap_or(""))
            }
            Some(Element::Text(text)) => format!("text {text}"),
            None => "-".to_string(),
        };
        table.add_row(vec![
            index.to_string(),
            element,
            record.calls.len().to_string(),
            (record.empty_count() > 0).to_string(),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
