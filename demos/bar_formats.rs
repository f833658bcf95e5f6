//! Example showing which widgets each bar format produces

use color_eyre::Result;
use comfy_table::Table;
use console::style;
use std::sync::Arc;
use std::time::Duration;
use stprogress::ui::{HostCapabilities, MemoryContainer};
use stprogress::{RenderDecision, ScopeManager, StProgress};

const FORMATS: &[&str] = &[
    "{l_bar}{bar}{r_bar}",
    "{bar}",
    "{bar:20}{desc}",
    "{desc}: {n_fmt}/{total_fmt} [{elapsed}<{remaining}]",
    "{percentage:3.0f}% done",
];

fn main() -> Result<()> {
    color_eyre::install()?;

    let manager = Arc::new(ScopeManager::default());
    let mut table = Table::new();
    table.set_header(vec!["Format", "Host", "Bar", "Text", "Widgets", "Meter text"]);

    for &format in FORMATS {
        for (host, capabilities) in [
            ("current", HostCapabilities::latest()),
            ("legacy", HostCapabilities::legacy()),
        ] {
            let container = MemoryContainer::with_capabilities(capabilities);
            let decision = RenderDecision::decide(Some(format));
            let mut bar = StProgress::counter()
                .total(8)
                .desc("Demo")
                .bar_format(format)
                .mininterval(Duration::ZERO)
                .scope_manager(manager.clone())
                .st_container(Arc::new(container.clone()))
                .build();
            bar.update(3);

            table.add_row(vec![
                style(format).cyan().to_string(),
                host.to_string(),
                decision.show_bar.to_string(),
                decision.show_text.to_string(),
                container.len().to_string(),
                bar.format_meter(),
            ]);
        }
    }

    println!("{table}");
    Ok(())
}
