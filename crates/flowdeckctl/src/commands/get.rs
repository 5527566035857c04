use anyhow::Result;
use chrono::{DateTime, Local};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use serde_json::json;

use flowdeck_core::{FlowEntry, FLOW_FILE, SETTINGS_FILE};
use flowdeck_store::FlowStore;

use crate::output::{dim, OutputFormat};

/// List flows (kubectl-style: get flows)
pub fn execute(store: &FlowStore, output: OutputFormat) -> Result<()> {
    let flows = store.flows();

    match output {
        OutputFormat::Json => {
            let items: Vec<_> = flows.iter().map(flow_json).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Name => {
            for flow in &flows {
                println!("flow/{}", flow.name);
            }
        }
        OutputFormat::Wide => {
            if flows.is_empty() {
                println!("{}", dim(&format!("No flows in {}", store.layout().flows_dir().display())));
                return Ok(());
            }
            println!("{}", flow_table(&flows));
        }
    }

    Ok(())
}

fn flow_json(flow: &FlowEntry) -> serde_json::Value {
    json!({
        "name": flow.name,
        "path": flow.path,
        "flowDocument": flow.has_child(FLOW_FILE),
        "settingsDocument": flow.has_child(SETTINGS_FILE),
        "modified": flow.modified.map(format_time),
        "children": flow.children,
    })
}

fn format_time(time: std::time::SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn presence(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "missing"
    }
}

fn flow_table(flows: &[FlowEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["NAME", "FLOW.TOML", "SETTINGS.TOML", "MODIFIED", "PATH"]);

    for flow in flows {
        table.add_row(vec![
            flow.name.clone(),
            presence(flow.has_child(FLOW_FILE)).to_string(),
            presence(flow.has_child(SETTINGS_FILE)).to_string(),
            flow.modified.map(format_time).unwrap_or_else(|| "-".to_string()),
            flow.path.display().to_string(),
        ]);
    }
    table
}
