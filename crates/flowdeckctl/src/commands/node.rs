use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use toml::Value;

use flowdeck_core::{json_to_toml, toml_to_json};
use flowdeck_store::FlowStore;
use flowdeck_viz::{CanvasRenderer, Viewport};

use crate::output::{render_config, success, NodeFormat};

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// List the nodes of a flow
    List {
        /// Flow name
        flow: String,
    },

    /// Show one node's configuration
    Get {
        /// Flow name
        flow: String,

        /// Node id
        node_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        output: NodeFormat,
    },

    /// Replace one node's `data` with a JSON object
    Set {
        /// Flow name
        flow: String,

        /// Node id
        node_id: String,

        /// New data as JSON, e.g. '{"title":"Nightly"}'
        #[arg(long)]
        data: String,
    },
}

pub async fn execute(store: &FlowStore, command: NodeCommands) -> Result<()> {
    match command {
        NodeCommands::List { flow } => list(store, &flow).await,
        NodeCommands::Get {
            flow,
            node_id,
            output,
        } => get(store, &flow, &node_id, output).await,
        NodeCommands::Set {
            flow,
            node_id,
            data,
        } => set(store, &flow, &node_id, &data).await,
    }
}

async fn list(store: &FlowStore, flow: &str) -> Result<()> {
    let graph = store
        .load_graph(flow)
        .await
        .with_context(|| format!("Failed to load graph of flow '{}'", flow))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["ID", "TYPE", "TITLE", "POSITION"]);
    for node in &graph.nodes {
        table.add_row(vec![
            node.id.clone(),
            node.node_type.clone().unwrap_or_else(|| "-".to_string()),
            node.title().unwrap_or("-").to_string(),
            format!("{:.0},{:.0}", node.position.x, node.position.y),
        ]);
    }
    println!("{}", table);
    let renderer = CanvasRenderer::new(render_config(), Viewport::default());
    for line in renderer.edge_summary(&graph.edges) {
        println!("{}", line);
    }
    println!("{} node(s), {} edge(s)", graph.nodes.len(), graph.edges.len());
    Ok(())
}

async fn get(store: &FlowStore, flow: &str, node_id: &str, output: NodeFormat) -> Result<()> {
    let node = store
        .read_node_config(flow, node_id)
        .await
        .with_context(|| format!("Failed to read node '{}' of flow '{}'", node_id, flow))?;

    match output {
        NodeFormat::Toml => print!("{}", toml::to_string(&node)?),
        NodeFormat::Json => {
            let value = toml_to_json(&Value::Table(node));
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

async fn set(store: &FlowStore, flow: &str, node_id: &str, data: &str) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(data).context("--data is not valid JSON")?;
    let value = json_to_toml(json).context("--data cannot be stored as TOML")?;

    store
        .write_node_config(flow, node_id, value)
        .await
        .with_context(|| format!("Failed to write node '{}' of flow '{}'", node_id, flow))?;
    success(&format!("flow/{} node {} updated", flow, node_id));
    Ok(())
}
