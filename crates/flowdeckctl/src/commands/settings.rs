use anyhow::{Context, Result};
use clap::Subcommand;

use flowdeck_core::{json_to_toml, SettingsDocument};
use flowdeck_store::FlowStore;

use crate::output::success;

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print settings.toml
    Get {
        /// Flow name
        flow: String,
    },

    /// Replace the `[settings]` table with a JSON object
    Set {
        /// Flow name
        flow: String,

        /// New settings as JSON, e.g. '{"retries":3}'
        #[arg(long)]
        data: String,
    },
}

pub async fn execute(store: &FlowStore, command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Get { flow } => {
            let settings = store
                .read_settings(&flow)
                .await
                .with_context(|| format!("Failed to read settings of flow '{}'", flow))?;
            print!("{}", settings.to_toml_string()?);
        }
        SettingsCommands::Set { flow, data } => {
            let json: serde_json::Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
            let settings = match json_to_toml(json).context("--data cannot be stored as TOML")? {
                toml::Value::Table(settings) => SettingsDocument { settings },
                _ => anyhow::bail!("--data must be a JSON object"),
            };
            store
                .write_settings(&flow, &settings)
                .await
                .with_context(|| format!("Failed to write settings of flow '{}'", flow))?;
            success(&format!("flow/{} settings updated", flow));
        }
    }
    Ok(())
}
