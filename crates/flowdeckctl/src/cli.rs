use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flowdeck_core::FlowdeckConfig;
use flowdeck_store::FlowStore;

use crate::commands;
use crate::output::{NodeFormat, OutputFormat};

/// flowdeck CLI - manage and edit flows stored as TOML documents
#[derive(Parser, Debug)]
#[command(name = "flowdeckctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Documents root holding the `flows` directory (overrides the config file)
    #[arg(long, global = true, env = "FLOWDECK_ROOT")]
    pub root: Option<PathBuf>,

    /// Configuration file
    ///
    /// Defaults to `<config dir>/flowdeck/config.toml` when that file exists.
    #[arg(long, global = true, env = "FLOWDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List resources (verb-first: get flows)
    Get {
        /// Resource type (flow, flows)
        resource_type: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "wide")]
        output: OutputFormat,
    },

    /// Create a resource named after the number of existing flows
    Create {
        /// Resource type (flow)
        resource_type: String,
    },

    /// Delete a resource and everything under it
    Delete {
        /// Resource type (flow)
        resource_type: String,

        /// Resource name
        name: String,
    },

    /// Rename a resource
    Rename {
        /// Resource type (flow)
        resource_type: String,

        /// Current name
        name: String,

        /// New name
        new_name: String,
    },

    /// Read or write node configuration inside a flow
    Node {
        #[command(subcommand)]
        command: commands::node::NodeCommands,
    },

    /// Read or write a flow's settings
    Settings {
        #[command(subcommand)]
        command: commands::settings::SettingsCommands,
    },

    /// Stream file changes and listing refreshes until interrupted
    Watch,

    /// Open the terminal flow editor
    Edit {
        /// Flow name
        flow: String,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: commands::completion::Shell,
    },
}

impl Cli {
    /// Built-in defaults, then the config file, then `--root`
    pub fn resolve_config(&self) -> Result<FlowdeckConfig> {
        let config = FlowdeckConfig::resolve(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load config {}", path.display()),
            None => "Failed to load config".to_string(),
        })?;
        Ok(match &self.root {
            Some(root) => config.with_documents_root(root),
            None => config,
        })
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.resolve_config()?;

        match self.command {
            Commands::Completion { shell } => commands::completion::execute(shell),
            Commands::Get {
                resource_type,
                output,
            } => {
                parse_resource(&resource_type)?;
                let store = open_store(&config).await?;
                commands::get::execute(&store, output)
            }
            Commands::Create { resource_type } => {
                parse_resource(&resource_type)?;
                let store = open_store(&config).await?;
                commands::flow::create(&store).await
            }
            Commands::Delete {
                resource_type,
                name,
            } => {
                parse_resource(&resource_type)?;
                let store = open_store(&config).await?;
                commands::flow::delete(&store, &name).await
            }
            Commands::Rename {
                resource_type,
                name,
                new_name,
            } => {
                parse_resource(&resource_type)?;
                let store = open_store(&config).await?;
                commands::flow::rename(&store, &name, &new_name).await
            }
            Commands::Node { command } => {
                let store = open_store(&config).await?;
                commands::node::execute(&store, command).await
            }
            Commands::Settings { command } => {
                let store = open_store(&config).await?;
                commands::settings::execute(&store, command).await
            }
            Commands::Watch => {
                let store = open_store(&config).await?;
                commands::watch::execute(store, config.watch.poll_interval()).await
            }
            Commands::Edit { flow } => {
                let store = open_store(&config).await?;
                commands::edit::execute(store, &flow, &config).await
            }
        }
    }
}

/// Only flows are managed; accept the usual singular and plural spellings
fn parse_resource(resource_type: &str) -> Result<()> {
    match resource_type.to_lowercase().as_str() {
        "flow" | "flows" => Ok(()),
        other => Err(anyhow::anyhow!("Unknown resource type: {}", other)),
    }
}

async fn open_store(config: &FlowdeckConfig) -> Result<FlowStore> {
    let store = FlowStore::from_config(config);
    store
        .refresh()
        .await
        .with_context(|| format!("Failed to read flows under {}", config.documents_root.display()))?;
    Ok(store)
}
