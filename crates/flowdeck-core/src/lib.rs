// flowdeck Core - Foundation types for the flowdeck flow editor
//
// A flow is a directory of TOML documents under a documents root. This crate
// owns the document model, the directory layout, configuration and the error
// type shared by the store, editor and CLI crates.

pub mod config;
pub mod error;
pub mod flow;
pub mod layout;

// Re-export core types
pub use config::{FlowdeckConfig, WatchConfig};
pub use error::{ErrorKind, FlowdeckError, FlowdeckResult};
pub use flow::{
    default_flow_name, edge_id, json_to_toml, toml_to_json, FlowDocument, FlowEntry,
    FlowGraphDocument, FlowMetadata, GraphEdge, GraphNode, Position, SettingsDocument,
};
pub use layout::{is_junk_entry, validate_flow_name, FlowLayout, FLOWS_DIR, FLOW_FILE, SETTINGS_FILE};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
