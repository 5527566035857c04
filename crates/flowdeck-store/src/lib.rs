//! flowdeck Store - File-system persistence for flows
//!
//! Each flow is a directory under `<documents-root>/flows` holding
//! `flow.toml` and `settings.toml`. [`FlowStore`] enumerates, creates,
//! renames and deletes those directories, reads and writes node
//! configuration inside `flow.toml`, and publishes the flow listing to
//! subscribers. [`FlowWatcher`] polls the documents root so that external
//! edits show up in the listing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flowdeck_core::FlowLayout;
//! use flowdeck_store::FlowStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FlowStore::open(FlowLayout::new("/home/me/Documents/flowdeck")).await?;
//! let created = store.create_flow().await?;
//! println!("created {} ({})", created.name, created.id);
//! # Ok(())
//! # }
//! ```

mod fs;
pub mod store;
pub mod watcher;

pub use store::{is_flow_document, FlowStore, RenameStrategy};
pub use watcher::{FlowWatcher, WatchBatch, WatchEvent, WatchEventKind, WatchHandle};
