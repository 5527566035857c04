pub mod completion;
pub mod edit;
pub mod flow;
pub mod get;
pub mod node;
pub mod settings;
pub mod watch;
