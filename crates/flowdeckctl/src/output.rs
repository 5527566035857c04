//! Output formats and status lines

use clap::ValueEnum;
use colored::Colorize;
use flowdeck_viz::RenderConfig;
use std::io::IsTerminal;

/// Listing formats for `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table with paths and document state
    Wide,
    /// JSON array
    Json,
    /// `flow/<name>` per line
    Name,
}

/// Formats for node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NodeFormat {
    Toml,
    Json,
}

fn use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// `✓ <message>` on stdout
pub fn success(message: &str) {
    if use_colors() {
        println!("{} {}", "✓".green().bold(), message);
    } else {
        println!("✓ {}", message);
    }
}

/// `! <message>` on stderr
pub fn warning(message: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{} {}", "!".yellow().bold(), message);
    } else {
        eprintln!("! {}", message);
    }
}

/// Dimmed text when writing to a terminal
pub fn dim(text: &str) -> String {
    if use_colors() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Box drawing and symbols on a terminal, plain ASCII when piped
pub fn render_config() -> RenderConfig {
    if use_colors() {
        RenderConfig::default()
    } else {
        RenderConfig::ascii()
    }
}
