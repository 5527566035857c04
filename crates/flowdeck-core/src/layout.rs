// flowdeck Core - On-disk layout
//
// <documents-root>/flows/<flow-name>/flow.toml
// <documents-root>/flows/<flow-name>/settings.toml

use crate::error::{FlowdeckError, FlowdeckResult};

use std::path::{Path, PathBuf};

/// Directory under the documents root that holds one sub-directory per flow
pub const FLOWS_DIR: &str = "flows";

/// Metadata document name
pub const FLOW_FILE: &str = "flow.toml";

/// Settings document name
pub const SETTINGS_FILE: &str = "settings.toml";

/// Platform housekeeping files that never belong to a flow
const JUNK_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Resolves flow names to paths under a documents root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLayout {
    documents_root: PathBuf,
}

impl FlowLayout {
    pub fn new(documents_root: impl Into<PathBuf>) -> Self {
        Self {
            documents_root: documents_root.into(),
        }
    }

    pub fn documents_root(&self) -> &Path {
        &self.documents_root
    }

    pub fn flows_dir(&self) -> PathBuf {
        self.documents_root.join(FLOWS_DIR)
    }

    /// Directory of a single flow. The name must already be validated.
    pub fn flow_dir(&self, flow_name: &str) -> PathBuf {
        self.flows_dir().join(flow_name)
    }

    pub fn flow_file(&self, flow_name: &str) -> PathBuf {
        self.flow_dir(flow_name).join(FLOW_FILE)
    }

    pub fn settings_file(&self, flow_name: &str) -> PathBuf {
        self.flow_dir(flow_name).join(SETTINGS_FILE)
    }
}

/// Check that a flow name is usable as a single directory component
pub fn validate_flow_name(name: &str) -> FlowdeckResult<()> {
    if name.trim().is_empty() {
        return Err(FlowdeckError::invalid_input("flow name is empty"));
    }
    if name == "." || name == ".." {
        return Err(FlowdeckError::invalid_input(format!(
            "flow name '{}' is reserved",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(FlowdeckError::invalid_input(format!(
            "flow name '{}' must not contain path separators",
            name
        )));
    }
    Ok(())
}

/// True for OS housekeeping entries (Finder metadata, thumbnail caches, AppleDouble files)
pub fn is_junk_entry(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => JUNK_FILES.contains(&name) || name.starts_with("._"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = FlowLayout::new("/docs");
        assert_eq!(layout.flows_dir(), PathBuf::from("/docs/flows"));
        assert_eq!(
            layout.flow_file("Flow 1"),
            PathBuf::from("/docs/flows/Flow 1/flow.toml")
        );
        assert_eq!(
            layout.settings_file("Flow 1"),
            PathBuf::from("/docs/flows/Flow 1/settings.toml")
        );
    }

    #[test]
    fn test_validate_flow_name() {
        assert!(validate_flow_name("Flow 1").is_ok());
        assert!(validate_flow_name("my-flow_2").is_ok());
        assert!(validate_flow_name("").is_err());
        assert!(validate_flow_name("   ").is_err());
        assert!(validate_flow_name("..").is_err());
        assert!(validate_flow_name("a/b").is_err());
        assert!(validate_flow_name("a\\b").is_err());
    }

    #[test]
    fn test_junk_entries() {
        assert!(is_junk_entry(Path::new("/docs/flows/.DS_Store")));
        assert!(is_junk_entry(Path::new("/docs/flows/Flow 1/Thumbs.db")));
        assert!(is_junk_entry(Path::new("/docs/flows/._flow.toml")));
        assert!(!is_junk_entry(Path::new("/docs/flows/Flow 1/flow.toml")));
        assert!(!is_junk_entry(Path::new("/docs/flows/Flow 1")));
    }
}
