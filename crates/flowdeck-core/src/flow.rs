// flowdeck Core - Flow documents
//
// flow.toml is handled as a generic TOML table so that keys flowdeck does not
// know about survive a parse/mutate/serialize cycle. Typed views (metadata,
// graph) are extracted from and written back into that table.

use crate::error::{FlowdeckError, FlowdeckResult};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use toml::{Table, Value};

pub const DEFAULT_FLOW_VERSION: &str = "0.0.1";
pub const DEFAULT_AUTHOR: &str = "Your Name <your.email@example.com>";
pub const DEFAULT_DESCRIPTION: &str = "Description of your flow";

/// Name given to the n-th flow when none is supplied
pub fn default_flow_name(n: usize) -> String {
    format!("Flow {}", n)
}

/// The `[flow]` table of flow.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetadata {
    pub name: String,
    pub id: String,
    pub version: String,
    pub author: String,
    pub description: String,
}

impl FlowMetadata {
    /// Metadata for a brand new flow with a fresh v4 id
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            version: DEFAULT_FLOW_VERSION.to_string(),
            author: author.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// One flow directory as seen by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEntry {
    pub name: String,
    pub path: PathBuf,
    /// Non-junk files and directories below the flow directory
    pub children: Vec<PathBuf>,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

impl FlowEntry {
    pub fn has_child(&self, file_name: &str) -> bool {
        self.children
            .iter()
            .any(|p| p.file_name().map_or(false, |n| n == file_name))
    }
}

/// Canvas position of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn empty_data() -> Value {
    Value::Table(Table::new())
}

/// Typed view of a `[[nodes]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "empty_data")]
    pub data: Value,
    /// Keys flowdeck does not interpret
    #[serde(flatten)]
    pub extra: Table,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: Some(node_type.into()),
            position,
            data: empty_data(),
            extra: Table::new(),
        }
    }

    /// `data.title` when present
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }
}

/// Typed view of an `[[edges]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Table,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
            extra: Table::new(),
        }
    }
}

/// Identifier given to the edge connecting `source` to `target`
pub fn edge_id(source: &str, target: &str) -> String {
    format!("edge-{}-{}", source, target)
}

/// The node graph stored in flow.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// Parsed flow.toml
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDocument {
    flow_name: String,
    path: PathBuf,
    table: Table,
}

impl FlowDocument {
    /// Parse the text of `path` (used only for error messages)
    pub fn parse(flow_name: &str, path: impl AsRef<Path>, text: &str) -> FlowdeckResult<Self> {
        let path = path.as_ref();
        let table: Table = text
            .parse()
            .map_err(|e: toml::de::Error| FlowdeckError::malformed(path, e.message().to_string()))?;
        Ok(Self {
            flow_name: flow_name.to_string(),
            path: path.to_path_buf(),
            table,
        })
    }

    /// Minimal document for a new flow: only the `[flow]` table
    pub fn new_flow(metadata: &FlowMetadata) -> FlowdeckResult<String> {
        let mut table = Table::new();
        table.insert("flow".to_string(), Value::try_from(metadata)?);
        Ok(toml::to_string(&table)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn metadata(&self) -> FlowdeckResult<FlowMetadata> {
        let flow = self
            .table
            .get("flow")
            .cloned()
            .ok_or_else(|| FlowdeckError::malformed(&self.path, "missing [flow] table"))?;
        flow.try_into()
            .map_err(|e: toml::de::Error| FlowdeckError::malformed(&self.path, e.message().to_string()))
    }

    fn nodes(&self) -> FlowdeckResult<&Vec<Value>> {
        match self.table.get("nodes") {
            None => Err(FlowdeckError::not_found(format!(
                "flow '{}' has no nodes list",
                self.flow_name
            ))),
            Some(Value::Array(nodes)) if nodes.is_empty() => Err(FlowdeckError::not_found(
                format!("flow '{}' has an empty nodes list", self.flow_name),
            )),
            Some(Value::Array(nodes)) => Ok(nodes),
            Some(other) => Err(FlowdeckError::malformed(
                &self.path,
                format!("'nodes' must be an array, found {}", other.type_str()),
            )),
        }
    }

    /// Position of the single node carrying `node_id`
    fn node_index(&self, node_id: &str) -> FlowdeckResult<usize> {
        if node_id.is_empty() {
            return Err(FlowdeckError::invalid_input("node id is empty"));
        }
        let nodes = self.nodes()?;
        let matches: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.get("id").and_then(Value::as_str) == Some(node_id))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [] => Err(FlowdeckError::not_found(format!(
                "node '{}' not found in flow '{}'",
                node_id, self.flow_name
            ))),
            [index] => Ok(*index),
            _ => Err(FlowdeckError::DuplicateNodeId {
                flow: self.flow_name.clone(),
                node_id: node_id.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// The full node table for `node_id`
    pub fn node(&self, node_id: &str) -> FlowdeckResult<Table> {
        let index = self.node_index(node_id)?;
        match &self.nodes()?[index] {
            Value::Table(node) => Ok(node.clone()),
            other => Err(FlowdeckError::malformed(
                &self.path,
                format!("node entries must be tables, found {}", other.type_str()),
            )),
        }
    }

    /// Replace the `data` of `node_id`, leaving every other key untouched
    pub fn set_node_data(&mut self, node_id: &str, data: Value) -> FlowdeckResult<()> {
        let index = self.node_index(node_id)?;
        let path = self.path.clone();
        match self.table.get_mut("nodes") {
            Some(Value::Array(nodes)) => match &mut nodes[index] {
                Value::Table(node) => {
                    node.insert("data".to_string(), data);
                    Ok(())
                }
                other => Err(FlowdeckError::malformed(
                    path,
                    format!("node entries must be tables, found {}", other.type_str()),
                )),
            },
            _ => Err(FlowdeckError::malformed(path, "'nodes' must be an array")),
        }
    }

    /// Nodes and edges as typed values; absent arrays are empty
    pub fn graph(&self) -> FlowdeckResult<FlowGraphDocument> {
        let mut view = Table::new();
        for key in ["nodes", "edges"] {
            if let Some(value) = self.table.get(key) {
                view.insert(key.to_string(), value.clone());
            }
        }
        Value::Table(view)
            .try_into()
            .map_err(|e: toml::de::Error| FlowdeckError::malformed(&self.path, e.message().to_string()))
    }

    /// Replace the `nodes` and `edges` arrays
    pub fn set_graph(&mut self, graph: &FlowGraphDocument) -> FlowdeckResult<()> {
        let nodes = graph
            .nodes
            .iter()
            .map(Value::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = graph
            .edges
            .iter()
            .map(Value::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.table.insert("nodes".to_string(), Value::Array(nodes));
        self.table.insert("edges".to_string(), Value::Array(edges));
        Ok(())
    }

    pub fn to_toml_string(&self) -> FlowdeckResult<String> {
        Ok(toml::to_string(&self.table)?)
    }
}

/// Parsed settings.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub settings: Table,
}

impl SettingsDocument {
    pub fn parse(path: impl AsRef<Path>, text: &str) -> FlowdeckResult<Self> {
        toml::from_str(text)
            .map_err(|e| FlowdeckError::malformed(path.as_ref(), e.message().to_string()))
    }

    pub fn to_toml_string(&self) -> FlowdeckResult<String> {
        Ok(toml::to_string(self)?)
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        let mut settings = Table::new();
        settings.insert("some_key".to_string(), Value::String("some_value".to_string()));
        Self { settings }
    }
}

/// Convert a JSON value into TOML. TOML has no null, so nulls are rejected.
pub fn json_to_toml(value: serde_json::Value) -> FlowdeckResult<Value> {
    use serde_json::Value as Json;

    Ok(match value {
        Json::Null => {
            return Err(FlowdeckError::invalid_input(
                "null values cannot be stored in TOML",
            ))
        }
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                Value::Float(f)
            } else {
                // u64 above i64::MAX
                return Err(FlowdeckError::invalid_input(format!(
                    "number {} does not fit in a TOML integer",
                    n
                )));
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(
            items
                .into_iter()
                .map(json_to_toml)
                .collect::<FlowdeckResult<Vec<_>>>()?,
        ),
        Json::Object(map) => {
            let mut table = Table::new();
            for (k, v) in map {
                table.insert(k, json_to_toml(v)?);
            }
            Value::Table(table)
        }
    })
}

/// Convert a TOML value into JSON; datetimes become RFC 3339 strings
pub fn toml_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Datetime(dt) => Json::String(dt.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(toml_to_json).collect()),
        Value::Table(table) => Json::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
