//! Module `commands`
//!
//! Defines the request parsing logic and the data structures used to
//! represent requests, their status, and results.
//!
//! Requests arrive one JSON object per line, selected by an `op` field:
//!
//! ```text
//! {"op":"create","project":"website","path":"docs/readme.txt","type":"file","author":"ada"}
//! {"op":"batch","project":"website","nodes":[{"path":"src","type":"folder"},{"path":"src/lib.rs","type":"file"}]}
//! {"op":"get","project":"website"}
//! {"op":"quit"}
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::service::NodeRequest;

/// Represents a request parsed from the client input.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Add a file or folder; `node_type` is checked by the service.
    Create {
        project: String,
        path: String,
        node_type: String,
        author: Option<String>,
    },
    /// Add several nodes, all or nothing.
    Batch {
        project: String,
        nodes: Vec<NodeRequest>,
    },
    /// Fetch a project's tree and path list.
    Get { project: String },
    Quit,
    /// Well-formed JSON with an `op` this server does not know.
    Unknown(String),
    /// Not a JSON object, or required fields missing.
    Malformed(String),
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request {
    Create {
        project: String,
        #[serde(default)]
        path: String,
        #[serde(default, rename = "type")]
        node_type: String,
        #[serde(default)]
        author: Option<String>,
    },
    Batch {
        project: String,
        nodes: Vec<NodeRequest>,
    },
    Get {
        project: String,
    },
    Quit,
}

const KNOWN_OPS: [&str; 4] = ["create", "batch", "get", "quit"];

/// Parses a raw request line into the `Command` enum.
pub fn parse_command(raw: &str) -> Command {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(e) => return Command::Malformed(e.to_string()),
    };

    let op = match value.get("op").and_then(Value::as_str) {
        Some(op) => op.to_string(),
        None => return Command::Malformed("missing \"op\" field".into()),
    };
    if !KNOWN_OPS.contains(&op.as_str()) {
        return Command::Unknown(op);
    }

    match serde_json::from_value::<Request>(value) {
        Ok(Request::Create {
            project,
            path,
            node_type,
            author,
        }) => Command::Create {
            project,
            path,
            node_type,
            author,
        },
        Ok(Request::Batch { project, nodes }) => Command::Batch { project, nodes },
        Ok(Request::Get { project }) => Command::Get { project },
        Ok(Request::Quit) => Command::Quit,
        Err(e) => Command::Malformed(e.to_string()),
    }
}
