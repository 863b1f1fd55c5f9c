//! Command handlers module for the tree server.
//!
//! Maps each parsed request onto the structure store and turns the outcome
//! into a response line.

use log::info;

use crate::error::ServiceError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::protocol::responses::{
    BAD_REQUEST, CREATED, GOODBYE, OK, error_response, message_response, tree_response,
};
use crate::protocol::{Command, CommandResult, CommandStatus};
use crate::service::{CreateNode, NodeRequest, StructureStore};

/// Dispatches a received command to its corresponding handler.
///
/// # Arguments
///
/// * `command` - Reference to the parsed request.
/// * `store` - The structure store serving tree operations.
///
/// # Returns
///
/// * `CommandResult` - Result of the command execution, including status and message.
pub async fn handle_command(command: &Command, store: &StructureStore) -> CommandResult {
    match command {
        Command::Create {
            project,
            path,
            node_type,
            author,
        } => {
            let request = CreateNode {
                project: project.clone(),
                path: path.clone(),
                node_type: node_type.clone(),
                author: author.clone(),
            };
            handle_cmd_create(request, store).await
        }
        Command::Batch { project, nodes } => handle_cmd_batch(project, nodes.clone(), store).await,
        Command::Get { project } => handle_cmd_get(project, store).await,
        Command::Quit => handle_cmd_quit(),
        Command::Unknown(op) => handle_cmd_unknown(op),
        Command::Malformed(reason) => failure(&ServiceError::ProtocolError(reason.clone())),
    }
}

/// Handles `create`: inserts a node and returns the refreshed tree.
async fn handle_cmd_create(request: CreateNode, store: &StructureStore) -> CommandResult {
    let project = request.project.clone();
    let path = request.path.clone();
    match store.create_node(request).await {
        Ok(snapshot) => {
            info!(
                "Project {}: created {} ({} paths)",
                project,
                path,
                snapshot.paths.len()
            );
            CommandResult {
                status: CommandStatus::Success,
                message: Some(tree_response(CREATED, &snapshot)),
            }
        }
        Err(e) => failure(&e),
    }
}

/// Handles `batch`: inserts every node or none of them.
async fn handle_cmd_batch(
    project: &str,
    nodes: Vec<NodeRequest>,
    store: &StructureStore,
) -> CommandResult {
    let count = nodes.len();
    match store.create_nodes(project, nodes).await {
        Ok(snapshot) => {
            info!(
                "Project {}: created {} nodes ({} paths)",
                project,
                count,
                snapshot.paths.len()
            );
            CommandResult {
                status: CommandStatus::Success,
                message: Some(tree_response(CREATED, &snapshot)),
            }
        }
        Err(e) => failure(&e),
    }
}

/// Handles `get`: returns the project's tree, creating it if absent.
async fn handle_cmd_get(project: &str, store: &StructureStore) -> CommandResult {
    match store.get_tree(project).await {
        Ok(snapshot) => CommandResult {
            status: CommandStatus::Success,
            message: Some(tree_response(OK, &snapshot)),
        },
        Err(e) => failure(&e),
    }
}

/// Handles `quit`: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(message_response(GOODBYE, "Goodbye")),
    }
}

fn handle_cmd_unknown(op: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(format!("Unknown op {}", op)),
        message: Some(error_response(
            BAD_REQUEST,
            &format!("Unknown op: {}", op),
        )),
    }
}

fn failure(err: &ServiceError) -> CommandResult {
    handle_error(err);
    CommandResult {
        status: CommandStatus::Failure(err.to_string()),
        message: Some(error_response(error_to_status(err), &err.to_string())),
    }
}
