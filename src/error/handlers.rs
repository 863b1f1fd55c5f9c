//! Error handlers
//!
//! Logs failures and maps them to the coarse status codes sent to clients.

use crate::error::types::{ProjectError, ServiceError, StoreError};
use log::{error, warn};

/// Log a service error at a level matching its kind.
pub fn handle_error(err: &ServiceError) {
    match err {
        ServiceError::Store(_) => error!("Tree service error: {}", err),
        _ => warn!("Rejected request: {}", err),
    }
}

/// Convert error to response status code
pub fn error_to_status(err: &ServiceError) -> u16 {
    match err {
        ServiceError::Tree(_) => 400,
        ServiceError::Project(ProjectError::EmptyIdentifier) => 400,
        ServiceError::Project(ProjectError::UnknownProject(_)) => 404,
        ServiceError::Store(StoreError::Corrupt(_)) => 500,
        ServiceError::Store(_) => 503,
        ServiceError::ProtocolError(_) => 400,
        ServiceError::RequestTooLong(_) => 413,
    }
}
