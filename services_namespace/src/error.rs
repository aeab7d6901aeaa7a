//! Namesystem errors

use fs_view::NamespaceError;
use services_storage::StorageError;
use storage_policy::PolicyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamesystemError {
    /// No policy in the suite has this name
    #[error("Cannot find a storage policy with the name {0}")]
    UnknownPolicyName(String),

    #[error("File/Directory does not exist: {0}")]
    PathNotFound(String),

    /// The policy table failed validation
    #[error("Malformed storage policy configuration: {0}")]
    MalformedPolicyConfiguration(String),

    #[error("Namespace error: {0}")]
    Namespace(NamespaceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<PolicyError> for NamesystemError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::UnknownPolicyName(name) => NamesystemError::UnknownPolicyName(name),
            PolicyError::MalformedConfiguration(msg) => {
                NamesystemError::MalformedPolicyConfiguration(msg)
            }
        }
    }
}

impl From<NamespaceError> for NamesystemError {
    fn from(err: NamespaceError) -> Self {
        match err {
            NamespaceError::PathNotFound(path) => NamesystemError::PathNotFound(path),
            other => NamesystemError::Namespace(other),
        }
    }
}
