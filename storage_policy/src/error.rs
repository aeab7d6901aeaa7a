//! Policy errors

use alloc::string::String;
use core::fmt;

/// Errors raised by policy lookup and suite loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A policy name is not registered in the suite
    UnknownPolicyName(String),

    /// The policy configuration cannot be turned into a suite
    ///
    /// This is a startup error; a process must not start with it.
    MalformedConfiguration(String),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::UnknownPolicyName(name) => {
                write!(f, "Cannot find a storage policy with the name {}", name)
            }
            PolicyError::MalformedConfiguration(msg) => {
                write!(f, "Malformed storage policy configuration: {}", msg)
            }
        }
    }
}
