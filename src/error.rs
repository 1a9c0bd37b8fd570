use thiserror::Error;

use crate::models::{Action, ResourceKind, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A draft field could not be coerced into its wire type.
    #[error("invalid value {value:?} for {field}: {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{role} may not {action} this {resource}")]
    AccessDenied {
        role: Role,
        action: Action,
        resource: ResourceKind,
    },

    /// Cleanup left an academic field blank. Always a logic fault.
    #[error("reconciled payload would blank academic field {field}")]
    ReconciliationInvariant { field: &'static str },

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),
}

impl CoreError {
    pub fn validation(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::Validation {
            field,
            value: value.to_string(),
            reason,
        }
    }
}
