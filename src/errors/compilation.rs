// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for turning process nodes into behaviors.
//!
//! Every variant carries the identifier of the offending node and the attribute
//! or class that could not be resolved, so operators can fix the definition source.

use crate::errors::ScheduleParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilationError {
    /// A class reference is not present in the class registry.
    #[error("Node '{node_id}': could not find class '{class_name}'")]
    ClassNotFound { node_id: String, class_name: String },

    /// A registered constructor refused to build an instance.
    #[error("Node '{node_id}': could not instantiate '{class_name}': {reason}")]
    Instantiation {
        node_id: String,
        class_name: String,
        reason: String,
    },

    /// A required attribute is missing or malformed.
    #[error("Node '{node_id}': invalid attribute '{attribute}': {reason}")]
    InvalidDefinition {
        node_id: String,
        attribute: String,
        reason: String,
    },

    /// An expression could not be compiled.
    #[error("Node '{node_id}': invalid expression '{expression}': {reason}")]
    InvalidExpression {
        node_id: String,
        expression: String,
        reason: String,
    },

    /// No tier of the delegate resolution chain produced a delegate.
    #[error("Node '{node_id}': no delegate could be resolved ({tier})")]
    ResolutionExhausted { node_id: String, tier: String },

    /// A timer definition carries an unparseable schedule.
    #[error("Node '{node_id}': invalid timer schedule: {source}")]
    Schedule {
        node_id: String,
        #[source]
        source: ScheduleParseError,
    },
}

impl CompilationError {
    pub fn invalid(node_id: &str, attribute: &str, reason: impl Into<String>) -> Self {
        CompilationError::InvalidDefinition {
            node_id: node_id.to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    pub fn class_not_found(node_id: &str, class_name: &str) -> Self {
        CompilationError::ClassNotFound {
            node_id: node_id.to_string(),
            class_name: class_name.to_string(),
        }
    }

    /// Identifier of the node that failed to compile.
    pub fn node_id(&self) -> &str {
        match self {
            CompilationError::ClassNotFound { node_id, .. }
            | CompilationError::Instantiation { node_id, .. }
            | CompilationError::InvalidDefinition { node_id, .. }
            | CompilationError::InvalidExpression { node_id, .. }
            | CompilationError::ResolutionExhausted { node_id, .. }
            | CompilationError::Schedule { node_id, .. } => node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_node_and_attribute() {
        let err = CompilationError::invalid("endEvent1", "errorRef", "error event definition has no error reference");
        assert_eq!(err.node_id(), "endEvent1");
        let msg = err.to_string();
        assert!(msg.contains("endEvent1"));
        assert!(msg.contains("errorRef"));
    }

    #[test]
    fn class_not_found_names_class() {
        let err = CompilationError::class_not_found("camelTask", "integration::camel::DefaultCamelBehavior");
        assert!(err.to_string().contains("integration::camel::DefaultCamelBehavior"));
    }
}
