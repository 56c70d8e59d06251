// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures reported by an execution runtime or a delegate while running a behavior.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// A delegate reported a business error that may be mapped onto a BPMN error.
    #[error("Delegate '{delegate}' failed: {message}")]
    DelegateFailed { delegate: String, message: String },

    /// The runtime does not know how to drive this behavior.
    #[error("Behavior '{behavior}' is not supported by this runtime")]
    Unsupported { behavior: String },

    /// Any other runtime failure.
    #[error("Execution of node '{node_id}' failed: {message}")]
    Runtime { node_id: String, message: String },
}
