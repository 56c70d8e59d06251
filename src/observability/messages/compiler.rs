// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for behavior compilation.
//!
//! This module contains message types for logging events related to:
//! * Definition compilation lifecycle (start, completion, failure)
//! * Per-node behavior selection
//! * Delegate resolution tiers
//! * Test-harness overrides

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Compilation of a process definition started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_conductor::observability::messages::compiler::CompilationStarted;
///
/// let msg = CompilationStarted {
///     definition_id: "order_process",
///     node_count: 12,
///     flow_count: 14,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CompilationStarted<'a> {
    pub definition_id: &'a str,
    pub node_count: usize,
    pub flow_count: usize,
}

impl Display for CompilationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiling definition '{}': {} nodes, {} sequence flows",
            self.definition_id, self.node_count, self.flow_count
        )
    }
}

impl StructuredLog for CompilationStarted<'_> {
    fn log(&self) {
        tracing::info!(
            definition_id = self.definition_id,
            node_count = self.node_count,
            flow_count = self.flow_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "compilation",
            span_name = name,
            definition_id = self.definition_id,
            node_count = self.node_count,
        )
    }
}

/// Compilation of a process definition completed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CompilationCompleted<'a> {
    pub definition_id: &'a str,
    pub behavior_count: usize,
    pub duration: std::time::Duration,
}

impl Display for CompilationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled definition '{}': {} behaviors in {:?}",
            self.definition_id, self.behavior_count, self.duration
        )
    }
}

impl StructuredLog for CompilationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            definition_id = self.definition_id,
            behavior_count = self.behavior_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "compilation_completed",
            span_name = name,
            definition_id = self.definition_id,
            duration = ?self.duration,
        )
    }
}

/// Compilation of a process definition failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_conductor::errors::CompilationError;
/// use the_conductor::observability::messages::compiler::CompilationFailed;
///
/// let error = CompilationError::class_not_found("charge", "billing::Charge");
/// let msg = CompilationFailed {
///     definition_id: "order_process",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CompilationFailed<'a> {
    pub definition_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CompilationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compilation of definition '{}' failed: {}",
            self.definition_id, self.error
        )
    }
}

impl StructuredLog for CompilationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            definition_id = self.definition_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "compilation_failed",
            span_name = name,
            definition_id = self.definition_id,
        )
    }
}

/// A node was compiled into a behavior.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeCompiled<'a> {
    pub node_id: &'a str,
    pub node_kind: &'a str,
    pub behavior: &'a str,
}

impl Display for NodeCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) compiled to {}",
            self.node_id, self.node_kind, self.behavior
        )
    }
}

impl StructuredLog for NodeCompiled<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            node_kind = self.node_kind,
            behavior = self.behavior,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node",
            span_name = name,
            node_id = self.node_id,
            node_kind = self.node_kind,
        )
    }
}

/// A throw-message delegate was resolved.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct DelegateResolved<'a> {
    pub node_id: &'a str,
    pub tier: &'a str,
    pub delegate: &'a str,
}

impl Display for DelegateResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' resolved delegate '{}' via {}",
            self.node_id, self.delegate, self.tier
        )
    }
}

impl StructuredLog for DelegateResolved<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            tier = self.tier,
            delegate = self.delegate,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "delegate_resolution",
            span_name = name,
            node_id = self.node_id,
            tier = self.tier,
        )
    }
}

/// The test harness replaced a service-task behavior.
///
/// # Log Level
/// `info!` - Test scenarios should see which nodes were stubbed
pub struct OverrideApplied<'a> {
    pub node_id: &'a str,
    pub original: &'a str,
    pub replacement: &'a str,
}

impl Display for OverrideApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}': '{}' replaced by '{}'",
            self.node_id, self.original, self.replacement
        )
    }
}

impl StructuredLog for OverrideApplied<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            original = self.original,
            replacement = self.replacement,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "override",
            span_name = name,
            node_id = self.node_id,
            replacement = self.replacement,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CompilationError;

    #[test]
    fn test_compilation_started_display() {
        let msg = CompilationStarted {
            definition_id: "p",
            node_count: 3,
            flow_count: 2,
        };
        assert_eq!(msg.to_string(), "Compiling definition 'p': 3 nodes, 2 sequence flows");
    }

    #[test]
    fn test_compilation_failed_includes_error() {
        let error = CompilationError::class_not_found("charge", "billing::Charge");
        let msg = CompilationFailed {
            definition_id: "p",
            error: &error,
        };
        let text = msg.to_string();
        assert!(text.starts_with("Compilation of definition 'p' failed:"));
        assert!(text.contains("billing::Charge"));
    }

    #[test]
    fn test_override_applied_display() {
        let msg = OverrideApplied {
            node_id: "charge",
            original: "billing::Charge",
            replacement: "NoOpServiceTask",
        };
        assert_eq!(
            msg.to_string(),
            "Node 'charge': 'billing::Charge' replaced by 'NoOpServiceTask'"
        );
    }
}
