// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory process graph consumed by the behavior compiler.
//!
//! The graph is produced by an external parser and is read-only from the
//! compiler's point of view. Every type derives `Deserialize` so that a graph
//! can also be loaded from YAML for demos and tests.

mod definition;
mod event;
mod extension;
mod field;
mod node;

pub use definition::{load_definition, Message, ProcessDefinition, SequenceFlow, Signal, SignalScope};
pub use event::{
    CompensateEventDefinition, ErrorEventDefinition, EventDefinition, MessageEventDefinition,
    PayloadMapping, SignalEventDefinition, TerminateEventDefinition, TimerEventDefinition,
    TimerValue,
};
pub use extension::{ExtensionAttribute, ExtensionAttributes};
pub use field::{FieldExtension, MapExceptionEntry};
pub use node::{
    BoundaryEvent, BusinessRuleTask, CallActivity, ImplementationType,
    MultiInstanceLoopCharacteristics, NodeKind, ProcessNode, ScriptTask, ServiceTask,
    ServiceTaskType, StartEvent, UserTask,
};

pub(crate) fn default_true() -> bool {
    true
}
