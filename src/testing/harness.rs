// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::compiler::{
    Behavior, BehaviorFactory, BehaviorResult, ClassDelegateBehavior, DelegateHandle,
    FieldDeclaration, LeafBehavior,
};
use crate::errors::CompilationError;
use crate::model::{
    BusinessRuleTask, CallActivity, CompensateEventDefinition, ErrorEventDefinition,
    ImplementationType, Message, MessageEventDefinition, ProcessNode, ScriptTask,
    ServiceTask, Signal, SignalEventDefinition, StartEvent, TimerEventDefinition, UserTask,
};
use crate::observability::messages::compiler::OverrideApplied;
use crate::observability::messages::StructuredLog;
use crate::testing::no_op::{NoOpServiceTask, NO_OP_SERVICE_TASK_CLASS};

#[derive(Debug, Default)]
struct OverrideTables {
    all_service_tasks_no_op: bool,
    no_op_ids: HashSet<String>,
    no_op_class_names: HashSet<String>,
    mocked_class_delegates: HashMap<String, String>,
}

enum Replacement {
    NoOp,
    Mock(String),
}

/// Wraps a factory and swaps selected service-like tasks for stand-ins.
///
/// Tasks matched by the all-tasks flag, by node ID or by implementation class
/// compile to a [`NoOpServiceTask`](crate::testing::NoOpServiceTask) whose
/// `name` field holds the replaced implementation. Class delegates with a
/// registered mock compile against the mock class instead. Every other
/// operation is forwarded to the wrapped factory unchanged.
///
/// No-op stand-ins are built by the harness itself, so the wrapped factory's
/// class registry does not need to know [`NO_OP_SERVICE_TASK_CLASS`]. Mock
/// classes are compiled by the wrapped factory and must be registered there.
///
/// One harness belongs to one test scenario. The tables are guarded so the
/// harness can sit behind `Arc<dyn BehaviorFactory>`, but mutating them while
/// another thread compiles gives no ordering guarantee. Call
/// [`reset`](Self::reset) between scenarios.
pub struct TestBehaviorFactory {
    wrapped: Arc<dyn BehaviorFactory>,
    tables: RwLock<OverrideTables>,
}

impl TestBehaviorFactory {
    pub fn new(wrapped: Arc<dyn BehaviorFactory>) -> Self {
        Self {
            wrapped,
            tables: RwLock::new(OverrideTables::default()),
        }
    }

    pub fn wrapped(&self) -> &Arc<dyn BehaviorFactory> {
        &self.wrapped
    }

    pub fn set_all_service_tasks_no_op(&self, enabled: bool) {
        self.tables.write().all_service_tasks_no_op = enabled;
    }

    pub fn add_no_op_service_task_id(&self, node_id: &str) {
        self.tables.write().no_op_ids.insert(node_id.to_string());
    }

    pub fn add_no_op_service_task_class_name(&self, class_name: &str) {
        self.tables.write().no_op_class_names.insert(class_name.to_string());
    }

    /// `mock_class` is instantiated through the wrapped factory's registry.
    pub fn add_class_delegate_mock(&self, original_class: &str, mock_class: &str) {
        self.tables
            .write()
            .mocked_class_delegates
            .insert(original_class.to_string(), mock_class.to_string());
    }

    /// Clear every table and the all-tasks flag.
    pub fn reset(&self) {
        *self.tables.write() = OverrideTables::default();
    }

    fn replacement(&self, node: &ProcessNode, task: &ServiceTask) -> Option<Replacement> {
        let tables = self.tables.read();
        let implementation = task.implementation().map(str::trim);

        if tables.all_service_tasks_no_op
            || tables.no_op_ids.contains(&node.id)
            || implementation.is_some_and(|class| tables.no_op_class_names.contains(class))
        {
            return Some(Replacement::NoOp);
        }

        if task.implementation_type == ImplementationType::Class {
            return implementation
                .and_then(|class| tables.mocked_class_delegates.get(class))
                .cloned()
                .map(Replacement::Mock);
        }

        None
    }

    /// Apply an override if one matches, else run `forward`.
    fn intercept<F>(&self, node: &ProcessNode, task: &ServiceTask, forward: F) -> BehaviorResult
    where
        F: FnOnce() -> BehaviorResult,
    {
        let Some(replacement) = self.replacement(node, task) else {
            return forward();
        };
        let original = task.implementation().unwrap_or(node.kind.label());

        let (behavior, replacement) = match replacement {
            Replacement::NoOp => (no_op_behavior(node, task)?, NO_OP_SERVICE_TASK_CLASS.to_string()),
            Replacement::Mock(mock_class) => {
                let mock_task = ServiceTask {
                    implementation: Some(mock_class.clone()),
                    ..task.clone()
                };
                (self.wrapped.class_delegate_service_task(node, &mock_task)?, mock_class)
            }
        };

        OverrideApplied {
            node_id: &node.id,
            original,
            replacement: &replacement,
        }
        .log();
        Ok(behavior)
    }
}

/// A no-op class delegate carrying the replaced implementation in its `name` field.
fn no_op_behavior(node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
    let fields: Vec<FieldDeclaration> = task
        .implementation()
        .map(|implementation| vec![FieldDeclaration::fixed("name", implementation)])
        .unwrap_or_default();
    let instance = NoOpServiceTask::construct(&fields).map_err(|reason| {
        CompilationError::Instantiation {
            node_id: node.id.clone(),
            class_name: NO_OP_SERVICE_TASK_CLASS.to_string(),
            reason,
        }
    })?;
    Ok(LeafBehavior::ClassDelegate {
        node_id: node.id.clone(),
        delegate: Box::new(ClassDelegateBehavior {
            delegate: DelegateHandle::new(NO_OP_SERVICE_TASK_CLASS, instance),
            fields,
            skip_expression: None,
            map_exceptions: Vec::new(),
        }),
    }
    .into())
}

impl std::fmt::Debug for TestBehaviorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestBehaviorFactory")
            .field("tables", &*self.tables.read())
            .finish_non_exhaustive()
    }
}

impl BehaviorFactory for TestBehaviorFactory {
    fn none_start_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.none_start_event(node)
    }

    fn timer_start_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult {
        self.wrapped.timer_start_event(node, timer)
    }

    fn event_sub_process_error_start_event(&self, node: &ProcessNode, error: &ErrorEventDefinition) -> BehaviorResult {
        self.wrapped.event_sub_process_error_start_event(node, error)
    }

    fn event_sub_process_message_start_event(
        &self,
        node: &ProcessNode,
        start: &StartEvent,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        self.wrapped
            .event_sub_process_message_start_event(node, start, message, declared)
    }

    fn task(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.task(node)
    }

    fn manual_task(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.manual_task(node)
    }

    fn receive_task(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.receive_task(node)
    }

    fn user_task(&self, node: &ProcessNode, task: &UserTask) -> BehaviorResult {
        self.wrapped.user_task(node, task)
    }

    fn script_task(&self, node: &ProcessNode, task: &ScriptTask) -> BehaviorResult {
        self.wrapped.script_task(node, task)
    }

    fn business_rule_task(&self, node: &ProcessNode, task: &BusinessRuleTask) -> BehaviorResult {
        self.wrapped.business_rule_task(node, task)
    }

    fn class_delegate_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.class_delegate_service_task(node, task))
    }

    fn service_task_delegate_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.service_task_delegate_expression(node, task))
    }

    fn default_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.default_service_task(node, task))
    }

    fn service_task_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.service_task_expression(node, task))
    }

    fn web_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.web_service_task(node, task))
    }

    fn mail_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.mail_task(node, task))
    }

    fn shell_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.shell_task(node, task))
    }

    fn mule_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.mule_task(node, task))
    }

    fn camel_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.intercept(node, task, || self.wrapped.camel_task(node, task))
    }

    fn exclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.exclusive_gateway(node)
    }

    fn parallel_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.parallel_gateway(node)
    }

    fn inclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.inclusive_gateway(node)
    }

    fn event_based_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.event_based_gateway(node)
    }

    fn sequential_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult {
        self.wrapped.sequential_multi_instance(node, inner)
    }

    fn parallel_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult {
        self.wrapped.parallel_multi_instance(node, inner)
    }

    fn sub_process(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.sub_process(node)
    }

    fn adhoc_sub_process(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.adhoc_sub_process(node)
    }

    fn call_activity(&self, node: &ProcessNode, call: &CallActivity) -> BehaviorResult {
        self.wrapped.call_activity(node, call)
    }

    fn transaction(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.transaction(node)
    }

    fn intermediate_catch_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.intermediate_catch_event(node)
    }

    fn intermediate_catch_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        self.wrapped.intermediate_catch_message_event(node, message, declared)
    }

    fn intermediate_catch_timer_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult {
        self.wrapped.intermediate_catch_timer_event(node, timer)
    }

    fn intermediate_catch_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult {
        self.wrapped.intermediate_catch_signal_event(node, signal, declared)
    }

    fn intermediate_throw_none_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.intermediate_throw_none_event(node)
    }

    fn intermediate_throw_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult {
        self.wrapped.intermediate_throw_signal_event(node, signal, declared)
    }

    fn intermediate_throw_compensation_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
    ) -> BehaviorResult {
        self.wrapped.intermediate_throw_compensation_event(node, compensate)
    }

    fn throw_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        self.wrapped.throw_message_event(node, message, declared)
    }

    fn none_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.none_end_event(node)
    }

    fn error_end_event(&self, node: &ProcessNode, error: &ErrorEventDefinition) -> BehaviorResult {
        self.wrapped.error_end_event(node, error)
    }

    fn cancel_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.cancel_end_event(node)
    }

    fn terminate_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.terminate_end_event(node)
    }

    fn throw_message_end_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        self.wrapped.throw_message_end_event(node, message, declared)
    }

    fn boundary_event(&self, node: &ProcessNode, interrupting: bool) -> BehaviorResult {
        self.wrapped.boundary_event(node, interrupting)
    }

    fn boundary_cancel_event(&self, node: &ProcessNode) -> BehaviorResult {
        self.wrapped.boundary_cancel_event(node)
    }

    fn boundary_compensate_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult {
        self.wrapped.boundary_compensate_event(node, compensate, interrupting)
    }

    fn boundary_timer_event(
        &self,
        node: &ProcessNode,
        timer: &TimerEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult {
        self.wrapped.boundary_timer_event(node, timer, interrupting)
    }

    fn boundary_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
        interrupting: bool,
    ) -> BehaviorResult {
        self.wrapped.boundary_signal_event(node, signal, declared, interrupting)
    }

    fn boundary_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
        interrupting: bool,
    ) -> BehaviorResult {
        self.wrapped.boundary_message_event(node, message, declared, interrupting)
    }
}
