// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::compiler::behavior::Behavior;
use crate::compiler::behavior_map::BehaviorMap;
use crate::compiler::expression::{compile_optional, ExpressionManager};
use crate::compiler::factory::{BehaviorFactory, BehaviorResult};
use crate::errors::CompilationError;
use crate::model::{
    EventDefinition, ImplementationType, NodeKind, ProcessDefinition, ProcessNode, ServiceTask,
    ServiceTaskType,
};
use crate::observability::messages::compiler::{
    CompilationCompleted, CompilationFailed, CompilationStarted, NodeCompiled,
};
use crate::observability::messages::StructuredLog;

/// Chooses the factory operation for each node and compiles whole definitions.
///
/// The factory is swappable: production code passes a
/// [`DefaultBehaviorFactory`](crate::compiler::DefaultBehaviorFactory), tests
/// may pass a [`TestBehaviorFactory`](crate::testing::TestBehaviorFactory)
/// wrapping it.
#[derive(Clone)]
pub struct BehaviorCompiler {
    factory: Arc<dyn BehaviorFactory>,
    expressions: Arc<dyn ExpressionManager>,
}

impl BehaviorCompiler {
    pub fn new(factory: Arc<dyn BehaviorFactory>, expressions: Arc<dyn ExpressionManager>) -> Self {
        Self { factory, expressions }
    }

    pub fn factory(&self) -> &Arc<dyn BehaviorFactory> {
        &self.factory
    }

    /// Compile every node and conditional flow of `definition`.
    ///
    /// The first failure aborts the compilation and is returned as is.
    pub fn compile_definition(&self, definition: &ProcessDefinition) -> Result<BehaviorMap, CompilationError> {
        let started = Instant::now();
        CompilationStarted {
            definition_id: &definition.id,
            node_count: definition.nodes.len(),
            flow_count: definition.sequence_flows.len(),
        }
        .log();

        let result = self.compile_all(definition);
        match &result {
            Ok(behaviors) => CompilationCompleted {
                definition_id: &definition.id,
                behavior_count: behaviors.len(),
                duration: started.elapsed(),
            }
            .log(),
            Err(error) => CompilationFailed {
                definition_id: &definition.id,
                error,
            }
            .log(),
        }
        result
    }

    fn compile_all(&self, definition: &ProcessDefinition) -> Result<BehaviorMap, CompilationError> {
        validate_references(definition)?;

        let mut behaviors = BehaviorMap::new();
        for node in &definition.nodes {
            let behavior = self.compile_node(node, definition)?;
            behaviors.insert(node.id.clone(), behavior);
        }

        for flow in &definition.sequence_flows {
            if let Some(condition) =
                compile_optional(self.expressions.as_ref(), &flow.id, flow.condition_expression.as_deref())?
            {
                behaviors.insert_condition(flow.id.clone(), condition);
            }
        }

        Ok(behaviors)
    }

    /// Compile one node, wrapping it when it carries multi-instance characteristics.
    pub fn compile_node(&self, node: &ProcessNode, definition: &ProcessDefinition) -> BehaviorResult {
        let inner = self.compile_leaf(node, definition)?;

        let behavior = match &node.multi_instance {
            None => inner,
            Some(_) if !node.kind.is_activity() => {
                return Err(CompilationError::invalid(
                    &node.id,
                    "multiInstanceLoopCharacteristics",
                    format!("{} cannot be multi-instance", node.kind.label()),
                ))
            }
            Some(characteristics) if characteristics.sequential => {
                self.factory.sequential_multi_instance(node, inner)?
            }
            Some(_) => self.factory.parallel_multi_instance(node, inner)?,
        };

        NodeCompiled {
            node_id: &node.id,
            node_kind: node.kind.label(),
            behavior: behavior.label(),
        }
        .log();

        Ok(behavior)
    }

    fn compile_leaf(&self, node: &ProcessNode, definition: &ProcessDefinition) -> BehaviorResult {
        let factory = self.factory.as_ref();
        let first = node.first_event_definition();

        match &node.kind {
            NodeKind::StartEvent(start) => match first {
                None => factory.none_start_event(node),
                Some(EventDefinition::Timer(timer)) => factory.timer_start_event(node, timer),
                Some(EventDefinition::Error(error)) if start.in_event_sub_process => {
                    factory.event_sub_process_error_start_event(node, error)
                }
                Some(EventDefinition::Message(message)) if start.in_event_sub_process => {
                    let declared = message.message_ref.as_deref().and_then(|id| definition.message(id));
                    factory.event_sub_process_message_start_event(node, start, message, declared)
                }
                // Process-level message and signal starts are triggered by the engine
                Some(EventDefinition::Message(_)) | Some(EventDefinition::Signal(_)) => {
                    factory.none_start_event(node)
                }
                Some(other) => Err(unsupported(node, other)),
            },

            NodeKind::EndEvent => match first {
                None => factory.none_end_event(node),
                Some(EventDefinition::Error(error)) => factory.error_end_event(node, error),
                Some(EventDefinition::Cancel) => factory.cancel_end_event(node),
                Some(EventDefinition::Terminate(_)) => factory.terminate_end_event(node),
                Some(EventDefinition::Message(message)) => {
                    let declared = message.message_ref.as_deref().and_then(|id| definition.message(id));
                    factory.throw_message_end_event(node, message, declared)
                }
                Some(other) => Err(unsupported(node, other)),
            },

            NodeKind::Task => factory.task(node),
            NodeKind::ManualTask => factory.manual_task(node),
            NodeKind::ReceiveTask => factory.receive_task(node),
            NodeKind::UserTask(task) => factory.user_task(node, task),
            NodeKind::ScriptTask(task) => factory.script_task(node, task),
            NodeKind::BusinessRuleTask(task) => factory.business_rule_task(node, task),
            NodeKind::ServiceTask(task) | NodeKind::SendTask(task) => self.compile_service_like(node, task),

            NodeKind::ExclusiveGateway => factory.exclusive_gateway(node),
            NodeKind::ParallelGateway => factory.parallel_gateway(node),
            NodeKind::InclusiveGateway => factory.inclusive_gateway(node),
            NodeKind::EventGateway => factory.event_based_gateway(node),

            NodeKind::SubProcess => factory.sub_process(node),
            NodeKind::AdhocSubProcess => factory.adhoc_sub_process(node),
            NodeKind::CallActivity(call) => factory.call_activity(node, call),
            NodeKind::Transaction => factory.transaction(node),

            NodeKind::BoundaryEvent(boundary) => {
                let interrupting = boundary.cancel_activity;
                match first {
                    None | Some(EventDefinition::Error(_)) => factory.boundary_event(node, interrupting),
                    Some(EventDefinition::Cancel) => factory.boundary_cancel_event(node),
                    Some(EventDefinition::Compensate(compensate)) => {
                        factory.boundary_compensate_event(node, compensate, interrupting)
                    }
                    Some(EventDefinition::Timer(timer)) => factory.boundary_timer_event(node, timer, interrupting),
                    Some(EventDefinition::Signal(signal)) => {
                        let declared = signal.signal_ref.as_deref().and_then(|id| definition.signal(id));
                        factory.boundary_signal_event(node, signal, declared, interrupting)
                    }
                    Some(EventDefinition::Message(message)) => {
                        let declared = message.message_ref.as_deref().and_then(|id| definition.message(id));
                        factory.boundary_message_event(node, message, declared, interrupting)
                    }
                    Some(other) => Err(unsupported(node, other)),
                }
            }

            NodeKind::IntermediateCatchEvent => match first {
                None => factory.intermediate_catch_event(node),
                Some(EventDefinition::Message(message)) => {
                    let declared = message.message_ref.as_deref().and_then(|id| definition.message(id));
                    factory.intermediate_catch_message_event(node, message, declared)
                }
                Some(EventDefinition::Timer(timer)) => factory.intermediate_catch_timer_event(node, timer),
                Some(EventDefinition::Signal(signal)) => {
                    let declared = signal.signal_ref.as_deref().and_then(|id| definition.signal(id));
                    factory.intermediate_catch_signal_event(node, signal, declared)
                }
                Some(other) => Err(unsupported(node, other)),
            },

            NodeKind::IntermediateThrowEvent => match first {
                None => factory.intermediate_throw_none_event(node),
                Some(EventDefinition::Signal(signal)) => {
                    let declared = signal.signal_ref.as_deref().and_then(|id| definition.signal(id));
                    factory.intermediate_throw_signal_event(node, signal, declared)
                }
                Some(EventDefinition::Compensate(compensate)) => {
                    factory.intermediate_throw_compensation_event(node, compensate)
                }
                Some(EventDefinition::Message(message)) => {
                    let declared = message.message_ref.as_deref().and_then(|id| definition.message(id));
                    factory.throw_message_event(node, message, declared)
                }
                Some(other) => Err(unsupported(node, other)),
            },
        }
    }

    /// Typed tasks first, then the implementation type.
    fn compile_service_like(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        let factory = self.factory.as_ref();

        if let Some(task_type) = task.task_type {
            return match task_type {
                ServiceTaskType::Mail => factory.mail_task(node, task),
                ServiceTaskType::Mule => factory.mule_task(node, task),
                ServiceTaskType::Camel => factory.camel_task(node, task),
                ServiceTaskType::Shell => factory.shell_task(node, task),
            };
        }

        match task.implementation_type {
            ImplementationType::WebService => factory.web_service_task(node, task),
            ImplementationType::Class => factory.class_delegate_service_task(node, task),
            ImplementationType::Expression => factory.service_task_expression(node, task),
            ImplementationType::DelegateExpression => factory.service_task_delegate_expression(node, task),
            ImplementationType::Unspecified if task.implementation().is_some() => {
                factory.default_service_task(node, task)
            }
            ImplementationType::Unspecified => Err(CompilationError::invalid(
                &node.id,
                "implementation",
                format!("{} defines no implementation", node.kind.label()),
            )),
        }
    }
}

impl std::fmt::Debug for BehaviorCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorCompiler").finish_non_exhaustive()
    }
}

fn unsupported(node: &ProcessNode, definition: &EventDefinition) -> CompilationError {
    CompilationError::invalid(
        &node.id,
        "eventDefinitions",
        format!(
            "{} event definition is not supported on {}",
            definition.label(),
            node.kind.label()
        ),
    )
}

/// Node IDs are unique, boundary events sit on activities and flows connect known nodes.
fn validate_references(definition: &ProcessDefinition) -> Result<(), CompilationError> {
    let mut seen = HashSet::new();
    for node in &definition.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(CompilationError::invalid(&node.id, "id", "duplicate node id"));
        }
    }

    for node in &definition.nodes {
        if let NodeKind::BoundaryEvent(boundary) = &node.kind {
            match definition.node(&boundary.attached_to_ref) {
                Some(host) if host.kind.is_activity() => {}
                Some(host) => {
                    return Err(CompilationError::invalid(
                        &node.id,
                        "attachedToRef",
                        format!("'{}' is a {}, not an activity", host.id, host.kind.label()),
                    ))
                }
                None => {
                    return Err(CompilationError::invalid(
                        &node.id,
                        "attachedToRef",
                        format!("unknown activity '{}'", boundary.attached_to_ref),
                    ))
                }
            }
        }
    }

    for flow in &definition.sequence_flows {
        for (attribute, target) in [("sourceRef", &flow.source_ref), ("targetRef", &flow.target_ref)] {
            if !seen.contains(target.as_str()) {
                return Err(CompilationError::invalid(
                    &flow.id,
                    attribute,
                    format!("unknown node '{}'", target),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::behavior::LeafBehavior;
    use crate::compiler::expression::DefaultExpressionManager;
    use crate::compiler::factory::DefaultBehaviorFactory;
    use crate::config::EngineConfig;
    use crate::model::{
        BoundaryEvent, CompensateEventDefinition, ErrorEventDefinition, MessageEventDefinition,
        MultiInstanceLoopCharacteristics, SequenceFlow, SignalEventDefinition, StartEvent,
        TimerEventDefinition,
    };
    use crate::testing::NO_OP_SERVICE_TASK_CLASS;

    fn compiler() -> BehaviorCompiler {
        BehaviorCompiler::new(
            Arc::new(DefaultBehaviorFactory::new(EngineConfig::default())),
            Arc::new(DefaultExpressionManager),
        )
    }

    fn label_of(node: ProcessNode) -> Result<&'static str, CompilationError> {
        let definition = ProcessDefinition::new("p").with_node(node.clone());
        compiler().compile_node(&node, &definition).map(|b| b.label())
    }

    #[test]
    fn test_dispatch_table() {
        let event_sub_process = StartEvent {
            in_event_sub_process: true,
            ..StartEvent::default()
        };
        let signal = SignalEventDefinition {
            signal_ref: Some("alarm".to_string()),
            ..SignalEventDefinition::default()
        };
        let error = ErrorEventDefinition {
            error_ref: Some("E42".to_string()),
        };

        let cases: Vec<(ProcessNode, &str)> = vec![
            (ProcessNode::new("n", NodeKind::StartEvent(StartEvent::default())), "none_start_event"),
            (
                ProcessNode::new("n", NodeKind::StartEvent(StartEvent::default()))
                    .with_event_definition(EventDefinition::Timer(TimerEventDefinition::cycle("R/PT1H"))),
                "timer_start_event",
            ),
            (
                ProcessNode::new("n", NodeKind::StartEvent(StartEvent::default()))
                    .with_event_definition(EventDefinition::Message(MessageEventDefinition::new("m"))),
                "none_start_event",
            ),
            (
                ProcessNode::new("n", NodeKind::StartEvent(event_sub_process.clone()))
                    .with_event_definition(EventDefinition::Error(ErrorEventDefinition::default())),
                "error_start_event",
            ),
            (
                ProcessNode::new("n", NodeKind::StartEvent(event_sub_process))
                    .with_event_definition(EventDefinition::Message(MessageEventDefinition::new("m"))),
                "message_start_event",
            ),
            (ProcessNode::new("n", NodeKind::EndEvent), "none_end_event"),
            (
                ProcessNode::new("n", NodeKind::EndEvent).with_event_definition(EventDefinition::Error(error.clone())),
                "error_end_event",
            ),
            (
                ProcessNode::new("n", NodeKind::EndEvent).with_event_definition(EventDefinition::Cancel),
                "cancel_end_event",
            ),
            (
                ProcessNode::new("n", NodeKind::EndEvent)
                    .with_event_definition(EventDefinition::Message(MessageEventDefinition::new("m"))),
                "throw_message_end_event",
            ),
            (ProcessNode::new("n", NodeKind::ManualTask), "manual_task"),
            (ProcessNode::new("n", NodeKind::EventGateway), "event_based_gateway"),
            (ProcessNode::new("n", NodeKind::Transaction), "transaction"),
            (
                ProcessNode::new("n", NodeKind::ServiceTask(ServiceTask::class(NO_OP_SERVICE_TASK_CLASS))),
                "class_delegate",
            ),
            (
                ProcessNode::new("n", NodeKind::SendTask(ServiceTask::typed(ServiceTaskType::Mail))),
                "mail_task",
            ),
            (
                ProcessNode::new(
                    "n",
                    NodeKind::ServiceTask(ServiceTask {
                        implementation_type: ImplementationType::WebService,
                        ..ServiceTask::default()
                    }),
                ),
                "web_service_task",
            ),
            (
                ProcessNode::new("n", NodeKind::ServiceTask(ServiceTask::delegate_expression("${sender}"))),
                "service_task_delegate_expression",
            ),
            (
                ProcessNode::new(
                    "n",
                    NodeKind::ServiceTask(ServiceTask {
                        implementation: Some("legacyBean".to_string()),
                        ..ServiceTask::default()
                    }),
                ),
                "service_task_delegate_expression",
            ),
            (
                ProcessNode::new("n", NodeKind::BoundaryEvent(BoundaryEvent::attached_to("t", false)))
                    .with_event_definition(EventDefinition::Signal(signal.clone())),
                "boundary_signal_event",
            ),
            (
                ProcessNode::new("n", NodeKind::BoundaryEvent(BoundaryEvent::attached_to("t", true)))
                    .with_event_definition(EventDefinition::Error(error)),
                "boundary_event",
            ),
            (
                ProcessNode::new("n", NodeKind::BoundaryEvent(BoundaryEvent::attached_to("t", true)))
                    .with_event_definition(EventDefinition::Compensate(CompensateEventDefinition::default())),
                "boundary_compensate_event",
            ),
            (
                ProcessNode::new("n", NodeKind::IntermediateCatchEvent)
                    .with_event_definition(EventDefinition::Signal(signal.clone())),
                "intermediate_catch_signal_event",
            ),
            (
                ProcessNode::new("n", NodeKind::IntermediateThrowEvent)
                    .with_event_definition(EventDefinition::Signal(signal)),
                "intermediate_throw_signal_event",
            ),
            (
                ProcessNode::new("n", NodeKind::IntermediateThrowEvent)
                    .with_event_definition(EventDefinition::Compensate(CompensateEventDefinition::default())),
                "intermediate_throw_compensation_event",
            ),
            (
                ProcessNode::new("n", NodeKind::IntermediateThrowEvent)
                    .with_event_definition(EventDefinition::Message(MessageEventDefinition::new("m"))),
                "throw_message_event",
            ),
        ];

        for (node, expected) in cases {
            assert_eq!(label_of(node.clone()).unwrap(), expected, "node {:?}", node);
        }
    }

    #[test]
    fn test_cancel_boundary_ignores_cancel_activity() {
        for cancel_activity in [true, false] {
            let node = ProcessNode::new("n", NodeKind::BoundaryEvent(BoundaryEvent::attached_to("t", cancel_activity)))
                .with_event_definition(EventDefinition::Cancel);
            let definition = ProcessDefinition::new("p").with_node(node.clone());
            let behavior = compiler().compile_node(&node, &definition).unwrap();
            assert_eq!(
                behavior.as_leaf(),
                Some(&LeafBehavior::BoundaryCancelEvent { node_id: "n".to_string() }),
                "cancel_activity = {cancel_activity}"
            );
        }
    }

    #[test]
    fn test_unsupported_combinations() {
        let cases = vec![
            ProcessNode::new("n", NodeKind::StartEvent(StartEvent::default()))
                .with_event_definition(EventDefinition::Error(ErrorEventDefinition::default())),
            ProcessNode::new("n", NodeKind::EndEvent)
                .with_event_definition(EventDefinition::Timer(TimerEventDefinition::duration("PT1M"))),
            ProcessNode::new("n", NodeKind::IntermediateCatchEvent).with_event_definition(EventDefinition::Cancel),
            ProcessNode::new("n", NodeKind::ServiceTask(ServiceTask::default())),
            ProcessNode::new("n", NodeKind::ExclusiveGateway)
                .with_multi_instance(MultiInstanceLoopCharacteristics {
                    loop_cardinality: Some("3".to_string()),
                    ..MultiInstanceLoopCharacteristics::default()
                }),
        ];

        for node in cases {
            assert!(
                matches!(label_of(node.clone()), Err(CompilationError::InvalidDefinition { .. })),
                "node {:?}",
                node
            );
        }
    }

    #[test]
    fn test_multi_instance_wrapping() {
        let node = ProcessNode::new("review", NodeKind::Task).with_multi_instance(MultiInstanceLoopCharacteristics {
            sequential: true,
            collection: Some("${reviewers}".to_string()),
            element_variable: Some("reviewer".to_string()),
            ..MultiInstanceLoopCharacteristics::default()
        });
        let definition = ProcessDefinition::new("p").with_node(node.clone());

        match compiler().compile_node(&node, &definition).unwrap() {
            Behavior::MultiInstance(multi) => {
                assert_eq!(multi.mode.label(), "sequential_multi_instance");
                assert_eq!(
                    *multi.inner,
                    Behavior::from(LeafBehavior::Task {
                        node_id: "review".to_string()
                    })
                );
            }
            other => panic!("unexpected behavior {:?}", other),
        }
    }

    #[test]
    fn test_reference_validation() {
        let base = ProcessDefinition::new("p")
            .with_node(ProcessNode::new("start", NodeKind::StartEvent(StartEvent::default())))
            .with_node(ProcessNode::new("end", NodeKind::EndEvent));

        let dangling_flow = base.clone().with_flow(SequenceFlow::new("f1", "start", "nowhere"));
        let error = compiler().compile_definition(&dangling_flow).unwrap_err();
        assert_eq!(error.node_id(), "f1");
        assert!(error.to_string().contains("targetRef"));

        let misplaced_boundary = base.clone().with_node(ProcessNode::new(
            "timeout",
            NodeKind::BoundaryEvent(BoundaryEvent::attached_to("end", true)),
        ));
        let error = compiler().compile_definition(&misplaced_boundary).unwrap_err();
        assert!(error.to_string().contains("attachedToRef"));

        let duplicate = base.clone().with_node(ProcessNode::new("end", NodeKind::EndEvent));
        assert!(compiler().compile_definition(&duplicate).is_err());

        let good = base
            .with_flow(SequenceFlow::new("f1", "start", "end").with_condition("${ready}"))
            .with_flow(SequenceFlow::new("f2", "start", "end"));
        let behaviors = compiler().compile_definition(&good).unwrap();
        assert_eq!(behaviors.len(), 2);
        assert!(behaviors.condition("f1").unwrap().is_deferred());
        assert!(behaviors.condition("f2").is_none());
    }
}
