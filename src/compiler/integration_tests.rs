// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::calendar::Clock;
use crate::compiler::{
    Behavior, BehaviorCompiler, BehaviorFactory, ClassRegistry, DefaultBehaviorFactory, LeafBehavior,
    MultiInstanceBehavior, ThrowDelegate,
};
use crate::config::{load_and_validate_config, CompilerBuilder, EngineConfig};
use crate::errors::{CompilationError, ExecutionError};
use crate::model::{
    load_definition, EventDefinition, ExtensionAttributes, Message, MessageEventDefinition,
    MultiInstanceLoopCharacteristics, NodeKind, ProcessDefinition, ProcessNode, SequenceFlow, ServiceTask,
    ServiceTaskType,
};
use crate::testing::{NoOpServiceTask, TestBehaviorFactory, NO_OP_CALLS_VARIABLE, NO_OP_SERVICE_TASK_CLASS};
use crate::traits::{ExecutionRuntime, Variables};

/// Records what it was asked to run and executes class delegates against shared variables.
#[derive(Default)]
struct RecordingRuntime {
    executed: Mutex<Vec<String>>,
    variables: tokio::sync::Mutex<Variables>,
}

#[async_trait]
impl ExecutionRuntime for RecordingRuntime {
    async fn execute_leaf(&self, behavior: &LeafBehavior) -> Result<(), ExecutionError> {
        self.executed
            .lock()
            .push(format!("{}:{}", behavior.node_id(), behavior.label()));
        if let Some(delegate) = behavior.class_delegate() {
            let mut variables = self.variables.lock().await;
            delegate.delegate.execute(&mut variables).await?;
        }
        Ok(())
    }

    async fn execute_multi_instance(&self, behavior: &MultiInstanceBehavior) -> Result<(), ExecutionError> {
        self.executed
            .lock()
            .push(format!("{}:{}", behavior.node_id, behavior.mode.label()));
        behavior.inner.execute(self).await
    }
}

fn standard_compiler() -> BehaviorCompiler {
    let (compiler, _, _) = CompilerBuilder::from_config(&EngineConfig::default()).unwrap();
    compiler
}

fn throwing_end_event(extensions: ExtensionAttributes) -> ProcessDefinition {
    let message = MessageEventDefinition {
        extensions,
        ..MessageEventDefinition::new("invoiceSent")
    };
    ProcessDefinition::new("invoicing")
        .with_message(Message::new("invoiceSent", "invoice-sent"))
        .with_node(
            ProcessNode::new("notify", NodeKind::EndEvent)
                .with_event_definition(EventDefinition::Message(message)),
        )
}

fn throw_delegate_of(behaviors: &crate::compiler::BehaviorMap) -> ThrowDelegate {
    match behaviors.get("notify").and_then(Behavior::as_leaf) {
        Some(LeafBehavior::ThrowMessageEndEvent { message, delegate, .. }) => {
            assert_eq!(message.message_name.text(), "invoice-sent");
            delegate.clone()
        }
        other => panic!("expected a throw message end event, got {:?}", other),
    }
}

#[test]
fn test_engine_config_yaml_loading() {
    let config = load_and_validate_config("configs/engine.yaml").unwrap();

    assert_eq!(config.extension_namespace, "conductor");
    assert_eq!(config.scheduling.default_time_zone, "Europe/Amsterdam");
    assert_eq!(
        config.integrations.camel_default_class,
        "integration::camel::DefaultCamelBehavior"
    );
}

#[test]
fn test_order_fulfillment_compiles_from_yaml() {
    let config = load_and_validate_config("configs/engine.yaml").unwrap();
    let definition = load_definition("definitions/order-fulfillment.yaml").unwrap();
    let (compiler, calendars, clock) = CompilerBuilder::from_config(&config).unwrap();

    let behaviors = compiler.compile_definition(&definition).unwrap();

    assert_eq!(behaviors.len(), definition.nodes.len());
    assert_eq!(behaviors.condition_count(), 2);
    assert!(behaviors.condition("f3").is_some_and(|c| c.is_deferred()));
    assert!(behaviors.condition("f1").is_none());

    let labels: Vec<(&str, &str)> = behaviors
        .sorted_ids()
        .into_iter()
        .filter_map(|id| behaviors.get(id).map(|b| (id, b.label())))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("approved", "exclusive_gateway"),
            ("charge", "service_task_delegate_expression"),
            ("confirm", "throw_message_end_event"),
            ("rejected", "error_end_event"),
            ("reserveStock", "service_task_expression"),
            ("review", "parallel_multi_instance"),
            ("reviewTimeout", "boundary_timer_event"),
            ("shipped", "intermediate_throw_signal_event"),
            ("start", "none_start_event"),
            ("waitForPickup", "intermediate_catch_timer_event"),
        ]
    );

    match behaviors.get("shipped").and_then(Behavior::as_leaf) {
        Some(LeafBehavior::IntermediateThrowSignalEvent { signal, .. }) => {
            assert_eq!(signal.signal_name.text(), "orderShipped");
        }
        other => panic!("unexpected behavior {:?}", other),
    }

    // Compiled timers are still evaluated lazily against the clock.
    clock.set_current_time("2024-03-01T08:00:00Z".parse().unwrap());
    let timer = behaviors
        .get("waitForPickup")
        .and_then(Behavior::as_leaf)
        .and_then(LeafBehavior::timer)
        .unwrap();
    let due = timer.due_date(&calendars, &clock).unwrap();
    assert_eq!(due.to_rfc3339(), "2024-03-01T19:00:00+01:00");
    assert_eq!(clock.zone(), chrono_tz::Europe::Amsterdam);
}

#[test]
fn test_throw_delegate_precedence_through_compiler() {
    let registry = ClassRegistry::standard().with_class("mail::InvoiceMailer", NoOpServiceTask::construct);
    let (compiler, _, _) = CompilerBuilder::with_registry(&EngineConfig::default(), registry).unwrap();

    // class attribute beats delegateExpression
    let both = ExtensionAttributes::new()
        .with("conductor", "delegateExpression", "${mailer}")
        .with("conductor", "class", "mail::InvoiceMailer");
    let behaviors = compiler.compile_definition(&throwing_end_event(both)).unwrap();
    match throw_delegate_of(&behaviors) {
        ThrowDelegate::Class(handle) => assert_eq!(handle.class_name(), "mail::InvoiceMailer"),
        other => panic!("expected class delegate, got {:?}", other),
    }

    // delegateExpression beats the default
    let expression_only = ExtensionAttributes::new().with("conductor", "delegateExpression", "${mailer}");
    let behaviors = compiler.compile_definition(&throwing_end_event(expression_only)).unwrap();
    match throw_delegate_of(&behaviors) {
        ThrowDelegate::Expression(expression) => assert_eq!(expression.text(), "${mailer}"),
        other => panic!("expected expression delegate, got {:?}", other),
    }

    // attributes in another namespace are ignored
    let foreign = ExtensionAttributes::new().with("acme", "class", "mail::InvoiceMailer");
    let behaviors = compiler.compile_definition(&throwing_end_event(foreign)).unwrap();
    assert!(matches!(throw_delegate_of(&behaviors), ThrowDelegate::Default(_)));
}

#[test]
fn test_unknown_throw_class_fails_compilation() {
    let missing = ExtensionAttributes::new().with("conductor", "class", "mail::Missing");
    let err = standard_compiler()
        .compile_definition(&throwing_end_event(missing))
        .unwrap_err();
    assert_eq!(err, CompilationError::class_not_found("notify", "mail::Missing"));
}

#[test]
fn test_camel_task_without_bridge_is_class_not_found() {
    let definition = ProcessDefinition::new("routing").with_node(ProcessNode::new(
        "route",
        NodeKind::ServiceTask(ServiceTask::typed(ServiceTaskType::Camel)),
    ));

    let err = standard_compiler().compile_definition(&definition).unwrap_err();
    assert_eq!(
        err,
        CompilationError::class_not_found("route", "integration::camel::DefaultCamelBehavior")
    );
    assert_eq!(err.node_id(), "route");
}

#[test]
fn test_multi_instance_wraps_the_plain_behavior() {
    let plain = ProcessNode::new("approve", NodeKind::ServiceTask(ServiceTask::expression("${approver.approve()}")));
    let looped = plain.clone().with_multi_instance(MultiInstanceLoopCharacteristics {
        sequential: true,
        collection: Some("${approvers}".to_string()),
        element_variable: Some("approver".to_string()),
        ..MultiInstanceLoopCharacteristics::default()
    });

    let compiler = standard_compiler();
    let inner = compiler
        .compile_definition(&ProcessDefinition::new("p").with_node(plain))
        .unwrap()
        .get("approve")
        .cloned()
        .unwrap();
    let wrapped = compiler
        .compile_definition(&ProcessDefinition::new("p").with_node(looped))
        .unwrap()
        .get("approve")
        .cloned()
        .unwrap();

    match wrapped {
        Behavior::MultiInstance(multi) => {
            assert_eq!(*multi.inner, inner);
            assert_eq!(multi.element_variable.as_deref(), Some("approver"));
            assert_eq!(multi.collection.map(|c| c.text().to_string()), Some("${approvers}".to_string()));
        }
        other => panic!("expected multi-instance behavior, got {:?}", other),
    }
}

#[test]
fn test_failed_node_aborts_whole_definition() {
    let definition = ProcessDefinition::new("broken")
        .with_node(ProcessNode::new("start", NodeKind::StartEvent(Default::default())))
        .with_node(ProcessNode::new("charge", NodeKind::ServiceTask(ServiceTask::class("billing::Charge"))))
        .with_flow(SequenceFlow::new("f1", "start", "charge"));

    let err = standard_compiler().compile_definition(&definition).unwrap_err();
    assert_eq!(err.node_id(), "charge");
}

#[tokio::test]
async fn test_harness_replaces_real_tasks_with_no_ops() {
    let definition = ProcessDefinition::new("billing")
        .with_node(ProcessNode::new("start", NodeKind::StartEvent(Default::default())))
        .with_node(ProcessNode::new("charge", NodeKind::ServiceTask(ServiceTask::class("billing::Charge"))))
        .with_node(
            ProcessNode::new("notify", NodeKind::SendTask(ServiceTask::class("mail::Notify"))).with_multi_instance(
                MultiInstanceLoopCharacteristics {
                    loop_cardinality: Some("2".to_string()),
                    ..MultiInstanceLoopCharacteristics::default()
                },
            ),
        )
        .with_node(ProcessNode::new("end", NodeKind::EndEvent))
        .with_flow(SequenceFlow::new("f1", "start", "charge"))
        .with_flow(SequenceFlow::new("f2", "charge", "notify"))
        .with_flow(SequenceFlow::new("f3", "notify", "end"));

    let wrapped: Arc<dyn BehaviorFactory> = Arc::new(DefaultBehaviorFactory::new(EngineConfig::default()));
    let harness = Arc::new(TestBehaviorFactory::new(wrapped.clone()));
    let compiler = BehaviorCompiler::new(harness.clone(), Arc::new(crate::compiler::DefaultExpressionManager));

    // Without overrides the real classes are not registered.
    assert!(matches!(
        compiler.compile_definition(&definition),
        Err(CompilationError::ClassNotFound { .. })
    ));

    harness.add_no_op_service_task_class_name("billing::Charge");
    harness.add_no_op_service_task_id("notify");
    let behaviors = compiler.compile_definition(&definition).unwrap();

    let runtime = RecordingRuntime::default();
    for id in ["start", "charge", "notify", "end"] {
        behaviors.get(id).unwrap().execute(&runtime).await.unwrap();
    }

    assert_eq!(
        *runtime.executed.lock(),
        vec![
            "start:none_start_event",
            "charge:class_delegate",
            "notify:parallel_multi_instance",
            "notify:class_delegate",
            "end:none_end_event",
        ]
    );
    assert_eq!(
        runtime.variables.lock().await[NO_OP_CALLS_VARIABLE],
        serde_json::json!(["billing::Charge", "mail::Notify"])
    );

    match behaviors.get("charge").and_then(Behavior::as_leaf).and_then(LeafBehavior::class_delegate) {
        Some(delegate) => assert_eq!(delegate.delegate.class_name(), NO_OP_SERVICE_TASK_CLASS),
        None => panic!("charge should compile to a class delegate"),
    }

    harness.reset();
    assert!(compiler.compile_definition(&definition).is_err());
}

#[test]
fn test_clock_pinning_is_independent_per_builder() {
    let (_, _, first) = CompilerBuilder::from_config(&EngineConfig::default()).unwrap();
    let (_, _, second) = CompilerBuilder::from_config(&EngineConfig::default()).unwrap();

    let pinned = "2030-01-01T00:00:00Z".parse().unwrap();
    first.set_current_time(pinned);

    assert_eq!(first.now(), pinned);
    assert_ne!(second.now(), pinned);
}
