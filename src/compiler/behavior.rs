// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiled node behaviors.
//!
//! A behavior is a stateless template built once per compilation. It carries
//! everything the execution engine needs to run the node (compiled
//! expressions, delegate handles, timer and message definitions) and nothing
//! about any particular process instance.

use crate::compiler::expression::Expression;
use crate::compiler::fields::FieldDeclaration;
use crate::compiler::message::MessageExecutionContext;
use crate::compiler::multi_instance::MultiInstanceBehavior;
use crate::compiler::registry::DelegateHandle;
use crate::compiler::resolution::ThrowDelegate;
use crate::errors::ExecutionError;
use crate::model::{MapExceptionEntry, SignalScope, TimerEventDefinition};
use crate::traits::ExecutionRuntime;

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Leaf(LeafBehavior),
    MultiInstance(MultiInstanceBehavior),
}

impl Behavior {
    pub fn node_id(&self) -> &str {
        match self {
            Behavior::Leaf(leaf) => leaf.node_id(),
            Behavior::MultiInstance(multi) => &multi.node_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Leaf(leaf) => leaf.label(),
            Behavior::MultiInstance(multi) => multi.mode.label(),
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafBehavior> {
        match self {
            Behavior::Leaf(leaf) => Some(leaf),
            Behavior::MultiInstance(_) => None,
        }
    }

    /// Hand the behavior to the runtime that drives it.
    pub async fn execute(&self, runtime: &dyn ExecutionRuntime) -> Result<(), ExecutionError> {
        match self {
            Behavior::Leaf(leaf) => runtime.execute_leaf(leaf).await,
            Behavior::MultiInstance(multi) => runtime.execute_multi_instance(multi).await,
        }
    }
}

impl From<LeafBehavior> for Behavior {
    fn from(leaf: LeafBehavior) -> Self {
        Behavior::Leaf(leaf)
    }
}

/// The signal a signal event throws or waits for.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBinding {
    pub signal_ref: Option<String>,
    pub signal_name: Expression,
    pub scope: SignalScope,
}

/// Target of a call activity: a fixed process key or one computed at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum CalledElement {
    Literal(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserTaskBehavior {
    pub assignee: Option<Expression>,
    pub owner: Option<Expression>,
    pub candidate_users: Vec<Expression>,
    pub candidate_groups: Vec<Expression>,
    pub due_date: Option<Expression>,
    pub priority: Option<Expression>,
    pub form_key: Option<Expression>,
    pub category: Option<Expression>,
    pub skip_expression: Option<Expression>,
}

/// A delegate loaded by class name, with the fields injected into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDelegateBehavior {
    pub delegate: DelegateHandle,
    pub fields: Vec<FieldDeclaration>,
    pub skip_expression: Option<Expression>,
    pub map_exceptions: Vec<MapExceptionEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessRuleBehavior {
    pub rules: DelegateHandle,
    pub input_variables: Vec<Expression>,
    pub rule_names: Vec<Expression>,
    pub exclude: bool,
    pub result_variable: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafBehavior {
    // Start events
    NoneStartEvent {
        node_id: String,
    },
    TimerStartEvent {
        node_id: String,
        timer: TimerEventDefinition,
    },
    ErrorStartEvent {
        node_id: String,
        /// `None` catches every error.
        error_code: Option<String>,
    },
    MessageStartEvent {
        node_id: String,
        interrupting: bool,
        message: MessageExecutionContext,
    },

    // Tasks
    Task {
        node_id: String,
    },
    ManualTask {
        node_id: String,
    },
    ReceiveTask {
        node_id: String,
    },
    UserTask {
        node_id: String,
        task: Box<UserTaskBehavior>,
    },
    ScriptTask {
        node_id: String,
        language: String,
        script: String,
        result_variable: Option<String>,
        auto_store_variables: bool,
    },
    BusinessRuleTask {
        node_id: String,
        rules: Box<BusinessRuleBehavior>,
    },

    // Service-like tasks
    ClassDelegate {
        node_id: String,
        delegate: Box<ClassDelegateBehavior>,
    },
    ServiceTaskDelegateExpression {
        node_id: String,
        expression: Expression,
        skip_expression: Option<Expression>,
        fields: Vec<FieldDeclaration>,
    },
    ServiceTaskExpression {
        node_id: String,
        expression: Expression,
        skip_expression: Option<Expression>,
        result_variable: Option<String>,
    },
    WebServiceTask {
        node_id: String,
        operation_ref: Option<String>,
    },
    MailTask {
        node_id: String,
        fields: Vec<FieldDeclaration>,
    },
    ShellTask {
        node_id: String,
        fields: Vec<FieldDeclaration>,
        wait: bool,
        redirect_error: bool,
        clean_env: bool,
    },

    // Gateways
    ExclusiveGateway {
        node_id: String,
    },
    ParallelGateway {
        node_id: String,
    },
    InclusiveGateway {
        node_id: String,
    },
    EventBasedGateway {
        node_id: String,
    },

    // Containers
    SubProcess {
        node_id: String,
    },
    AdhocSubProcess {
        node_id: String,
    },
    CallActivity {
        node_id: String,
        called_element: CalledElement,
        inherit_variables: bool,
        map_exceptions: Vec<MapExceptionEntry>,
    },
    Transaction {
        node_id: String,
    },

    // Intermediate events
    IntermediateCatchEvent {
        node_id: String,
    },
    IntermediateCatchMessageEvent {
        node_id: String,
        message: MessageExecutionContext,
    },
    IntermediateCatchTimerEvent {
        node_id: String,
        timer: TimerEventDefinition,
    },
    IntermediateCatchSignalEvent {
        node_id: String,
        signal: SignalBinding,
    },
    IntermediateThrowNoneEvent {
        node_id: String,
    },
    IntermediateThrowSignalEvent {
        node_id: String,
        signal: SignalBinding,
        asynchronous: bool,
    },
    IntermediateThrowCompensationEvent {
        node_id: String,
        activity_ref: Option<String>,
        wait_for_completion: bool,
    },
    ThrowMessageEvent {
        node_id: String,
        message: MessageExecutionContext,
        delegate: ThrowDelegate,
    },

    // End events
    NoneEndEvent {
        node_id: String,
    },
    ErrorEndEvent {
        node_id: String,
        error_code: String,
    },
    CancelEndEvent {
        node_id: String,
    },
    TerminateEndEvent {
        node_id: String,
        terminate_all: bool,
        terminate_multi_instance: bool,
    },
    ThrowMessageEndEvent {
        node_id: String,
        message: MessageExecutionContext,
        delegate: ThrowDelegate,
    },

    // Boundary events
    BoundaryEvent {
        node_id: String,
        interrupting: bool,
    },
    BoundaryCancelEvent {
        node_id: String,
    },
    BoundaryCompensateEvent {
        node_id: String,
        activity_ref: Option<String>,
        interrupting: bool,
    },
    BoundaryTimerEvent {
        node_id: String,
        timer: TimerEventDefinition,
        interrupting: bool,
    },
    BoundarySignalEvent {
        node_id: String,
        signal: SignalBinding,
        interrupting: bool,
    },
    BoundaryMessageEvent {
        node_id: String,
        message: MessageExecutionContext,
        interrupting: bool,
    },
}

impl LeafBehavior {
    pub fn node_id(&self) -> &str {
        use LeafBehavior::*;
        match self {
            NoneStartEvent { node_id }
            | TimerStartEvent { node_id, .. }
            | ErrorStartEvent { node_id, .. }
            | MessageStartEvent { node_id, .. }
            | Task { node_id }
            | ManualTask { node_id }
            | ReceiveTask { node_id }
            | UserTask { node_id, .. }
            | ScriptTask { node_id, .. }
            | BusinessRuleTask { node_id, .. }
            | ClassDelegate { node_id, .. }
            | ServiceTaskDelegateExpression { node_id, .. }
            | ServiceTaskExpression { node_id, .. }
            | WebServiceTask { node_id, .. }
            | MailTask { node_id, .. }
            | ShellTask { node_id, .. }
            | ExclusiveGateway { node_id }
            | ParallelGateway { node_id }
            | InclusiveGateway { node_id }
            | EventBasedGateway { node_id }
            | SubProcess { node_id }
            | AdhocSubProcess { node_id }
            | CallActivity { node_id, .. }
            | Transaction { node_id }
            | IntermediateCatchEvent { node_id }
            | IntermediateCatchMessageEvent { node_id, .. }
            | IntermediateCatchTimerEvent { node_id, .. }
            | IntermediateCatchSignalEvent { node_id, .. }
            | IntermediateThrowNoneEvent { node_id }
            | IntermediateThrowSignalEvent { node_id, .. }
            | IntermediateThrowCompensationEvent { node_id, .. }
            | ThrowMessageEvent { node_id, .. }
            | NoneEndEvent { node_id }
            | ErrorEndEvent { node_id, .. }
            | CancelEndEvent { node_id }
            | TerminateEndEvent { node_id, .. }
            | ThrowMessageEndEvent { node_id, .. }
            | BoundaryEvent { node_id, .. }
            | BoundaryCancelEvent { node_id }
            | BoundaryCompensateEvent { node_id, .. }
            | BoundaryTimerEvent { node_id, .. }
            | BoundarySignalEvent { node_id, .. }
            | BoundaryMessageEvent { node_id, .. } => node_id,
        }
    }

    pub fn label(&self) -> &'static str {
        use LeafBehavior::*;
        match self {
            NoneStartEvent { .. } => "none_start_event",
            TimerStartEvent { .. } => "timer_start_event",
            ErrorStartEvent { .. } => "error_start_event",
            MessageStartEvent { .. } => "message_start_event",
            Task { .. } => "task",
            ManualTask { .. } => "manual_task",
            ReceiveTask { .. } => "receive_task",
            UserTask { .. } => "user_task",
            ScriptTask { .. } => "script_task",
            BusinessRuleTask { .. } => "business_rule_task",
            ClassDelegate { .. } => "class_delegate",
            ServiceTaskDelegateExpression { .. } => "service_task_delegate_expression",
            ServiceTaskExpression { .. } => "service_task_expression",
            WebServiceTask { .. } => "web_service_task",
            MailTask { .. } => "mail_task",
            ShellTask { .. } => "shell_task",
            ExclusiveGateway { .. } => "exclusive_gateway",
            ParallelGateway { .. } => "parallel_gateway",
            InclusiveGateway { .. } => "inclusive_gateway",
            EventBasedGateway { .. } => "event_based_gateway",
            SubProcess { .. } => "sub_process",
            AdhocSubProcess { .. } => "adhoc_sub_process",
            CallActivity { .. } => "call_activity",
            Transaction { .. } => "transaction",
            IntermediateCatchEvent { .. } => "intermediate_catch_event",
            IntermediateCatchMessageEvent { .. } => "intermediate_catch_message_event",
            IntermediateCatchTimerEvent { .. } => "intermediate_catch_timer_event",
            IntermediateCatchSignalEvent { .. } => "intermediate_catch_signal_event",
            IntermediateThrowNoneEvent { .. } => "intermediate_throw_none_event",
            IntermediateThrowSignalEvent { .. } => "intermediate_throw_signal_event",
            IntermediateThrowCompensationEvent { .. } => "intermediate_throw_compensation_event",
            ThrowMessageEvent { .. } => "throw_message_event",
            NoneEndEvent { .. } => "none_end_event",
            ErrorEndEvent { .. } => "error_end_event",
            CancelEndEvent { .. } => "cancel_end_event",
            TerminateEndEvent { .. } => "terminate_end_event",
            ThrowMessageEndEvent { .. } => "throw_message_end_event",
            BoundaryEvent { .. } => "boundary_event",
            BoundaryCancelEvent { .. } => "boundary_cancel_event",
            BoundaryCompensateEvent { .. } => "boundary_compensate_event",
            BoundaryTimerEvent { .. } => "boundary_timer_event",
            BoundarySignalEvent { .. } => "boundary_signal_event",
            BoundaryMessageEvent { .. } => "boundary_message_event",
        }
    }

    /// The timer definition of timer-driven behaviors.
    pub fn timer(&self) -> Option<&TimerEventDefinition> {
        match self {
            LeafBehavior::TimerStartEvent { timer, .. }
            | LeafBehavior::IntermediateCatchTimerEvent { timer, .. }
            | LeafBehavior::BoundaryTimerEvent { timer, .. } => Some(timer),
            _ => None,
        }
    }

    /// The class-based delegate, if this behavior runs one.
    pub fn class_delegate(&self) -> Option<&ClassDelegateBehavior> {
        match self {
            LeafBehavior::ClassDelegate { delegate, .. } => Some(delegate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::multi_instance::MultiInstanceMode;

    #[test]
    fn test_node_id_and_label() {
        let leaf = LeafBehavior::TerminateEndEvent {
            node_id: "end".to_string(),
            terminate_all: true,
            terminate_multi_instance: false,
        };
        assert_eq!(leaf.node_id(), "end");
        assert_eq!(leaf.label(), "terminate_end_event");

        let behavior = Behavior::from(leaf.clone());
        assert_eq!(behavior.node_id(), "end");
        assert_eq!(behavior.as_leaf(), Some(&leaf));
    }

    #[test]
    fn test_multi_instance_label() {
        let behavior = Behavior::MultiInstance(MultiInstanceBehavior {
            node_id: "review".to_string(),
            mode: MultiInstanceMode::Parallel,
            inner: Box::new(Behavior::from(LeafBehavior::Task {
                node_id: "review".to_string(),
            })),
            loop_cardinality: Some(Expression::literal("3")),
            collection: None,
            element_variable: None,
            element_index_variable: None,
            completion_condition: None,
        });
        assert_eq!(behavior.label(), "parallel_multi_instance");
        assert_eq!(behavior.as_leaf(), None);
    }

    #[test]
    fn test_timer_accessor() {
        let timer = TimerEventDefinition::cycle("R3/PT1H");
        let leaf = LeafBehavior::BoundaryTimerEvent {
            node_id: "escalate".to_string(),
            timer: timer.clone(),
            interrupting: false,
        };
        assert_eq!(leaf.timer(), Some(&timer));
        assert_eq!(LeafBehavior::Task { node_id: "t".to_string() }.timer(), None);
    }
}
