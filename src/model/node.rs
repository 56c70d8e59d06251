// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{default_true, EventDefinition, ExtensionAttributes, FieldExtension, MapExceptionEntry};
use serde::{Deserialize, Serialize};

/// One step, gateway or event of a process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNode {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: NodeKind,
    #[serde(default)]
    pub fields: Vec<FieldExtension>,
    #[serde(default)]
    pub extensions: ExtensionAttributes,
    #[serde(default)]
    pub event_definitions: Vec<EventDefinition>,
    #[serde(default)]
    pub map_exceptions: Vec<MapExceptionEntry>,
    #[serde(default)]
    pub multi_instance: Option<MultiInstanceLoopCharacteristics>,
}

impl ProcessNode {
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind,
            fields: Vec::new(),
            extensions: ExtensionAttributes::new(),
            event_definitions: Vec::new(),
            map_exceptions: Vec::new(),
            multi_instance: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_field(mut self, field: FieldExtension) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_event_definition(mut self, definition: EventDefinition) -> Self {
        self.event_definitions.push(definition);
        self
    }

    pub fn with_map_exception(mut self, entry: MapExceptionEntry) -> Self {
        self.map_exceptions.push(entry);
        self
    }

    pub fn with_multi_instance(mut self, characteristics: MultiInstanceLoopCharacteristics) -> Self {
        self.multi_instance = Some(characteristics);
        self
    }

    /// The first event definition, which decides the behavior of an event node.
    pub fn first_event_definition(&self) -> Option<&EventDefinition> {
        self.event_definitions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    StartEvent(StartEvent),
    EndEvent,
    Task,
    UserTask(UserTask),
    ServiceTask(ServiceTask),
    /// Send tasks share the implementation attributes of service tasks.
    SendTask(ServiceTask),
    ScriptTask(ScriptTask),
    ManualTask,
    ReceiveTask,
    BusinessRuleTask(BusinessRuleTask),
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
    EventGateway,
    SubProcess,
    AdhocSubProcess,
    CallActivity(CallActivity),
    Transaction,
    BoundaryEvent(BoundaryEvent),
    IntermediateCatchEvent,
    IntermediateThrowEvent,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::StartEvent(_) => "startEvent",
            NodeKind::EndEvent => "endEvent",
            NodeKind::Task => "task",
            NodeKind::UserTask(_) => "userTask",
            NodeKind::ServiceTask(_) => "serviceTask",
            NodeKind::SendTask(_) => "sendTask",
            NodeKind::ScriptTask(_) => "scriptTask",
            NodeKind::ManualTask => "manualTask",
            NodeKind::ReceiveTask => "receiveTask",
            NodeKind::BusinessRuleTask(_) => "businessRuleTask",
            NodeKind::ExclusiveGateway => "exclusiveGateway",
            NodeKind::ParallelGateway => "parallelGateway",
            NodeKind::InclusiveGateway => "inclusiveGateway",
            NodeKind::EventGateway => "eventBasedGateway",
            NodeKind::SubProcess => "subProcess",
            NodeKind::AdhocSubProcess => "adHocSubProcess",
            NodeKind::CallActivity(_) => "callActivity",
            NodeKind::Transaction => "transaction",
            NodeKind::BoundaryEvent(_) => "boundaryEvent",
            NodeKind::IntermediateCatchEvent => "intermediateCatchEvent",
            NodeKind::IntermediateThrowEvent => "intermediateThrowEvent",
        }
    }

    /// Activities may carry multi-instance characteristics; events and gateways may not.
    pub fn is_activity(&self) -> bool {
        matches!(
            self,
            NodeKind::Task
                | NodeKind::UserTask(_)
                | NodeKind::ServiceTask(_)
                | NodeKind::SendTask(_)
                | NodeKind::ScriptTask(_)
                | NodeKind::ManualTask
                | NodeKind::ReceiveTask
                | NodeKind::BusinessRuleTask(_)
                | NodeKind::SubProcess
                | NodeKind::AdhocSubProcess
                | NodeKind::CallActivity(_)
                | NodeKind::Transaction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    /// Start event of an event subprocess rather than of the process itself.
    #[serde(default)]
    pub in_event_sub_process: bool,
    #[serde(default = "default_true")]
    pub interrupting: bool,
    #[serde(default)]
    pub initiator: Option<String>,
}

impl Default for StartEvent {
    fn default() -> Self {
        Self {
            in_event_sub_process: false,
            interrupting: true,
            initiator: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserTask {
    pub assignee: Option<String>,
    pub owner: Option<String>,
    pub candidate_users: Vec<String>,
    pub candidate_groups: Vec<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub form_key: Option<String>,
    pub category: Option<String>,
    pub skip_expression: Option<String>,
}

/// How a service-like task names its executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationType {
    /// Only the bare `implementation` token was given.
    #[default]
    Unspecified,
    Class,
    Expression,
    DelegateExpression,
    WebService,
}

/// Built-in or bridged task types selected through the `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTaskType {
    Mail,
    Mule,
    Camel,
    Shell,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTask {
    pub implementation_type: ImplementationType,
    pub implementation: Option<String>,
    pub task_type: Option<ServiceTaskType>,
    pub skip_expression: Option<String>,
    pub result_variable: Option<String>,
    pub operation_ref: Option<String>,
}

impl ServiceTask {
    pub fn class(class_name: &str) -> Self {
        Self {
            implementation_type: ImplementationType::Class,
            implementation: Some(class_name.to_string()),
            ..Self::default()
        }
    }

    pub fn expression(expression: &str) -> Self {
        Self {
            implementation_type: ImplementationType::Expression,
            implementation: Some(expression.to_string()),
            ..Self::default()
        }
    }

    pub fn delegate_expression(expression: &str) -> Self {
        Self {
            implementation_type: ImplementationType::DelegateExpression,
            implementation: Some(expression.to_string()),
            ..Self::default()
        }
    }

    pub fn typed(task_type: ServiceTaskType) -> Self {
        Self {
            task_type: Some(task_type),
            ..Self::default()
        }
    }

    /// The implementation token, if set and non-empty.
    pub fn implementation(&self) -> Option<&str> {
        self.implementation.as_deref().filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptTask {
    pub script_format: Option<String>,
    pub script: String,
    pub result_variable: Option<String>,
    pub auto_store_variables: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessRuleTask {
    pub class_name: Option<String>,
    pub input_variables: Vec<String>,
    pub rule_names: Vec<String>,
    pub exclude: bool,
    pub result_variable: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallActivity {
    pub called_element: Option<String>,
    pub inherit_variables: bool,
}

impl CallActivity {
    pub fn calling(called_element: &str) -> Self {
        Self {
            called_element: Some(called_element.to_string()),
            inherit_variables: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEvent {
    pub attached_to_ref: String,
    /// `true` when the boundary event interrupts the activity it is attached to.
    #[serde(default = "default_true")]
    pub cancel_activity: bool,
}

impl BoundaryEvent {
    pub fn attached_to(activity_id: &str, cancel_activity: bool) -> Self {
        Self {
            attached_to_ref: activity_id.to_string(),
            cancel_activity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiInstanceLoopCharacteristics {
    pub sequential: bool,
    pub loop_cardinality: Option<String>,
    /// Expression or variable name of the collection to iterate.
    pub collection: Option<String>,
    pub element_variable: Option<String>,
    pub element_index_variable: Option<String>,
    pub completion_condition: Option<String>,
}
