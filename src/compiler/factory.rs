// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Construction of node behaviors.
//!
//! [`BehaviorFactory`] has one operation per node shape. The dispatcher in
//! [`dispatch`](crate::compiler::dispatch) picks the operation; the factory only
//! validates the attributes of that one shape and assembles the behavior.
//! [`DefaultBehaviorFactory`] is the production implementation; the test harness
//! wraps any factory and intercepts the service-like operations.

use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::calendar::{parse_date_time, DurationHelper};
use crate::compiler::behavior::{
    Behavior, BusinessRuleBehavior, CalledElement, ClassDelegateBehavior, LeafBehavior,
    SignalBinding, UserTaskBehavior,
};
use crate::compiler::expression::{
    compile, compile_optional, DefaultExpressionManager, Expression, ExpressionManager,
};
use crate::compiler::fields::{
    create_field_declarations, find_field, validate_exception_map, FieldDeclaration, FieldValue,
};
use crate::compiler::message::{
    DefaultMessageExecutionContextFactory, DefaultMessagePayloadMappingProviderFactory,
    DefaultThrowMessageDelegateFactory, MessageExecutionContext, MessageExecutionContextFactory,
    MessagePayloadMappingProviderFactory, ThrowMessageDelegateFactory,
};
use crate::compiler::multi_instance::{compose, MultiInstanceMode};
use crate::compiler::registry::ClassRegistry;
use crate::compiler::resolution::{DelegateResolutionChain, ResolutionContext, ThrowDelegate};
use crate::config::EngineConfig;
use crate::errors::{CompilationError, ScheduleParseError};
use crate::model::{
    BusinessRuleTask, CallActivity, CompensateEventDefinition, ErrorEventDefinition,
    EventDefinition, Message, MessageEventDefinition, ProcessNode, ScriptTask, ServiceTask,
    Signal, SignalEventDefinition, StartEvent, TimerEventDefinition, TimerValue, UserTask,
};

/// Field naming the class that replaces the default Camel bridge.
pub const CAMEL_BEHAVIOR_CLASS_FIELD: &str = "camelBehaviorClass";
/// Field naming the class that replaces the default Mule bridge.
pub const MULE_BEHAVIOR_CLASS_FIELD: &str = "muleBehaviorClass";

pub const SHELL_WAIT_FIELD: &str = "wait";
pub const SHELL_REDIRECT_ERROR_FIELD: &str = "redirectError";
pub const SHELL_CLEAN_ENV_FIELD: &str = "cleanEnv";

/// Called elements matching this pattern are resolved at run time.
const CALLED_ELEMENT_EXPRESSION: &str = r"^\$+\{+.+\}$";

pub type BehaviorResult = Result<Behavior, CompilationError>;

pub trait BehaviorFactory: Send + Sync {
    // Start events
    fn none_start_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn timer_start_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult;
    fn event_sub_process_error_start_event(
        &self,
        node: &ProcessNode,
        error: &ErrorEventDefinition,
    ) -> BehaviorResult;
    fn event_sub_process_message_start_event(
        &self,
        node: &ProcessNode,
        start: &StartEvent,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult;

    // Tasks
    fn task(&self, node: &ProcessNode) -> BehaviorResult;
    fn manual_task(&self, node: &ProcessNode) -> BehaviorResult;
    fn receive_task(&self, node: &ProcessNode) -> BehaviorResult;
    fn user_task(&self, node: &ProcessNode, task: &UserTask) -> BehaviorResult;
    fn script_task(&self, node: &ProcessNode, task: &ScriptTask) -> BehaviorResult;
    fn business_rule_task(&self, node: &ProcessNode, task: &BusinessRuleTask) -> BehaviorResult;

    // Service-like tasks, shared by service and send tasks
    fn class_delegate_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn service_task_delegate_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn default_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn service_task_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn web_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn mail_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn shell_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn mule_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;
    fn camel_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult;

    // Gateways
    fn exclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult;
    fn parallel_gateway(&self, node: &ProcessNode) -> BehaviorResult;
    fn inclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult;
    fn event_based_gateway(&self, node: &ProcessNode) -> BehaviorResult;

    // Multi-instance wrappers around an already compiled behavior
    fn sequential_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult;
    fn parallel_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult;

    // Containers
    fn sub_process(&self, node: &ProcessNode) -> BehaviorResult;
    fn adhoc_sub_process(&self, node: &ProcessNode) -> BehaviorResult;
    fn call_activity(&self, node: &ProcessNode, call: &CallActivity) -> BehaviorResult;
    fn transaction(&self, node: &ProcessNode) -> BehaviorResult;

    // Intermediate events
    fn intermediate_catch_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn intermediate_catch_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult;
    fn intermediate_catch_timer_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult;
    fn intermediate_catch_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult;
    fn intermediate_throw_none_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn intermediate_throw_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult;
    fn intermediate_throw_compensation_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
    ) -> BehaviorResult;
    fn throw_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult;

    // End events
    fn none_end_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn error_end_event(&self, node: &ProcessNode, error: &ErrorEventDefinition) -> BehaviorResult;
    fn cancel_end_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn terminate_end_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn throw_message_end_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult;

    // Boundary events
    fn boundary_event(&self, node: &ProcessNode, interrupting: bool) -> BehaviorResult;
    /// Cancel boundaries always interrupt the transaction they sit on, so the
    /// boundary's `cancelActivity` attribute is not passed through.
    fn boundary_cancel_event(&self, node: &ProcessNode) -> BehaviorResult;
    fn boundary_compensate_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult;
    fn boundary_timer_event(
        &self,
        node: &ProcessNode,
        timer: &TimerEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult;
    fn boundary_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
        interrupting: bool,
    ) -> BehaviorResult;
    fn boundary_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
        interrupting: bool,
    ) -> BehaviorResult;
}

/// Production factory backed by the class registry and the message collaborators.
///
/// Immutable after [`build`](DefaultBehaviorFactoryBuilder::build), so a single
/// instance can be shared by every compilation.
pub struct DefaultBehaviorFactory {
    config: EngineConfig,
    expressions: Arc<dyn ExpressionManager>,
    registry: Arc<ClassRegistry>,
    payloads: Arc<dyn MessagePayloadMappingProviderFactory>,
    contexts: Arc<dyn MessageExecutionContextFactory>,
    resolution: DelegateResolutionChain,
}

pub struct DefaultBehaviorFactoryBuilder {
    config: EngineConfig,
    expressions: Arc<dyn ExpressionManager>,
    registry: Arc<ClassRegistry>,
    payloads: Arc<dyn MessagePayloadMappingProviderFactory>,
    contexts: Arc<dyn MessageExecutionContextFactory>,
    throw_delegates: Arc<dyn ThrowMessageDelegateFactory>,
    resolution: Option<DelegateResolutionChain>,
}

impl DefaultBehaviorFactoryBuilder {
    pub fn expression_manager(mut self, expressions: Arc<dyn ExpressionManager>) -> Self {
        self.expressions = expressions;
        self
    }

    pub fn class_registry(mut self, registry: Arc<ClassRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn payload_factory(mut self, payloads: Arc<dyn MessagePayloadMappingProviderFactory>) -> Self {
        self.payloads = payloads;
        self
    }

    pub fn context_factory(mut self, contexts: Arc<dyn MessageExecutionContextFactory>) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn throw_delegate_factory(mut self, throw_delegates: Arc<dyn ThrowMessageDelegateFactory>) -> Self {
        self.throw_delegates = throw_delegates;
        self
    }

    /// Replace the standard class / delegateExpression / default chain.
    pub fn resolution_chain(mut self, chain: DelegateResolutionChain) -> Self {
        self.resolution = Some(chain);
        self
    }

    pub fn build(self) -> DefaultBehaviorFactory {
        let resolution = self.resolution.unwrap_or_else(|| {
            DelegateResolutionChain::standard(
                self.registry.clone(),
                self.expressions.clone(),
                self.throw_delegates.clone(),
            )
        });

        DefaultBehaviorFactory {
            config: self.config,
            expressions: self.expressions,
            registry: self.registry,
            payloads: self.payloads,
            contexts: self.contexts,
            resolution,
        }
    }
}

impl DefaultBehaviorFactory {
    pub fn builder(config: EngineConfig) -> DefaultBehaviorFactoryBuilder {
        DefaultBehaviorFactoryBuilder {
            config,
            expressions: Arc::new(DefaultExpressionManager),
            registry: Arc::new(ClassRegistry::standard()),
            payloads: Arc::new(DefaultMessagePayloadMappingProviderFactory),
            contexts: Arc::new(DefaultMessageExecutionContextFactory),
            throw_delegates: Arc::new(DefaultThrowMessageDelegateFactory),
            resolution: None,
        }
    }

    pub fn new(config: EngineConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn expression_manager(&self) -> Arc<dyn ExpressionManager> {
        self.expressions.clone()
    }

    pub fn class_registry(&self) -> &ClassRegistry {
        &self.registry
    }

    fn expression(&self, node: &ProcessNode, text: &str) -> Result<Expression, CompilationError> {
        compile(self.expressions.as_ref(), &node.id, text)
    }

    fn optional_expression(&self, node: &ProcessNode, text: Option<&str>) -> Result<Option<Expression>, CompilationError> {
        compile_optional(self.expressions.as_ref(), &node.id, text)
    }

    fn expression_list(&self, node: &ProcessNode, texts: &[String]) -> Result<Vec<Expression>, CompilationError> {
        texts
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(|text| self.expression(node, text))
            .collect()
    }

    fn fields(&self, node: &ProcessNode) -> Result<Vec<FieldDeclaration>, CompilationError> {
        create_field_declarations(&node.id, &node.fields, self.expressions.as_ref())
    }

    fn class_delegate(
        &self,
        node: &ProcessNode,
        class_name: &str,
        fields: Vec<FieldDeclaration>,
        skip_expression: Option<&str>,
    ) -> BehaviorResult {
        validate_exception_map(&node.id, &node.map_exceptions)?;
        let delegate = self.registry.instantiate(&node.id, class_name, &fields)?;
        Ok(LeafBehavior::ClassDelegate {
            node_id: node.id.clone(),
            delegate: Box::new(ClassDelegateBehavior {
                delegate,
                fields,
                skip_expression: self.optional_expression(node, skip_expression)?,
                map_exceptions: node.map_exceptions.clone(),
            }),
        }
        .into())
    }

    /// Camel and Mule bridges: an override field picks the class, else the configured default.
    fn integration_task(
        &self,
        node: &ProcessNode,
        task: &ServiceTask,
        override_field: &str,
        default_class: &str,
        with_exception_map: bool,
    ) -> BehaviorResult {
        let mut fields = self.fields(node)?;
        let overridden = fields
            .iter()
            .position(|field| field.name == override_field)
            .map(|index| fields.remove(index))
            .and_then(|field| field.fixed_value().map(str::trim).map(str::to_string))
            .filter(|class_name| !class_name.is_empty());
        let class_name = overridden.unwrap_or_else(|| default_class.to_string());

        if with_exception_map {
            fields.push(FieldDeclaration::exception_map(&node.map_exceptions));
        }

        self.class_delegate(node, &class_name, fields, task.skip_expression.as_deref())
    }

    fn message_name(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> Result<Expression, CompilationError> {
        if let Some(text) = non_blank(definition.message_expression.as_deref()) {
            return self.expression(node, text);
        }
        let message_ref = non_blank(definition.message_ref.as_deref()).ok_or_else(|| {
            CompilationError::invalid(
                &node.id,
                "messageRef",
                "message event has neither messageRef nor messageExpression",
            )
        })?;
        let name = declared
            .and_then(|message| non_blank(Some(message.name.as_str())))
            .unwrap_or(message_ref);
        self.expression(node, name)
    }

    fn message_context(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> Result<MessageExecutionContext, CompilationError> {
        let message_name = self.message_name(node, definition, declared)?;
        let payload = self.payloads.create(node, definition, self.expressions.as_ref())?;
        self.contexts
            .create(node, definition, message_name, payload, self.expressions.as_ref())
    }

    fn throw_delegate(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
    ) -> Result<ThrowDelegate, CompilationError> {
        self.resolution.resolve(&ResolutionContext {
            node,
            message: definition,
            namespace: &self.config.extension_namespace,
        })
    }

    fn signal_binding(
        &self,
        node: &ProcessNode,
        definition: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> Result<SignalBinding, CompilationError> {
        let signal_ref = non_blank(definition.signal_ref.as_deref());
        let scope = declared.map(|signal| signal.scope).unwrap_or_default();

        let signal_name = match non_blank(definition.signal_expression.as_deref()) {
            Some(text) => self.expression(node, text)?,
            None => {
                let signal_ref = signal_ref.ok_or_else(|| {
                    CompilationError::invalid(
                        &node.id,
                        "signalRef",
                        "signal event has neither signalRef nor signalExpression",
                    )
                })?;
                let name = declared
                    .and_then(|signal| non_blank(Some(signal.name.as_str())))
                    .unwrap_or(signal_ref);
                self.expression(node, name)?
            }
        };

        Ok(SignalBinding {
            signal_ref: signal_ref.map(str::to_string),
            signal_name,
            scope,
        })
    }

    /// Reject timers whose literal schedule cannot be parsed. Values computed
    /// at run time are only checked for expression syntax.
    fn validated_timer(
        &self,
        node: &ProcessNode,
        timer: &TimerEventDefinition,
    ) -> Result<TimerEventDefinition, CompilationError> {
        let value = timer
            .value()
            .map_err(|reason| CompilationError::invalid(&node.id, "timerEventDefinition", reason))?;
        let schedule_error = |source: ScheduleParseError| CompilationError::Schedule {
            node_id: node.id.clone(),
            source,
        };

        let text = value.text().trim();
        if !self.expression(node, text)?.is_deferred() {
            match value {
                TimerValue::Date(_) if !text.starts_with('P') => {
                    parse_date_time(text).map_err(schedule_error)?;
                }
                _ => {
                    DurationHelper::new(text).map_err(schedule_error)?;
                }
            }
        }

        if let Some(end_date) = non_blank(timer.end_date.as_deref()) {
            if !self.expression(node, end_date)?.is_deferred() {
                parse_date_time(end_date.trim()).map_err(schedule_error)?;
            }
        }

        Ok(timer.clone())
    }
}

impl BehaviorFactory for DefaultBehaviorFactory {
    fn none_start_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::NoneStartEvent { node_id: node.id.clone() }.into())
    }

    fn timer_start_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult {
        Ok(LeafBehavior::TimerStartEvent {
            node_id: node.id.clone(),
            timer: self.validated_timer(node, timer)?,
        }
        .into())
    }

    fn event_sub_process_error_start_event(
        &self,
        node: &ProcessNode,
        error: &ErrorEventDefinition,
    ) -> BehaviorResult {
        Ok(LeafBehavior::ErrorStartEvent {
            node_id: node.id.clone(),
            error_code: non_blank(error.error_ref.as_deref()).map(str::to_string),
        }
        .into())
    }

    fn event_sub_process_message_start_event(
        &self,
        node: &ProcessNode,
        start: &StartEvent,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::MessageStartEvent {
            node_id: node.id.clone(),
            interrupting: start.interrupting,
            message: self.message_context(node, message, declared)?,
        }
        .into())
    }

    fn task(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::Task { node_id: node.id.clone() }.into())
    }

    fn manual_task(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::ManualTask { node_id: node.id.clone() }.into())
    }

    fn receive_task(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::ReceiveTask { node_id: node.id.clone() }.into())
    }

    fn user_task(&self, node: &ProcessNode, task: &UserTask) -> BehaviorResult {
        let user_task = UserTaskBehavior {
            assignee: self.optional_expression(node, task.assignee.as_deref())?,
            owner: self.optional_expression(node, task.owner.as_deref())?,
            candidate_users: self.expression_list(node, &task.candidate_users)?,
            candidate_groups: self.expression_list(node, &task.candidate_groups)?,
            due_date: self.optional_expression(node, task.due_date.as_deref())?,
            priority: self.optional_expression(node, task.priority.as_deref())?,
            form_key: self.optional_expression(node, task.form_key.as_deref())?,
            category: self.optional_expression(node, task.category.as_deref())?,
            skip_expression: self.optional_expression(node, task.skip_expression.as_deref())?,
        };
        Ok(LeafBehavior::UserTask {
            node_id: node.id.clone(),
            task: Box::new(user_task),
        }
        .into())
    }

    fn script_task(&self, node: &ProcessNode, task: &ScriptTask) -> BehaviorResult {
        if task.script.trim().is_empty() {
            return Err(CompilationError::invalid(&node.id, "script", "script task has no script"));
        }
        let language = non_blank(task.script_format.as_deref())
            .unwrap_or(&self.config.default_script_language)
            .to_string();

        Ok(LeafBehavior::ScriptTask {
            node_id: node.id.clone(),
            language,
            script: task.script.clone(),
            result_variable: non_blank(task.result_variable.as_deref()).map(str::to_string),
            auto_store_variables: task.auto_store_variables,
        }
        .into())
    }

    fn business_rule_task(&self, node: &ProcessNode, task: &BusinessRuleTask) -> BehaviorResult {
        let class_name = non_blank(task.class_name.as_deref()).ok_or_else(|| {
            CompilationError::invalid(&node.id, "className", "business rule task names no rules class")
        })?;
        let rules = self.registry.instantiate(&node.id, class_name.trim(), &[])?;

        Ok(LeafBehavior::BusinessRuleTask {
            node_id: node.id.clone(),
            rules: Box::new(BusinessRuleBehavior {
                rules,
                input_variables: self.expression_list(node, &task.input_variables)?,
                rule_names: self.expression_list(node, &task.rule_names)?,
                exclude: task.exclude,
                result_variable: non_blank(task.result_variable.as_deref())
                    .unwrap_or(&self.config.rules_result_variable)
                    .to_string(),
            }),
        }
        .into())
    }

    fn class_delegate_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        let class_name = task
            .implementation()
            .ok_or_else(|| CompilationError::invalid(&node.id, "class", "service task names no class"))?;
        let fields = self.fields(node)?;
        self.class_delegate(node, class_name.trim(), fields, task.skip_expression.as_deref())
    }

    fn service_task_delegate_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        let text = task.implementation().ok_or_else(|| {
            CompilationError::invalid(&node.id, "delegateExpression", "service task has an empty delegate expression")
        })?;
        Ok(LeafBehavior::ServiceTaskDelegateExpression {
            node_id: node.id.clone(),
            expression: self.expression(node, text)?,
            skip_expression: self.optional_expression(node, task.skip_expression.as_deref())?,
            fields: self.fields(node)?,
        }
        .into())
    }

    fn default_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        let bean = format!("${{{}}}", self.config.default_service_task_bean);
        Ok(LeafBehavior::ServiceTaskDelegateExpression {
            node_id: node.id.clone(),
            expression: self.expression(node, &bean)?,
            skip_expression: self.optional_expression(node, task.skip_expression.as_deref())?,
            fields: self.fields(node)?,
        }
        .into())
    }

    fn service_task_expression(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        let text = task.implementation().ok_or_else(|| {
            CompilationError::invalid(&node.id, "expression", "service task has an empty expression")
        })?;
        Ok(LeafBehavior::ServiceTaskExpression {
            node_id: node.id.clone(),
            expression: self.expression(node, text)?,
            skip_expression: self.optional_expression(node, task.skip_expression.as_deref())?,
            result_variable: non_blank(task.result_variable.as_deref()).map(str::to_string),
        }
        .into())
    }

    fn web_service_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        Ok(LeafBehavior::WebServiceTask {
            node_id: node.id.clone(),
            operation_ref: non_blank(task.operation_ref.as_deref()).map(str::to_string),
        }
        .into())
    }

    fn mail_task(&self, node: &ProcessNode, _task: &ServiceTask) -> BehaviorResult {
        Ok(LeafBehavior::MailTask {
            node_id: node.id.clone(),
            fields: self.fields(node)?,
        }
        .into())
    }

    fn shell_task(&self, node: &ProcessNode, _task: &ServiceTask) -> BehaviorResult {
        let fields = self.fields(node)?;
        Ok(LeafBehavior::ShellTask {
            node_id: node.id.clone(),
            wait: boolean_field(node, &fields, SHELL_WAIT_FIELD, true)?,
            redirect_error: boolean_field(node, &fields, SHELL_REDIRECT_ERROR_FIELD, false)?,
            clean_env: boolean_field(node, &fields, SHELL_CLEAN_ENV_FIELD, false)?,
            fields,
        }
        .into())
    }

    fn mule_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.integration_task(
            node,
            task,
            MULE_BEHAVIOR_CLASS_FIELD,
            &self.config.integrations.mule_default_class,
            false,
        )
    }

    fn camel_task(&self, node: &ProcessNode, task: &ServiceTask) -> BehaviorResult {
        self.integration_task(
            node,
            task,
            CAMEL_BEHAVIOR_CLASS_FIELD,
            &self.config.integrations.camel_default_class,
            true,
        )
    }

    fn exclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::ExclusiveGateway { node_id: node.id.clone() }.into())
    }

    fn parallel_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::ParallelGateway { node_id: node.id.clone() }.into())
    }

    fn inclusive_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::InclusiveGateway { node_id: node.id.clone() }.into())
    }

    fn event_based_gateway(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::EventBasedGateway { node_id: node.id.clone() }.into())
    }

    fn sequential_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult {
        compose(node, MultiInstanceMode::Sequential, inner, self.expressions.as_ref()).map(Behavior::MultiInstance)
    }

    fn parallel_multi_instance(&self, node: &ProcessNode, inner: Behavior) -> BehaviorResult {
        compose(node, MultiInstanceMode::Parallel, inner, self.expressions.as_ref()).map(Behavior::MultiInstance)
    }

    fn sub_process(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::SubProcess { node_id: node.id.clone() }.into())
    }

    fn adhoc_sub_process(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::AdhocSubProcess { node_id: node.id.clone() }.into())
    }

    fn call_activity(&self, node: &ProcessNode, call: &CallActivity) -> BehaviorResult {
        let called = non_blank(call.called_element.as_deref())
            .map(str::trim)
            .ok_or_else(|| {
                CompilationError::invalid(&node.id, "calledElement", "call activity names no called element")
            })?;
        validate_exception_map(&node.id, &node.map_exceptions)?;

        let called_element = match called_element_pattern() {
            Some(pattern) if pattern.is_match(called) => CalledElement::Expression(self.expression(node, called)?),
            _ => CalledElement::Literal(called.to_string()),
        };

        Ok(LeafBehavior::CallActivity {
            node_id: node.id.clone(),
            called_element,
            inherit_variables: call.inherit_variables,
            map_exceptions: node.map_exceptions.clone(),
        }
        .into())
    }

    fn transaction(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::Transaction { node_id: node.id.clone() }.into())
    }

    fn intermediate_catch_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateCatchEvent { node_id: node.id.clone() }.into())
    }

    fn intermediate_catch_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateCatchMessageEvent {
            node_id: node.id.clone(),
            message: self.message_context(node, message, declared)?,
        }
        .into())
    }

    fn intermediate_catch_timer_event(&self, node: &ProcessNode, timer: &TimerEventDefinition) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateCatchTimerEvent {
            node_id: node.id.clone(),
            timer: self.validated_timer(node, timer)?,
        }
        .into())
    }

    fn intermediate_catch_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateCatchSignalEvent {
            node_id: node.id.clone(),
            signal: self.signal_binding(node, signal, declared)?,
        }
        .into())
    }

    fn intermediate_throw_none_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateThrowNoneEvent { node_id: node.id.clone() }.into())
    }

    fn intermediate_throw_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateThrowSignalEvent {
            node_id: node.id.clone(),
            signal: self.signal_binding(node, signal, declared)?,
            asynchronous: signal.asynchronous,
        }
        .into())
    }

    fn intermediate_throw_compensation_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
    ) -> BehaviorResult {
        Ok(LeafBehavior::IntermediateThrowCompensationEvent {
            node_id: node.id.clone(),
            activity_ref: non_blank(compensate.activity_ref.as_deref()).map(str::to_string),
            wait_for_completion: compensate.wait_for_completion,
        }
        .into())
    }

    fn throw_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::ThrowMessageEvent {
            node_id: node.id.clone(),
            message: self.message_context(node, message, declared)?,
            delegate: self.throw_delegate(node, message)?,
        }
        .into())
    }

    fn none_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::NoneEndEvent { node_id: node.id.clone() }.into())
    }

    fn error_end_event(&self, node: &ProcessNode, error: &ErrorEventDefinition) -> BehaviorResult {
        let error_code = non_blank(error.error_ref.as_deref()).ok_or_else(|| {
            CompilationError::invalid(&node.id, "errorRef", "error end event has no error reference")
        })?;
        Ok(LeafBehavior::ErrorEndEvent {
            node_id: node.id.clone(),
            error_code: error_code.to_string(),
        }
        .into())
    }

    fn cancel_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::CancelEndEvent { node_id: node.id.clone() }.into())
    }

    fn terminate_end_event(&self, node: &ProcessNode) -> BehaviorResult {
        let terminate = match node.first_event_definition() {
            Some(EventDefinition::Terminate(definition)) => *definition,
            _ => Default::default(),
        };
        Ok(LeafBehavior::TerminateEndEvent {
            node_id: node.id.clone(),
            terminate_all: terminate.terminate_all,
            terminate_multi_instance: terminate.terminate_multi_instance,
        }
        .into())
    }

    fn throw_message_end_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
    ) -> BehaviorResult {
        Ok(LeafBehavior::ThrowMessageEndEvent {
            node_id: node.id.clone(),
            message: self.message_context(node, message, declared)?,
            delegate: self.throw_delegate(node, message)?,
        }
        .into())
    }

    fn boundary_event(&self, node: &ProcessNode, interrupting: bool) -> BehaviorResult {
        Ok(LeafBehavior::BoundaryEvent {
            node_id: node.id.clone(),
            interrupting,
        }
        .into())
    }

    fn boundary_cancel_event(&self, node: &ProcessNode) -> BehaviorResult {
        Ok(LeafBehavior::BoundaryCancelEvent { node_id: node.id.clone() }.into())
    }

    fn boundary_compensate_event(
        &self,
        node: &ProcessNode,
        compensate: &CompensateEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult {
        Ok(LeafBehavior::BoundaryCompensateEvent {
            node_id: node.id.clone(),
            activity_ref: non_blank(compensate.activity_ref.as_deref()).map(str::to_string),
            interrupting,
        }
        .into())
    }

    fn boundary_timer_event(
        &self,
        node: &ProcessNode,
        timer: &TimerEventDefinition,
        interrupting: bool,
    ) -> BehaviorResult {
        Ok(LeafBehavior::BoundaryTimerEvent {
            node_id: node.id.clone(),
            timer: self.validated_timer(node, timer)?,
            interrupting,
        }
        .into())
    }

    fn boundary_signal_event(
        &self,
        node: &ProcessNode,
        signal: &SignalEventDefinition,
        declared: Option<&Signal>,
        interrupting: bool,
    ) -> BehaviorResult {
        Ok(LeafBehavior::BoundarySignalEvent {
            node_id: node.id.clone(),
            signal: self.signal_binding(node, signal, declared)?,
            interrupting,
        }
        .into())
    }

    fn boundary_message_event(
        &self,
        node: &ProcessNode,
        message: &MessageEventDefinition,
        declared: Option<&Message>,
        interrupting: bool,
    ) -> BehaviorResult {
        Ok(LeafBehavior::BoundaryMessageEvent {
            node_id: node.id.clone(),
            message: self.message_context(node, message, declared)?,
            interrupting,
        }
        .into())
    }
}

impl std::fmt::Debug for DefaultBehaviorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultBehaviorFactory")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("resolution", &self.resolution)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn called_element_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(CALLED_ELEMENT_EXPRESSION).ok())
        .as_ref()
}

/// A literal `true` / `false` field, case-insensitive. Absent or empty means `default`.
fn boolean_field(
    node: &ProcessNode,
    fields: &[FieldDeclaration],
    name: &str,
    default: bool,
) -> Result<bool, CompilationError> {
    let Some(field) = find_field(fields, name) else {
        return Ok(default);
    };
    match &field.value {
        FieldValue::Fixed(value) => match value.trim() {
            "" => Ok(default),
            v if v.eq_ignore_ascii_case("true") => Ok(true),
            v if v.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(CompilationError::invalid(
                &node.id,
                name,
                format!("expected true or false, found '{other}'"),
            )),
        },
        _ => Err(CompilationError::invalid(
            &node.id,
            name,
            "must be a literal true or false",
        )),
    }
}
