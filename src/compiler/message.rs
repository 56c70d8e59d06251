// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Collaborators that prepare message-bearing events.

use async_trait::async_trait;
use std::sync::Arc;

use crate::compiler::expression::{compile, compile_optional, Expression, ExpressionManager};
use crate::compiler::fields::FieldDeclaration;
use crate::compiler::registry::DelegateHandle;
use crate::errors::{CompilationError, ExecutionError};
use crate::model::{MessageEventDefinition, ProcessNode};
use crate::traits::{Delegate, Variables};

pub const DEFAULT_THROW_MESSAGE_DELEGATE_CLASS: &str = "messaging::DefaultThrowMessageDelegate";

/// One payload entry: `target` receives the value of `source` when the message is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadExpression {
    pub target: String,
    pub source: Expression,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePayloadMappingProvider {
    pub mappings: Vec<PayloadExpression>,
}

pub trait MessagePayloadMappingProviderFactory: Send + Sync {
    fn create(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        expressions: &dyn ExpressionManager,
    ) -> Result<MessagePayloadMappingProvider, CompilationError>;
}

/// Compiles each payload source; every mapping needs a target.
#[derive(Debug, Default)]
pub struct DefaultMessagePayloadMappingProviderFactory;

impl MessagePayloadMappingProviderFactory for DefaultMessagePayloadMappingProviderFactory {
    fn create(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        expressions: &dyn ExpressionManager,
    ) -> Result<MessagePayloadMappingProvider, CompilationError> {
        let mappings = definition
            .payload
            .iter()
            .map(|mapping| {
                if mapping.target.trim().is_empty() {
                    return Err(CompilationError::invalid(
                        &node.id,
                        "payload",
                        format!("mapping from '{}' has no target", mapping.source),
                    ));
                }
                Ok(PayloadExpression {
                    target: mapping.target.clone(),
                    source: compile(expressions, &node.id, &mapping.source)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MessagePayloadMappingProvider { mappings })
    }
}

/// Everything a runtime needs to build or match a message for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageExecutionContext {
    pub message_name: Expression,
    pub correlation_key: Option<Expression>,
    pub payload: MessagePayloadMappingProvider,
}

pub trait MessageExecutionContextFactory: Send + Sync {
    fn create(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        message_name: Expression,
        payload: MessagePayloadMappingProvider,
        expressions: &dyn ExpressionManager,
    ) -> Result<MessageExecutionContext, CompilationError>;
}

#[derive(Debug, Default)]
pub struct DefaultMessageExecutionContextFactory;

impl MessageExecutionContextFactory for DefaultMessageExecutionContextFactory {
    fn create(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
        message_name: Expression,
        payload: MessagePayloadMappingProvider,
        expressions: &dyn ExpressionManager,
    ) -> Result<MessageExecutionContext, CompilationError> {
        Ok(MessageExecutionContext {
            message_name,
            correlation_key: compile_optional(expressions, &node.id, definition.correlation_key.as_deref())?,
            payload,
        })
    }
}

/// Supplies the throw delegate used when a message event names none.
pub trait ThrowMessageDelegateFactory: Send + Sync {
    fn create_default(
        &self,
        node: &ProcessNode,
        definition: &MessageEventDefinition,
    ) -> Option<DelegateHandle>;
}

#[derive(Debug, Default)]
pub struct DefaultThrowMessageDelegateFactory;

impl ThrowMessageDelegateFactory for DefaultThrowMessageDelegateFactory {
    fn create_default(
        &self,
        _node: &ProcessNode,
        _definition: &MessageEventDefinition,
    ) -> Option<DelegateHandle> {
        Some(DelegateHandle::new(
            DEFAULT_THROW_MESSAGE_DELEGATE_CLASS,
            Arc::new(DefaultThrowMessageDelegate),
        ))
    }
}

/// Leaves delivery to the engine's own message correlation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultThrowMessageDelegate;

impl DefaultThrowMessageDelegate {
    pub fn construct(_fields: &[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> {
        Ok(Arc::new(DefaultThrowMessageDelegate))
    }
}

#[async_trait]
impl Delegate for DefaultThrowMessageDelegate {
    async fn execute(&self, _variables: &mut Variables) -> Result<(), ExecutionError> {
        tracing::debug!("No message transport configured, delivery left to the engine");
        Ok(())
    }

    fn name(&self) -> &str {
        "default_throw_message_delegate"
    }
}
