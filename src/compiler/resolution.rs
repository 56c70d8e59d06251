// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chooses the delegate that sends a thrown message.
//!
//! Resolvers are consulted in order and the first one that recognises the
//! event's extension attributes wins:
//!
//! 1. `class` attribute in the engine namespace, loaded from the class registry
//! 2. `delegateExpression` attribute, compiled as an expression
//! 3. the default delegate supplied by the [`ThrowMessageDelegateFactory`]

use std::sync::Arc;

use crate::compiler::expression::{compile, Expression, ExpressionManager};
use crate::compiler::message::ThrowMessageDelegateFactory;
use crate::compiler::registry::{ClassRegistry, DelegateHandle};
use crate::errors::CompilationError;
use crate::model::{MessageEventDefinition, ProcessNode};
use crate::observability::messages::compiler::DelegateResolved;
use crate::observability::messages::StructuredLog;

pub const CLASS_ATTRIBUTE: &str = "class";
pub const DELEGATE_EXPRESSION_ATTRIBUTE: &str = "delegateExpression";

#[derive(Debug, Clone, PartialEq)]
pub enum ThrowDelegate {
    Class(DelegateHandle),
    Expression(Expression),
    Default(DelegateHandle),
}

impl ThrowDelegate {
    pub fn describe(&self) -> &str {
        match self {
            ThrowDelegate::Class(handle) | ThrowDelegate::Default(handle) => handle.class_name(),
            ThrowDelegate::Expression(expression) => expression.text(),
        }
    }
}

pub struct ResolutionContext<'a> {
    pub node: &'a ProcessNode,
    pub message: &'a MessageEventDefinition,
    pub namespace: &'a str,
}

impl ResolutionContext<'_> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.message
            .extensions
            .get(self.namespace, name)
            .filter(|value| !value.trim().is_empty())
    }
}

pub trait DelegateResolver: Send + Sync {
    fn tier(&self) -> &'static str;

    /// `Ok(None)` when this tier does not apply.
    fn resolve(&self, context: &ResolutionContext<'_>) -> Result<Option<ThrowDelegate>, CompilationError>;
}

pub struct ClassAttributeResolver {
    registry: Arc<ClassRegistry>,
}

impl ClassAttributeResolver {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }
}

impl DelegateResolver for ClassAttributeResolver {
    fn tier(&self) -> &'static str {
        "class attribute"
    }

    fn resolve(&self, context: &ResolutionContext<'_>) -> Result<Option<ThrowDelegate>, CompilationError> {
        context
            .attribute(CLASS_ATTRIBUTE)
            .map(|class_name| {
                self.registry
                    .instantiate(&context.node.id, class_name, &[])
                    .map(ThrowDelegate::Class)
            })
            .transpose()
    }
}

pub struct DelegateExpressionResolver {
    expressions: Arc<dyn ExpressionManager>,
}

impl DelegateExpressionResolver {
    pub fn new(expressions: Arc<dyn ExpressionManager>) -> Self {
        Self { expressions }
    }
}

impl DelegateResolver for DelegateExpressionResolver {
    fn tier(&self) -> &'static str {
        "delegateExpression attribute"
    }

    fn resolve(&self, context: &ResolutionContext<'_>) -> Result<Option<ThrowDelegate>, CompilationError> {
        context
            .attribute(DELEGATE_EXPRESSION_ATTRIBUTE)
            .map(|text| compile(self.expressions.as_ref(), &context.node.id, text).map(ThrowDelegate::Expression))
            .transpose()
    }
}

pub struct DefaultDelegateResolver {
    factory: Arc<dyn ThrowMessageDelegateFactory>,
}

impl DefaultDelegateResolver {
    pub fn new(factory: Arc<dyn ThrowMessageDelegateFactory>) -> Self {
        Self { factory }
    }
}

impl DelegateResolver for DefaultDelegateResolver {
    fn tier(&self) -> &'static str {
        "default throw delegate"
    }

    fn resolve(&self, context: &ResolutionContext<'_>) -> Result<Option<ThrowDelegate>, CompilationError> {
        Ok(self
            .factory
            .create_default(context.node, context.message)
            .map(ThrowDelegate::Default))
    }
}

/// Ordered list of resolvers; the first match wins.
pub struct DelegateResolutionChain {
    resolvers: Vec<Box<dyn DelegateResolver>>,
}

impl DelegateResolutionChain {
    pub fn new(resolvers: Vec<Box<dyn DelegateResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn standard(
        registry: Arc<ClassRegistry>,
        expressions: Arc<dyn ExpressionManager>,
        defaults: Arc<dyn ThrowMessageDelegateFactory>,
    ) -> Self {
        Self::new(vec![
            Box::new(ClassAttributeResolver::new(registry)),
            Box::new(DelegateExpressionResolver::new(expressions)),
            Box::new(DefaultDelegateResolver::new(defaults)),
        ])
    }

    pub fn tiers(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|resolver| resolver.tier()).collect()
    }

    pub fn resolve(&self, context: &ResolutionContext<'_>) -> Result<ThrowDelegate, CompilationError> {
        for resolver in &self.resolvers {
            if let Some(delegate) = resolver.resolve(context)? {
                DelegateResolved {
                    node_id: &context.node.id,
                    tier: resolver.tier(),
                    delegate: delegate.describe(),
                }
                .log();
                return Ok(delegate);
            }
        }

        Err(CompilationError::ResolutionExhausted {
            node_id: context.node.id.clone(),
            tier: self
                .resolvers
                .last()
                .map(|resolver| resolver.tier())
                .unwrap_or("no resolvers configured")
                .to_string(),
        })
    }
}

impl std::fmt::Debug for DelegateResolutionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateResolutionChain")
            .field("tiers", &self.tiers())
            .finish()
    }
}
