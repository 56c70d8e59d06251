// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turns process nodes into executable behavior templates.
//!
//! The compiler is synchronous and holds no per-instance state:
//!
//! - [`BehaviorCompiler`] walks a [`ProcessDefinition`](crate::model::ProcessDefinition)
//!   and picks one [`BehaviorFactory`] operation per node
//! - [`DefaultBehaviorFactory`] validates node attributes and builds the
//!   [`Behavior`], resolving classes through the [`ClassRegistry`] and throw
//!   delegates through the [`DelegateResolutionChain`]
//! - multi-instance nodes are wrapped after their inner behavior is built
//!
//! A definition either compiles completely into a [`BehaviorMap`] or fails with
//! the first [`CompilationError`](crate::errors::CompilationError).

pub mod behavior;
pub mod behavior_map;
pub mod dispatch;
pub mod expression;
pub mod factory;
pub mod fields;
pub mod message;
pub mod multi_instance;
pub mod registry;
pub mod resolution;

pub use behavior::{
    Behavior, BusinessRuleBehavior, CalledElement, ClassDelegateBehavior, LeafBehavior,
    SignalBinding, UserTaskBehavior,
};
pub use behavior_map::BehaviorMap;
pub use dispatch::BehaviorCompiler;
pub use expression::{DefaultExpressionManager, Expression, ExpressionKind, ExpressionManager};
pub use factory::{BehaviorFactory, BehaviorResult, DefaultBehaviorFactory, DefaultBehaviorFactoryBuilder};
pub use fields::{FieldDeclaration, FieldValue};
pub use message::{
    DefaultMessageExecutionContextFactory, DefaultMessagePayloadMappingProviderFactory,
    DefaultThrowMessageDelegate, DefaultThrowMessageDelegateFactory, MessageExecutionContext,
    MessageExecutionContextFactory, MessagePayloadMappingProvider,
    MessagePayloadMappingProviderFactory, PayloadExpression, ThrowMessageDelegateFactory,
};
pub use multi_instance::{MultiInstanceBehavior, MultiInstanceMode};
pub use registry::{ClassRegistry, DelegateConstructor, DelegateHandle};
pub use resolution::{
    ClassAttributeResolver, DefaultDelegateResolver, DelegateExpressionResolver,
    DelegateResolutionChain, DelegateResolver, ResolutionContext, ThrowDelegate,
};

#[cfg(test)]
mod integration_tests;
