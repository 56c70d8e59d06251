// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::compiler::{LeafBehavior, MultiInstanceBehavior};
use crate::errors::ExecutionError;

/// Implemented by the execution engine that drives compiled behaviors.
///
/// Compiled behaviors are templates; the runtime owns tokens, variables and
/// scheduling. [`Behavior::execute`](crate::compiler::Behavior::execute) routes
/// each behavior to the matching method.
#[async_trait]
pub trait ExecutionRuntime: Send + Sync {
    async fn execute_leaf(&self, behavior: &LeafBehavior) -> Result<(), ExecutionError>;

    async fn execute_multi_instance(
        &self,
        behavior: &MultiInstanceBehavior,
    ) -> Result<(), ExecutionError>;
}
