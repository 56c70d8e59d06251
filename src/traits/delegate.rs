// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::ExecutionError;

/// Process variables visible to a delegate.
pub type Variables = HashMap<String, serde_json::Value>;

/// User code invoked by a class-based task, a rules task or a message throw.
#[async_trait]
pub trait Delegate: Send + Sync {
    async fn execute(&self, variables: &mut Variables) -> Result<(), ExecutionError>;

    fn name(&self) -> &str;
}
