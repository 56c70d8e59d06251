// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::compiler::{FieldDeclaration, FieldValue};
use crate::errors::ExecutionError;
use crate::traits::{Delegate, Variables};

pub const NO_OP_SERVICE_TASK_CLASS: &str = "testing::NoOpServiceTask";

/// Variable that collects the `name` of every no-op task that ran.
pub const NO_OP_CALLS_VARIABLE: &str = "noOpServiceTask.calls";

/// Stand-in for a service task whose real implementation is not wanted in a test.
#[derive(Debug, Clone, PartialEq)]
pub struct NoOpServiceTask {
    pub name: Option<String>,
}

impl NoOpServiceTask {
    /// Reads the optional `name` field, which holds the replaced implementation.
    pub fn construct(fields: &[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> {
        let name = fields
            .iter()
            .find(|field| field.name == "name")
            .and_then(|field| match &field.value {
                FieldValue::Fixed(value) => Some(value.clone()),
                FieldValue::Expression(expression) => Some(expression.text().to_string()),
                FieldValue::ExceptionMap(_) => None,
            });
        Ok(Arc::new(NoOpServiceTask { name }))
    }
}

#[async_trait]
impl Delegate for NoOpServiceTask {
    async fn execute(&self, variables: &mut Variables) -> Result<(), ExecutionError> {
        let calls = variables
            .entry(NO_OP_CALLS_VARIABLE.to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        match calls {
            serde_json::Value::Array(entries) => {
                entries.push(serde_json::json!(self.name));
                Ok(())
            }
            _ => Err(ExecutionError::DelegateFailed {
                delegate: NO_OP_SERVICE_TASK_CLASS.to_string(),
                message: format!("variable '{NO_OP_CALLS_VARIABLE}' is not a list"),
            }),
        }
    }

    fn name(&self) -> &str {
        "no_op_service_task"
    }
}
