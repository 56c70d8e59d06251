// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::compiler::behavior::Behavior;
use crate::compiler::expression::{compile_optional, Expression, ExpressionManager};
use crate::errors::CompilationError;
use crate::model::{MultiInstanceLoopCharacteristics, ProcessNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiInstanceMode {
    Sequential,
    Parallel,
}

impl MultiInstanceMode {
    pub fn label(&self) -> &'static str {
        match self {
            MultiInstanceMode::Sequential => "sequential_multi_instance",
            MultiInstanceMode::Parallel => "parallel_multi_instance",
        }
    }
}

/// Runs `inner` once per element of a collection or `loop_cardinality` times.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiInstanceBehavior {
    pub node_id: String,
    pub mode: MultiInstanceMode,
    pub inner: Box<Behavior>,
    pub loop_cardinality: Option<Expression>,
    pub collection: Option<Expression>,
    pub element_variable: Option<String>,
    pub element_index_variable: Option<String>,
    pub completion_condition: Option<Expression>,
}

/// Wrap an already compiled behavior according to the node's loop characteristics.
pub fn compose(
    node: &ProcessNode,
    mode: MultiInstanceMode,
    inner: Behavior,
    expressions: &dyn ExpressionManager,
) -> Result<MultiInstanceBehavior, CompilationError> {
    let characteristics: &MultiInstanceLoopCharacteristics = node.multi_instance.as_ref().ok_or_else(|| {
        CompilationError::invalid(&node.id, "multiInstanceLoopCharacteristics", "node is not multi-instance")
    })?;

    let loop_cardinality = compile_optional(expressions, &node.id, characteristics.loop_cardinality.as_deref())?;
    let collection = compile_optional(expressions, &node.id, characteristics.collection.as_deref())?;
    if loop_cardinality.is_none() && collection.is_none() {
        return Err(CompilationError::invalid(
            &node.id,
            "multiInstanceLoopCharacteristics",
            "either loopCardinality or collection must be set",
        ));
    }

    Ok(MultiInstanceBehavior {
        node_id: node.id.clone(),
        mode,
        inner: Box::new(inner),
        loop_cardinality,
        collection,
        element_variable: non_blank(characteristics.element_variable.as_deref()),
        element_index_variable: non_blank(characteristics.element_index_variable.as_deref()),
        completion_condition: compile_optional(
            expressions,
            &node.id,
            characteristics.completion_condition.as_deref(),
        )?,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}
