// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::compiler::expression::{compile, Expression, ExpressionManager};
use crate::errors::CompilationError;
use crate::model::{FieldExtension, MapExceptionEntry};

/// Name of the field that carries a task's exception map to an integration bridge.
pub const EXCEPTION_MAP_FIELD: &str = "mapExceptions";

pub const FIXED_VALUE_TYPE: &str = "fixed";
pub const EXPRESSION_TYPE: &str = "expression";
pub const EXCEPTION_MAP_TYPE: &str = "exception_map";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Fixed(String),
    Expression(Expression),
    ExceptionMap(Vec<MapExceptionEntry>),
}

/// A value injected into a delegate before it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: String,
    pub type_tag: String,
    pub value: FieldValue,
}

impl FieldDeclaration {
    pub fn fixed(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            type_tag: FIXED_VALUE_TYPE.to_string(),
            value: FieldValue::Fixed(value.to_string()),
        }
    }

    pub fn exception_map(entries: &[MapExceptionEntry]) -> Self {
        Self {
            name: EXCEPTION_MAP_FIELD.to_string(),
            type_tag: EXCEPTION_MAP_TYPE.to_string(),
            value: FieldValue::ExceptionMap(entries.to_vec()),
        }
    }

    /// The literal value, if this is a fixed field.
    pub fn fixed_value(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Fixed(value) => Some(value),
            _ => None,
        }
    }
}

/// A literal string value wins over an expression; a field with neither
/// becomes an empty literal.
pub fn create_field_declarations(
    node_id: &str,
    fields: &[FieldExtension],
    expressions: &dyn ExpressionManager,
) -> Result<Vec<FieldDeclaration>, CompilationError> {
    fields
        .iter()
        .map(|field| {
            if let Some(value) = field.literal_value() {
                return Ok(FieldDeclaration::fixed(&field.field_name, value));
            }
            match field.expression.as_deref().filter(|e| !e.trim().is_empty()) {
                Some(text) => Ok(FieldDeclaration {
                    name: field.field_name.clone(),
                    type_tag: EXPRESSION_TYPE.to_string(),
                    value: FieldValue::Expression(compile(expressions, node_id, text)?),
                }),
                None => Ok(FieldDeclaration::fixed(&field.field_name, "")),
            }
        })
        .collect()
}

pub fn find_field<'a>(declarations: &'a [FieldDeclaration], name: &str) -> Option<&'a FieldDeclaration> {
    declarations.iter().find(|declaration| declaration.name == name)
}

/// Every entry must name an error code.
pub fn validate_exception_map(
    node_id: &str,
    entries: &[MapExceptionEntry],
) -> Result<(), CompilationError> {
    match entries.iter().position(|entry| entry.error_code.trim().is_empty()) {
        Some(index) => Err(CompilationError::invalid(
            node_id,
            EXCEPTION_MAP_FIELD,
            format!("entry {index} has an empty error code"),
        )),
        None => Ok(()),
    }
}
