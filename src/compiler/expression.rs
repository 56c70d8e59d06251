// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::CompilationError;
use std::fmt::{Display, Formatter};

/// Whether an expression needs evaluation at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    /// Plain text with no `${...}` or `#{...}` part.
    Literal,
    Deferred,
}

/// A compiled expression. Evaluation belongs to the execution engine; the
/// compiler only checks delimiters and records the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    text: String,
    kind: ExpressionKind,
}

impl Expression {
    pub fn literal(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ExpressionKind::Literal,
        }
    }

    pub fn deferred(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ExpressionKind::Deferred,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    pub fn is_deferred(&self) -> bool {
        self.kind == ExpressionKind::Deferred
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Compiles expression source text.
pub trait ExpressionManager: Send + Sync {
    /// Returns the compiled expression or a reason it is malformed.
    fn create_expression(&self, text: &str) -> Result<Expression, String>;
}

/// Accepts any text whose `${` / `#{` delimiters are closed and non-empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExpressionManager;

impl ExpressionManager for DefaultExpressionManager {
    fn create_expression(&self, text: &str) -> Result<Expression, String> {
        let mut deferred = false;
        let mut offset = 0;
        while let Some(relative) = text[offset..].find(['$', '#']) {
            let start = offset + relative;
            if text[start + 1..].starts_with('{') {
                let body_start = start + 2;
                let Some(length) = text[body_start..].find('}') else {
                    return Err(format!("unterminated expression starting at offset {start}"));
                };
                if text[body_start..body_start + length].trim().is_empty() {
                    return Err(format!("empty expression at offset {start}"));
                }
                deferred = true;
                offset = body_start + length + 1;
            } else {
                offset = start + 1;
            }
        }

        Ok(if deferred {
            Expression::deferred(text)
        } else {
            Expression::literal(text)
        })
    }
}

/// Compile `text` for `node_id`, mapping failures onto [`CompilationError::InvalidExpression`].
pub(crate) fn compile(
    expressions: &dyn ExpressionManager,
    node_id: &str,
    text: &str,
) -> Result<Expression, CompilationError> {
    expressions
        .create_expression(text)
        .map_err(|reason| CompilationError::InvalidExpression {
            node_id: node_id.to_string(),
            expression: text.to_string(),
            reason,
        })
}

/// Compile an optional attribute, skipping absent or blank values.
pub(crate) fn compile_optional(
    expressions: &dyn ExpressionManager,
    node_id: &str,
    text: Option<&str>,
) -> Result<Option<Expression>, CompilationError> {
    match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => compile(expressions, node_id, text).map(Some),
        None => Ok(None),
    }
}
