// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A field injected into a constructed delegate.
///
/// Exactly one of `string_value` and `expression` is expected; a non-empty
/// literal takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExtension {
    pub field_name: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
}

impl FieldExtension {
    pub fn literal(name: &str, value: &str) -> Self {
        Self {
            field_name: name.to_string(),
            string_value: Some(value.to_string()),
            expression: None,
        }
    }

    pub fn expression(name: &str, expression: &str) -> Self {
        Self {
            field_name: name.to_string(),
            string_value: None,
            expression: Some(expression.to_string()),
        }
    }

    /// The literal value, if one is set and non-empty.
    pub fn literal_value(&self) -> Option<&str> {
        self.string_value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Maps a delegate failure onto a BPMN error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapExceptionEntry {
    pub error_code: String,
    /// Failure type to match; `None` is the catch-all mapping.
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub and_children: bool,
}
