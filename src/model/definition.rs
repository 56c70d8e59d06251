// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::ProcessNode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A complete process graph: nodes, control flow and the signals and messages
/// its events refer to.
///
/// # Example
/// ```yaml
/// id: order
/// nodes:
///   - id: start
///     kind: { type: start_event }
///   - id: end
///     kind: { type: end_event }
/// sequence_flows:
///   - id: f1
///     source_ref: start
///     target_ref: end
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<ProcessNode>,
    #[serde(default)]
    pub sequence_flows: Vec<SequenceFlow>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ProcessDefinition {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_node(mut self, node: ProcessNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_flow(mut self, flow: SequenceFlow) -> Self {
        self.sequence_flows.push(flow);
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn node(&self, id: &str) -> Option<&ProcessNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn signal(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.id == id)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFlow {
    pub id: String,
    pub source_ref: String,
    pub target_ref: String,
    #[serde(default)]
    pub condition_expression: Option<String>,
}

impl SequenceFlow {
    pub fn new(id: &str, source_ref: &str, target_ref: &str) -> Self {
        Self {
            id: id.to_string(),
            source_ref: source_ref.to_string(),
            target_ref: target_ref.to_string(),
            condition_expression: None,
        }
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition_expression = Some(condition.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalScope {
    #[default]
    Global,
    ProcessInstance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scope: SignalScope,
}

impl Signal {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            scope: SignalScope::Global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub name: String,
}

impl Message {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Load a process graph that was serialized to YAML.
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<ProcessDefinition, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let definition: ProcessDefinition = serde_yaml::from_str(&content)?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use std::io::Write;

    #[test]
    fn load_definition_from_file() {
        let yaml = r#"
id: order
nodes:
  - id: start
    kind: { type: start_event }
  - id: ship
    kind:
      type: send_task
      task_type: camel
  - id: end
    kind: { type: end_event }
sequence_flows:
  - id: f1
    source_ref: start
    target_ref: ship
  - id: f2
    source_ref: ship
    target_ref: end
    condition_expression: "${shipped}"
signals:
  - id: cancelOrder
    name: cancel-order
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let definition = load_definition(file.path()).unwrap();
        assert_eq!(definition.nodes.len(), 3);
        assert!(matches!(definition.node("ship").unwrap().kind, NodeKind::SendTask(_)));
        assert_eq!(definition.sequence_flows[1].condition_expression.as_deref(), Some("${shipped}"));
        assert_eq!(definition.signal("cancelOrder").unwrap().scope, SignalScope::Global);
        assert!(definition.message("missing").is_none());
    }

    #[test]
    fn load_definition_missing_file() {
        assert!(load_definition("/definitely/not/here.yaml").is_err());
    }
}
