// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{default_true, ExtensionAttributes};
use serde::{Deserialize, Serialize};

/// The typed trigger attached to a start, catch, throw or boundary event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDefinition {
    Timer(TimerEventDefinition),
    Signal(SignalEventDefinition),
    Message(MessageEventDefinition),
    Error(ErrorEventDefinition),
    Cancel,
    Compensate(CompensateEventDefinition),
    Terminate(TerminateEventDefinition),
}

impl EventDefinition {
    pub fn label(&self) -> &'static str {
        match self {
            EventDefinition::Timer(_) => "timer",
            EventDefinition::Signal(_) => "signal",
            EventDefinition::Message(_) => "message",
            EventDefinition::Error(_) => "error",
            EventDefinition::Cancel => "cancel",
            EventDefinition::Compensate(_) => "compensate",
            EventDefinition::Terminate(_) => "terminate",
        }
    }
}

/// Timer trigger: exactly one of `time_date`, `time_duration`, `time_cycle`.
///
/// Values are kept raw; they are evaluated against a clock only when the
/// execution engine asks for a due date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerEventDefinition {
    pub calendar_name: Option<String>,
    pub time_date: Option<String>,
    pub time_duration: Option<String>,
    pub time_cycle: Option<String>,
    pub end_date: Option<String>,
}

/// The single value a timer definition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerValue<'a> {
    Date(&'a str),
    Duration(&'a str),
    Cycle(&'a str),
}

impl TimerEventDefinition {
    pub fn cycle(spec: &str) -> Self {
        Self {
            time_cycle: Some(spec.to_string()),
            ..Self::default()
        }
    }

    pub fn duration(spec: &str) -> Self {
        Self {
            time_duration: Some(spec.to_string()),
            ..Self::default()
        }
    }

    pub fn date(spec: &str) -> Self {
        Self {
            time_date: Some(spec.to_string()),
            ..Self::default()
        }
    }

    /// The configured value, or a description of why there is not exactly one.
    pub fn value(&self) -> Result<TimerValue<'_>, String> {
        let present: Vec<TimerValue<'_>> = [
            self.time_date.as_deref().map(TimerValue::Date),
            self.time_duration.as_deref().map(TimerValue::Duration),
            self.time_cycle.as_deref().map(TimerValue::Cycle),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.text().trim().is_empty())
        .collect();

        match present.as_slice() {
            [single] => Ok(*single),
            [] => Err("timer defines none of timeDate, timeDuration, timeCycle".to_string()),
            _ => Err("timer defines more than one of timeDate, timeDuration, timeCycle".to_string()),
        }
    }
}

impl<'a> TimerValue<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            TimerValue::Date(text) | TimerValue::Duration(text) | TimerValue::Cycle(text) => text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalEventDefinition {
    pub signal_ref: Option<String>,
    pub signal_expression: Option<String>,
    #[serde(rename = "async")]
    pub asynchronous: bool,
}

/// Moves a value between the event and process variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMapping {
    /// Expression or variable name read on the sending side.
    pub source: String,
    /// Variable written on the receiving side.
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEventDefinition {
    pub message_ref: Option<String>,
    pub message_expression: Option<String>,
    pub correlation_key: Option<String>,
    pub payload: Vec<PayloadMapping>,
    pub extensions: ExtensionAttributes,
}

impl MessageEventDefinition {
    pub fn new(message_ref: &str) -> Self {
        Self {
            message_ref: Some(message_ref.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorEventDefinition {
    pub error_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensateEventDefinition {
    #[serde(default)]
    pub activity_ref: Option<String>,
    #[serde(default = "default_true")]
    pub wait_for_completion: bool,
}

impl Default for CompensateEventDefinition {
    fn default() -> Self {
        Self {
            activity_ref: None,
            wait_for_completion: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminateEventDefinition {
    pub terminate_all: bool,
    pub terminate_multi_instance: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_value_requires_exactly_one() {
        assert_eq!(
            TimerEventDefinition::cycle("R3/PT10H").value(),
            Ok(TimerValue::Cycle("R3/PT10H"))
        );

        let empty = TimerEventDefinition::default();
        assert!(empty.value().unwrap_err().contains("none of"));

        let both = TimerEventDefinition {
            time_date: Some("2024-01-01T00:00:00Z".to_string()),
            time_duration: Some("PT5M".to_string()),
            ..TimerEventDefinition::default()
        };
        assert!(both.value().unwrap_err().contains("more than one"));
    }

    #[test]
    fn blank_timer_values_are_ignored() {
        let timer = TimerEventDefinition {
            time_date: Some("  ".to_string()),
            time_duration: Some("PT5M".to_string()),
            ..TimerEventDefinition::default()
        };
        assert_eq!(timer.value(), Ok(TimerValue::Duration("PT5M")));
    }

    #[test]
    fn deserializes_tagged_definitions() {
        let yaml = r#"
- type: timer
  time_cycle: R2/PT1H
- type: cancel
- type: terminate
  terminate_all: true
"#;
        let defs: Vec<EventDefinition> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[1], EventDefinition::Cancel);
        assert_eq!(
            defs[2],
            EventDefinition::Terminate(TerminateEventDefinition {
                terminate_all: true,
                terminate_multi_instance: false,
            })
        );
    }
}
