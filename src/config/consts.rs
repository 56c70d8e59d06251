// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Vendor namespace prefix under which engine extension attributes live.
pub const DEFAULT_EXTENSION_NAMESPACE: &str = "conductor";
/// Bean the default service-task expression points at when only `implementation` is set.
pub const DEFAULT_SERVICE_TASK_BEAN_NAME: &str = "defaultServiceTaskBehavior";
/// Script language used when a script task does not declare one.
pub const DEFAULT_SCRIPT_LANGUAGE: &str = "lua";
/// Variable receiving business-rule output when the task does not name one.
pub const DEFAULT_RULES_RESULT_VARIABLE: &str = "conductor.rules.OUTPUT";
/// Bridge used by camel tasks without a `camelBehaviorClass` field.
pub const DEFAULT_CAMEL_BEHAVIOR_CLASS: &str = "integration::camel::DefaultCamelBehavior";
/// Bridge used by mule tasks without a `muleBehaviorClass` field.
pub const DEFAULT_MULE_BEHAVIOR_CLASS: &str = "integration::mule::MuleSendBehavior";
/// Zone used to interpret timer date-times that carry no offset.
pub const DEFAULT_TIME_ZONE: &str = "UTC";
