// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiler::fields::FieldDeclaration;
use crate::compiler::message::{DefaultThrowMessageDelegate, DEFAULT_THROW_MESSAGE_DELEGATE_CLASS};
use crate::errors::{CompilationError, ExecutionError};
use crate::testing::{NoOpServiceTask, NO_OP_SERVICE_TASK_CLASS};
use crate::traits::{Delegate, Variables};

/// Builds a delegate from the field declarations of the node that names it.
pub type DelegateConstructor =
    Arc<dyn Fn(&[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> + Send + Sync>;

/// A delegate instance together with the class name it was loaded under.
///
/// Handles compare by class name so compiled behaviors can be compared
/// structurally.
#[derive(Clone)]
pub struct DelegateHandle {
    class_name: String,
    instance: Arc<dyn Delegate>,
}

impl DelegateHandle {
    pub fn new(class_name: &str, instance: Arc<dyn Delegate>) -> Self {
        Self {
            class_name: class_name.to_string(),
            instance,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn instance(&self) -> &Arc<dyn Delegate> {
        &self.instance
    }

    pub async fn execute(&self, variables: &mut Variables) -> Result<(), ExecutionError> {
        self.instance.execute(variables).await
    }
}

impl PartialEq for DelegateHandle {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name
    }
}

impl std::fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("class_name", &self.class_name)
            .field("delegate", &self.instance.name())
            .finish()
    }
}

/// Name → constructor table standing in for class loading.
///
/// Optional integrations (Camel, Mule) are only available when something
/// registers their classes; compiling a task that needs an absent class fails
/// with [`CompilationError::ClassNotFound`].
#[derive(Clone, Default)]
pub struct ClassRegistry {
    constructors: HashMap<String, DelegateConstructor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in delegates.
    pub fn standard() -> Self {
        Self::new()
            .with_class(NO_OP_SERVICE_TASK_CLASS, NoOpServiceTask::construct)
            .with_class(DEFAULT_THROW_MESSAGE_DELEGATE_CLASS, DefaultThrowMessageDelegate::construct)
    }

    pub fn register<F>(&mut self, class_name: &str, constructor: F)
    where
        F: Fn(&[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> + Send + Sync + 'static,
    {
        self.constructors
            .insert(class_name.to_string(), Arc::new(constructor));
    }

    pub fn with_class<F>(mut self, class_name: &str, constructor: F) -> Self
    where
        F: Fn(&[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> + Send + Sync + 'static,
    {
        self.register(class_name, constructor);
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    pub fn load(&self, class_name: &str) -> Option<DelegateConstructor> {
        self.constructors.get(class_name).cloned()
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load `class_name` and build it with `fields`.
    pub fn instantiate(
        &self,
        node_id: &str,
        class_name: &str,
        fields: &[FieldDeclaration],
    ) -> Result<DelegateHandle, CompilationError> {
        let constructor = self
            .load(class_name)
            .ok_or_else(|| CompilationError::class_not_found(node_id, class_name))?;
        let instance = constructor(fields).map_err(|reason| CompilationError::Instantiation {
            node_id: node_id.to_string(),
            class_name: class_name.to_string(),
            reason,
        })?;
        Ok(DelegateHandle::new(class_name, instance))
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("class_count", &self.constructors.len())
            .field("class_names", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Recorder {
        label: String,
    }

    #[async_trait]
    impl Delegate for Recorder {
        async fn execute(&self, variables: &mut Variables) -> Result<(), ExecutionError> {
            variables.insert("recorded".to_string(), serde_json::json!(self.label));
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    fn recorder(fields: &[FieldDeclaration]) -> Result<Arc<dyn Delegate>, String> {
        let label = fields
            .iter()
            .find(|f| f.name == "label")
            .and_then(|f| f.fixed_value())
            .ok_or_else(|| "missing 'label' field".to_string())?;
        Ok(Arc::new(Recorder {
            label: label.to_string(),
        }))
    }

    #[test]
    fn test_standard_registry_contents() {
        let registry = ClassRegistry::standard();
        assert_eq!(
            registry.class_names(),
            vec![DEFAULT_THROW_MESSAGE_DELEGATE_CLASS, NO_OP_SERVICE_TASK_CLASS]
        );
        assert!(!registry.contains("integration::camel::DefaultCamelBehavior"));
    }

    #[test]
    fn test_instantiate_errors() {
        let registry = ClassRegistry::new().with_class("acme::Recorder", recorder);

        assert_eq!(
            registry.instantiate("n1", "acme::Missing", &[]).unwrap_err(),
            CompilationError::class_not_found("n1", "acme::Missing")
        );
        assert_eq!(
            registry.instantiate("n1", "acme::Recorder", &[]).unwrap_err(),
            CompilationError::Instantiation {
                node_id: "n1".to_string(),
                class_name: "acme::Recorder".to_string(),
                reason: "missing 'label' field".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_instantiated_delegate_runs() {
        let registry = ClassRegistry::new().with_class("acme::Recorder", recorder);
        let handle = registry
            .instantiate("n1", "acme::Recorder", &[FieldDeclaration::fixed("label", "hello")])
            .unwrap();

        let mut variables = Variables::new();
        handle.execute(&mut variables).await.unwrap();

        assert_eq!(handle.class_name(), "acme::Recorder");
        assert_eq!(variables["recorded"], serde_json::json!("hello"));
    }

    #[test]
    fn test_handles_compare_by_class_name() {
        let registry = ClassRegistry::new().with_class("acme::Recorder", recorder);
        let a = registry
            .instantiate("n1", "acme::Recorder", &[FieldDeclaration::fixed("label", "a")])
            .unwrap();
        let b = registry
            .instantiate("n2", "acme::Recorder", &[FieldDeclaration::fixed("label", "b")])
            .unwrap();
        assert_eq!(a, b);
    }
}
