//! Adapter registry.
//!
//! Built once at startup and shared read-only with the dispatchers.

use std::collections::BTreeMap;
use std::sync::Arc;

use judgeline_adapter_api::{InstanceAdapter, JudgeAdapter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} adapter: {name}")]
    Duplicate { kind: &'static str, name: String },
}

#[derive(Default)]
pub struct AdapterRegistryBuilder {
    judges: BTreeMap<String, Arc<dyn JudgeAdapter>>,
    instancers: BTreeMap<String, Arc<dyn InstanceAdapter>>,
}

impl AdapterRegistryBuilder {
    pub fn judge(mut self, adapter: impl JudgeAdapter + 'static) -> Result<Self, RegistryError> {
        let name = adapter.name().to_string();
        if self.judges.contains_key(&name) {
            return Err(RegistryError::Duplicate { kind: "judge", name });
        }
        self.judges.insert(name, Arc::new(adapter));
        Ok(self)
    }

    pub fn instancer(
        mut self,
        adapter: impl InstanceAdapter + 'static,
    ) -> Result<Self, RegistryError> {
        let name = adapter.name().to_string();
        if self.instancers.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: "instance",
                name,
            });
        }
        self.instancers.insert(name, Arc::new(adapter));
        Ok(self)
    }

    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            judges: self.judges,
            instancers: self.instancers,
        }
    }
}

/// Name to implementation maps for both adapter kinds.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    judges: BTreeMap<String, Arc<dyn JudgeAdapter>>,
    instancers: BTreeMap<String, Arc<dyn InstanceAdapter>>,
}

impl AdapterRegistry {
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::default()
    }

    pub fn judge(&self, name: &str) -> Option<Arc<dyn JudgeAdapter>> {
        self.judges.get(name).cloned()
    }

    pub fn instancer(&self, name: &str) -> Option<Arc<dyn InstanceAdapter>> {
        self.instancers.get(name).cloned()
    }

    pub fn judge_names(&self) -> impl Iterator<Item = &str> {
        self.judges.keys().map(String::as_str)
    }

    pub fn instancer_names(&self) -> impl Iterator<Item = &str> {
        self.instancers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("judges", &self.judges.keys().collect::<Vec<_>>())
            .field("instancers", &self.instancers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use judgeline_adapter_api::{InstanceTask, JudgeError, JudgeTask};

    struct Named(&'static str);

    #[async_trait]
    impl JudgeAdapter for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn judge(&self, _task: &dyn JudgeTask) -> Result<(), JudgeError> {
            Ok(())
        }
    }

    #[async_trait]
    impl InstanceAdapter for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn start(&self, _task: &dyn InstanceTask) -> anyhow::Result<()> {
            Ok(())
        }

        async fn destroy(&self, _task: &dyn InstanceTask) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_judge_is_rejected() {
        let err = AdapterRegistry::builder()
            .judge(Named("dummy"))
            .unwrap()
            .judge(Named("dummy"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                kind: "judge",
                name: "dummy".into()
            }
        );
    }

    #[test]
    fn kinds_have_separate_namespaces() {
        let registry = AdapterRegistry::builder()
            .judge(Named("shell"))
            .unwrap()
            .instancer(Named("shell"))
            .unwrap()
            .build();

        assert!(registry.judge("shell").is_some());
        assert!(registry.instancer("shell").is_some());
        assert!(registry.judge("missing").is_none());
        assert_eq!(registry.judge_names().collect::<Vec<_>>(), vec!["shell"]);
    }
}
