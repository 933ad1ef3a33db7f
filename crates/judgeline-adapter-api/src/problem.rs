//! Problem configuration as delivered by the control server.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

/// Per-problem configuration.
///
/// The engine reads only the adapter names; everything inside an
/// [`AdapterConfig`] belongs to the adapter that owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemConfig {
    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionConstraints>,

    #[serde(default)]
    pub judge: AdapterSection,

    /// Submit form definition; only the web frontend interprets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<AdapterSection>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl ProblemConfig {
    /// Name of the judge adapter this problem asks for.
    pub fn judge_adapter(&self) -> &str {
        &self.judge.adapter
    }

    /// Name of the instance adapter, if the problem is instanced at all.
    ///
    /// An `instanceLabel` takes precedence over `instance.adapter`.
    pub fn instance_adapter(&self) -> Option<&str> {
        let section = self.instance.as_ref()?;
        Some(self.instance_label.as_deref().unwrap_or(&section.adapter))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

/// Adapter name plus its private configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterSection {
    #[serde(default)]
    pub adapter: String,

    #[serde(default)]
    pub config: AdapterConfig,
}

/// Raw adapter configuration, decoded lazily by the adapter that owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterConfig(serde_json::Value);

impl AdapterConfig {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    /// Decode into the adapter's own config type.
    ///
    /// A missing config decodes like an empty object, so config types whose
    /// fields all have defaults accept it.
    pub fn decode<T: DeserializeOwned>(&self, adapter: &str) -> Result<T, JudgeError> {
        let value = if self.0.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            self.0.clone()
        };
        serde_json::from_value(value).map_err(|e| JudgeError::InvalidConfig {
            adapter: adapter.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct PingConfig {
        #[serde(default)]
        ping: String,
    }

    #[test]
    fn parses_server_payload() {
        let raw = r#"{
            "label": "a+b",
            "judge": { "adapter": "dummy", "config": { "ping": "hi" } },
            "instanceLabel": "docker",
            "instance": { "adapter": "docker", "config": {} },
            "variables": { "lang": "cpp" }
        }"#;
        let cfg: ProblemConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.judge_adapter(), "dummy");
        assert_eq!(cfg.instance_adapter(), Some("docker"));
        assert_eq!(cfg.variables.get("lang").map(String::as_str), Some("cpp"));

        let ping: PingConfig = cfg.judge.config.decode("dummy").unwrap();
        assert_eq!(ping.ping, "hi");
    }

    #[test]
    fn instance_adapter_requires_instance_section() {
        let cfg = ProblemConfig {
            instance_label: Some("shell".into()),
            ..Default::default()
        };
        assert_eq!(cfg.instance_adapter(), None);
    }

    #[test]
    fn missing_config_decodes_as_empty_object() {
        let cfg: ProblemConfig =
            serde_json::from_str(r#"{"judge":{"adapter":"dummy"}}"#).unwrap();
        assert!(cfg.judge.config.is_empty());
        let ping: PingConfig = cfg.judge.config.decode("dummy").unwrap();
        assert_eq!(ping.ping, "");
    }

    #[test]
    fn decode_failure_names_the_adapter() {
        let config = AdapterConfig::new(serde_json::json!({ "ping": 42 }));
        let err = config.decode::<PingConfig>("dummy").unwrap_err();
        assert!(matches!(err, JudgeError::InvalidConfig { ref adapter, .. } if adapter == "dummy"));
    }
}
