use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::HandlerChain;

use super::Environment;

/// One named configuration: which handlers to try and where to report.
/// Either field may be absent and is then filled from a lower level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigEntry {
    pub handler: Option<HandlerChain>,
    pub reporter: Option<String>,
}

impl ConfigEntry {
    pub fn new(handler: Option<HandlerChain>, reporter: Option<String>) -> Self {
        Self { handler, reporter }
    }
}

/// Contents of the named configuration store.
///
/// ```toml
/// [default]
/// handler = ["in_process", "disk"]
///
/// [production.mail]
/// handler = [{ message_queue = { queue = "mail" } }, "disk"]
/// reporter = "notification"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedConfigurations {
    #[serde(default)]
    pub default: Option<ConfigEntry>,
    #[serde(flatten)]
    pub environments: HashMap<String, HashMap<String, ConfigEntry>>,
}

impl NamedConfigurations {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.environments.is_empty()
    }

    pub fn with_default(mut self, entry: ConfigEntry) -> Self {
        self.default = Some(entry);
        self
    }

    pub fn with_entry(
        mut self,
        environment: &str,
        name: impl Into<String>,
        entry: ConfigEntry,
    ) -> Self {
        self.environments
            .entry(environment.to_string())
            .or_default()
            .insert(name.into(), entry);
        self
    }

    /// Looks up `name` under any spelling of `environment`.
    pub fn entry(&self, environment: Environment, name: &str) -> Option<&ConfigEntry> {
        environment
            .aliases()
            .iter()
            .filter_map(|key| self.environments.get(*key))
            .find_map(|entries| entries.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_environments_and_default() {
        let named: NamedConfigurations = serde_json::from_value(json!({
            "default": { "handler": ["in_process", "disk"] },
            "production": {
                "mail": {
                    "handler": [{ "message_queue": { "queue": "mail" } }, "disk"],
                    "reporter": "notification"
                }
            },
            "testing": {
                "mail": { "handler": "test", "reporter": "test" }
            }
        }))
        .unwrap();

        let default = named.default.as_ref().unwrap();
        assert_eq!(default.handler.as_ref().unwrap().names(), vec!["in_process", "disk"]);
        assert!(default.reporter.is_none());

        let mail = named.entry(Environment::Production, "mail").unwrap();
        assert_eq!(mail.reporter.as_deref(), Some("notification"));

        let mail = named.entry(Environment::Testing, "mail").unwrap();
        assert_eq!(mail.handler.as_ref().unwrap().names(), vec!["test"]);

        assert!(named.entry(Environment::Staging, "mail").is_none());
    }
}
