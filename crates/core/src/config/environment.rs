use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DeferError;

/// Environment variable that selects the current environment.
pub const ENVIRONMENT_VAR: &str = "DEFER_ENV";

/// Deployment environment, used to pick the per-environment section of the
/// named configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Staging,
    Production,
}

impl Environment {
    /// Get current environment from environment variable
    pub fn current() -> Result<Self, DeferError> {
        std::env::var(ENVIRONMENT_VAR)
            .map(|s| s.parse())
            .unwrap_or(Ok(Environment::Development))
    }

    /// Canonical key used in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Every spelling accepted for this environment, canonical key first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Environment::Development => &["development", "dev"],
            Environment::Testing => &["test", "testing"],
            Environment::Staging => &["staging", "stage"],
            Environment::Production => &["production", "prod"],
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = DeferError;

    fn from_str(env: &str) -> Result<Self, Self::Err> {
        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(DeferError::Configuration(format!(
                "Invalid environment: {env}"
            ))),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = DeferError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.key().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
