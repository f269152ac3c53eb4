use std::fmt;

use serde::{Deserialize, Serialize};

use super::HandlerChain;

/// Result of a dispatch: the handler that accepted the capture, or nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "handler", rename_all = "snake_case")]
pub enum Outcome {
    Accepted(String),
    NoneAccepted,
}

impl Outcome {
    pub fn accepted(handler: impl Into<String>) -> Self {
        Outcome::Accepted(handler.into())
    }

    pub fn handler(&self) -> Option<&str> {
        match self {
            Outcome::Accepted(name) => Some(name),
            Outcome::NoneAccepted => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted(name) => write!(f, "accepted by {name}"),
            Outcome::NoneAccepted => write!(f, "none accepted"),
        }
    }
}

/// Fully resolved routing for one dispatch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub handler: HandlerChain,
    pub reporter: String,
}
