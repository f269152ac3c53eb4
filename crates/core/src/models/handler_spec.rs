use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DeferError, DeferResult};

/// Handler specific options, keyed by option name.
pub type HandlerOptions = serde_json::Map<String, serde_json::Value>;

/// Names a handler plus the options it should be invoked with.
///
/// In configuration files a spec is written either as a bare name
/// (`"disk"`) or as a map with exactly one entry whose value holds the
/// options (`{ message_queue = { queue = "mail" } }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHandlerSpec", into = "RawHandlerSpec")]
pub struct HandlerSpec {
    pub name: String,
    pub options: HandlerOptions,
}

impl HandlerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: HandlerOptions::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}

impl fmt::Display for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(
                f,
                "{}{}",
                self.name,
                serde_json::Value::Object(self.options.clone())
            )
        }
    }
}

/// Parses `name` or `name:key=value,key=value`. Values that are valid JSON
/// (numbers, booleans, quoted strings) keep their type, anything else is
/// taken as a plain string.
impl FromStr for HandlerSpec {
    type Err = DeferError;

    fn from_str(s: &str) -> DeferResult<Self> {
        let (name, rest) = match s.split_once(':') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(DeferError::Configuration(format!(
                "handler spec without a name: {s:?}"
            )));
        }

        let mut spec = HandlerSpec::new(name);
        for pair in rest.into_iter().flat_map(|r| r.split(',')) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DeferError::Configuration(format!("malformed handler option {pair:?} in {s:?}"))
            })?;
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            spec.options.insert(key.trim().to_string(), value);
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawHandlerSpec {
    Name(String),
    Configured(BTreeMap<String, Option<serde_json::Value>>),
}

impl TryFrom<RawHandlerSpec> for HandlerSpec {
    type Error = String;

    fn try_from(raw: RawHandlerSpec) -> Result<Self, Self::Error> {
        match raw {
            RawHandlerSpec::Name(name) => Ok(HandlerSpec::new(name)),
            RawHandlerSpec::Configured(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "malformed handler options: expected exactly one handler name, found {}",
                        map.len()
                    ));
                }
                let Some((name, options)) = map.into_iter().next() else {
                    return Err("malformed handler options: empty map".to_string());
                };
                let options = match options {
                    None | Some(serde_json::Value::Null) => HandlerOptions::new(),
                    Some(serde_json::Value::Object(options)) => options,
                    Some(other) => {
                        return Err(format!(
                            "malformed handler options for {name}: expected a table, found {other}"
                        ))
                    }
                };
                Ok(HandlerSpec { name, options })
            }
        }
    }
}

impl From<HandlerSpec> for RawHandlerSpec {
    fn from(spec: HandlerSpec) -> Self {
        if spec.options.is_empty() {
            RawHandlerSpec::Name(spec.name)
        } else {
            let mut map = BTreeMap::new();
            map.insert(spec.name, Some(serde_json::Value::Object(spec.options)));
            RawHandlerSpec::Configured(map)
        }
    }
}

/// Ordered handler specs, tried left to right until one accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHandlerChain", into = "Vec<HandlerSpec>")]
pub struct HandlerChain(Vec<HandlerSpec>);

impl HandlerChain {
    pub fn new(specs: Vec<HandlerSpec>) -> Self {
        Self(specs)
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![HandlerSpec::new(name)])
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(HandlerSpec::new).collect())
    }

    pub fn then(mut self, spec: HandlerSpec) -> Self {
        self.0.push(spec);
        self
    }

    pub fn specs(&self) -> &[HandlerSpec] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HandlerSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.name.as_str()).collect()
    }
}

impl fmt::Display for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl From<Vec<HandlerSpec>> for HandlerChain {
    fn from(specs: Vec<HandlerSpec>) -> Self {
        Self(specs)
    }
}

impl From<HandlerChain> for Vec<HandlerSpec> {
    fn from(chain: HandlerChain) -> Self {
        chain.0
    }
}

impl FromIterator<HandlerSpec> for HandlerChain {
    fn from_iter<T: IntoIterator<Item = HandlerSpec>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HandlerChain {
    type Item = &'a HandlerSpec;
    type IntoIter = std::slice::Iter<'a, HandlerSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHandlerChain {
    One(HandlerSpec),
    Many(Vec<HandlerSpec>),
}

impl TryFrom<RawHandlerChain> for HandlerChain {
    type Error = String;

    fn try_from(raw: RawHandlerChain) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawHandlerChain::One(spec) => HandlerChain(vec![spec]),
            RawHandlerChain::Many(specs) => HandlerChain(specs),
        })
    }
}
