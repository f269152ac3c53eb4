use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::models::{EffectiveConfig, HandlerChain};

use super::{
    ConfigEntry, ConfigurationSource, Environment, NamedConfigurations, ProcessDefaults,
    StaticConfigurationSource,
};

/// Values given explicitly at the dispatch call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSiteOptions {
    pub handler: Option<HandlerChain>,
    pub reporter: Option<String>,
}

impl CallSiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, chain: HandlerChain) -> Self {
        self.handler = Some(chain);
        self
    }

    pub fn reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }
}

/// Merges call-site options with named configurations and process defaults.
///
/// Precedence, per field, highest first:
/// 1. call-site value
/// 2. `configurations[environment][name]`
/// 3. `configurations.default`
/// 4. process defaults
///
/// The source is loaded on first use and cached for the life of the
/// resolver. A source that fails to load is logged and treated as empty.
pub struct ConfigResolver {
    source: Arc<dyn ConfigurationSource>,
    environment: Environment,
    defaults: ProcessDefaults,
    cache: OnceLock<NamedConfigurations>,
}

impl ConfigResolver {
    pub fn new(
        source: Arc<dyn ConfigurationSource>,
        environment: Environment,
        defaults: ProcessDefaults,
    ) -> Self {
        Self {
            source,
            environment,
            defaults,
            cache: OnceLock::new(),
        }
    }

    /// Resolver with no named configurations, only process defaults.
    pub fn with_defaults(defaults: ProcessDefaults) -> Self {
        Self::new(
            Arc::new(StaticConfigurationSource::empty()),
            Environment::default(),
            defaults,
        )
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn defaults(&self) -> &ProcessDefaults {
        &self.defaults
    }

    pub fn configurations(&self) -> &NamedConfigurations {
        self.cache.get_or_init(|| match self.source.load() {
            Ok(named) => named,
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "failed to load named configurations, continuing without them"
                );
                NamedConfigurations::default()
            }
        })
    }

    pub fn resolve(
        &self,
        call_site: &CallSiteOptions,
        configuration: Option<&str>,
    ) -> EffectiveConfig {
        let named = self.configurations();
        let levels: Vec<&ConfigEntry> = configuration
            .and_then(|name| named.entry(self.environment, name))
            .into_iter()
            .chain(named.default.as_ref())
            .collect();

        let handler = call_site
            .handler
            .clone()
            .or_else(|| levels.iter().find_map(|entry| entry.handler.clone()))
            .unwrap_or_else(|| self.defaults.handler.clone());

        let reporter = call_site
            .reporter
            .clone()
            .or_else(|| levels.iter().find_map(|entry| entry.reporter.clone()))
            .unwrap_or_else(|| self.defaults.reporter.clone());

        debug!(
            configuration = configuration.unwrap_or("-"),
            environment = %self.environment,
            handler = %handler,
            reporter = %reporter,
            "resolved dispatch configuration"
        );

        EffectiveConfig { handler, reporter }
    }
}
