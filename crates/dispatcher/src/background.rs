//! Dispatch context: resolves the effective configuration for a call and
//! hands the capture to the [`Dispatcher`].
//!
//! A `Background` is an explicit value rather than process-global state, so
//! tests and embedders can build as many independent contexts as they need.

use std::sync::Arc;

use defer_core::{
    CallSiteOptions, Capture, ConfigResolver, DeferResult, EffectiveConfig, HandlerChain,
    Outcome, WorkItem,
};
use tracing::debug;

use crate::{DeferredTask, Dispatcher};

/// Per-call routing overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeferOptions {
    pub handler: Option<HandlerChain>,
    pub reporter: Option<String>,
    pub configuration: Option<String>,
}

impl DeferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, chain: impl Into<HandlerChain>) -> Self {
        self.handler = Some(chain.into());
        self
    }

    pub fn reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }

    pub fn configuration(mut self, name: impl Into<String>) -> Self {
        self.configuration = Some(name.into());
        self
    }

    pub fn call_site(&self) -> CallSiteOptions {
        CallSiteOptions {
            handler: self.handler.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Background {
    resolver: Arc<ConfigResolver>,
    dispatcher: Arc<Dispatcher>,
}

impl Background {
    pub fn new(resolver: Arc<ConfigResolver>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            resolver,
            dispatcher,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn resolve(&self, options: &DeferOptions) -> EffectiveConfig {
        self.resolver
            .resolve(&options.call_site(), options.configuration.as_deref())
    }

    /// Resolves the routing for `options` and dispatches `capture`.
    pub async fn defer(&self, capture: &Capture, options: &DeferOptions) -> DeferResult<Outcome> {
        let effective = self.resolve(options);
        debug!(
            capture_id = %capture.id,
            handler = %effective.handler,
            reporter = %effective.reporter,
            "deferring capture"
        );
        self.dispatcher
            .dispatch(capture, &effective.handler, &effective.reporter)
            .await
    }

    /// One-shot form: captures `task(args)` and defers it with the resolved
    /// defaults.
    pub async fn defer_task(
        &self,
        task: impl Into<String>,
        args: Vec<serde_json::Value>,
    ) -> DeferResult<Outcome> {
        let capture = Capture::new(WorkItem::with_args(task, args));
        self.defer(&capture, &DeferOptions::default()).await
    }

    /// Reusable call-site wrapper around a registered task.
    pub fn deferred(&self, task: impl Into<String>) -> DeferredTask {
        DeferredTask::new(self.clone(), task)
    }
}
