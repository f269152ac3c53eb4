use std::sync::Arc;

use defer_core::{
    Capture, DeferError, DeferResult, HandlerChain, HandlerRegistry, Outcome, ReporterRegistry,
};
use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

/// Tries the handlers of a chain in order until one accepts the capture.
///
/// Every failure along the way goes to the reporter named for the call.
/// Running out of handlers is a normal result ([`Outcome::NoneAccepted`]),
/// not an error; the only error is a reporter name nobody registered.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    reporters: Arc<ReporterRegistry>,
}

impl Dispatcher {
    pub fn new(handlers: Arc<HandlerRegistry>, reporters: Arc<ReporterRegistry>) -> Self {
        Self {
            handlers,
            reporters,
        }
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn reporters(&self) -> &Arc<ReporterRegistry> {
        &self.reporters
    }

    #[instrument(skip(self, capture, chain), fields(
        capture_id = %capture.id,
        task = capture.task_name(),
        chain = %chain,
    ))]
    pub async fn dispatch(
        &self,
        capture: &Capture,
        chain: &HandlerChain,
        reporter_name: &str,
    ) -> DeferResult<Outcome> {
        let reporter = self.reporters.require(reporter_name)?;

        for spec in chain {
            let Some(handler) = self.handlers.get(&spec.name) else {
                warn!(handler = %spec.name, "handler is not registered");
                record_attempt(&spec.name, "unknown");
                reporter
                    .report(&DeferError::UnknownHandler {
                        name: spec.name.clone(),
                    })
                    .await;
                continue;
            };

            debug!(handler = %spec.name, "trying handler");
            match handler.handle(capture, &spec.options).await {
                Ok(()) => {
                    record_attempt(&spec.name, "accepted");
                    info!(handler = %spec.name, "capture accepted");
                    return Ok(Outcome::accepted(spec.name.clone()));
                }
                Err(e) => {
                    record_attempt(&spec.name, "failed");
                    warn!(handler = %spec.name, error = %e, "handler failed, trying next");
                    reporter.report(&e).await;
                }
            }
        }

        error!(attempted = chain.len(), "no handler accepted the capture");
        Ok(Outcome::NoneAccepted)
    }
}

fn record_attempt(handler: &str, result: &'static str) {
    counter!(
        "defer_dispatch_attempts_total",
        "handler" => handler.to_string(),
        "result" => result
    )
    .increment(1);
}
