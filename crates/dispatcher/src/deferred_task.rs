use std::fmt;

use defer_core::{Capture, DeferResult, HandlerChain, Outcome, WorkItem};
use serde_json::Value;

use crate::{Background, DeferOptions};

/// A registered task bound to a [`Background`] context and a fixed set of
/// dispatch options.
///
/// Calling it captures the arguments as the work item. Names given with
/// [`params`](Self::params) are matched positionally against the arguments
/// and also bound into the capture's locals.
///
/// ```rust,ignore
/// let welcome = background
///     .deferred("send_welcome")
///     .params(["user_id", "locale"])
///     .options(DeferOptions::new().configuration("mailers"));
///
/// welcome.call(vec![json!(42), json!("en")]).await?;
/// ```
#[derive(Clone)]
pub struct DeferredTask {
    background: Background,
    task: String,
    params: Vec<String>,
    receiver: Value,
    options: DeferOptions,
}

impl DeferredTask {
    pub fn new(background: Background, task: impl Into<String>) -> Self {
        Self {
            background,
            task: task.into(),
            params: Vec::new(),
            receiver: Value::Null,
            options: DeferOptions::default(),
        }
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn receiver(mut self, receiver: Value) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn options(mut self, options: DeferOptions) -> Self {
        self.options = options;
        self
    }

    pub fn handler(mut self, chain: impl Into<HandlerChain>) -> Self {
        self.options.handler = Some(chain.into());
        self
    }

    pub fn reporter(mut self, reporter: impl Into<String>) -> Self {
        self.options.reporter = Some(reporter.into());
        self
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// Builds the capture a call with `args` would dispatch. Params without a
    /// matching argument are left unbound.
    pub fn capture(&self, args: Vec<Value>) -> Capture {
        let locals: Vec<(String, Value)> = self
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();

        Capture::new(WorkItem::with_args(self.task.clone(), args))
            .with_locals(locals)
            .with_receiver(self.receiver.clone())
    }

    pub async fn call(&self, args: Vec<Value>) -> DeferResult<Outcome> {
        let capture = self.capture(args);
        self.background.defer(&capture, &self.options).await
    }
}

impl fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTask")
            .field("task", &self.task)
            .field("params", &self.params)
            .field("options", &self.options)
            .finish()
    }
}
