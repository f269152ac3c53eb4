use async_trait::async_trait;

use crate::{models::Capture, DeferResult};

/// A named unit of application work that a capture can refer to.
///
/// Tasks receive the whole capture: positional arguments from the work item,
/// named locals and the receiver value.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self, capture: &Capture) -> DeferResult<()>;
}

/// Adapts a synchronous closure into a [`Task`].
pub struct FnTask<F>(F);

impl<F> FnTask<F>
where
    F: Fn(&Capture) -> DeferResult<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Task for FnTask<F>
where
    F: Fn(&Capture) -> DeferResult<()> + Send + Sync,
{
    async fn run(&self, capture: &Capture) -> DeferResult<()> {
        (self.0)(capture)
    }
}
