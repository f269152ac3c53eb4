use async_trait::async_trait;

use crate::DeferError;

/// Sink for per-attempt failures.
///
/// Reporting is best effort: a reporter must not fail the dispatch that
/// called it, so `report` has no return value. Reporters that talk to the
/// outside world log their own delivery problems.
#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;

    async fn report(&self, error: &DeferError);
}
