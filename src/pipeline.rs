//! Pipeline factory seam.
//!
//! The controller never frames, decodes, or routes messages itself. The
//! caller supplies a [`PipelineFactory`]; for every accepted connection the
//! factory is invoked exactly once and its future is spawned on the worker
//! pool. A typical pipeline composes decode and encode stages around a
//! dispatch step that closes over the caller's router.

use std::future::Future;

use futures_util::future::BoxFuture;

use crate::net::Connection;

/// Builds the per-connection processing pipeline.
///
/// Called once per accepted connection, on the acceptor context; the returned
/// future runs on a worker-pool context, decoupled from accepting. The
/// controller does not inspect the pipeline's internals.
pub trait PipelineFactory: Send + Sync + 'static {
    fn build_pipeline(&self, conn: Connection) -> BoxFuture<'static, ()>;
}

/// Any `Fn(Connection) -> Future` closure is a pipeline factory.
impl<F, Fut> PipelineFactory for F
where
    F: Fn(Connection) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn build_pipeline(&self, conn: Connection) -> BoxFuture<'static, ()> {
        Box::pin(self(conn))
    }
}
