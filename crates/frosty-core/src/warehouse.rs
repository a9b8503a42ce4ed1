//! Warehouse execution abstraction.

use crate::{query::QuerySpec, result::ResultSet};

/// The execution context every render pass runs its statements through.
///
/// Constructed once at process start and shared by all requests. Calls are
/// awaited one at a time; implementations need not support concurrent use
/// of a single session.
#[async_trait::async_trait]
pub trait Warehouse: Send + Sync + 'static {
    /// Run `spec` and return its rows in warehouse order, with the columns
    /// named by `spec.columns`.
    async fn execute(&self, spec: &QuerySpec) -> anyhow::Result<ResultSet>;

    /// Cheap liveness probe.
    async fn ping(&self) -> anyhow::Result<()>;
}
