use crate::domain::table::Table;
use crate::utils::error::{ConeError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// What a batch does when one of its sub-queries fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort on the first failure and return it.
    #[default]
    Stop,
    /// Log and skip the failing item; fail only if nothing succeeded.
    Continue,
}

/// Runs `query` once per parameter set, in order, one at a time, and
/// row-stacks the results.
pub async fn query_loop<P, F, Fut>(params: Vec<P>, policy: FailurePolicy, mut query: F) -> Result<Table>
where
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<Table>>,
{
    let total = params.len();
    let mut tables = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (index, param) in params.into_iter().enumerate() {
        match query(param).await {
            Ok(table) => {
                tracing::debug!("✅ Sub-query {}/{} returned {} row(s)", index + 1, total, table.len());
                tables.push(table);
            }
            Err(e) => match policy {
                FailurePolicy::Stop => {
                    tracing::error!("❌ Sub-query {}/{} failed, aborting batch: {}", index + 1, total, e);
                    return Err(e);
                }
                FailurePolicy::Continue => {
                    tracing::warn!("⚠️ Sub-query {}/{} failed, skipping: {}", index + 1, total, e);
                    failed += 1;
                }
            },
        }
    }

    if total > 0 && failed == total {
        return Err(ConeError::BatchFailed { total });
    }

    let stacked = Table::vstack(tables);
    tracing::info!(
        "📊 Batch finished: {} row(s) from {}/{} sub-queries",
        stacked.len(),
        total - failed,
        total
    );
    Ok(stacked)
}
