use std::{collections::HashSet, future::Future};

use futures::future::join_all;
use serde::Serialize;

use crate::error::{Error, Result};

/// 批量操作中失败的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: i64,
    pub error: String,
}

/// 批量操作结果
///
/// 各项互相独立，已成功的项不会因其他项失败而回滚。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<i64>,
    pub failed: Vec<BulkFailure>,
    pub complete: bool,
}

impl BulkOutcome {
    fn from_results(results: impl IntoIterator<Item = (i64, Result<bool>)>) -> Self {
        let mut outcome = BulkOutcome::default();
        for (id, result) in results {
            match result {
                Ok(true) => outcome.succeeded.push(id),
                Ok(false) => outcome.failed.push(BulkFailure {
                    id,
                    error: Error::NotFound.to_string(),
                }),
                Err(e) => {
                    tracing::warn!(id, error = %e, "bulk item failed");
                    outcome.failed.push(BulkFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcome.complete = outcome.failed.is_empty();
        outcome
    }
}

/// 对每个 id 并发执行单行操作
///
/// `op` 返回 `Ok(false)` 表示该行不存在。重复的 id 只执行一次。
pub async fn run<F, Fut>(ids: &[i64], op: F) -> BulkOutcome
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let results = join_all(unique.iter().map(|&id| op(id))).await;
    let outcome = BulkOutcome::from_results(unique.into_iter().zip(results));
    tracing::info!(
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "bulk operation finished"
    );
    outcome
}
