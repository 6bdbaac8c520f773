//! Strictly staggered batch fetching.
//!
//! Harvest has no documented concurrency budget, so each request in a batch
//! starts a fixed interval after the previous one instead of running through a
//! worker pool. All fetches are polled from the calling task.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep_until, Instant};

use crate::error::ExecutionError;

/// Fetch every item, starting item `i` no earlier than `i * throttle` after
/// the batch begins.
///
/// A failed fetch is logged and left as `Err` in its slot; it never cancels
/// the others. Results keep input order.
pub async fn fetch_all<T, R, F, Fut>(
    items: Vec<T>,
    throttle: Duration,
    fetch_one: F,
) -> Vec<Result<R, ExecutionError>>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R, ExecutionError>>,
{
    let started = Instant::now();
    let fetch_one = &fetch_one;

    let fetches = items.into_iter().enumerate().map(|(index, item)| async move {
        let offset = throttle.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
        sleep_until(started + offset).await;

        let result = fetch_one(item, index).await;
        if let Err(ref e) = result {
            log::warn!("Throttled fetch {} failed: {}", index, e);
        }
        result
    });

    join_all(fetches).await
}

/// Keep successful results, in order.
pub fn successes<R>(results: Vec<Result<R, ExecutionError>>) -> Vec<R> {
    results.into_iter().filter_map(Result::ok).collect()
}
