//! Repeated sync cycles on a fixed interval.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Run `cycle` immediately and then once per `interval`, forever.
///
/// Cycles never overlap: a cycle that outlasts the interval delays the next one rather
/// than stacking it. Stop the loop by dropping the future.
pub async fn run_every<F, Fut>(interval: Duration, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed = 0usize;
    loop {
        ticker.tick().await;
        completed += 1;
        info!(cycle = completed, "Starting scheduled sync cycle");
        cycle().await;
        debug!(next_in_secs = interval.as_secs(), "Waiting for next cycle");
    }
}
