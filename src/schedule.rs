//! Repeating runs: once, at a fixed interval, or daily at a local time.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Once,
    /// Run now, then again after each interval.
    Interval(Duration),
    /// Run every day at this local time.
    Daily(NaiveTime),
}

/// The first occurrence of `at` strictly after `now`, in `now`'s time zone.
///
/// Days where `at` falls into a DST gap are skipped.
#[must_use]
pub fn next_daily_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..=2).find_map(|offset| {
        let date = today.checked_add_days(Days::new(offset))?;
        tz.from_local_datetime(&date.and_time(at))
            .earliest()
            .filter(|candidate| candidate > now)
    })
}

fn until<Tz: TimeZone>(now: &DateTime<Tz>, next: &DateTime<Tz>) -> Duration {
    next.clone()
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or_default()
}

/// Drive `job` according to `mode`.
///
/// `Once` returns the job's result. The repeating modes never return; a failed
/// run is logged and the next one is still scheduled.
///
/// # Errors
///
/// Returns the job's error in `Once` mode.
pub async fn run_schedule<F, Fut>(mode: ScheduleMode, mut job: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match mode {
        ScheduleMode::Once => job().await,
        ScheduleMode::Interval(interval) => {
            info!(interval_secs = interval.as_secs(), "Running on a fixed interval");
            loop {
                if let Err(e) = job().await {
                    error!("Scheduled run failed: {e:#}");
                }
                info!(next_in_secs = interval.as_secs(), "Waiting for next run");
                tokio::time::sleep(interval).await;
            }
        }
        ScheduleMode::Daily(at) => {
            info!(at = %at.format("%H:%M"), "Running daily");
            loop {
                let now = Local::now();
                // Fall back to a day when no valid local time exists in the next days.
                let delay = next_daily_run(&now, at)
                    .map_or(Duration::from_secs(24 * 60 * 60), |next| {
                        info!(next_run = %next.format("%Y-%m-%d %H:%M"), "Waiting for next run");
                        until(&now, &next)
                    });
                tokio::time::sleep(delay).await;
                if let Err(e) = job().await {
                    error!("Scheduled run failed: {e:#}");
                }
            }
        }
    }
}
