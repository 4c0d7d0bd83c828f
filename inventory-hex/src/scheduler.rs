//! Background exchange rate refresh.
//!
//! Refreshes once at start, then every `interval`, and once more at the next
//! local midnight. After the midnight refresh the interval is re-armed from
//! that point. Missed ticks (e.g. a suspended process) are skipped, not
//! replayed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use inventory_types::{ExternalRateSource, RateHistoryRepository};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};

use crate::rates::RateService;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default spacing between scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    pub interval: Duration,
    /// Also refresh at local midnight
    pub midnight: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            midnight: true,
        }
    }
}

/// Handle to a spawned background task.
///
/// Dropping the handle leaves the task running; call [`TaskHandle::shutdown`]
/// to stop it and wait for it to finish.
pub struct TaskHandle {
    name: &'static str,
    stop: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(name: &'static str, stop: oneshot::Sender<()>, join: JoinHandle<()>) -> Self {
        Self {
            name,
            stop: Some(stop),
            join,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            // The task may already be gone; nothing to signal then.
            let _ = stop.send(());
        }
        if let Err(err) = self.join.await {
            tracing::warn!(task = self.name, error = %err, "Background task ended abnormally");
        } else {
            tracing::info!(task = self.name, "Background task stopped");
        }
    }
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Starts the refresh loop on the current runtime.
    pub fn spawn<S, H>(service: Arc<RateService<S, H>>, config: ScheduleConfig) -> TaskHandle
    where
        S: ExternalRateSource,
        H: RateHistoryRepository,
    {
        Self::spawn_with_clock(service, config, || until_next_midnight(&Local::now()))
    }

    /// Like [`RefreshScheduler::spawn`], asking `to_midnight` for the wait
    /// until each next midnight.
    pub(crate) fn spawn_with_clock<S, H, C>(
        service: Arc<RateService<S, H>>,
        config: ScheduleConfig,
        mut to_midnight: C,
    ) -> TaskHandle
    where
        S: ExternalRateSource,
        H: RateHistoryRepository,
        C: FnMut() -> Duration + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let join = tokio::spawn(async move {
            tracing::info!(
                interval_secs = config.interval.as_secs(),
                midnight = config.midnight,
                "Rate refresh scheduler started"
            );

            service.refresh().await;

            let mut ticks = interval_at(Instant::now() + config.interval, config.interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let midnight = sleep(to_midnight());
            tokio::pin!(midnight);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticks.tick() => {
                        tracing::debug!("Scheduled rate refresh");
                        service.refresh().await;
                    }
                    _ = &mut midnight, if config.midnight => {
                        tracing::debug!("Midnight rate refresh");
                        service.refresh().await;
                        midnight.as_mut().reset(Instant::now() + to_midnight());
                        ticks.reset();
                    }
                }
            }
        });

        TaskHandle::new("rate-refresh", stop_tx, join)
    }
}

/// Time left until the next midnight in `now`'s time zone.
///
/// Falls back to a full day when that midnight does not exist locally.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return DAY;
    };
    let midnight = tomorrow.and_time(NaiveTime::MIN);

    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(next) => next.signed_duration_since(now).to_std().unwrap_or(DAY),
        None => DAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockHistory, MockSource};
    use chrono::{FixedOffset, Utc};
    use inventory_types::Rate;

    fn service(source: MockSource) -> Arc<RateService<MockSource, MockHistory>> {
        Arc::new(RateService::new(
            source,
            Arc::new(MockHistory::default()),
            Rate::new(36.5).unwrap(),
        ))
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_until_next_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 22, 30, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_until_next_midnight_at_midnight_is_full_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(&now), DAY);
    }

    #[test]
    fn test_until_next_midnight_uses_local_offset() {
        // 23:00 in Caracas (UTC-4) is 03:00 UTC the next day.
        let caracas = FixedOffset::west_opt(4 * 3600).unwrap();
        let now = caracas.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_at_start_and_every_interval() {
        let source = MockSource::always(40.0);
        let calls = source.calls();
        let service = service(source);

        let handle = RefreshScheduler::spawn(
            service.clone(),
            ScheduleConfig {
                interval: Duration::from_secs(3600),
                midnight: false,
            },
        );

        settle().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(service.current_rate().rate.value(), 40.0);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        settle().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
        settle().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 4);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_midnight_refresh_rearms_interval() {
        const HOUR: Duration = Duration::from_secs(3600);

        let source = MockSource::always(40.0);
        let calls = source.calls();
        let count = move || calls.load(std::sync::atomic::Ordering::SeqCst);

        // Midnight is 10 h away at start, then a full day after each midnight.
        let mut first = true;
        let clock = move || {
            if std::mem::take(&mut first) { 10 * HOUR } else { DAY }
        };

        let handle = RefreshScheduler::spawn_with_clock(
            service(source),
            ScheduleConfig {
                interval: 12 * HOUR,
                midnight: true,
            },
            clock,
        );

        settle().await;
        assert_eq!(count(), 1);

        tokio::time::sleep(10 * HOUR + Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(count(), 2);

        // The tick first due 12 h after start was pushed back by the midnight refresh.
        tokio::time::sleep(2 * HOUR + Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(count(), 2);

        // Re-armed: due one interval after midnight.
        tokio::time::sleep(10 * HOUR).await;
        settle().await;
        assert_eq!(count(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_refreshing() {
        let source = MockSource::always(40.0);
        let calls = source.calls();
        let handle = RefreshScheduler::spawn(
            service(source),
            ScheduleConfig {
                interval: Duration::from_secs(60),
                midnight: false,
            },
        );

        settle().await;
        handle.shutdown().await;
        let after_stop = calls.load(std::sync::atomic::Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), after_stop);
    }
}
