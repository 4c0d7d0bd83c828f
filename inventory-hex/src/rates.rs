//! Exchange Rate Application Service
//!
//! Holds the rate in force in memory, refreshes it from the external source
//! with a store fallback, and broadcasts every change to subscribers.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;

use exchange_rates::convert_dynamic;
use inventory_types::{
    AppError, ConvertRequest, ConvertResponse, CurrentRate, ExternalRateSource, Money, Rate,
    RateError, RateHistoryRepository, RateRecord, RateSource, RepoError, USD, VES,
};

/// Default first retry delay after a failed fetch.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(60);

/// Upper bound for the retry delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(60 * 60);

/// Exponential backoff applied to the external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the next attempt after `failures` consecutive failures.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (failures - 1).min(20);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[derive(Debug, Default)]
struct BackoffState {
    failures: u32,
    retry_at: Option<Instant>,
}

struct RateState {
    current: CurrentRate,
    /// Bumped on every write; lets an in-flight refresh detect that it lost
    /// the race to a newer value.
    generation: u64,
}

/// Application service for the exchange rate.
///
/// Generic over the external source and the history store so either can be
/// swapped in tests.
pub struct RateService<S: ExternalRateSource, H: RateHistoryRepository> {
    source: S,
    history: Arc<H>,
    state: RwLock<RateState>,
    backoff: std::sync::Mutex<BackoffState>,
    policy: BackoffPolicy,
    /// Serializes memory updates with their history writes.
    write_lock: Mutex<()>,
    changes: watch::Sender<CurrentRate>,
}

impl<S: ExternalRateSource, H: RateHistoryRepository> RateService<S, H> {
    /// Creates a service holding `default_rate` until a rate is established.
    pub fn new(source: S, history: Arc<H>, default_rate: Rate) -> Self {
        let initial = CurrentRate::initial(default_rate);
        let (changes, _) = watch::channel(initial);
        Self {
            source,
            history,
            state: RwLock::new(RateState {
                current: initial,
                generation: 0,
            }),
            backoff: std::sync::Mutex::new(BackoffState::default()),
            policy: BackoffPolicy::default(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    pub fn with_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// The rate in force. Never blocks on IO.
    pub fn current_rate(&self) -> CurrentRate {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }

    /// Receives every change of the current rate.
    pub fn subscribe(&self) -> watch::Receiver<CurrentRate> {
        self.changes.subscribe()
    }

    pub fn convert_to_local(&self, amount: Money<USD>) -> Money<VES> {
        exchange_rates::to_local(amount, self.current_rate().rate)
    }

    pub fn convert_to_usd(&self, amount: Money<VES>) -> Money<USD> {
        exchange_rates::to_usd(amount, self.current_rate().rate)
    }

    /// Converts between any two supported currencies at the current rate.
    pub fn convert(&self, req: &ConvertRequest) -> ConvertResponse {
        let rate = self.current_rate().rate;
        ConvertResponse {
            amount: req.amount,
            from: req.from,
            converted: convert_dynamic(req.amount, req.from, req.to, rate),
            to: req.to,
            rate,
        }
    }

    /// Most recent history records first.
    pub async fn history(&self, limit: i64) -> Result<Vec<RateRecord>, AppError> {
        if limit <= 0 {
            return Err(AppError::BadRequest("Limit must be positive".into()));
        }
        self.history
            .list_rates(limit)
            .await
            .map_err(RateError::from)
            .map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Refreshes from the external source, falling back to the latest active
    /// history record, and finally to the value already held.
    ///
    /// Never fails: the returned value is whatever is in force afterwards.
    #[tracing::instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh(&self) -> CurrentRate {
        let started = self.generation();

        if let Some(wait) = self.backoff_remaining() {
            tracing::debug!(retry_in_secs = wait.as_secs(), "Rate source backing off");
            return self.fall_back(started).await;
        }

        match self.source.fetch_rate().await {
            Ok(rate) => {
                self.reset_backoff();
                let record = RateRecord::new(rate, RateSource::Api);
                let _guard = self.write_lock.lock().await;
                if self.generation() != started {
                    tracing::info!(
                        rate = rate.value(),
                        "Discarding fetched rate superseded while in flight"
                    );
                    return self.current_rate();
                }
                let current = self.publish(CurrentRate::from(&record));
                self.persist(&record).await;
                tracing::info!(rate = rate.value(), "Exchange rate refreshed from source");
                current
            }
            Err(err) => {
                let delay = self.register_failure();
                tracing::warn!(
                    error = %err,
                    retry_in_secs = delay.as_secs(),
                    "Exchange rate fetch failed"
                );
                self.fall_back(started).await
            }
        }
    }

    /// Adopts the latest stored rate without calling the external source.
    ///
    /// Used at startup so a restart keeps the last known rate until the
    /// first refresh.
    pub async fn restore(&self) -> CurrentRate {
        let started = self.generation();
        self.fall_back(started).await
    }

    /// Sets the rate by hand.
    ///
    /// Zero, negative and non-finite values are rejected and leave the
    /// current rate untouched.
    #[tracing::instrument(skip(self))]
    pub async fn set_manual_rate(&self, value: f64) -> Result<CurrentRate, RateError> {
        let rate = Rate::new(value)?;
        let record = RateRecord::new(rate, RateSource::Manual);

        let _guard = self.write_lock.lock().await;
        let current = self.publish(CurrentRate::from(&record));
        self.persist(&record).await;
        tracing::info!(rate = rate.value(), "Manual exchange rate set");
        Ok(current)
    }

    async fn fall_back(&self, started: u64) -> CurrentRate {
        match self.history.latest_active_rate().await {
            Ok(Some(record)) => {
                let _guard = self.write_lock.lock().await;
                let current = self.current_rate();
                if self.generation() != started {
                    return current;
                }
                // Already holding this record. Stores keep microseconds only.
                if current.rate == record.rate
                    && current.observed_at.timestamp_micros() == record.observed_at.timestamp_micros()
                {
                    tracing::debug!(rate = record.rate.value(), "Stored exchange rate already in force");
                    return current;
                }
                let fallback = CurrentRate {
                    rate: record.rate,
                    source: RateSource::Fallback,
                    observed_at: record.observed_at,
                };
                tracing::info!(rate = record.rate.value(), "Using last stored exchange rate");
                self.publish(fallback)
            }
            Ok(None) => {
                tracing::warn!("No stored exchange rate; keeping current value");
                self.current_rate()
            }
            Err(RepoError::CorruptRate(detail)) => {
                tracing::error!(%detail, "Stored exchange rate is invalid; keeping current value");
                self.current_rate()
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rate store unavailable; keeping current value");
                self.current_rate()
            }
        }
    }

    fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    fn publish(&self, next: CurrentRate) -> CurrentRate {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.current = next;
            state.generation += 1;
        }
        self.changes.send_replace(next);
        next
    }

    /// History writes are best effort: the in-memory value stays in force
    /// even if the store rejects the record.
    async fn persist(&self, record: &RateRecord) {
        if let Err(err) = self.history.record_rate(record).await {
            tracing::warn!(
                error = %err,
                rate = record.rate.value(),
                source = %record.source,
                "Failed to persist exchange rate"
            );
        }
    }

    fn backoff_remaining(&self) -> Option<Duration> {
        let backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        backoff
            .retry_at
            .filter(|retry_at| *retry_at > now)
            .map(|retry_at| retry_at - now)
    }

    fn register_failure(&self) -> Duration {
        let mut backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
        backoff.failures = backoff.failures.saturating_add(1);
        let delay = self.policy.delay(backoff.failures);
        backoff.retry_at = Some(Instant::now() + delay);
        delay
    }

    fn reset_backoff(&self) {
        let mut backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
        *backoff = BackoffState::default();
    }
}
