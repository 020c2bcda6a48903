use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default auto-refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Shortest period accepted; tokio intervals cannot be zero.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Callback run on every tick.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Periodic auto-refresh timer with an explicit enabled/disabled state.
///
/// `start` spawns a timer task whose first tick is one full period away;
/// `stop` aborts it. Each start bumps an epoch that the task checks before
/// firing, so a tick that races with `stop` is dropped. Dropping the
/// scheduler stops it.
pub struct RefreshScheduler {
    period: Duration,
    on_tick: TickFn,
    task: Option<JoinHandle<()>>,
    epoch: Arc<AtomicU64>,
}

impl RefreshScheduler {
    pub fn new(period: Duration, on_tick: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            period: period.max(MIN_REFRESH_INTERVAL),
            on_tick: Arc::new(on_tick),
            task: None,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        self.task.is_some()
    }

    /// Disabled → Enabled. Does nothing when already enabled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_enabled() {
            return;
        }
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let current = Arc::clone(&self.epoch);
        let on_tick = Arc::clone(&self.on_tick);
        let period = self.period;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if current.load(Ordering::Acquire) != epoch {
                    break;
                }
                tracing::debug!("Auto-refresh tick");
                on_tick();
            }
        }));
        tracing::info!(period_secs = period.as_secs(), "Auto-refresh enabled");
    }

    /// Enabled → Disabled. No tick fires after this returns.
    pub fn stop(&mut self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self.task.take() {
            handle.abort();
            tracing::info!("Auto-refresh disabled");
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Flips the state and returns the new one.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.is_enabled());
        self.is_enabled()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
