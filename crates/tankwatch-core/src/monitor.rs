// ── Monitor session ──
//
// Owns all per-session state (evaluator, reorder trigger, toaster) and
// drives it from one task. Order placement runs in a `JoinSet` so readings
// keep flowing while an order is pending; the outcome is applied back inside
// the loop. Observers read state through a `watch` channel.

use std::sync::Arc;

use tankwatch_api::{FeedEvent, OrderRequest, Percent};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::ThresholdEvent;
use crate::notify::{self, Severity, Toast, Toaster};
use crate::ports::{LevelSource, OrderSink};
use crate::reorder::{self, Decision, ReorderPhase, ReorderTrigger};
use crate::threshold::ThresholdEvaluator;

/// Push-channel state as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum FeedStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Observable state, republished after every step of the loop.
#[derive(Debug, Clone, Default)]
pub struct MonitorSnapshot {
    pub level: Percent,
    /// Push readings classified so far.
    pub readings: u64,
    pub last_event: Option<ThresholdEvent>,
    pub toast: Option<Toast>,
    pub phase: ReorderPhase,
    pub orders_placed: u32,
    pub feed: FeedStatus,
}

pub struct Monitor<L, O> {
    levels: Arc<L>,
    orders: Arc<O>,
    evaluator: ThresholdEvaluator,
    trigger: ReorderTrigger,
    toaster: Toaster,
    order_timeout: Duration,
    in_flight: JoinSet<Result<(), CoreError>>,
    snapshot_tx: watch::Sender<MonitorSnapshot>,

    level: Percent,
    readings: u64,
    last_event: Option<ThresholdEvent>,
    orders_placed: u32,
    feed: FeedStatus,
    connected_once: bool,
}

impl<L: LevelSource, O: OrderSink> Monitor<L, O> {
    pub fn new(config: MonitorConfig, levels: Arc<L>, orders: Arc<O>) -> Self {
        let (snapshot_tx, _) = watch::channel(MonitorSnapshot::default());
        Self {
            levels,
            orders,
            evaluator: ThresholdEvaluator::new(config.thresholds, config.trigger_mode),
            trigger: ReorderTrigger::new(&config),
            toaster: Toaster::new(config.toast_duration),
            order_timeout: config.order_timeout,
            in_flight: JoinSet::new(),
            snapshot_tx,
            level: Percent::ZERO,
            readings: 0,
            last_event: None,
            orders_placed: 0,
            feed: FeedStatus::Connecting,
            connected_once: false,
        }
    }

    /// Subscribe to state snapshots. Valid before and during [`run`](Self::run).
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Run until `cancel` fires or the feed closes. Never returns an error:
    /// every failure ends up as a log line, a toast, or both.
    pub async fn run(mut self, mut feed: broadcast::Receiver<FeedEvent>, cancel: CancellationToken) {
        self.initial_fetch(&cancel).await;
        if cancel.is_cancelled() {
            return;
        }
        self.publish();

        loop {
            let toast_deadline = self.toaster.deadline();

            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("monitor cancelled");
                    break;
                }

                Some(joined) = self.in_flight.join_next() => {
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(CoreError::Internal(format!("order task failed: {e}")))
                    });
                    self.on_order_outcome(outcome);
                }

                event = feed.recv() => match event {
                    Ok(event) => self.on_feed_event(event, &cancel).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "monitor fell behind the level feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("level feed closed, stopping monitor");
                        break;
                    }
                },

                () = sleep_until(toast_deadline), if toast_deadline.is_some() => {
                    self.toaster.expire(Instant::now());
                }
            }

            self.publish();
        }

        self.in_flight.abort_all();
    }

    // ── Loop steps ──────────────────────────────────────────────────

    /// Fetch the level, bounded by the API timeout. `None` when cancelled.
    async fn fetch_level(&self, cancel: &CancellationToken) -> Option<Result<Percent, CoreError>> {
        let timeout_secs = self.order_timeout.as_secs();
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            fetched = tokio::time::timeout(self.order_timeout, self.levels.fetch_level()) => {
                Some(fetched.unwrap_or_else(|_| Err(CoreError::Timeout { timeout_secs })))
            }
        }
    }

    async fn initial_fetch(&mut self, cancel: &CancellationToken) {
        let Some(fetched) = self.fetch_level(cancel).await else {
            return;
        };
        match fetched {
            Ok(level) => {
                info!(level = level.value(), "initial level fetched");
                self.level = level;
                self.evaluator.seed(level);
            }
            Err(e) => {
                warn!(error = %e, "initial level fetch failed, showing 0%");
                self.level = Percent::ZERO;
            }
        }
    }

    async fn on_feed_event(&mut self, event: FeedEvent, cancel: &CancellationToken) {
        match event {
            FeedEvent::Level(level) => self.on_reading(level),
            FeedEvent::Connected => {
                self.feed = FeedStatus::Connected;
                if !self.evaluator.is_seeded() {
                    self.initial_fetch(cancel).await;
                } else if self.connected_once {
                    self.resync(cancel).await;
                }
                self.connected_once = true;
            }
            FeedEvent::Disconnected => {
                self.feed = FeedStatus::Disconnected;
                warn!("level feed disconnected, waiting for reconnect");
            }
        }
    }

    /// Re-read the level after a reconnect so a crossing missed while the
    /// feed was down is still classified.
    async fn resync(&mut self, cancel: &CancellationToken) {
        let Some(fetched) = self.fetch_level(cancel).await else {
            return;
        };
        match fetched {
            Ok(level) => {
                debug!(level = level.value(), "level resynced after reconnect");
                self.on_reading(level);
            }
            Err(e) => {
                warn!(error = %e, "level resync failed, showing 0% until the next update");
                self.level = Percent::ZERO;
            }
        }
    }

    fn on_reading(&mut self, level: Percent) {
        let (reading, event) = self.evaluator.observe(level);
        self.level = level;
        self.readings = reading.sequence;
        self.trigger.observe_level(level);

        if let Some(event) = event {
            self.last_event = Some(event);
            self.on_threshold_event(&event);
        }
    }

    fn on_threshold_event(&mut self, event: &ThresholdEvent) {
        if let Some((text, severity)) = notify::threshold_toast(event.kind) {
            self.toaster.show(text, severity, Instant::now());
        }
        if !event.needs_reorder() {
            return;
        }

        match self.trigger.on_event(event) {
            Decision::Dispatch(request) => self.dispatch(request),
            Decision::Misconfigured(e) => {
                self.toaster.show(
                    format!("Cannot place automatic order: {e}"),
                    Severity::Error,
                    Instant::now(),
                );
            }
            Decision::Suppressed | Decision::Ignored => {}
        }
    }

    fn dispatch(&mut self, request: OrderRequest) {
        let orders = Arc::clone(&self.orders);
        let timeout = self.order_timeout;
        self.in_flight
            .spawn(async move { reorder::place_order(orders.as_ref(), request, timeout).await });
    }

    fn on_order_outcome(&mut self, outcome: Result<(), CoreError>) {
        self.trigger.complete(&outcome);
        match outcome {
            Ok(()) => {
                self.orders_placed += 1;
                self.toaster.show(
                    notify::ORDER_PLACED_MESSAGE,
                    Severity::Success,
                    Instant::now(),
                );
            }
            Err(e) => {
                warn!(error = %e, "automatic order failed, will retry on the next reorder reading");
                self.toaster
                    .show(notify::ORDER_FAILED_MESSAGE, Severity::Error, Instant::now());
            }
        }
    }

    fn publish(&self) {
        let now = Instant::now();
        self.snapshot_tx.send_replace(MonitorSnapshot {
            level: self.level,
            readings: self.readings,
            last_event: self.last_event,
            toast: self.toaster.current(now).cloned(),
            phase: self.trigger.phase(),
            orders_placed: self.orders_placed,
            feed: self.feed,
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
