// ── Reorder trigger ──
//
// At most one automatic order per depletion cycle. The phase moves to
// `InFlight` inside `on_event`, before the caller spawns the API call, so a
// second qualifying reading that arrives while the first order is pending
// is suppressed.

use std::time::Duration;

use tankwatch_api::{OrderRequest, Percent};
use tracing::{debug, info, warn};

use crate::config::{MonitorConfig, OrderTemplate, SessionIdentity};
use crate::error::CoreError;
use crate::model::ThresholdEvent;
use crate::ports::OrderSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum ReorderPhase {
    #[default]
    Idle,
    InFlight,
    OrderPlaced,
}

/// What the caller must do after feeding an event to the trigger.
#[derive(Debug)]
pub enum Decision {
    /// Place this order, then report back through [`ReorderTrigger::complete`].
    Dispatch(OrderRequest),
    /// An order is already pending or placed for this cycle.
    Suppressed,
    /// The identity cannot attribute an order; nothing was sent.
    Misconfigured(CoreError),
    /// Not a reorder event.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ReorderTrigger {
    phase: ReorderPhase,
    reorder_level: f64,
    rearm_hysteresis: f64,
    template: OrderTemplate,
    identity: SessionIdentity,
}

impl ReorderTrigger {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            phase: ReorderPhase::Idle,
            reorder_level: config.thresholds.reorder,
            rearm_hysteresis: config.rearm_hysteresis.max(0.0),
            template: config.order.clone(),
            identity: config.identity.clone(),
        }
    }

    pub fn phase(&self) -> ReorderPhase {
        self.phase
    }

    pub fn on_event(&mut self, event: &ThresholdEvent) -> Decision {
        if !event.needs_reorder() {
            return Decision::Ignored;
        }
        if self.phase != ReorderPhase::Idle {
            debug!(phase = %self.phase, sequence = event.reading.sequence, "reorder suppressed");
            return Decision::Suppressed;
        }

        match self.identity.order_request(&self.template) {
            Ok(request) => {
                self.phase = ReorderPhase::InFlight;
                info!(
                    level = event.reading.value.value(),
                    sequence = event.reading.sequence,
                    station = request.station,
                    "reorder point reached, placing order"
                );
                Decision::Dispatch(request)
            }
            Err(e) => {
                warn!(error = %e, "reorder point reached but no order can be attributed");
                Decision::Misconfigured(e)
            }
        }
    }

    /// Apply the outcome of a dispatched order.
    pub fn complete(&mut self, outcome: &Result<(), CoreError>) -> ReorderPhase {
        if self.phase != ReorderPhase::InFlight {
            warn!(phase = %self.phase, "order outcome arrived with no order in flight");
            return self.phase;
        }
        self.phase = if outcome.is_ok() {
            ReorderPhase::OrderPlaced
        } else {
            ReorderPhase::Idle
        };
        self.phase
    }

    /// Re-arm after a refill. Returns `true` when the phase went back to `Idle`.
    pub fn observe_level(&mut self, level: Percent) -> bool {
        if self.phase == ReorderPhase::OrderPlaced
            && level.value() > self.reorder_level + self.rearm_hysteresis
        {
            info!(level = level.value(), "tank refilled, automatic reorder re-armed");
            self.phase = ReorderPhase::Idle;
            return true;
        }
        false
    }
}

/// Create the order, then ask the API to mail the station. Each call is
/// bounded by `timeout`. Only the order itself decides the outcome.
pub async fn place_order<S: OrderSink>(
    sink: &S,
    request: OrderRequest,
    timeout: Duration,
) -> Result<(), CoreError> {
    let timeout_secs = timeout.as_secs();

    tokio::time::timeout(timeout, sink.create_order(&request))
        .await
        .map_err(|_| CoreError::Timeout { timeout_secs })??;
    info!(station = request.station, "automatic order created");

    match tokio::time::timeout(timeout, sink.send_reorder_notification(&request.email)).await {
        Ok(Ok(())) => debug!("reorder notification sent"),
        Ok(Err(e)) => warn!(error = %e, "order created but notification email failed"),
        Err(_) => warn!(timeout_secs, "order created but notification email timed out"),
    }
    Ok(())
}
