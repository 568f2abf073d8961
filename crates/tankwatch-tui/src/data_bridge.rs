//! Data bridge: forwards monitor snapshots into the TUI action channel.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tankwatch_core::MonitorSnapshot;

use crate::action::Action;

/// Forward every snapshot change as [`Action::Snapshot`] until cancelled.
/// When the monitor drops its sender, emits [`Action::MonitorStopped`].
pub async fn spawn_data_bridge(
    mut snapshots: watch::Receiver<MonitorSnapshot>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let initial = snapshots.borrow_and_update().clone();
    let _ = action_tx.send(Action::Snapshot(Box::new(initial)));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("monitor snapshot channel closed");
                    let _ = action_tx.send(Action::MonitorStopped);
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                if action_tx.send(Action::Snapshot(Box::new(snap))).is_err() {
                    break;
                }
            }
        }
    }
}
