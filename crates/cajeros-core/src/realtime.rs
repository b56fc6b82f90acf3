// ── Realtime reconciliation ──
//
// Applies feed events to a device mirror in delivery order. A
// `RealtimeSubscription` owns its cancellation token and both background
// tasks, so tearing one down can never cancel a different subscription.
// Teardown happens once: explicitly through `close`, or on drop.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cajeros_api::realtime::{RealtimeConfig, RealtimeHandle, RowChange, SubscriptionState};

use crate::convert;
use crate::store::DeviceMirror;

/// A live feed bound to one mirror.
pub struct RealtimeSubscription {
    cancel: CancellationToken,
    feed: Option<RealtimeHandle>,
    applier: Option<JoinHandle<()>>,
    state: watch::Receiver<SubscriptionState>,
}

impl RealtimeSubscription {
    /// Open the feed and start applying its events to `mirror`.
    pub fn start(config: RealtimeConfig, mirror: Arc<DeviceMirror>) -> Self {
        let cancel = CancellationToken::new();
        let table = config.filter.table.clone();
        let feed = RealtimeHandle::spawn(config, cancel.child_token());
        let state = feed.state();
        let mut changes = feed.subscribe();

        let task_cancel = cancel.clone();
        let applier = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    msg = changes.recv() => match msg {
                        Ok(change) => apply_change(&mirror, &table, &change),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "realtime consumer lagged, mirror may be stale");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            debug!("realtime applier exiting");
        });

        info!("realtime subscription started");
        Self {
            cancel,
            feed: Some(feed),
            applier: Some(applier),
            state,
        }
    }

    /// Watch the channel state.
    pub fn state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Leave the channel, close the socket and wait for both tasks.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(feed) = self.feed.take() {
            feed.shutdown().await;
        }
        if let Some(applier) = self.applier.take() {
            if let Err(e) = applier.await {
                warn!(error = %e, "realtime applier ended abnormally");
            }
        }
        info!("realtime subscription closed");
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Apply one feed event; events for other tables are ignored.
fn apply_change(mirror: &DeviceMirror, table: &str, change: &RowChange) {
    if !change.table.is_empty() && change.table != table {
        return;
    }
    if let Some(mc) = convert::change_from_row(change) {
        let changed = mirror.apply(mc);
        debug!(kind = ?change.kind, changed, "applied realtime change");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Device, DeviceId};
    use serde_json::json;

    fn row(v: serde_json::Value) -> RowChange {
        serde_json::from_value(v).unwrap()
    }

    fn mirror() -> DeviceMirror {
        let mut a = Device::new(DeviceId::new(1));
        a.name = "A".into();
        a.online = true;
        let mut b = Device::new(DeviceId::new(2));
        b.name = "B".into();
        DeviceMirror::from_devices(vec![a, b])
    }

    #[test]
    fn update_event_merges_partial_payload() {
        let m = mirror();
        apply_change(
            &m,
            "cajeros",
            &row(json!({ "type": "UPDATE", "table": "cajeros", "record": { "id": 2, "estadolinea": "open" } })),
        );
        let b = m.get(DeviceId::new(2)).unwrap();
        assert!(b.online);
        assert_eq!(b.name, "B");
    }

    #[test]
    fn events_apply_in_delivery_order() {
        let m = mirror();
        for v in [
            json!({ "type": "INSERT", "table": "cajeros", "record": { "id": 3, "nombre": "C", "estadolinea": "open" } }),
            json!({ "type": "UPDATE", "table": "cajeros", "record": { "id": 3, "estadolinea": "close" } }),
            json!({ "type": "DELETE", "table": "cajeros", "old_record": { "id": 1 } }),
        ] {
            apply_change(&m, "cajeros", &row(v));
        }
        let ids: Vec<i64> = m.snapshot().iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(!m.get(DeviceId::new(3)).unwrap().online);
    }

    #[test]
    fn events_for_other_tables_are_ignored() {
        let m = mirror();
        apply_change(
            &m,
            "cajeros",
            &row(json!({ "type": "DELETE", "table": "administradores", "old_record": { "id": 1 } })),
        );
        assert_eq!(m.len(), 2);
    }

    #[tokio::test]
    async fn close_tears_down_unreachable_feed() {
        let url = url::Url::parse("ws://127.0.0.1:9/realtime/v1/websocket").unwrap();
        let config = RealtimeConfig::new(
            url,
            secrecy::SecretString::from("k"),
            "cajeros-realtime",
            cajeros_api::ChangeFilter::table("cajeros"),
        );
        let sub = RealtimeSubscription::start(config, Arc::new(DeviceMirror::new()));
        assert_ne!(sub.current_state(), SubscriptionState::Active);
        sub.close().await;
    }
}
