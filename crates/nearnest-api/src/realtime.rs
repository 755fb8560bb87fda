use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use nearnest_types::events::{ChangeEvent, PHX_CLOSE, PHX_ERROR, PhoenixMessage};
use nearnest_types::models::Table;

use crate::error::ApiError;

/// Realtime drops sockets that stay silent for longer than ~30s.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Pending notifications per subscription. Extras are dropped: any pending
/// one already triggers a full re-fetch.
const EVENT_BUFFER: usize = 8;

/// Opens Realtime channels on the backend's WebSocket endpoint.
#[derive(Debug)]
pub struct RealtimeClient {
    url: String,
}

impl RealtimeClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Open a dedicated socket, join `realtime:<channel>` for inserts on
    /// `table`, and wait for the join to be acknowledged. Later values of
    /// `token` are pushed to the joined channel.
    pub async fn subscribe_inserts(
        &self,
        channel: &str,
        table: Table,
        mut token: watch::Receiver<Option<String>>,
    ) -> Result<Subscription, ApiError> {
        let access_token = token.borrow_and_update().clone();
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        let topic = format!("realtime:{}", channel);
        // Refs only need to be unique per socket, and each subscription owns one
        let mut reference: u64 = 1;
        let join_ref = reference.to_string();
        let join = PhoenixMessage::join_inserts(&topic, table, access_token.as_deref(), join_ref.clone());
        ws_tx.send(Message::Text(serde_json::to_string(&join)?.into())).await?;

        // Wait for the join reply before handing out the subscription
        loop {
            match ws_rx.next().await {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = serde_json::from_str::<PhoenixMessage>(text.as_str()) else {
                        continue;
                    };
                    if frame.topic != topic || frame.reference.as_deref() != Some(join_ref.as_str()) {
                        continue;
                    }
                    match frame.reply_status() {
                        Some("ok") => break,
                        Some(_) => {
                            return Err(ApiError::SubscriptionRejected(frame.payload.to_string()));
                        }
                        None => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(ApiError::SubscriptionRejected("socket closed during join".into()));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }

        info!("Subscribed to inserts on {} ({})", table.as_str(), topic);

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (leave_tx, mut leave_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            let mut token_open = true;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        reference += 1;
                        let frame = PhoenixMessage::heartbeat(reference.to_string());
                        let Ok(text) = serde_json::to_string(&frame) else { break };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            warn!("Realtime heartbeat failed on {}", topic);
                            break;
                        }
                        trace!("Realtime heartbeat sent on {}", topic);
                    }
                    msg = ws_rx.next() => {
                        let text = match msg {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Realtime socket closed for {}", topic);
                                break;
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => {
                                warn!("Realtime socket error on {}: {}", topic, e);
                                break;
                            }
                        };

                        let Ok(frame) = serde_json::from_str::<PhoenixMessage>(text.as_str()) else {
                            continue;
                        };
                        if frame.topic != topic {
                            continue;
                        }
                        if frame.event == PHX_ERROR || frame.event == PHX_CLOSE {
                            warn!("Realtime channel {} ended: {}", topic, frame.event);
                            break;
                        }
                        if let Some(changed) = frame.changed_table() {
                            match events_tx.try_send(ChangeEvent { table: changed }) {
                                Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                                Err(mpsc::error::TrySendError::Closed(_)) => break,
                            }
                        }
                    }
                    changed = token.changed(), if token_open => {
                        if changed.is_err() {
                            token_open = false;
                            continue;
                        }
                        // Signed out: the channel keeps its last token until it is dropped
                        let Some(access_token) = token.borrow_and_update().clone() else { continue };
                        reference += 1;
                        let frame = PhoenixMessage::access_token(&topic, &access_token, reference.to_string());
                        let Ok(text) = serde_json::to_string(&frame) else { break };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            warn!("Realtime token update failed on {}", topic);
                            break;
                        }
                        debug!("Forwarded refreshed token to {}", topic);
                    }
                    _ = &mut leave_rx => {
                        reference += 1;
                        let frame = PhoenixMessage::leave(&topic, reference.to_string());
                        if let Ok(text) = serde_json::to_string(&frame) {
                            let _ = ws_tx.send(Message::Text(text.into())).await;
                        }
                        let _ = ws_tx.close().await;
                        debug!("Left realtime channel {}", topic);
                        break;
                    }
                }
            }
        });

        Ok(Subscription {
            events: events_rx,
            leave: Some(leave_tx),
            task: Some(task),
        })
    }
}

/// A live insert subscription. Dropping it leaves the channel and closes
/// the socket, so hold it exactly as long as the screen that needs it.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    leave: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// A subscription fed by an arbitrary channel instead of a socket.
    pub fn from_channel(events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self {
            events,
            leave: None,
            task: None,
        }
    }

    /// Wait for the next change. `None` once the underlying channel is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Wait for the socket task to finish after leaving.
    pub async fn close(mut self) {
        if let Some(leave) = self.leave.take() {
            let _ = leave.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The task sends phx_leave and ends on its own once signalled
        let signalled = self.leave.take().is_some_and(|leave| leave.send(()).is_ok());
        if !signalled {
            if let Some(task) = self.task.take() {
                task.abort();
            }
        }
    }
}
