//! WebSocket realtime manager with reconnect backoff.
//!
//! Reconnection is a transport concern and lives entirely here: the sync
//! engine only sees `Connected`/`Disconnected` frames and keeps the
//! last-committed view state while the channel is down.

use crate::api_client::WsClient;
use crate::events::ClientEvent;
use futures_util::StreamExt;
use opsdesk_api::events::{Topic, WsEvent};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

pub fn spawn_ws_manager(
    ws: WsClient,
    topic: Topic,
    generation: u64,
    sender: mpsc::Sender<ClientEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = ws.reconnect_config().initial_ms;
        loop {
            match ws.connect(topic).await {
                Ok(mut stream) => {
                    debug!(%topic, generation, "subscription connected");
                    if forward(&sender, topic, generation, WsEvent::Connected {})
                        .await
                        .is_err()
                    {
                        return;
                    }
                    backoff = ws.reconnect_config().initial_ms;

                    while let Some(message) = stream.next().await {
                        match message {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<WsEvent>(&text) {
                                    Ok(event) => {
                                        if forward(&sender, topic, generation, event)
                                            .await
                                            .is_err()
                                        {
                                            return;
                                        }
                                    }
                                    Err(err) => {
                                        warn!(%topic, error = %err, "undecodable ws frame");
                                        let _ = sender
                                            .send(ClientEvent::ApiError(format!(
                                                "WS decode error: {}",
                                                err
                                            )))
                                            .await;
                                    }
                                }
                            }
                            Ok(Message::Binary(_)) => {}
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(err) => {
                                let _ = forward(
                                    &sender,
                                    topic,
                                    generation,
                                    WsEvent::Error {
                                        message: err.to_string(),
                                    },
                                )
                                .await;
                                break;
                            }
                        }
                    }

                    if forward(
                        &sender,
                        topic,
                        generation,
                        WsEvent::Disconnected {
                            reason: "connection closed".to_string(),
                        },
                    )
                    .await
                    .is_err()
                    {
                        return;
                    }
                }
                Err(err) => {
                    if forward(
                        &sender,
                        topic,
                        generation,
                        WsEvent::Error {
                            message: err.to_string(),
                        },
                    )
                    .await
                    .is_err()
                    {
                        return;
                    }
                }
            }

            let delay = jittered_backoff(backoff, ws.reconnect_config().jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let next = (backoff as f64 * ws.reconnect_config().multiplier) as u64;
            backoff = next.min(ws.reconnect_config().max_ms);
        }
    })
}

async fn forward(
    sender: &mpsc::Sender<ClientEvent>,
    topic: Topic,
    generation: u64,
    event: WsEvent,
) -> Result<(), mpsc::error::SendError<ClientEvent>> {
    sender
        .send(ClientEvent::Ws {
            topic,
            generation,
            event: Box::new(event),
        })
        .await
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let delay = jittered_backoff(250, 100);
            assert!((250..350).contains(&delay));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        assert_eq!(jittered_backoff(250, 0), 250);
    }
}
