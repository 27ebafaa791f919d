//! WebSocket upload endpoint.
//!
//! Frame mapping: text carries the JSON start request, binary frames are
//! chunks and a close frame cancels. Every handled frame is answered with
//! one JSON acknowledgment; a terminal acknowledgment ends the connection.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vhs_models::{StartUpload, TransferEnvelope, UploadAck};

use crate::metrics;
use crate::session::{SessionError, SessionState, UploadContext, UploadSession};
use crate::state::AppState;

const ENDPOINT: &str = "upload";

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Outbound buffer; acks are small and sent one per frame.
const WS_SEND_BUFFER_SIZE: usize = 32;

/// How long a connection may stay silent between frames.
pub const WS_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// WebSocket upload endpoint.
pub async fn ws_upload(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection(ENDPOINT);

    let ctx = state.upload.clone();
    let timeout = state.config.client_timeout;
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            handle_upload_socket(socket, ctx, timeout).await;
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        })
}

async fn handle_upload_socket(socket: WebSocket, ctx: UploadContext, timeout: Duration) {
    let (ws_sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let state = drive_session(receiver, &tx, UploadSession::new(ctx), timeout).await;
    metrics::record_upload_outcome(state);

    // Closing the channel flushes pending acks and closes the socket.
    drop(tx);
    let _ = send_task.await;
}

/// Run one session over a stream of inbound frames, sending acks to `tx`.
///
/// Each receive waits at most `idle_timeout`; a silent client fails the
/// session. Returns the state the session ended in.
pub async fn drive_session<S, E>(
    mut receiver: S,
    tx: &mpsc::Sender<Message>,
    mut session: UploadSession,
    idle_timeout: Duration,
) -> SessionState
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    session.accept();

    loop {
        let next = match tokio::time::timeout(idle_timeout, receiver.next()).await {
            Ok(next) => next,
            Err(_) => {
                warn!(state = %session.state(), "Upload client idle past timeout");
                let reason = if session.video_id().is_none() {
                    "timed out waiting for start"
                } else {
                    "client idle timeout"
                };
                fail(&mut session, tx, SessionError::transport(reason)).await;
                break;
            }
        };

        let envelope = match next {
            Some(Ok(msg)) => match decode(msg) {
                Some(Ok(envelope)) => envelope,
                Some(Err(e)) => {
                    fail(&mut session, tx, e).await;
                    break;
                }
                None => continue,
            },
            Some(Err(e)) => {
                fail(&mut session, tx, SessionError::transport(e.to_string())).await;
                break;
            }
            None => {
                debug!(state = %session.state(), "Upload connection closed");
                session.abort().await;
                break;
            }
        };

        metrics::record_ws_message_received(ENDPOINT);
        if let TransferEnvelope::Chunk(data) = &envelope {
            metrics::record_upload_bytes(data.len());
        }

        let ack = match session.handle(envelope).await {
            Ok(ack) => ack,
            Err(e) => UploadAck::error(e.to_string()),
        };
        let terminal = ack.is_terminal();

        if !send_ack(tx, &ack).await {
            session.abort().await;
            break;
        }
        if terminal {
            break;
        }
    }

    info!(
        state = %session.state(),
        video_id = ?session.video_id(),
        bytes = session.bytes_written(),
        "Upload session ended"
    );
    session.state()
}

/// Map a frame to an envelope; `None` for control frames.
fn decode(msg: Message) -> Option<Result<TransferEnvelope, SessionError>> {
    match msg {
        Message::Text(text) => Some(
            serde_json::from_str::<StartUpload>(&text)
                .map(TransferEnvelope::Start)
                .map_err(|e| SessionError::validation(format!("invalid start request: {}", e))),
        ),
        Message::Binary(data) => Some(Ok(TransferEnvelope::Chunk(data))),
        Message::Close(_) => Some(Ok(TransferEnvelope::Cancel)),
        Message::Ping(_) | Message::Pong(_) => None,
    }
}

async fn fail(session: &mut UploadSession, tx: &mpsc::Sender<Message>, error: SessionError) {
    warn!(error = %error, kind = error.kind(), "Upload session failed");
    session.abort().await;
    send_ack(tx, &UploadAck::error(error.to_string())).await;
}

/// Queue an ack for sending. Returns false once the socket is gone.
async fn send_ack(tx: &mpsc::Sender<Message>, ack: &UploadAck) -> bool {
    let json = match serde_json::to_string(ack) {
        Ok(j) => j,
        Err(_) => return false,
    };
    match tx.try_send(Message::Text(json.clone())) {
        Ok(_) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("WebSocket send buffer full, applying backpressure");
            if tx.send(Message::Text(json)).await.is_err() {
                return false;
            }
        }
        Err(mpsc::error::TrySendError::Closed(_)) => return false,
    }
    metrics::record_ws_message_sent(ENDPOINT, ack.ack_type.as_str());
    true
}
