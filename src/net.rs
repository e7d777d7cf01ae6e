// ==============================================================================
// net.rs — WEBSOCKET FRONT END
// ------------------------------------------------------------------------------
// One task per client. Each connection gets a gameplay Session and an audio
// EngineVoice sharing one RPM cell; every outgoing message goes through the
// connection's unbounded channel and a dedicated send loop.
// ==============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aven_fx::SharedRpm;
use crate::error::FxError;
use crate::protocol::{send, ClientMessage, ServerMessage};
use crate::state::{AudioState, FxState};

pub async fn start_websocket_server(
    addr: SocketAddr,
    state: Arc<Mutex<FxState>>,
    audio: Arc<Mutex<AudioState>>,
) -> Result<(), FxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("WebSocket listening on ws://{}", addr);

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let state_clone = Arc::clone(&state);
        let audio_clone = Arc::clone(&audio);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(raw, state_clone, audio_clone).await {
                warn!(%peer, error = %e, "connection dropped");
            }
        });
    }
}

async fn handle_connection(
    raw: TcpStream,
    state: Arc<Mutex<FxState>>,
    audio: Arc<Mutex<AudioState>>,
) -> Result<(), FxError> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Session (gameplay) + voice (audio), linked by one RPM cell
    // -------------------------------
    let rpm = SharedRpm::new();
    let session_id = state.lock().await.add_session(tx.clone(), rpm.clone());
    audio.lock().await.add_voice(session_id, rpm, tx.clone());

    info!(session = %session_id, "🟢 client connected");
    send(&tx, &ServerMessage::Welcome { session_id });

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    let result = receive_loop(&mut read, session_id, &state, &tx).await;

    info!(session = %session_id, "🔴 client disconnected");
    state.lock().await.remove_session(&session_id);
    audio.lock().await.remove_voice(&session_id);
    send_task.abort();

    result
}

async fn receive_loop<S>(
    read: &mut S,
    session_id: Uuid,
    state: &Mutex<FxState>,
    tx: &mpsc::UnboundedSender<String>,
) -> Result<(), FxError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let msg = msg?;
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }

        let reply = match ClientMessage::parse(msg.to_text()?) {
            Ok(parsed) => state.lock().await.handle_message(&session_id, parsed),
            Err(e) => {
                debug!(session = %session_id, error = %e, "rejected client message");
                Some(ServerMessage::Error { message: e.to_string() })
            }
        };

        if let Some(reply) = reply {
            send(tx, &reply);
        }
    }
    Ok(())
}
