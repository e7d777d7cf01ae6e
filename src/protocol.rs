//! WebSocket wire messages (JSON, tagged by `type`).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use uuid::Uuid;

use crate::aven_fx::{EffectHandle, SoundParams};
use crate::error::FxError;
use crate::ledger::FxCommand;
use crate::state::TelemetryFrame;
use crate::vehicle::HitEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Latest physics snapshot; used by every gameplay tick until replaced.
    Telemetry(TelemetryFrame),
    /// Chassis collision.
    Hit(HitEvent),
    Death,
    Respawn,
    /// A particle instance the server still tracks ran to completion.
    EffectCompleted { handle: EffectHandle },
    Ping,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, FxError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { session_id: Uuid },
    Fx { tick: u64, commands: Vec<FxCommand> },
    EngineMix { rpm: f32, bands: Vec<SoundParams> },
    Pong,
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, FxError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Encode and queue `msg` on a connection's outgoing channel. False if the
/// connection is gone or the message failed to encode.
pub(crate) fn send(tx: &UnboundedSender<String>, msg: &ServerMessage) -> bool {
    match msg.to_json() {
        Ok(json) => tx.send(json).is_ok(),
        Err(e) => {
            warn!(error = %e, "failed to encode server message");
            false
        }
    }
}
