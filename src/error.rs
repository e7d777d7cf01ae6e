use thiserror::Error;

use crate::aven_fx::WHEEL_COUNT;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("wheel index {0} out of range (vehicle has {WHEEL_COUNT} wheels)")]
    WheelIndex(usize),

    #[error("engine sample index {index} out of range (node has {len} samples)")]
    SampleIndex { index: usize, len: usize },

    #[error("malformed client message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
