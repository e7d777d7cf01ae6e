//! Vehicle effects server: wheel dust, skid audio and engine sound blending for
//! remote game clients.

pub mod aven_fx;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod net;
pub mod protocol;
pub mod state;
pub mod vehicle;

pub use error::FxError;
