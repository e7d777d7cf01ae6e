//! aven_fx - engine-agnostic vehicle effect state machines (pure types + collaborators)

pub mod types;
pub mod collab;
pub mod wheel_fx;
pub mod skid;
pub mod engine_sound;
pub mod dust;
pub mod rpm;

#[cfg(test)]
pub(crate) mod testing;

pub use types::*;
pub use collab::*;
pub use wheel_fx::WheelEffects;
pub use skid::{SkidConfig, SkidTracker, SkidTransition};
pub use engine_sound::{EngineSample, EngineSoundNode, SoundParams};
pub use dust::DustTable;
pub use rpm::SharedRpm;
