// ==============================================================================
// collab.rs — COLLABORATOR CONTRACTS
// ------------------------------------------------------------------------------
// The effect state machines never own physics, particles or audio. They read
// the vehicle through VehiclePhysics / EngineRpmSource and issue fire-and-forget
// requests through ParticleSystem / AudioSink.
//
// Implementations in this crate:
// - state::TelemetryFrame     -> VehiclePhysics
// - rpm::SharedRpm            -> EngineRpmSource
// - dust::DustTable           -> DustLookup
// - ledger::ParticleLedger    -> ParticleSystem
// - ledger::AudioLedger       -> AudioSink
// ==============================================================================

use nalgebra::{Point3, Vector3};

use crate::aven_fx::types::{
    AudioChannel, EffectHandle, EffectId, EffectStatus, MaterialId, SoundId, WheelId,
};

/// Query-only view of the simulated vehicle for one gameplay tick.
pub trait VehiclePhysics {
    /// `None` while the wheel is airborne.
    fn contact_material(&self, wheel: WheelId) -> Option<&MaterialId>;
    fn max_spring_force(&self) -> f32;
    fn forward_speed(&self) -> f32;
    fn velocity(&self) -> Vector3<f32>;
    fn location(&self) -> Point3<f32>;
    /// True when any tire slips past either ratio.
    fn check_slip_threshold(&self, long_slip: f32, lat_slip: f32) -> bool;
}

/// Anything that can report an engine speed to the engine sound node.
pub trait EngineRpmSource {
    fn engine_rotation_speed(&self) -> f32;
}

pub trait DustLookup {
    fn dust_effect(&self, material: Option<&MaterialId>, speed: f32) -> Option<EffectId>;
}

/// One-shot impact effect request.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpactEffect {
    pub template: EffectId,
    pub location: Point3<f32>,
    pub normal: Vector3<f32>,
    pub force: f32,
    /// Hit normal roughly matches the chassis up axis.
    pub wheel_land: bool,
}

pub trait ParticleSystem {
    /// Allocate a new instance attached to `wheel`, already active.
    fn spawn(&mut self, template: &EffectId, wheel: WheelId) -> EffectHandle;
    /// Rebind a deactivated instance to `template` and activate it again.
    fn retarget(&mut self, handle: EffectHandle, template: &EffectId);
    /// Stop emitting; existing particles dissipate on their own.
    fn deactivate(&mut self, handle: EffectHandle);
    /// Stop emitting and destroy once finished. The handle must not be used again.
    fn retire(&mut self, handle: EffectHandle);
    fn status(&self, handle: EffectHandle) -> EffectStatus;
    /// Unattached, self-destroying world effect.
    fn spawn_at(&mut self, template: &EffectId, location: Point3<f32>, normal: Vector3<f32>) -> EffectHandle;
    fn spawn_impact(&mut self, impact: &ImpactEffect) -> EffectHandle;
}

pub trait AudioSink {
    fn play(&mut self, channel: AudioChannel, sound: &SoundId);
    fn stop(&mut self, channel: AudioChannel);
    fn fade_out(&mut self, channel: AudioChannel, duration: f32);
    fn play_at(&mut self, sound: &SoundId, location: Point3<f32>);
}
