// ==============================================================================
// ledger.rs — RECORDING COLLABORATORS
// ------------------------------------------------------------------------------
// The real particle/audio systems live in the client. On the server, every
// request is appended to a per-session command list that is flushed to the
// client once per gameplay tick. The particle ledger also mirrors instance
// status so the wheel controller can query it:
//
//   spawn / retarget  -> Live
//   deactivate        -> Deactivated
//   client report     -> Completed  (mark_completed)
//   retire            -> forgotten (status() then reports Completed)
// ==============================================================================

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::aven_fx::{
    AudioChannel, AudioSink, EffectHandle, EffectId, EffectStatus, ImpactEffect, ParticleSystem,
    SoundId, WheelId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FxCommand {
    SpawnEffect { handle: EffectHandle, template: EffectId, wheel: WheelId },
    RetargetEffect { handle: EffectHandle, template: EffectId },
    DeactivateEffect { handle: EffectHandle },
    RetireEffect { handle: EffectHandle },
    SpawnEffectAt { handle: EffectHandle, template: EffectId, location: Point3<f32>, normal: Vector3<f32> },
    SpawnImpact {
        handle: EffectHandle,
        template: EffectId,
        location: Point3<f32>,
        normal: Vector3<f32>,
        force: f32,
        wheel_land: bool,
    },
    PlaySound { channel: AudioChannel, sound: SoundId },
    StopSound { channel: AudioChannel },
    FadeOutSound { channel: AudioChannel, duration: f32 },
    PlaySoundAt { sound: SoundId, location: Point3<f32> },
}

#[derive(Debug, Default)]
pub struct ParticleLedger {
    next_handle: u64,
    status: HashMap<EffectHandle, EffectStatus>,
    commands: Vec<FxCommand>,
}

impl ParticleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> EffectHandle {
        self.next_handle += 1;
        EffectHandle(self.next_handle)
    }

    /// Client reports the instance finished on its own. Unknown or retired handles are ignored.
    pub fn mark_completed(&mut self, handle: EffectHandle) -> bool {
        match self.status.get_mut(&handle) {
            Some(s) => {
                *s = EffectStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// Instances still referenced by a wheel slot.
    pub fn tracked(&self) -> usize {
        self.status.len()
    }

    /// Retire every tracked instance (vehicle replaced), lowest handle first.
    pub fn retire_all(&mut self) {
        let mut handles: Vec<EffectHandle> = self.status.keys().copied().collect();
        handles.sort();
        for handle in handles {
            self.retire(handle);
        }
    }

    pub fn drain(&mut self) -> Vec<FxCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ParticleSystem for ParticleLedger {
    fn spawn(&mut self, template: &EffectId, wheel: WheelId) -> EffectHandle {
        let handle = self.alloc();
        self.status.insert(handle, EffectStatus::Live);
        self.commands.push(FxCommand::SpawnEffect { handle, template: template.clone(), wheel });
        handle
    }

    fn retarget(&mut self, handle: EffectHandle, template: &EffectId) {
        if let Some(s) = self.status.get_mut(&handle) {
            *s = EffectStatus::Live;
            self.commands.push(FxCommand::RetargetEffect { handle, template: template.clone() });
        }
    }

    fn deactivate(&mut self, handle: EffectHandle) {
        if let Some(s) = self.status.get_mut(&handle) {
            *s = EffectStatus::Deactivated;
            self.commands.push(FxCommand::DeactivateEffect { handle });
        }
    }

    fn retire(&mut self, handle: EffectHandle) {
        if self.status.remove(&handle).is_some() {
            self.commands.push(FxCommand::RetireEffect { handle });
        }
    }

    fn status(&self, handle: EffectHandle) -> EffectStatus {
        self.status.get(&handle).copied().unwrap_or(EffectStatus::Completed)
    }

    fn spawn_at(&mut self, template: &EffectId, location: Point3<f32>, normal: Vector3<f32>) -> EffectHandle {
        // world one-shots destroy themselves; nothing to track
        let handle = self.alloc();
        self.commands.push(FxCommand::SpawnEffectAt { handle, template: template.clone(), location, normal });
        handle
    }

    fn spawn_impact(&mut self, impact: &ImpactEffect) -> EffectHandle {
        let handle = self.alloc();
        self.commands.push(FxCommand::SpawnImpact {
            handle,
            template: impact.template.clone(),
            location: impact.location,
            normal: impact.normal,
            force: impact.force,
            wheel_land: impact.wheel_land,
        });
        handle
    }
}

#[derive(Debug, Default)]
pub struct AudioLedger {
    commands: Vec<FxCommand>,
}

impl AudioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<FxCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl AudioSink for AudioLedger {
    fn play(&mut self, channel: AudioChannel, sound: &SoundId) {
        self.commands.push(FxCommand::PlaySound { channel, sound: sound.clone() });
    }

    fn stop(&mut self, channel: AudioChannel) {
        self.commands.push(FxCommand::StopSound { channel });
    }

    fn fade_out(&mut self, channel: AudioChannel, duration: f32) {
        self.commands.push(FxCommand::FadeOutSound { channel, duration });
    }

    fn play_at(&mut self, sound: &SoundId, location: Point3<f32>) {
        self.commands.push(FxCommand::PlaySoundAt { sound: sound.clone(), location });
    }
}
