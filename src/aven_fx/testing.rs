//! Recording fakes for the collaborator traits (test-only).

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::aven_fx::collab::{AudioSink, ImpactEffect, ParticleSystem, VehiclePhysics};
use crate::aven_fx::types::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Spawn(EffectHandle, EffectId, WheelId),
    Retarget(EffectHandle, EffectId),
    Deactivate(EffectHandle),
    Retire(EffectHandle),
    SpawnAt(EffectHandle, EffectId),
    Impact(EffectHandle, EffectId, bool),
    Play(AudioChannel, SoundId),
    Stop(AudioChannel),
    FadeOut(AudioChannel, f32),
    PlayAt(SoundId),
}

#[derive(Default)]
pub struct FakeParticles {
    next: u64,
    pub status: HashMap<EffectHandle, EffectStatus>,
    pub calls: Vec<Call>,
}

impl FakeParticles {
    pub fn complete(&mut self, handle: EffectHandle) {
        self.status.insert(handle, EffectStatus::Completed);
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn alloc(&mut self) -> EffectHandle {
        self.next += 1;
        EffectHandle(self.next)
    }
}

impl ParticleSystem for FakeParticles {
    fn spawn(&mut self, template: &EffectId, wheel: WheelId) -> EffectHandle {
        let h = self.alloc();
        self.status.insert(h, EffectStatus::Live);
        self.calls.push(Call::Spawn(h, template.clone(), wheel));
        h
    }

    fn retarget(&mut self, handle: EffectHandle, template: &EffectId) {
        assert!(self.status.contains_key(&handle), "retarget of retired handle {handle}");
        self.status.insert(handle, EffectStatus::Live);
        self.calls.push(Call::Retarget(handle, template.clone()));
    }

    fn deactivate(&mut self, handle: EffectHandle) {
        self.status.insert(handle, EffectStatus::Deactivated);
        self.calls.push(Call::Deactivate(handle));
    }

    fn retire(&mut self, handle: EffectHandle) {
        self.status.remove(&handle);
        self.calls.push(Call::Retire(handle));
    }

    fn status(&self, handle: EffectHandle) -> EffectStatus {
        self.status.get(&handle).copied().unwrap_or(EffectStatus::Completed)
    }

    fn spawn_at(&mut self, template: &EffectId, _location: Point3<f32>, _normal: Vector3<f32>) -> EffectHandle {
        let h = self.alloc();
        self.calls.push(Call::SpawnAt(h, template.clone()));
        h
    }

    fn spawn_impact(&mut self, impact: &ImpactEffect) -> EffectHandle {
        let h = self.alloc();
        self.calls.push(Call::Impact(h, impact.template.clone(), impact.wheel_land));
        h
    }
}

#[derive(Default)]
pub struct FakeAudio {
    pub calls: Vec<Call>,
}

impl AudioSink for FakeAudio {
    fn play(&mut self, channel: AudioChannel, sound: &SoundId) {
        self.calls.push(Call::Play(channel, sound.clone()));
    }

    fn stop(&mut self, channel: AudioChannel) {
        self.calls.push(Call::Stop(channel));
    }

    fn fade_out(&mut self, channel: AudioChannel, duration: f32) {
        self.calls.push(Call::FadeOut(channel, duration));
    }

    fn play_at(&mut self, sound: &SoundId, _location: Point3<f32>) {
        self.calls.push(Call::PlayAt(sound.clone()));
    }
}

#[derive(Clone)]
pub struct FakePhysics {
    pub materials: [Option<MaterialId>; WHEEL_COUNT],
    pub spring_force: f32,
    pub forward_speed: f32,
    pub velocity: Vector3<f32>,
    pub slipping: bool,
}

impl Default for FakePhysics {
    fn default() -> Self {
        Self {
            materials: Default::default(),
            spring_force: 0.0,
            forward_speed: 0.0,
            velocity: Vector3::zeros(),
            slipping: false,
        }
    }
}

impl FakePhysics {
    pub fn on(material: &str) -> Self {
        let m = Some(MaterialId::from(material));
        Self { materials: [m.clone(), m.clone(), m.clone(), m], ..Self::default() }
    }
}

impl VehiclePhysics for FakePhysics {
    fn contact_material(&self, wheel: WheelId) -> Option<&MaterialId> {
        self.materials[wheel.index()].as_ref()
    }

    fn max_spring_force(&self) -> f32 { self.spring_force }
    fn forward_speed(&self) -> f32 { self.forward_speed }
    fn velocity(&self) -> Vector3<f32> { self.velocity }
    fn location(&self) -> Point3<f32> { Point3::origin() }

    fn check_slip_threshold(&self, _long_slip: f32, _lat_slip: f32) -> bool {
        self.slipping
    }
}
