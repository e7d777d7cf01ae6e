// ==============================================================================
// vehicle.rs — VEHICLE EFFECTS PAWN
// ------------------------------------------------------------------------------
// Owns the per-vehicle effect state for the pawn's lifetime:
//   on_spawn  -> engine loop on, skid loop off
//   tick      -> landing check -> wheel dust -> skid (strict order: skid reads
//                the touching flag the wheel pass just produced)
//   on_hit    -> impact effect above the chassis force threshold
//   on_death  -> everything back to inactive + destruction FX
// ==============================================================================

use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aven_fx::skid::SkidInputs;
use crate::aven_fx::{
    AudioChannel, AudioSink, EffectHandle, ImpactEffect, ParticleSystem, SkidTracker,
    SkidTransition, VehiclePhysics, WheelEffects,
};
use crate::config::VehicleFxConfig;

/// Dot threshold between hit normal and chassis up for a hit to count as wheels landing.
const WHEEL_LAND_DOT: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub location: Point3<f32>,
    pub normal: Vector3<f32>,
    pub normal_force: Vector3<f32>,
    /// Chassis up axis at the time of the hit.
    pub up: Vector3<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub landed: bool,
    pub touching_ground: bool,
    pub skid: SkidTransition,
}

impl TickReport {
    fn idle() -> Self {
        Self { landed: false, touching_ground: false, skid: SkidTransition::Unchanged }
    }
}

pub struct VehicleFx {
    cfg: Arc<VehicleFxConfig>,
    wheels: WheelEffects,
    skid: SkidTracker,
    dying: bool,
}

impl VehicleFx {
    pub fn new(cfg: Arc<VehicleFxConfig>) -> Self {
        Self {
            cfg,
            wheels: WheelEffects::new(),
            skid: SkidTracker::new(),
            dying: false,
        }
    }

    pub fn wheels(&self) -> &WheelEffects {
        &self.wheels
    }

    pub fn skid(&self) -> &SkidTracker {
        &self.skid
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub fn on_spawn<A>(&mut self, audio: &mut A)
    where
        A: AudioSink + ?Sized,
    {
        if let Some(sound) = &self.cfg.engine_loop {
            audio.play(AudioChannel::Engine, sound);
        }
        audio.stop(AudioChannel::Skid);
    }

    pub fn tick<P, S, A>(&mut self, physics: &P, particles: &mut S, audio: &mut A, now: f64) -> TickReport
    where
        P: VehiclePhysics + ?Sized,
        S: ParticleSystem + ?Sized,
        A: AudioSink + ?Sized,
    {
        if self.dying {
            return TickReport::idle();
        }
        let cfg = &*self.cfg;

        let landed = self.wheels.landing_triggered(physics, cfg.landing_spring_threshold);
        if landed {
            if let Some(sound) = &cfg.landing_sound {
                audio.play_at(sound, physics.location());
            }
            debug!(spring_force = physics.max_spring_force(), "landing");
        }

        let speed = physics.forward_speed().abs();
        self.wheels.update(physics, &cfg.dust, particles, speed);

        let touching_ground = self.wheels.any_wheel_touching_ground();
        let input = SkidInputs::from_physics(physics, &cfg.skid, touching_ground, now);
        let skid = self.skid.update(&cfg.skid, input, audio, physics.location());

        TickReport { landed, touching_ground, skid }
    }

    pub fn on_hit<S>(&mut self, hit: &HitEvent, particles: &mut S) -> Option<EffectHandle>
    where
        S: ParticleSystem + ?Sized,
    {
        let template = self.cfg.impact_effect.as_ref()?;
        let force = hit.normal_force.norm();
        if force <= self.cfg.impact_force_threshold {
            return None;
        }

        let impact = ImpactEffect {
            template: template.clone(),
            location: hit.location,
            normal: hit.normal,
            force,
            wheel_land: hit.normal.dot(&hit.up) > WHEEL_LAND_DOT,
        };
        debug!(force, wheel_land = impact.wheel_land, "impact");
        Some(particles.spawn_impact(&impact))
    }

    /// Returns false if the vehicle was already dying.
    pub fn on_death<S, A>(&mut self, location: Point3<f32>, particles: &mut S, audio: &mut A) -> bool
    where
        S: ParticleSystem + ?Sized,
        A: AudioSink + ?Sized,
    {
        if self.dying {
            return false;
        }
        self.dying = true;

        self.wheels.reset(particles);
        self.skid.reset(audio);
        audio.stop(AudioChannel::Engine);

        if let Some(fx) = &self.cfg.death_effect {
            particles.spawn_at(fx, location, Vector3::y());
        }
        if let Some(sound) = &self.cfg.death_sound {
            audio.play_at(sound, location);
        }
        info!("vehicle destroyed");
        true
    }
}
