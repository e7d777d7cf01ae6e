// ==============================================================================
// skid.rs — SKID AUDIO STATE MACHINE
// ------------------------------------------------------------------------------
//   wants_skid = touching_ground
//             && |v_ground|² >= threshold_velocity²
//             && slip past either ratio
//
//   NotSkidding --wants_skid-->  Skidding    play loop, remember start time
//   Skidding    --!wants_skid--> NotSkidding fade loop out; stop cue if the
//                                            episode lasted min_duration+
//
// Staying in either state issues nothing.
// ==============================================================================

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aven_fx::collab::{AudioSink, VehiclePhysics};
use crate::aven_fx::types::{AudioChannel, SoundId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkidConfig {
    pub threshold_velocity: f32,       // skid never plays below this ground speed
    pub fade_out_time: f32,            // s
    pub long_slip_threshold: f32,      // 0..1
    pub lat_slip_threshold: f32,       // 0..1
    pub min_duration_for_stop: f32,    // s
    pub loop_sound: Option<SoundId>,
    pub stop_sound: Option<SoundId>,
}

impl Default for SkidConfig {
    fn default() -> Self {
        Self {
            threshold_velocity: 30.0,
            fade_out_time: 0.1,
            long_slip_threshold: 0.3,
            lat_slip_threshold: 0.3,
            min_duration_for_stop: 1.5,
            loop_sound: None,
            stop_sound: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SkidPhase {
    #[default]
    NotSkidding,
    Skidding { started_at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkidTransition {
    Unchanged,
    Started,
    Stopped { duration: f64, stop_cue: bool },
}

/// Per-tick inputs, already reduced from the physics view.
#[derive(Debug, Clone, Copy)]
pub struct SkidInputs {
    pub touching_ground: bool,
    pub ground_speed_sq: f32,
    pub slipping: bool,
    pub now: f64,
}

impl SkidInputs {
    pub fn from_physics<P>(physics: &P, cfg: &SkidConfig, touching_ground: bool, now: f64) -> Self
    where
        P: VehiclePhysics + ?Sized,
    {
        Self {
            touching_ground,
            ground_speed_sq: ground_speed_sq(physics.velocity()),
            slipping: physics.check_slip_threshold(cfg.long_slip_threshold, cfg.lat_slip_threshold),
            now,
        }
    }
}

/// Squared speed on the X/Z ground plane (Y up).
#[inline]
pub fn ground_speed_sq(v: Vector3<f32>) -> f32 {
    v.x * v.x + v.z * v.z
}

#[derive(Debug, Default)]
pub struct SkidTracker {
    phase: SkidPhase,
}

impl SkidTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SkidPhase {
        self.phase
    }

    pub fn is_skidding(&self) -> bool {
        matches!(self.phase, SkidPhase::Skidding { .. })
    }

    pub fn update<A>(
        &mut self,
        cfg: &SkidConfig,
        input: SkidInputs,
        audio: &mut A,
        location: Point3<f32>,
    ) -> SkidTransition
    where
        A: AudioSink + ?Sized,
    {
        let threshold_sq = cfg.threshold_velocity * cfg.threshold_velocity;
        let wants_skid =
            input.touching_ground && input.ground_speed_sq >= threshold_sq && input.slipping;

        match (self.phase, wants_skid) {
            (SkidPhase::NotSkidding, true) => {
                self.phase = SkidPhase::Skidding { started_at: input.now };
                if let Some(sound) = &cfg.loop_sound {
                    audio.play(AudioChannel::Skid, sound);
                }
                debug!(now = input.now, "skid started");
                SkidTransition::Started
            }
            (SkidPhase::Skidding { started_at }, false) => {
                self.phase = SkidPhase::NotSkidding;
                audio.fade_out(AudioChannel::Skid, cfg.fade_out_time);

                let duration = input.now - started_at;
                let stop_cue = duration >= f64::from(cfg.min_duration_for_stop);
                if stop_cue {
                    if let Some(sound) = &cfg.stop_sound {
                        audio.play_at(sound, location);
                    }
                }
                debug!(duration, stop_cue, "skid stopped");
                SkidTransition::Stopped { duration, stop_cue }
            }
            _ => SkidTransition::Unchanged,
        }
    }

    /// Hard stop without fade (pawn death).
    pub fn reset<A>(&mut self, audio: &mut A)
    where
        A: AudioSink + ?Sized,
    {
        self.phase = SkidPhase::NotSkidding;
        audio.stop(AudioChannel::Skid);
    }
}
