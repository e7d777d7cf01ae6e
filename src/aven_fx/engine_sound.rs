// ==============================================================================
// engine_sound.rs — RPM-DRIVEN ENGINE SAMPLE BLEND
// ------------------------------------------------------------------------------
// One node blends N looping engine samples. Each evaluation:
//
// 1) smooth the engine speed toward min(|rpm|, max_fade_out_rpm):
//        R += (target - R) * (1 - exp(-interp_speed * dt))
//    dt < 0 or non-finite counts as 0, so a jittery audio clock can't push R
//    backwards or past the target.
//
// 2) per sample band, with alpha = (R - in_start) / (out_end - in_start):
//        pitch  = lerp(1, max_pitch, alpha)          (alpha NOT clamped)
//        volume = ramp up   on [in_start, in_end]    (if in_start != in_end)
//               | ramp down on [out_start, out_end]  (if out_start != out_end)
//               | 0, pitch 1  if R < in_end or R > out_end
//               | 1
//    and the band plays at base * (volume, pitch).
//
// max_fade_out_rpm only ever grows: lowering a band's out_end after the fact
// does not lower the smoothing cap.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::aven_fx::collab::EngineRpmSource;
use crate::error::FxError;

pub const DEFAULT_INTERP_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSample {
    pub fade_in_rpm_start: f32,
    pub fade_in_rpm_end: f32,
    pub fade_out_rpm_start: f32,
    pub fade_out_rpm_end: f32,
    pub max_pitch_multiplier: f32,
}

impl Default for EngineSample {
    fn default() -> Self {
        Self {
            fade_in_rpm_start: 0.0,
            fade_in_rpm_end: 0.0,
            fade_out_rpm_start: 0.0,
            fade_out_rpm_end: 0.0,
            max_pitch_multiplier: 1.0,
        }
    }
}

impl EngineSample {
    pub fn new(fade_in: (f32, f32), fade_out: (f32, f32), max_pitch_multiplier: f32) -> Self {
        Self {
            fade_in_rpm_start: fade_in.0,
            fade_in_rpm_end: fade_in.1,
            fade_out_rpm_start: fade_out.0,
            fade_out_rpm_end: fade_out.1,
            max_pitch_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundParams {
    pub volume: f32,
    pub pitch: f32,
}

impl Default for SoundParams {
    fn default() -> Self {
        Self { volume: 1.0, pitch: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineMix {
    pub rpm: f32,
    pub bands: Vec<SoundParams>,
}

/// Frame-rate independent exponential approach. Never overshoots for `speed > 0`.
#[inline]
pub fn interp_exp(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let alpha = 1.0 - (-speed * dt).exp();
    current + (target - current) * alpha
}

/// Volume/pitch multipliers of one band at engine speed `rpm`.
pub fn band_mix(s: &EngineSample, rpm: f32) -> SoundParams {
    let span = s.fade_out_rpm_end - s.fade_in_rpm_start;
    let alpha = if span != 0.0 { (rpm - s.fade_in_rpm_start) / span } else { 0.0 };

    let mut pitch = 1.0 + (s.max_pitch_multiplier - 1.0) * alpha;
    let mut volume = 1.0;

    if rpm >= s.fade_in_rpm_start && rpm <= s.fade_in_rpm_end && s.fade_in_rpm_start != s.fade_in_rpm_end {
        volume = (rpm - s.fade_in_rpm_start) / (s.fade_in_rpm_end - s.fade_in_rpm_start);
    } else if rpm >= s.fade_out_rpm_start
        && rpm <= s.fade_out_rpm_end
        && s.fade_out_rpm_start != s.fade_out_rpm_end
    {
        volume = 1.0 - (rpm - s.fade_out_rpm_start) / (s.fade_out_rpm_end - s.fade_out_rpm_start);
    } else if rpm < s.fade_in_rpm_end || rpm > s.fade_out_rpm_end {
        volume = 0.0;
        pitch = 1.0;
    }

    SoundParams { volume, pitch }
}

#[derive(Debug, Clone)]
pub struct EngineSoundNode {
    samples: Vec<EngineSample>,
    interp_speed: f32,
    smoothed_rpm: f32,
    last_update: f64,
    max_fade_out_rpm: f32,
}

impl EngineSoundNode {
    pub fn new(samples: Vec<EngineSample>, interp_speed: f32) -> Self {
        let mut node = Self {
            samples,
            interp_speed,
            smoothed_rpm: 0.0,
            last_update: 0.0,
            max_fade_out_rpm: 0.0,
        };
        node.raise_cap();
        node
    }

    pub fn samples(&self) -> &[EngineSample] {
        &self.samples
    }

    pub fn smoothed_rpm(&self) -> f32 {
        self.smoothed_rpm
    }

    pub fn max_fade_out_rpm(&self) -> f32 {
        self.max_fade_out_rpm
    }

    pub fn set_samples(&mut self, samples: Vec<EngineSample>) {
        self.samples = samples;
        self.raise_cap();
    }

    /// New band at `index` (pitch multiplier 1, all RPMs zero).
    pub fn insert_sample(&mut self, index: usize) -> Result<(), FxError> {
        if index > self.samples.len() {
            return Err(FxError::SampleIndex { index, len: self.samples.len() });
        }
        self.samples.insert(index, EngineSample::default());
        Ok(())
    }

    pub fn remove_sample(&mut self, index: usize) -> Result<EngineSample, FxError> {
        if index >= self.samples.len() {
            return Err(FxError::SampleIndex { index, len: self.samples.len() });
        }
        Ok(self.samples.remove(index))
    }

    /// Grow or shrink the band list to match `count` child sounds.
    pub fn resize_samples(&mut self, count: usize) {
        self.samples.resize(count, EngineSample::default());
    }

    fn raise_cap(&mut self) {
        for s in &self.samples {
            self.max_fade_out_rpm = self.max_fade_out_rpm.max(s.fade_out_rpm_end);
        }
    }

    pub fn evaluate(
        &mut self,
        source: Option<&dyn EngineRpmSource>,
        now: f64,
        base: SoundParams,
    ) -> EngineMix {
        let dt = now - self.last_update;
        if now.is_finite() {
            self.last_update = now;
        }
        self.advance(source, dt as f32, base)
    }

    /// Same as `evaluate`, driven by an elapsed time instead of a clock.
    pub fn advance(
        &mut self,
        source: Option<&dyn EngineRpmSource>,
        dt: f32,
        base: SoundParams,
    ) -> EngineMix {
        let desired = source
            .map(|s| s.engine_rotation_speed().abs())
            .filter(|rpm| rpm.is_finite())
            .unwrap_or(0.0);
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let target = desired.min(self.max_fade_out_rpm);
        self.smoothed_rpm = interp_exp(self.smoothed_rpm, target, dt, self.interp_speed).max(0.0);

        let rpm = self.smoothed_rpm;
        let mut bands = Vec::with_capacity(self.samples.len());
        for s in &self.samples {
            self.max_fade_out_rpm = self.max_fade_out_rpm.max(s.fade_out_rpm_end);
            let m = band_mix(s, rpm);
            bands.push(SoundParams {
                volume: base.volume * m.volume,
                pitch: base.pitch * m.pitch,
            });
        }

        EngineMix { rpm, bands }
    }
}
