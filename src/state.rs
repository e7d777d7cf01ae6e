// ==============================================================================
// state.rs — SESSIONS, TELEMETRY, AUDIO VOICES
// ------------------------------------------------------------------------------
// Two independently locked halves, one per cadence:
// - FxState    (gameplay tick): one Session per client, owning the vehicle
//   effect state machines and the command ledgers.
// - AudioState (audio tick): one EngineVoice per client, owning the engine
//   sound node.
// The only thing a Session and its EngineVoice share is the SharedRpm cell.
// ==============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aven_fx::{
    EngineRpmSource, EngineSoundNode, MaterialId, SharedRpm, SoundParams, VehiclePhysics, WheelId,
    WHEEL_COUNT,
};
use crate::config::{EngineSoundConfig, VehicleFxConfig};
use crate::ledger::{AudioLedger, ParticleLedger};
use crate::protocol::{send, ClientMessage, ServerMessage};
use crate::vehicle::{TickReport, VehicleFx};

// ============================================
// Telemetry (client physics snapshot)
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryFrame {
    /// Contact surface per wheel, FL FR RL RR; null = airborne.
    pub wheels: [Option<MaterialId>; WHEEL_COUNT],
    /// (longitudinal, lateral) tire slip per wheel.
    pub wheel_slip: [[f32; 2]; WHEEL_COUNT],
    pub max_spring_force: f32,  // N
    pub forward_speed: f32,     // signed, along chassis forward
    pub velocity: Vector3<f32>,
    pub location: Point3<f32>,
    pub engine_rpm: f32,
}

impl Default for TelemetryFrame {
    fn default() -> Self {
        Self {
            wheels: Default::default(),
            wheel_slip: [[0.0; 2]; WHEEL_COUNT],
            max_spring_force: 0.0,
            forward_speed: 0.0,
            velocity: Vector3::zeros(),
            location: Point3::origin(),
            engine_rpm: 0.0,
        }
    }
}

impl VehiclePhysics for TelemetryFrame {
    fn contact_material(&self, wheel: WheelId) -> Option<&MaterialId> {
        self.wheels[wheel.index()].as_ref()
    }

    fn max_spring_force(&self) -> f32 {
        self.max_spring_force
    }

    fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    fn location(&self) -> Point3<f32> {
        self.location
    }

    fn check_slip_threshold(&self, long_slip: f32, lat_slip: f32) -> bool {
        self.wheel_slip
            .iter()
            .any(|[long, lat]| long.abs() > long_slip || lat.abs() > lat_slip)
    }
}

impl EngineRpmSource for TelemetryFrame {
    fn engine_rotation_speed(&self) -> f32 {
        self.engine_rpm.abs()
    }
}

// ============================================
// Gameplay side
// ============================================

pub struct Session {
    pub id: Uuid,
    pub tx: UnboundedSender<String>,
    pub vehicle: VehicleFx,
    pub particles: ParticleLedger,
    pub audio: AudioLedger,
    pub last_telemetry: Option<TelemetryFrame>,
    pub rpm: SharedRpm,
    cfg: Arc<VehicleFxConfig>,
}

impl Session {
    pub fn new(id: Uuid, tx: UnboundedSender<String>, cfg: Arc<VehicleFxConfig>, rpm: SharedRpm) -> Self {
        let mut session = Self {
            id,
            tx,
            vehicle: VehicleFx::new(Arc::clone(&cfg)),
            particles: ParticleLedger::new(),
            audio: AudioLedger::new(),
            last_telemetry: None,
            rpm,
            cfg,
        };
        session.vehicle.on_spawn(&mut session.audio);
        session
    }

    /// Run the effect state machines against the newest telemetry, if any arrived yet.
    pub fn tick(&mut self, now: f64) -> Option<TickReport> {
        let frame = self.last_telemetry.as_ref()?;
        // a dead engine stays silent until respawn
        let rpm = if self.vehicle.is_dying() { 0.0 } else { frame.engine_rotation_speed() };
        self.rpm.publish(rpm);
        Some(self.vehicle.tick(frame, &mut self.particles, &mut self.audio, now))
    }

    pub fn flush(&mut self, tick: u64) -> Option<ServerMessage> {
        let mut commands = self.particles.drain();
        commands.extend(self.audio.drain());
        if commands.is_empty() {
            return None;
        }
        Some(ServerMessage::Fx { tick, commands })
    }

    pub fn handle(&mut self, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Telemetry(frame) => {
                self.last_telemetry = Some(frame);
                None
            }
            ClientMessage::Hit(hit) => {
                self.vehicle.on_hit(&hit, &mut self.particles);
                None
            }
            ClientMessage::Death => {
                let location = self
                    .last_telemetry
                    .as_ref()
                    .map(|f| f.location)
                    .unwrap_or_else(Point3::origin);
                self.vehicle.on_death(location, &mut self.particles, &mut self.audio);
                self.rpm.publish(0.0);
                None
            }
            ClientMessage::Respawn => {
                self.particles.retire_all();
                self.vehicle = VehicleFx::new(Arc::clone(&self.cfg));
                self.vehicle.on_spawn(&mut self.audio);
                self.last_telemetry = None;
                info!(session = %self.id, "vehicle respawned");
                None
            }
            ClientMessage::EffectCompleted { handle } => {
                if !self.particles.mark_completed(handle) {
                    debug!(session = %self.id, %handle, "completion for untracked effect");
                }
                None
            }
            ClientMessage::Ping => Some(ServerMessage::Pong),
        }
    }

    pub fn send(&self, msg: &ServerMessage) -> bool {
        send(&self.tx, msg)
    }
}

pub struct FxState {
    pub tick: u64,
    pub sessions: HashMap<Uuid, Session>,
    cfg: Arc<VehicleFxConfig>,
}

impl FxState {
    pub fn new(cfg: Arc<VehicleFxConfig>) -> Self {
        Self {
            tick: 0,
            sessions: HashMap::new(),
            cfg,
        }
    }

    pub fn add_session(&mut self, tx: UnboundedSender<String>, rpm: SharedRpm) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .insert(id, Session::new(id, tx, Arc::clone(&self.cfg), rpm));
        id
    }

    pub fn remove_session(&mut self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn handle_message(&mut self, id: &Uuid, msg: ClientMessage) -> Option<ServerMessage> {
        match self.sessions.get_mut(id) {
            Some(session) => session.handle(msg),
            None => {
                warn!(session = %id, "message for unknown session");
                None
            }
        }
    }

    /// Advance one gameplay tick of length `dt` and flush every session's commands.
    pub fn step(&mut self, dt: f64) -> usize {
        self.tick += 1;
        let tick = self.tick;
        let now = tick as f64 * dt;

        let mut flushed = 0;
        for session in self.sessions.values_mut() {
            session.tick(now);
            if let Some(msg) = session.flush(tick) {
                if session.send(&msg) {
                    flushed += 1;
                }
            }
        }
        flushed
    }
}

// ============================================
// Audio side
// ============================================

pub struct EngineVoice {
    pub node: EngineSoundNode,
    pub rpm: SharedRpm,
    pub base: SoundParams,
    tx: UnboundedSender<String>,
}

pub struct AudioState {
    cfg: EngineSoundConfig,
    pub voices: HashMap<Uuid, EngineVoice>,
}

impl AudioState {
    pub fn new(cfg: EngineSoundConfig) -> Self {
        Self { cfg, voices: HashMap::new() }
    }

    pub fn add_voice(&mut self, id: Uuid, rpm: SharedRpm, tx: UnboundedSender<String>) {
        let voice = EngineVoice {
            node: EngineSoundNode::new(self.cfg.samples.clone(), self.cfg.interp_speed),
            rpm,
            base: self.cfg.base,
            tx,
        };
        self.voices.insert(id, voice);
    }

    pub fn remove_voice(&mut self, id: &Uuid) -> bool {
        self.voices.remove(id).is_some()
    }

    /// One audio pass at audio-clock time `now`.
    pub fn mix(&mut self, now: f64) -> usize {
        let mut sent = 0;
        for voice in self.voices.values_mut() {
            let source: &dyn EngineRpmSource = &voice.rpm;
            let mix = voice.node.evaluate(Some(source), now, voice.base);
            let msg = ServerMessage::EngineMix { rpm: mix.rpm, bands: mix.bands };
            if send(&voice.tx, &msg) {
                sent += 1;
            }
        }
        sent
    }
}
