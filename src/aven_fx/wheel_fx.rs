// ==============================================================================
// wheel_fx.rs — PER-WHEEL DUST EFFECT CONTROLLER
// ------------------------------------------------------------------------------
// Each tick, for every wheel:
// 1) read the contact material (None = airborne) and fold it into the
//    vehicle-level "any wheel touching ground" flag
// 2) resolve the wanted dust template from (material, speed)
// 3) reconcile the wheel's particle slot against it:
//
//    wanted Some(fx), and fx differs from the bound kind or the instance
//    is not live:
//        instance Deactivated  -> retarget it to fx (re-arm in place)
//        otherwise             -> retire old instance, spawn a fresh one
//    wanted None and instance live:
//        deactivate (old particles dissipate, instance kept for re-arm)
//    else:
//        nothing
//
// Notes:
// - A retired handle leaves the slot in the same step and is never touched
//   again; the host destroys it once its particles finish.
// - The landing check must run BEFORE update() since it relies on the
//   previous tick's touching flag.
// ==============================================================================

use tracing::trace;

use crate::aven_fx::collab::{DustLookup, ParticleSystem, VehiclePhysics};
use crate::aven_fx::types::{EffectHandle, EffectId, EffectStatus, WheelId, WHEEL_COUNT};
use crate::error::FxError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WheelSlot {
    pub handle: Option<EffectHandle>,
    /// Template currently bound to `handle`.
    pub kind: Option<EffectId>,
}

#[derive(Debug, Default)]
pub struct WheelEffects {
    slots: [WheelSlot; WHEEL_COUNT],
    touching_ground: bool,
}

impl WheelEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, wheel: WheelId) -> &WheelSlot {
        &self.slots[wheel.index()]
    }

    pub fn slot_at(&self, index: usize) -> Result<&WheelSlot, FxError> {
        self.slots.get(index).ok_or(FxError::WheelIndex(index))
    }

    /// Result of the last `update()`.
    pub fn any_wheel_touching_ground(&self) -> bool {
        self.touching_ground
    }

    /// Landing impact: airborne last tick and the springs took a hit above `threshold`.
    pub fn landing_triggered<P>(&self, physics: &P, threshold: f32) -> bool
    where
        P: VehiclePhysics + ?Sized,
    {
        !self.touching_ground && physics.max_spring_force() > threshold
    }

    pub fn update<P, D, S>(&mut self, physics: &P, dust: &D, particles: &mut S, speed: f32)
    where
        P: VehiclePhysics + ?Sized,
        D: DustLookup + ?Sized,
        S: ParticleSystem + ?Sized,
    {
        self.touching_ground = false;

        for wheel in WheelId::ALL {
            let material = physics.contact_material(wheel);
            if material.is_some() {
                self.touching_ground = true;
            }

            let wanted = dust.dust_effect(material, speed);
            self.reconcile(wheel, wanted, particles);
        }
    }

    fn reconcile<S>(&mut self, wheel: WheelId, wanted: Option<EffectId>, particles: &mut S)
    where
        S: ParticleSystem + ?Sized,
    {
        let slot = &mut self.slots[wheel.index()];
        let status = slot.handle.map(|h| particles.status(h));
        let is_live = status == Some(EffectStatus::Live);

        match wanted {
            Some(fx) if slot.kind.as_ref() != Some(&fx) || !is_live => {
                match slot.handle {
                    Some(h) if status == Some(EffectStatus::Deactivated) => {
                        trace!(%wheel, handle = %h, template = %fx, "re-arming dust effect");
                        particles.retarget(h, &fx);
                    }
                    old => {
                        if let Some(h) = old {
                            trace!(%wheel, handle = %h, "retiring dust effect");
                            particles.retire(h);
                        }
                        let h = particles.spawn(&fx, wheel);
                        trace!(%wheel, handle = %h, template = %fx, "spawned dust effect");
                        slot.handle = Some(h);
                    }
                }
                slot.kind = Some(fx);
            }
            None if is_live => {
                if let Some(h) = slot.handle {
                    particles.deactivate(h);
                }
            }
            _ => {}
        }
    }

    /// Pawn death: stop every live instance and forget ground contact.
    pub fn reset<S>(&mut self, particles: &mut S)
    where
        S: ParticleSystem + ?Sized,
    {
        for slot in &self.slots {
            if let Some(h) = slot.handle {
                if particles.status(h) == EffectStatus::Live {
                    particles.deactivate(h);
                }
            }
        }
        self.touching_ground = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aven_fx::testing::{Call, FakeParticles, FakePhysics};
    use crate::aven_fx::types::MaterialId;

    /// Template named after the surface, whenever the wheel is moving.
    struct SameName;

    impl DustLookup for SameName {
        fn dust_effect(&self, material: Option<&MaterialId>, speed: f32) -> Option<EffectId> {
            if speed <= 0.0 {
                return None;
            }
            material.map(|m| EffectId(format!("fx_{}", m.0)))
        }
    }

    fn wheel0(phys: &mut FakePhysics, material: Option<&str>) {
        phys.materials[0] = material.map(MaterialId::from);
    }

    #[test]
    fn test_spawns_once_for_stable_surface() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let phys = FakePhysics::on("mud");

        for _ in 0..5 {
            fx.update(&phys, &SameName, &mut particles, 10.0);
        }

        assert_eq!(particles.count(|c| matches!(c, Call::Spawn(..))), WHEEL_COUNT);
        assert_eq!(particles.calls.len(), WHEEL_COUNT);
        assert!(fx.any_wheel_touching_ground());
        assert_eq!(fx.slot(WheelId::RR).kind, Some(EffectId::from("fx_mud")));
    }

    #[test]
    fn test_mud_none_mud_rearms_without_churn() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();

        wheel0(&mut phys, Some("mud"));
        fx.update(&phys, &SameName, &mut particles, 10.0);
        let first = fx.slot(WheelId::FL).handle.unwrap();

        wheel0(&mut phys, None);
        fx.update(&phys, &SameName, &mut particles, 10.0);
        assert!(!fx.any_wheel_touching_ground());

        wheel0(&mut phys, Some("mud"));
        fx.update(&phys, &SameName, &mut particles, 10.0);

        assert_eq!(
            particles.calls,
            vec![
                Call::Spawn(first, EffectId::from("fx_mud"), WheelId::FL),
                Call::Deactivate(first),
                Call::Retarget(first, EffectId::from("fx_mud")),
            ]
        );
        assert_eq!(fx.slot(WheelId::FL).handle, Some(first));
    }

    #[test]
    fn test_surface_change_retires_and_spawns_fresh_handle() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();

        wheel0(&mut phys, Some("mud"));
        fx.update(&phys, &SameName, &mut particles, 10.0);
        let mud = fx.slot(WheelId::FL).handle.unwrap();

        wheel0(&mut phys, Some("gravel"));
        fx.update(&phys, &SameName, &mut particles, 10.0);
        let gravel = fx.slot(WheelId::FL).handle.unwrap();

        wheel0(&mut phys, Some("mud"));
        fx.update(&phys, &SameName, &mut particles, 10.0);
        let mud_again = fx.slot(WheelId::FL).handle.unwrap();

        assert_ne!(mud, gravel);
        assert_ne!(gravel, mud_again);
        assert_ne!(mud, mud_again);
        assert_eq!(particles.count(|c| matches!(c, Call::Retire(_))), 2);
        assert_eq!(particles.count(|c| matches!(c, Call::Spawn(..))), 3);
        assert_eq!(fx.slot(WheelId::FL).kind, Some(EffectId::from("fx_mud")));
    }

    #[test]
    fn test_completed_instance_is_replaced() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();
        wheel0(&mut phys, Some("sand"));

        fx.update(&phys, &SameName, &mut particles, 10.0);
        let old = fx.slot(WheelId::FL).handle.unwrap();
        particles.complete(old);

        fx.update(&phys, &SameName, &mut particles, 10.0);
        let new = fx.slot(WheelId::FL).handle.unwrap();

        assert_ne!(old, new);
        assert!(particles.calls.contains(&Call::Retire(old)));
    }

    #[test]
    fn test_zero_speed_airborne_never_spawns() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let phys = FakePhysics::default();

        fx.update(&phys, &SameName, &mut particles, 0.0);

        assert!(particles.calls.is_empty());
        assert!(!fx.any_wheel_touching_ground());
    }

    #[test]
    fn test_landing_uses_previous_tick_contact() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();
        phys.spring_force = 300_000.0;

        // airborne since spawn
        assert!(fx.landing_triggered(&phys, 250_000.0));
        assert!(!fx.landing_triggered(&phys, 400_000.0));

        wheel0(&mut phys, Some("tarmac"));
        fx.update(&phys, &SameName, &mut particles, 5.0);
        assert!(!fx.landing_triggered(&phys, 250_000.0));
    }

    #[test]
    fn test_long_surface_sequence_keeps_slot_consistent() {
        let surfaces = [None, Some("mud"), Some("gravel"), Some("sand")];
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();
        let mut last_kind: Option<EffectId> = None;
        let mut seed: u32 = 0x2545_f491;

        for _ in 0..500 {
            // xorshift32
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let surface = surfaces[(seed % 4) as usize];
            wheel0(&mut phys, surface);
            if seed % 7 == 0 {
                if let Some(h) = fx.slot(WheelId::FL).handle {
                    particles.complete(h);
                }
            }

            fx.update(&phys, &SameName, &mut particles, 10.0);

            let slot = fx.slot(WheelId::FL);
            match surface {
                Some(m) => {
                    let wanted = EffectId(format!("fx_{m}"));
                    assert_eq!(slot.kind.as_ref(), Some(&wanted));
                    let h = slot.handle.unwrap();
                    assert_eq!(particles.status(h), EffectStatus::Live);
                    last_kind = Some(wanted);
                }
                None => assert_eq!(slot.kind, last_kind),
            }
        }

        let mut retired = Vec::new();
        for call in &particles.calls {
            let handle = match call {
                Call::Spawn(h, ..) | Call::Retarget(h, _) | Call::Deactivate(h) => *h,
                Call::Retire(h) => {
                    assert!(!retired.contains(h), "{h} retired twice");
                    retired.push(*h);
                    continue;
                }
                _ => continue,
            };
            assert!(!retired.contains(&handle), "{handle} used after retire");
        }
        assert!(!retired.is_empty());
    }

    #[test]
    fn test_slot_at_rejects_out_of_range() {
        let fx = WheelEffects::new();
        assert!(fx.slot_at(3).is_ok());
        assert!(matches!(fx.slot_at(4), Err(FxError::WheelIndex(4))));
    }

    #[test]
    fn test_reset_deactivates_live_only() {
        let mut fx = WheelEffects::new();
        let mut particles = FakeParticles::default();
        let mut phys = FakePhysics::default();
        wheel0(&mut phys, Some("mud"));
        fx.update(&phys, &SameName, &mut particles, 10.0);
        particles.calls.clear();

        fx.reset(&mut particles);
        fx.reset(&mut particles);

        assert_eq!(particles.count(|c| matches!(c, Call::Deactivate(_))), 1);
        assert!(!fx.any_wheel_touching_ground());
    }
}
