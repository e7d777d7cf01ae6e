//! Surface -> dust particle lookup, one table per vehicle type.

use serde::{Deserialize, Serialize};

use crate::aven_fx::collab::DustLookup;
use crate::aven_fx::types::{EffectId, MaterialId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DustEntry {
    pub material: MaterialId,
    pub effect: EffectId,
    /// Heavier variant used at or above `fast_speed`.
    #[serde(default)]
    pub fast_effect: Option<EffectId>,
    #[serde(default)]
    pub fast_speed: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustTable {
    pub entries: Vec<DustEntry>,
    /// No dust below this speed, whatever the surface.
    pub min_speed: f32,
}

impl DustTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DustLookup for DustTable {
    fn dust_effect(&self, material: Option<&MaterialId>, speed: f32) -> Option<EffectId> {
        let material = material?;
        if speed <= 0.0 || speed < self.min_speed {
            return None;
        }

        let entry = self.entries.iter().find(|e| &e.material == material)?;
        match &entry.fast_effect {
            Some(fast) if speed >= entry.fast_speed => Some(fast.clone()),
            _ => Some(entry.effect.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DustTable {
        DustTable {
            entries: vec![
                DustEntry {
                    material: "mud".into(),
                    effect: "fx_mud".into(),
                    fast_effect: Some("fx_mud_spray".into()),
                    fast_speed: 800.0,
                },
                DustEntry {
                    material: "tarmac".into(),
                    effect: "fx_smoke".into(),
                    fast_effect: None,
                    fast_speed: 0.0,
                },
            ],
            min_speed: 50.0,
        }
    }

    #[test]
    fn test_airborne_and_stationary_resolve_to_nothing() {
        let t = table();
        assert_eq!(t.dust_effect(None, 0.0), None);
        assert_eq!(t.dust_effect(None, 1000.0), None);
        assert_eq!(t.dust_effect(Some(&"mud".into()), 0.0), None);
        assert_eq!(t.dust_effect(Some(&"mud".into()), 10.0), None);
    }

    #[test]
    fn test_speed_selects_variant() {
        let t = table();
        let mud = MaterialId::from("mud");
        assert_eq!(t.dust_effect(Some(&mud), 200.0), Some("fx_mud".into()));
        assert_eq!(t.dust_effect(Some(&mud), 800.0), Some("fx_mud_spray".into()));
        assert_eq!(t.dust_effect(Some(&"tarmac".into()), 5000.0), Some("fx_smoke".into()));
    }

    #[test]
    fn test_unknown_surface_has_no_dust() {
        assert_eq!(table().dust_effect(Some(&"ice".into()), 500.0), None);
    }

    #[test]
    fn test_table_from_json() {
        let t: DustTable = serde_json::from_str(
            r#"{"entries":[{"material":"sand","effect":"fx_sand"}],"min_speed":5}"#,
        )
        .unwrap();
        assert_eq!(t.entries[0].fast_effect, None);
        assert_eq!(t.dust_effect(Some(&"sand".into()), 6.0), Some("fx_sand".into()));
    }
}
