//! Engine speed handed from the gameplay tick to the audio pass.
//!
//! The only value both cadences touch: written once per gameplay tick, read
//! by the engine sound node at audio rate. Stored as f32 bits in an atomic so
//! neither side ever blocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::aven_fx::collab::EngineRpmSource;

#[derive(Debug, Clone, Default)]
pub struct SharedRpm(Arc<AtomicU32>);

impl SharedRpm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, rpm: f32) {
        let rpm = if rpm.is_finite() { rpm.abs() } else { 0.0 };
        self.0.store(rpm.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }
}

impl EngineRpmSource for SharedRpm {
    fn engine_rotation_speed(&self) -> f32 {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_is_visible_through_clones() {
        let writer = SharedRpm::new();
        let reader = writer.clone();
        assert_eq!(reader.engine_rotation_speed(), 0.0);

        writer.publish(-4200.5);
        assert_eq!(reader.engine_rotation_speed(), 4200.5);

        writer.publish(f32::INFINITY);
        assert_eq!(reader.get(), 0.0);
    }

    #[test]
    fn test_concurrent_reads_see_whole_values() {
        let rpm = SharedRpm::new();
        let reader = rpm.clone();
        let handle = std::thread::spawn(move || {
            for _ in 0..10_000 {
                let v = reader.get();
                assert!(v == 0.0 || v == 1000.0 || v == 7000.0);
            }
        });
        for i in 0..10_000 {
            rpm.publish(if i % 2 == 0 { 1000.0 } else { 7000.0 });
        }
        handle.join().unwrap();
    }
}
