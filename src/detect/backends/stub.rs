use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::{DetectionCapability, SegmenterBackend};
use crate::detect::labels::PERSON_CLASS_ID;
use crate::detect::result::{BoundingBox, Detection};

/// Stub backend for tests and synthetic runs.
///
/// By default every frame yields a single person whose mask spans 60% of
/// the image height. Tests can script an exact per-frame detection
/// sequence instead; once the script is exhausted the backend falls back
/// to the default person.
pub struct StubBackend {
    scripted: VecDeque<Vec<Detection>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            scripted: VecDeque::new(),
        }
    }

    /// Queue per-frame detection results, consumed in order.
    pub fn with_script(frames: Vec<Vec<Detection>>) -> Self {
        Self {
            scripted: frames.into(),
        }
    }

    /// A person detection whose mask spans `y_min..y_max` (normalized).
    pub fn person(y_min: f32, y_max: f32) -> Detection {
        Self::instance(PERSON_CLASS_ID, y_min, y_max)
    }

    /// A detection of an arbitrary class spanning `y_min..y_max`.
    pub fn instance(class_id: usize, y_min: f32, y_max: f32) -> Detection {
        Detection {
            class_id,
            confidence: 0.9,
            bbox: BoundingBox {
                x: 0.3,
                y: y_min,
                w: 0.4,
                h: y_max - y_min,
            },
            polygon: vec![[0.3, y_min], [0.7, y_min], [0.7, y_max], [0.3, y_max]],
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmenterBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(
            capability,
            DetectionCapability::ObjectDetection | DetectionCapability::InstanceSegmentation
        )
    }

    fn segment(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        if let Some(frame) = self.scripted.pop_front() {
            return Ok(frame);
        }
        Ok(vec![Self::person(0.2, 0.8)])
    }
}
