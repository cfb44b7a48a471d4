use anyhow::Result;

use crate::detect::result::Detection;

/// Detection capabilities supported by backends.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    ObjectDetection,
    InstanceSegmentation,
}

/// Segmenter backend trait.
///
/// Implementations wrap an external inference engine. The pipeline treats
/// them as black boxes: model loading, non-max suppression, and mask
/// decoding are backend concerns and never reimplemented by callers.
pub trait SegmenterBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on one RGB frame.
    ///
    /// `pixels` is tightly packed RGB, `width * height * 3` bytes.
    /// Implementations must treat the pixel slice as read-only and
    /// ephemeral.
    fn segment(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
