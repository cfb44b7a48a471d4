//! Acceptance decision procedure.
//!
//! Given one frame's aggregated person detections and image dimensions,
//! decide accept/reject and whether upscaling applies. Pure and
//! deterministic; the pipeline performs the actual pixel work.

use crate::detect::FrameSummary;

/// Minimum pixel area for acceptance at native resolution.
pub const DEFAULT_AREA_THRESHOLD: u64 = 8_200_000;

/// Fixed linear upscale applied to both dimensions when the native
/// resolution is insufficient.
pub const DEFAULT_SCALE_FACTOR: u32 = 2;

/// Frame tag parsed from the file stem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameTag {
    Full,
    Half,
}

impl FrameTag {
    /// Parse the tag from a file stem. Files whose names carry neither
    /// marker are not processable frames.
    pub fn from_stem(stem: &str) -> Option<Self> {
        if stem.contains("Full") {
            Some(FrameTag::Full)
        } else if stem.contains("Half") {
            Some(FrameTag::Half)
        } else {
            None
        }
    }
}

/// Outcome directory a frame is filed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    FullSuccess,
    HalfSuccess,
    Failed,
}

impl Outcome {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Outcome::FullSuccess => "full_success",
            Outcome::HalfSuccess => "half_success",
            Outcome::Failed => "failed",
        }
    }
}

/// Inputs to the decision procedure for one frame.
#[derive(Clone, Debug)]
pub struct FrameFacts {
    pub person_count: usize,
    pub excluded_count: usize,
    pub width: u32,
    pub height: u32,
    pub tag: FrameTag,
    /// Vertical extent of the person's segmentation mask, in pixels of the
    /// native image. `None` when no person mask was produced.
    pub mask_extent_px: Option<f64>,
}

impl FrameFacts {
    pub fn from_summary(summary: &FrameSummary, width: u32, height: u32, tag: FrameTag) -> Self {
        Self {
            person_count: summary.person_count,
            excluded_count: summary.excluded_count,
            width,
            height,
            tag,
            mask_extent_px: summary.person_extent_px(height),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Result of the decision procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub outcome: Outcome,
    /// Whether the upscaled resolution was the one accepted (the `Scaled`
    /// CSV column).
    pub scaled: bool,
    pub note: &'static str,
    /// Pixel count reported in the summary: the upscaled count for scaled
    /// accepts, the native count otherwise.
    pub reported_pixels: u64,
    /// Marker appended to the output file stem.
    pub name_suffix: &'static str,
}

pub const NOTE_OK: &str = "-";
pub const NOTE_CLASS_FAILED: &str = "class failed";
pub const NOTE_HEIGHT_FAILED: &str = "height failed";
pub const NOTE_SIZE_FAILED: &str = "Size failed";

/// Tunable acceptance rules.
#[derive(Clone, Copy, Debug)]
pub struct DecisionRules {
    pub area_threshold: u64,
    pub scale_factor: u32,
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self {
            area_threshold: DEFAULT_AREA_THRESHOLD,
            scale_factor: DEFAULT_SCALE_FACTOR,
        }
    }
}

impl DecisionRules {
    /// Decide accept/reject for one frame.
    ///
    /// The upscaled height used by the `Full` re-check is always derived
    /// from the current frame's own dimensions; no state carries over
    /// between frames.
    pub fn decide(&self, facts: &FrameFacts) -> Verdict {
        if facts.person_count != 1 || facts.excluded_count != 0 {
            return Verdict {
                accepted: false,
                outcome: Outcome::Failed,
                scaled: false,
                note: NOTE_CLASS_FAILED,
                reported_pixels: facts.area(),
                name_suffix: "",
            };
        }

        let area = facts.area();
        let mask_extent = facts.mask_extent_px.unwrap_or(0.0);

        if area >= self.area_threshold {
            return match facts.tag {
                FrameTag::Full => {
                    if mask_extent >= facts.height as f64 / 2.0 {
                        Verdict {
                            accepted: true,
                            outcome: Outcome::FullSuccess,
                            scaled: false,
                            note: NOTE_OK,
                            reported_pixels: area,
                            name_suffix: "",
                        }
                    } else {
                        Verdict {
                            accepted: false,
                            outcome: Outcome::Failed,
                            scaled: false,
                            note: NOTE_HEIGHT_FAILED,
                            reported_pixels: area,
                            name_suffix: "",
                        }
                    }
                }
                FrameTag::Half => Verdict {
                    accepted: true,
                    outcome: Outcome::HalfSuccess,
                    scaled: false,
                    note: NOTE_OK,
                    reported_pixels: area,
                    name_suffix: "",
                },
            };
        }

        let scale_sq = (self.scale_factor as u64).pow(2);
        let upscaled_area = area * scale_sq;
        if upscaled_area >= self.area_threshold {
            let upscaled_height = facts.height as u64 * self.scale_factor as u64;
            return match facts.tag {
                FrameTag::Half => Verdict {
                    accepted: true,
                    outcome: Outcome::HalfSuccess,
                    scaled: true,
                    note: NOTE_OK,
                    reported_pixels: upscaled_area,
                    name_suffix: "_scaled",
                },
                FrameTag::Full => {
                    if mask_extent >= upscaled_height as f64 / 2.0 {
                        Verdict {
                            accepted: true,
                            outcome: Outcome::FullSuccess,
                            scaled: true,
                            note: NOTE_OK,
                            reported_pixels: upscaled_area,
                            name_suffix: "_scaled",
                        }
                    } else {
                        Verdict {
                            accepted: false,
                            outcome: Outcome::Failed,
                            scaled: false,
                            note: NOTE_HEIGHT_FAILED,
                            reported_pixels: area,
                            name_suffix: "_scaled",
                        }
                    }
                }
            };
        }

        Verdict {
            accepted: false,
            outcome: Outcome::Failed,
            scaled: false,
            note: NOTE_SIZE_FAILED,
            reported_pixels: area,
            name_suffix: "_scaled_failed",
        }
    }
}
