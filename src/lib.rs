//! frame-triage
//!
//! Batch person-segmentation triage. A pretrained segmentation model runs
//! over a batch of still images; a deterministic rule-set decides, per
//! image, whether the detected person's region meets size/resolution/
//! height acceptance criteria, optionally re-checking against a 2x
//! upscale. Each frame is filed into exactly one outcome directory and
//! summarized in exactly one CSV row.
//!
//! # Module Structure
//!
//! - `source`: batch enumeration and frame tag parsing
//! - `detect`: segmenter backend trait, registry, and backends
//! - `decision`: the pure acceptance decision procedure
//! - `imaging`: decode, upscale, and PNG output
//! - `report`: summary table and CSV writers
//! - `pipeline`: the sequential per-frame run loop
//! - `config`: file + env configuration
//!
//! Model inference, non-max suppression, and mask decoding are backend
//! concerns behind the `SegmenterBackend` trait; this crate implements
//! the business logic around them.

pub mod config;
pub mod decision;
pub mod detect;
pub mod imaging;
pub mod pipeline;
pub mod report;
pub mod source;

pub use config::{default_excluded_classes, BackendSettings, RuleSettings, TriageConfig};
pub use decision::{
    DecisionRules, FrameFacts, FrameTag, Outcome, Verdict, DEFAULT_AREA_THRESHOLD,
    DEFAULT_SCALE_FACTOR,
};
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectionCapability, FrameSummary, SegmenterBackend,
    StubBackend,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use pipeline::RunReport;
pub use report::{FrameRecord, SummaryTable};
pub use source::SourceImage;
