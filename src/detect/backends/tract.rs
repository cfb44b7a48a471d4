#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectionCapability, SegmenterBackend};
use crate::detect::labels;
use crate::detect::result::{BoundingBox, Detection};

/// Tract-based backend for ONNX detection/segmentation models.
///
/// Loads a local model file and performs inference on RGB frames. Frames
/// are stretch-resized to the model input size; decoded boxes are returned
/// in normalized coordinates, so they remain valid for the native frame.
///
/// The decode is deliberately thin: candidate rows above the confidence
/// threshold plus a greedy overlap filter. Mask prototype decoding is not
/// reimplemented; the polygon is the box outline, whose vertical extent
/// matches the mask extent closely for person instances.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let frame = image::RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match dimensions"))?;
        let resized = image::imageops::resize(
            &frame,
            self.width,
            self.height,
            image::imageops::FilterType::Triangle,
        );

        let model_width = self.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, model_width),
            |(_, channel, y, x)| {
                resized.get_pixel(x as u32, y as u32).0[channel] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        if view.ndim() != 3 {
            return Err(anyhow!(
                "unexpected model output rank {} (expected 3)",
                view.ndim()
            ));
        }

        let rows = view.index_axis(tract_ndarray::Axis(0), 0);
        let stride = rows.shape()[1];
        if stride < 6 {
            return Err(anyhow!("model output row too short: {}", stride));
        }
        // YOLO-style rows: cx, cy, w, h, objectness, class scores, then
        // optional mask coefficients which this decode ignores.
        let class_count = (stride - 5).min(labels::coco_labels().len());

        let mut candidates = Vec::new();
        for row in rows.outer_iter() {
            let objectness = row[4];
            if objectness < self.confidence_threshold {
                continue;
            }
            let mut best_class = 0usize;
            let mut best_score = f32::NEG_INFINITY;
            for class_id in 0..class_count {
                let score = row[5 + class_id];
                if score > best_score {
                    best_score = score;
                    best_class = class_id;
                }
            }
            let confidence = objectness * best_score;
            if confidence < self.confidence_threshold {
                continue;
            }

            let cx = row[0] / self.width as f32;
            let cy = row[1] / self.height as f32;
            let w = row[2] / self.width as f32;
            let h = row[3] / self.height as f32;
            let x = (cx - w / 2.0).clamp(0.0, 1.0);
            let y = (cy - h / 2.0).clamp(0.0, 1.0);
            let w = w.min(1.0 - x);
            let h = h.min(1.0 - y);

            candidates.push(Detection {
                class_id: best_class,
                confidence,
                bbox: BoundingBox { x, y, w, h },
                polygon: vec![[x, y], [x + w, y], [x + w, y + h], [x, y + h]],
            });
        }

        Ok(suppress_overlaps(candidates, self.iou_threshold))
    }
}

/// Greedy confidence-ordered overlap suppression.
fn suppress_overlaps(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let overlaps = kept.iter().any(|existing| {
            existing.class_id == candidate.class_id
                && iou(&existing.bbox, &candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.w).min(b.x + b.w);
    let y2 = (a.y + a.h).min(b.y + b.h);
    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.w * a.h + b.w * b.h - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

impl SegmenterBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(
            capability,
            DetectionCapability::ObjectDetection | DetectionCapability::InstanceSegmentation
        )
    }

    fn segment(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }
}
