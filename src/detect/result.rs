use crate::detect::labels::{self, PERSON_CLASS_ID};

/// Axis-aligned bounding box in normalized 0..1 coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One detected instance, as produced by a segmenter backend.
///
/// The polygon is the segmentation outline in normalized 0..1 image
/// coordinates. Backends that cannot decode masks approximate it with the
/// bounding-box outline; the decision procedure only consumes the vertical
/// extent, so the approximation is lossless for box-shaped masks.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub polygon: Vec<[f32; 2]>,
}

impl Detection {
    pub fn class_name(&self) -> &'static str {
        labels::name_of(self.class_id)
    }

    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }

    /// Vertical extent of the polygon in normalized coordinates
    /// (max y - min y), or `None` when the polygon is empty.
    pub fn polygon_extent(&self) -> Option<f32> {
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for point in &self.polygon {
            min_y = min_y.min(point[1]);
            max_y = max_y.max(point[1]);
        }
        if min_y.is_finite() && max_y.is_finite() {
            Some(max_y - min_y)
        } else {
            None
        }
    }
}

/// Per-frame aggregation over all detections, feeding the decision
/// procedure.
#[derive(Clone, Debug, Default)]
pub struct FrameSummary {
    pub person_count: usize,
    pub excluded_count: usize,
    /// Normalized vertical extent of the first person's segmentation mask.
    pub person_extent: Option<f32>,
}

impl FrameSummary {
    pub fn collect(detections: &[Detection], excluded_classes: &[String]) -> Self {
        let mut summary = FrameSummary::default();
        for det in detections {
            if det.is_person() {
                summary.person_count += 1;
                if summary.person_extent.is_none() {
                    summary.person_extent = det.polygon_extent();
                }
            } else if excluded_classes.iter().any(|name| name == det.class_name()) {
                summary.excluded_count += 1;
            }
        }
        summary
    }

    /// Mask vertical extent converted to pixels of the native image.
    pub fn person_extent_px(&self, image_height: u32) -> Option<f64> {
        self.person_extent
            .map(|extent| extent as f64 * image_height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(y_min: f32, y_max: f32) -> Detection {
        Detection {
            class_id: PERSON_CLASS_ID,
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

    fn labeled(name: &str) -> Detection {
        let class_id = labels::coco_labels()
            .iter()
            .position(|n| *n == name)
            .expect("known label");
        Detection {
            class_id,
            confidence: 0.8,
            bbox: BoundingBox::default(),
            polygon: vec![[0.1, 0.1], [0.2, 0.2]],
        }
    }

    #[test]
    fn collects_person_and_excluded_counts() {
        let excluded = vec!["dog".to_string(), "cat".to_string()];
        let dets = vec![person(0.2, 0.8), labeled("dog"), labeled("car")];
        let summary = FrameSummary::collect(&dets, &excluded);
        assert_eq!(summary.person_count, 1);
        assert_eq!(summary.excluded_count, 1);
        let extent = summary.person_extent.expect("person extent");
        assert!((extent - 0.6).abs() < 1e-6);
    }

    #[test]
    fn extent_converts_to_pixels() {
        let summary = FrameSummary {
            person_count: 1,
            excluded_count: 0,
            person_extent: Some(0.5),
        };
        assert_eq!(summary.person_extent_px(2000), Some(1000.0));
    }

    #[test]
    fn empty_polygon_has_no_extent() {
        let det = Detection {
            class_id: PERSON_CLASS_ID,
            confidence: 0.9,
            bbox: BoundingBox::default(),
            polygon: vec![],
        };
        assert_eq!(det.polygon_extent(), None);
    }
}
