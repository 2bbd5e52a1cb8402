use crate::detection::Detection;

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Greedy same-class suppression across the outputs of several models.
///
/// Detections are visited from most to least confident. Each surviving
/// detection suppresses every later detection of the same class whose box
/// overlaps it by more than the IoU threshold. Different classes never
/// suppress each other: a coin lying on a note is two items.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    iou_threshold: f32,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Concatenate per-model detections in the given order, then deduplicate.
    pub fn fuse<I>(&self, per_model: I) -> Vec<Detection>
    where
        I: IntoIterator<Item = Vec<Detection>>,
    {
        let merged: Vec<Detection> = per_model.into_iter().flatten().collect();
        self.deduplicate(merged)
    }

    /// Survivors come back in acceptance order, i.e. descending confidence
    /// with ties in input order.
    pub fn deduplicate(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        // stable: equal confidences keep input order
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut suppressed = vec![false; detections.len()];
        let mut kept = Vec::with_capacity(detections.len());

        for i in 0..detections.len() {
            if suppressed[i] {
                continue;
            }

            let current = detections[i];
            kept.push(current);

            for j in (i + 1)..detections.len() {
                if suppressed[j] {
                    continue;
                }

                let candidate = &detections[j];
                if candidate.class_id == current.class_id
                    && current.iou(candidate) > self.iou_threshold
                {
                    suppressed[j] = true;
                }
            }
        }

        tracing::trace!(
            input = detections.len(),
            kept = kept.len(),
            "Deduplicated detections"
        );

        kept
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn det(class_id: u32, confidence: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            class_id,
            confidence,
            amount: 10 * (class_id + 1),
            bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
        }
    }

    fn random_detection(rng: &mut fastrand::Rng) -> Detection {
        let x1 = rng.f32() * 100.0;
        let y1 = rng.f32() * 100.0;
        let size = 5.0 + rng.f32() * 40.0;
        det(
            rng.u32(0..3),
            0.5 + rng.f32() * 0.5,
            [x1, y1, x1 + size, y1 + size * (0.5 + rng.f32())],
        )
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(Deduplicator::new().deduplicate(Vec::new()).is_empty());
    }

    #[test]
    fn single_detection_is_returned_unchanged() {
        let only = det(2, 0.7, [1.0, 1.0, 4.0, 4.0]);
        assert_eq!(Deduplicator::new().deduplicate(vec![only]), vec![only]);
    }

    #[test]
    fn same_class_overlap_keeps_most_confident() {
        let low = det(4, 0.6, [1.0, 1.0, 9.0, 9.0]);
        let high = det(4, 0.9, [0.0, 0.0, 10.0, 10.0]);

        let kept = Deduplicator::new().deduplicate(vec![low, high]);
        assert_eq!(kept, vec![high]);
    }

    #[test]
    fn different_classes_never_suppress() {
        let coin = det(0, 0.8, [0.0, 0.0, 10.0, 10.0]);
        let note = det(4, 0.7, [0.0, 0.0, 10.0, 10.0]);

        let kept = Deduplicator::new().deduplicate(vec![note, coin]);
        assert_eq!(kept, vec![coin, note]);
    }

    #[test]
    fn identical_detections_collapse_to_highest() {
        let boxes = [0.0, 0.0, 4.0, 4.0];
        let input = vec![
            det(1, 0.6, boxes),
            det(1, 0.99, boxes),
            det(1, 0.75, boxes),
            det(1, 0.8, boxes),
        ];

        let kept = Deduplicator::new().deduplicate(input);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.99);
    }

    /// IoU exactly at the threshold is not a duplicate.
    #[test]
    fn overlap_at_threshold_survives() {
        // inter = 3, union = 10: IoU 0.3
        let a = det(2, 0.9, [0.0, 0.0, 6.5, 1.0]);
        let b = det(2, 0.8, [3.5, 0.0, 10.0, 1.0]);
        assert!((a.iou(&b) - 0.3).abs() < 1e-6);

        let kept = Deduplicator::new().with_iou_threshold(a.iou(&b)).deduplicate(vec![a, b]);
        assert_eq!(kept.len(), 2);
    }

    /// A suppressed detection no longer suppresses others.
    #[test]
    fn suppression_is_not_transitive() {
        // a overlaps b heavily, b overlaps c heavily, a and c barely touch
        let a = det(3, 0.9, [0.0, 0.0, 10.0, 10.0]);
        let b = det(3, 0.8, [4.0, 0.0, 14.0, 10.0]);
        let c = det(3, 0.7, [8.0, 0.0, 18.0, 10.0]);
        assert!(a.iou(&b) > DEFAULT_IOU_THRESHOLD);
        assert!(b.iou(&c) > DEFAULT_IOU_THRESHOLD);
        assert!(a.iou(&c) <= DEFAULT_IOU_THRESHOLD);

        let kept = Deduplicator::new().deduplicate(vec![c, b, a]);
        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn ties_keep_input_order() {
        let first = det(0, 0.7, [0.0, 0.0, 1.0, 1.0]);
        let second = det(1, 0.7, [50.0, 50.0, 51.0, 51.0]);
        let third = det(2, 0.7, [80.0, 80.0, 81.0, 81.0]);

        let kept = Deduplicator::new().deduplicate(vec![first, second, third]);
        assert_eq!(kept, vec![first, second, third]);
    }

    #[test]
    fn fuse_merges_models_in_order() {
        let general = vec![det(4, 0.9, [0.0, 0.0, 10.0, 10.0])];
        let coin = vec![
            det(4, 0.85, [0.5, 0.5, 10.0, 10.0]),
            det(2, 0.8, [20.0, 20.0, 25.0, 25.0]),
        ];

        let kept = Deduplicator::new().fuse([general.clone(), coin.clone()]);
        assert_eq!(kept, vec![general[0], coin[1]]);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let dedup = Deduplicator::new();

        for _ in 0..200 {
            let n = rng.usize(0..25);
            let input: Vec<Detection> = (0..n).map(|_| random_detection(&mut rng)).collect();

            let once = dedup.deduplicate(input);
            let twice = dedup.deduplicate(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn output_is_a_sorted_subset_of_input() {
        let mut rng = fastrand::Rng::with_seed(42);
        let dedup = Deduplicator::new();

        for _ in 0..200 {
            let n = rng.usize(0..25);
            let input: Vec<Detection> = (0..n).map(|_| random_detection(&mut rng)).collect();

            let output = dedup.deduplicate(input.clone());

            assert!(output.len() <= input.len());
            assert!(output.iter().all(|d| input.contains(d)), "no fabrication");
            assert!(
                output
                    .windows(2)
                    .all(|w| w[0].confidence >= w[1].confidence),
                "descending confidence"
            );
            for (i, a) in output.iter().enumerate() {
                for b in &output[i + 1..] {
                    assert!(
                        a.class_id != b.class_id || a.iou(b) <= dedup.iou_threshold(),
                        "surviving same-class pair overlaps"
                    );
                }
            }
        }
    }

    #[test]
    fn iou_symmetry_and_disjointness_hold_for_random_boxes() {
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..500 {
            let a = random_detection(&mut rng);
            let b = random_detection(&mut rng);
            assert_eq!(a.iou(&b), b.iou(&a));
            assert!((a.iou(&a) - 1.0).abs() < 1e-5);

            let far = Detection {
                bbox: BoundingBox::new(
                    a.bbox.x2 + 1.0,
                    a.bbox.y2 + 1.0,
                    a.bbox.x2 + 2.0,
                    a.bbox.y2 + 2.0,
                ),
                ..a
            };
            assert_eq!(a.iou(&far), 0.0);
        }
    }

    #[test]
    fn same_input_gives_same_output_across_calls() {
        let mut rng = fastrand::Rng::with_seed(99);
        let input: Vec<Detection> = (0..40).map(|_| random_detection(&mut rng)).collect();

        let dedup = Deduplicator::new();
        let first = dedup.deduplicate(input.clone());
        let second = dedup.deduplicate(input);
        assert_eq!(first, second);
    }
}
