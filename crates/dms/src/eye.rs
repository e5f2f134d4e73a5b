//! Eye openness classification
//!
//! Landmark extraction is done upstream; this module only turns the six
//! landmarks of one eye into an aspect ratio and the ratio into an [`EyeCode`].

use serde::{Deserialize, Serialize};

use crate::DmsConfig;

/// Per-eye, per-frame openness. Ordered `Closed < Half < Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EyeCode {
    Closed,
    Half,
    Open,
}

/// Classification of a whole frame: the worse of the two eyes
pub type FrameVerdict = EyeCode;

impl EyeCode {
    /// Classify an eye aspect ratio against the configured thresholds
    pub fn from_ratio(ratio: f32, config: &DmsConfig) -> Self {
        if ratio > config.open_ratio {
            EyeCode::Open
        } else if ratio > config.half_ratio {
            EyeCode::Half
        } else {
            EyeCode::Closed
        }
    }

    /// Combine both eyes; a closed or half-open eye is never masked by an open one
    pub fn verdict(left: EyeCode, right: EyeCode) -> FrameVerdict {
        left.min(right)
    }
}

/// Six eye landmarks in the usual 68-point order:
/// outer corner, two upper lid points, inner corner, two lower lid points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    pub points: [(f32, f32); 6],
}

impl EyeLandmarks {
    pub fn new(points: [(f32, f32); 6]) -> Self {
        Self { points }
    }

    /// Eye aspect ratio: vertical lid gaps over twice the eye width.
    ///
    /// A zero-width eye yields 0.0 so that it classifies as closed.
    pub fn aspect_ratio(&self) -> f32 {
        let [p1, p2, p3, p4, p5, p6] = self.points;
        let width = distance(p1, p4);
        if width <= f32::EPSILON {
            return 0.0;
        }
        (distance(p2, p6) + distance(p3, p5)) / (2.0 * width)
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Source of per-eye classifications
pub trait BlinkClassifier {
    fn classify(&self, eye: &EyeLandmarks) -> EyeCode;
}

/// Threshold classifier over the eye aspect ratio
#[derive(Debug, Clone)]
pub struct RatioClassifier {
    config: DmsConfig,
}

impl RatioClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl BlinkClassifier for RatioClassifier {
    fn classify(&self, eye: &EyeLandmarks) -> EyeCode {
        EyeCode::from_ratio(eye.aspect_ratio(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye_with_gap(gap: f32) -> EyeLandmarks {
        // 10 units wide, both lid gaps equal to `gap`
        EyeLandmarks::new([
            (0.0, 0.0),
            (3.0, gap / 2.0),
            (7.0, gap / 2.0),
            (10.0, 0.0),
            (7.0, -gap / 2.0),
            (3.0, -gap / 2.0),
        ])
    }

    #[test]
    fn test_aspect_ratio() {
        let eye = eye_with_gap(3.0);
        assert!((eye.aspect_ratio() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_eye_is_closed() {
        let eye = EyeLandmarks::new([(1.0, 1.0); 6]);
        assert_eq!(eye.aspect_ratio(), 0.0);
        let classifier = RatioClassifier::new(&DmsConfig::default());
        assert_eq!(classifier.classify(&eye), EyeCode::Closed);
    }

    #[test]
    fn test_ratio_boundaries() {
        let config = DmsConfig::default();
        assert_eq!(EyeCode::from_ratio(0.30, &config), EyeCode::Open);
        assert_eq!(EyeCode::from_ratio(0.25, &config), EyeCode::Half);
        assert_eq!(EyeCode::from_ratio(0.22, &config), EyeCode::Half);
        assert_eq!(EyeCode::from_ratio(0.21, &config), EyeCode::Closed);
        assert_eq!(EyeCode::from_ratio(0.0, &config), EyeCode::Closed);
    }

    #[test]
    fn test_classifier_uses_landmarks() {
        let classifier = RatioClassifier::new(&DmsConfig::default());
        assert_eq!(classifier.classify(&eye_with_gap(3.0)), EyeCode::Open);
        assert_eq!(classifier.classify(&eye_with_gap(2.3)), EyeCode::Half);
        assert_eq!(classifier.classify(&eye_with_gap(1.0)), EyeCode::Closed);
    }

    #[test]
    fn test_verdict_takes_worse_eye() {
        assert_eq!(EyeCode::verdict(EyeCode::Open, EyeCode::Closed), EyeCode::Closed);
        assert_eq!(EyeCode::verdict(EyeCode::Half, EyeCode::Open), EyeCode::Half);
        assert_eq!(EyeCode::verdict(EyeCode::Half, EyeCode::Closed), EyeCode::Closed);
        assert_eq!(EyeCode::verdict(EyeCode::Open, EyeCode::Open), EyeCode::Open);
    }
}
