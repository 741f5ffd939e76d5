use crate::genome::Point3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a muscle's oscillation at the captured instant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stroke {
    /// Oscillator output is non-negative: the spring is longer than baseline.
    Extending,
    /// Oscillator output is negative: the spring is shorter than baseline.
    Contracting,
}

impl Stroke {
    #[must_use]
    pub fn from_oscillation(oscillation: f32) -> Self {
        if oscillation >= 0.0 {
            Self::Extending
        } else {
            Self::Contracting
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpringSegment {
    pub a: usize,
    pub b: usize,
    pub from: Point3,
    pub to: Point3,
    /// Oscillator argument wrapped into `[0, 2π)`.
    pub phase: f32,
    /// Sine of `phase`, in `[-1, 1]`.
    pub oscillation: f32,
    pub stroke: Stroke,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreatureFrame {
    pub id: Uuid,
    pub fitness: f32,
    pub nodes: Vec<Point3>,
    pub springs: Vec<SpringSegment>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraState {
    pub position: Point3,
    pub target: Point3,
}

/// Read-only values the surrounding UI polls once per frame.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct HudState {
    pub generation: u64,
    /// Best fitness across all completed generations, if any was finite.
    pub record: Option<f32>,
    /// Seconds left in the current epoch, rounded to one decimal.
    pub countdown_seconds: f32,
    pub alive: usize,
    pub leader_fitness: Option<f32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub generation: u64,
    pub epoch_elapsed_ms: f32,
    pub creatures: Vec<CreatureFrame>,
    pub camera: CameraState,
    pub hud: HudState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_sign() {
        assert_eq!(Stroke::from_oscillation(0.3), Stroke::Extending);
        assert_eq!(Stroke::from_oscillation(0.0), Stroke::Extending);
        assert_eq!(Stroke::from_oscillation(-0.01), Stroke::Contracting);
    }
}
