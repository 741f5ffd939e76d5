use kinesis_core::config::HarnessConfig;
use kinesis_data::{CameraState, Point3};

/// Chase camera that eases toward the leading creature.
#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Point3,
    target: Point3,
    offset: Point3,
    smoothing: f32,
}

impl CameraRig {
    #[must_use]
    pub fn new(config: &HarnessConfig) -> Self {
        let offset = Point3::from(config.camera_offset);
        Self {
            position: offset,
            target: Point3::default(),
            offset,
            smoothing: config.camera_smoothing,
        }
    }

    /// Moves the look target a `smoothing` fraction of the way to `leader`
    /// and the camera the same fraction toward `leader + offset`. Without a
    /// finite leader the camera holds still.
    pub fn update(&mut self, leader: Option<Point3>) -> CameraState {
        if let Some(leader) = leader.filter(Point3::is_finite) {
            self.target = self.target.lerp(leader, self.smoothing);
            self.position = self
                .position
                .lerp(leader.offset(self.offset), self.smoothing);
        }
        self.state()
    }

    #[must_use]
    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
        }
    }
}
