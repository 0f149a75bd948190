//! Sensor levels and recording states.

/// Level of the motion sensor line, sampled once per tick.
///
/// The line is active-high. `Inactive < Active`, so a rising edge is simply
/// `level > previous`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensorLevel {
    /// Line is low (no motion).
    #[default]
    Inactive,
    /// Line is high (motion).
    Active,
}

impl SensorLevel {
    /// Level as the `0|1` flag carried in shadow documents.
    pub fn as_flag(self) -> u8 {
        match self {
            SensorLevel::Inactive => 0,
            SensorLevel::Active => 1,
        }
    }

    /// Check if the line is high.
    pub fn is_active(self) -> bool {
        matches!(self, SensorLevel::Active)
    }
}

impl From<bool> for SensorLevel {
    fn from(high: bool) -> Self {
        if high {
            SensorLevel::Active
        } else {
            SensorLevel::Inactive
        }
    }
}

/// Target state of the recording pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordingState {
    /// Pipeline paused, `desired.camera == 0`.
    #[default]
    Idle,
    /// Pipeline playing, `desired.camera == 1` or forced on by motion.
    Recording,
}

impl RecordingState {
    /// Map a `camera` flag onto a recording state (any positive value records).
    pub fn from_camera(camera: u8) -> Self {
        if camera > 0 {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    /// The `camera` flag for this state.
    pub fn camera_flag(self) -> u8 {
        match self {
            RecordingState::Idle => 0,
            RecordingState::Recording => 1,
        }
    }

    /// Check if the pipeline should be producing output.
    pub fn is_recording(self) -> bool {
        matches!(self, RecordingState::Recording)
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
        }
    }
}
