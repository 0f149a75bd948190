//! Shadow documents exchanged with the synchronized state store.
//!
//! The store holds a desired/reported pair of `{Camera, Motion}` documents.
//! The agent writes whole documents with report/desire calls and reads the
//! desired section back, either by polling or through delta notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DecodeError, RecordingState, SensorLevel};

/// A delta `Camera` value above this starts the pipeline; anything else pauses it.
pub const DELTA_START_THRESHOLD: f64 = 0.1;

/// Wire name of the camera flag.
const CAMERA_FIELD: &str = "Camera";
/// Wire name of the motion flag.
const MOTION_FIELD: &str = "Motion";

/// The `{Camera, Motion}` document held in the desired and reported sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateDocument {
    /// Camera flag (0 = paused, 1 = recording).
    pub camera: u8,
    /// Motion flag (0 = none, 1 = motion seen).
    pub motion: u8,
}

impl StateDocument {
    /// Create a document from raw flags.
    pub fn new(camera: u8, motion: u8) -> Self {
        Self { camera, motion }
    }

    /// `{Camera: 0, Motion: 0}`.
    pub fn idle() -> Self {
        Self::new(0, 0)
    }

    /// `{Camera: 1, Motion: 1}`, reported when a motion edge forces recording on.
    pub fn motion_detected() -> Self {
        Self::new(1, 1)
    }

    /// `{Camera: 1, Motion: 0}`.
    pub fn recording() -> Self {
        Self::new(1, 0)
    }

    /// Confirmed state after a delta: the camera flag only, motion cleared.
    pub fn confirmed(state: RecordingState) -> Self {
        Self::new(state.camera_flag(), 0)
    }

    /// `{Camera: 0, Motion: level}`, reported when the watchdog stops recording.
    pub fn watchdog_reset(level: SensorLevel) -> Self {
        Self::new(0, level.as_flag())
    }

    /// Recording state implied by the camera flag.
    pub fn recording_state(&self) -> RecordingState {
        RecordingState::from_camera(self.camera)
    }

    /// Decode the desired section of a fetched shadow.
    ///
    /// `null` decodes to the all-zero document. Missing fields are zero and
    /// unknown fields are ignored. Flags must be non-negative integers (integral
    /// floats such as `1.0` included); any positive value decodes to 1.
    pub fn from_desired(desired: &Value) -> Result<Self, DecodeError> {
        let map = match desired {
            Value::Null => return Ok(Self::idle()),
            Value::Object(map) => map,
            other => return Err(DecodeError::NotAnObject(other.to_string())),
        };

        Ok(Self {
            camera: decode_flag(CAMERA_FIELD, map.get(CAMERA_FIELD))?,
            motion: decode_flag(MOTION_FIELD, map.get(MOTION_FIELD))?,
        })
    }

    /// Encode as a JSON object with the wire field names.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "Camera": self.camera,
            "Motion": self.motion,
        })
    }
}

fn decode_flag(field: &'static str, value: Option<&Value>) -> Result<u8, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            let raw = n.as_f64().ok_or_else(|| DecodeError::InvalidType {
                field,
                found: n.to_string(),
            })?;
            // Any positive count means "on"; flags are stored as 0/1.
            if raw < 0.0 || raw.fract() != 0.0 {
                Err(DecodeError::InvalidFlag { field, value: raw })
            } else if raw > 0.0 {
                Ok(1)
            } else {
                Ok(0)
            }
        }
        Some(other) => Err(DecodeError::InvalidType {
            field,
            found: other.to_string(),
        }),
    }
}

/// An asynchronous change to the desired document.
///
/// Deltas only carry the fields that changed, so `camera` is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateDelta {
    /// New desired camera value, if the delta touched it.
    pub camera: Option<f64>,
}

impl StateDelta {
    /// A delta that sets the camera value.
    pub fn camera(value: f64) -> Self {
        Self {
            camera: Some(value),
        }
    }

    /// Decode a delta payload (the changed part of the desired section).
    pub fn from_value(delta: &Value) -> Result<Self, DecodeError> {
        let map = match delta {
            Value::Object(map) => map,
            other => return Err(DecodeError::NotAnObject(other.to_string())),
        };

        let camera = match map.get(CAMERA_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_f64().ok_or_else(|| DecodeError::InvalidType {
                field: CAMERA_FIELD,
                found: n.to_string(),
            })?),
            Some(other) => {
                return Err(DecodeError::InvalidType {
                    field: CAMERA_FIELD,
                    found: other.to_string(),
                })
            }
        };

        Ok(Self { camera })
    }

    /// Recording state requested by this delta, or `None` if it does not touch the camera.
    pub fn target(&self) -> Option<RecordingState> {
        self.camera.map(|value| {
            if value > DELTA_START_THRESHOLD {
                RecordingState::Recording
            } else {
                RecordingState::Idle
            }
        })
    }
}
