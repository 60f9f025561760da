use serde::{Deserialize, Serialize};

/// Joystick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

/// Calibration point of an axis, as read back with `AxisCalibrator::point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Point {
    Min,
    Mid,
    Max,
}

/// The points that may be written directly. Center is sampling-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extreme {
    Min,
    Max,
}

impl From<Extreme> for Point {
    fn from(extreme: Extreme) -> Self {
        match extreme {
            Extreme::Min => Point::Min,
            Extreme::Max => Point::Max,
        }
    }
}
