//! Aligned two-axis joystick
//!
//! Calibrates the center and travel of an analog joystick read through an
//! ADC, and reads both axes on one shared scale so they respond alike even
//! when their raw extremes differ.

pub mod adc;
pub mod axis;
pub mod button;
pub mod calibrator;
pub mod config;
pub mod scale;
pub mod source;
pub mod startup;
pub mod store;
pub mod telemetry;

pub use axis::{Axis, Extreme, Point};
pub use calibrator::{AlignmentRange, AxisCalibrator, AxisState, AXIS_TRAVEL, RAW_MAX};
pub use config::JoystickConfig;
pub use scale::scale;
pub use source::{Clock, MonotonicClock, SampleSource};
pub use startup::{restore_or_calibrate, Startup};
pub use store::{CalibrationPoints, JsonFileStore, MemoryStore, PointStore};
