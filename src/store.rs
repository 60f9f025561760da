//! Persisting calibration extremes between runs, so the sweep only has to be
//! done once.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::axis::{Axis, Extreme, Point};
use crate::calibrator::AxisCalibrator;
use crate::source::{Clock, SampleSource};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid calibration data: {0}")]
    Json(#[from] serde_json::Error),
}

/// The four extremes of a calibrated joystick. The center is not stored: it
/// only matters while sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationPoints {
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
}

impl CalibrationPoints {
    pub fn capture<S: SampleSource, C: Clock>(calibrator: &AxisCalibrator<S, C>) -> Self {
        CalibrationPoints {
            x_min: calibrator.point(Axis::X, Point::Min),
            x_max: calibrator.point(Axis::X, Point::Max),
            y_min: calibrator.point(Axis::Y, Point::Min),
            y_max: calibrator.point(Axis::Y, Point::Max),
        }
    }

    /// Restore the extremes into `calibrator`; returns whether it is now
    /// fully calibrated.
    pub fn apply<S: SampleSource, C: Clock>(&self, calibrator: &mut AxisCalibrator<S, C>) -> bool {
        calibrator.set_point(Axis::X, Extreme::Min, self.x_min);
        calibrator.set_point(Axis::X, Extreme::Max, self.x_max);
        calibrator.set_point(Axis::Y, Extreme::Min, self.y_min);
        calibrator.set_point(Axis::Y, Extreme::Max, self.y_max);
        calibrator.is_calibrated()
    }
}

pub trait PointStore {
    /// `Ok(None)` if nothing has been stored yet.
    fn load(&self) -> Result<Option<CalibrationPoints>, StoreError>;

    fn save(&mut self, points: &CalibrationPoints) -> Result<(), StoreError>;
}

/// Points kept as pretty-printed JSON in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl PointStore for JsonFileStore {
    fn load(&self) -> Result<Option<CalibrationPoints>, StoreError> {
        if !self.path.exists() {
            debug!("no calibration stored at {:?}", self.path);
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let points = serde_json::from_str(&content)?;
        Ok(Some(points))
    }

    fn save(&mut self, points: &CalibrationPoints) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(points)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        info!("Saved calibration to {:?}", self.path);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    points: Option<CalibrationPoints>,
}

impl PointStore for MemoryStore {
    fn load(&self) -> Result<Option<CalibrationPoints>, StoreError> {
        Ok(self.points)
    }

    fn save(&mut self, points: &CalibrationPoints) -> Result<(), StoreError> {
        self.points = Some(*points);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrator::AlignmentRange;
    use std::convert::Infallible;
    use std::time::Duration;

    struct Fixed(u16);

    impl SampleSource for Fixed {
        type Error = Infallible;

        fn read(&mut self, _channel: u8) -> Result<u16, Infallible> {
            Ok(self.0)
        }
    }

    struct Frozen;

    impl Clock for Frozen {
        fn elapsed(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn calibrator() -> AxisCalibrator<Fixed, Frozen> {
        AxisCalibrator::new(Fixed(512), Frozen, 0, 1)
    }

    fn points() -> CalibrationPoints {
        CalibrationPoints { x_min: 100, x_max: 900, y_min: 50, y_max: 700 }
    }

    #[test]
    fn capture_then_apply_restores_calibration() {
        let mut original = calibrator();
        assert!(points().apply(&mut original));
        let captured = CalibrationPoints::capture(&original);
        assert_eq!(captured, points());

        let mut restored = calibrator();
        assert!(captured.apply(&mut restored));
        assert_eq!(restored.alignment(), Some(AlignmentRange { min: 50, max: 900 }));
    }

    #[test]
    fn apply_reports_insufficient_travel() {
        let mut cal = calibrator();
        let narrow = CalibrationPoints { x_min: 400, x_max: 600, ..points() };
        assert!(!narrow.apply(&mut cal));
        assert_eq!(cal.point(Axis::X, Point::Max), 600);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("calibration.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("calibration.json"));
        store.save(&points()).unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.load().unwrap(), Some(points()));
    }

    #[test]
    fn file_format_is_flat_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        fs::write(
            &path,
            // unknown keys such as an old travel_threshold are ignored
            r#"{"x_min":10,"x_max":1000,"y_min":20,"y_max":990,"travel_threshold":550}"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.x_max, 1000);
        assert_eq!(loaded.y_min, 20);
    }

    #[test]
    fn saved_file_holds_only_extremes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("calibration.json"));
        store.save(&points()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["x_max", "x_min", "y_max", "y_min"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonFileStore::new(&path).load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_keeps_last_save() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save(&points()).unwrap();
        assert_eq!(store.load().unwrap(), Some(points()));
    }
}
