//! Bringing a joystick to a calibrated state at startup: restore stored
//! extremes when possible, otherwise run the two calibration phases and store
//! the result.

use anyhow::Result;
use tracing::{info, warn};

use crate::calibrator::AxisCalibrator;
use crate::config::JoystickConfig;
use crate::source::{Clock, SampleSource};
use crate::store::{CalibrationPoints, PointStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Stored extremes were enough.
    Restored,
    /// Calibration ran and succeeded; the points were saved.
    Calibrated,
    /// Calibration ran out of attempts; readings pass through unaligned.
    Uncalibrated,
}

pub fn restore_or_calibrate<S, C, P>(
    calibrator: &mut AxisCalibrator<S, C>,
    store: &mut P,
    config: &JoystickConfig,
    force: bool,
) -> Result<Startup>
where
    S: SampleSource,
    S::Error: std::error::Error + Send + Sync + 'static,
    C: Clock,
    P: PointStore,
{
    if force {
        info!("Recalibration requested, ignoring stored points");
    } else if let Some(points) = store.load()? {
        if points.apply(calibrator) {
            info!("Restored calibration {:?}", calibrator.alignment());
            return Ok(Startup::Restored);
        }
        warn!("Stored points do not cover the travel threshold, recalibrating");
    }

    info!("Leave the joystick at rest...");
    calibrator.center_calibrate(config.center_duration())?;

    for attempt in 1..=config.max_extent_attempts {
        info!(
            "Sweep the joystick around its full range ({}/{})...",
            attempt, config.max_extent_attempts
        );
        if calibrator.extent_calibrate(config.extent_duration())? {
            store.save(&CalibrationPoints::capture(calibrator))?;
            return Ok(Startup::Calibrated);
        }
    }

    warn!("Calibration failed, reading axes unaligned");
    Ok(Startup::Uncalibrated)
}
