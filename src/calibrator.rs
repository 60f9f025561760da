//! Two-axis joystick calibration and cross-axis alignment.
//!
//! Calibration runs in two blocking phases so the caller can prompt the user
//! in between:
//!
//! 1. [`AxisCalibrator::center_calibrate`] samples the stick at rest.
//! 2. [`AxisCalibrator::extent_calibrate`] samples while the stick is swept
//!    around its perimeter and keeps the lowest/highest readings seen on each
//!    side of center.
//!
//! Once both axes show at least `travel_threshold` between their extremes the
//! joystick is fully calibrated and both axes are read on one shared scale,
//! the [`AlignmentRange`]. Extremes can also be restored directly with
//! [`AxisCalibrator::set_point`], skipping the sweep.
//!
//! The first extent pass starts both axes' extremes at their centers,
//! replacing any points set earlier. From then on the best extremes are
//! tracked across passes and never reset: a second pass can only widen the
//! range captured by the first. To start over, build a new calibrator.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::axis::{Axis, Extreme, Point};
use crate::scale::scale;
use crate::source::{Clock, SampleSource};

/// Default minimum travel (maximum - minimum) each axis must cover.
pub const AXIS_TRAVEL: u16 = 550;

/// Full-scale reading of a 10-bit converter.
pub const RAW_MAX: u16 = 1023;

/// Calibration points of one axis, in raw converter units.
///
/// All zero until sampled or set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisState {
    pub center: u16,
    pub minimum: u16,
    pub maximum: u16,
}

impl AxisState {
    /// Distance between the extremes; negative if they are inverted.
    pub fn travel(&self) -> i32 {
        i32::from(self.maximum) - i32::from(self.minimum)
    }

    pub fn point(&self, point: Point) -> u16 {
        match point {
            Point::Min => self.minimum,
            Point::Mid => self.center,
            Point::Max => self.maximum,
        }
    }
}

/// Scale shared by both axes once calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentRange {
    pub min: u16,
    pub max: u16,
}

impl AlignmentRange {
    fn of(x: &AxisState, y: &AxisState) -> Self {
        AlignmentRange {
            min: x.minimum.min(y.minimum),
            max: x.maximum.max(y.maximum),
        }
    }
}

/// Best extremes seen so far on one axis.
#[derive(Debug, Clone, Copy)]
struct Tracker {
    lowest: u16,
    highest: u16,
}

impl Tracker {
    fn at(center: u16) -> Self {
        Tracker { lowest: center, highest: center }
    }

    /// A sample counts only if it is past center and beats the best so far.
    fn observe(&mut self, raw: u16, state: &mut AxisState) {
        if raw < state.center && raw < self.lowest {
            self.lowest = raw;
            state.minimum = raw;
        }
        if raw > state.center && raw > self.highest {
            self.highest = raw;
            state.maximum = raw;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Trackers {
    x: Tracker,
    y: Tracker,
}

pub struct AxisCalibrator<S, C> {
    source: S,
    clock: C,
    x_channel: u8,
    y_channel: u8,
    x: AxisState,
    y: AxisState,
    // Seeded on the first extent pass, kept for the calibrator's lifetime.
    // Seeding also moves both extremes of each axis onto its center.
    trackers: Option<Trackers>,
    // Some(_) iff fully calibrated.
    alignment: Option<AlignmentRange>,
    centered: bool,
    travel_threshold: u16,
    raw_max: u16,
}

impl<S: SampleSource, C: Clock> AxisCalibrator<S, C> {
    /// Bind a calibrator to the converter channels of the X and Y axes.
    pub fn new(source: S, clock: C, x_channel: u8, y_channel: u8) -> Self {
        AxisCalibrator {
            source,
            clock,
            x_channel,
            y_channel,
            x: AxisState::default(),
            y: AxisState::default(),
            trackers: None,
            alignment: None,
            centered: false,
            travel_threshold: AXIS_TRAVEL,
            raw_max: RAW_MAX,
        }
    }

    /// Minimum travel each axis must cover to count as calibrated.
    pub fn with_travel_threshold(mut self, travel_threshold: u16) -> Self {
        self.travel_threshold = travel_threshold;
        self
    }

    /// Full-scale raw reading, used by [`Self::read_mapped`] before
    /// calibration.
    pub fn with_raw_max(mut self, raw_max: u16) -> Self {
        self.raw_max = raw_max;
        self
    }

    /// Sample both axes until `duration` has elapsed and keep the last
    /// reading as the center. No averaging.
    ///
    /// Marks the joystick centered even when `duration` is zero and no sample
    /// was taken.
    pub fn center_calibrate(&mut self, duration: Duration) -> Result<(), S::Error> {
        let start = self.clock.elapsed();
        let mut samples = 0u32;

        while self.clock.elapsed().saturating_sub(start) < duration {
            self.x.center = self.source.read(self.x_channel)?;
            self.y.center = self.source.read(self.y_channel)?;
            samples += 1;
        }

        self.centered = true;
        debug!("center window closed after {} samples", samples);
        info!("Center calibrated: X={} Y={}", self.x.center, self.y.center);
        Ok(())
    }

    /// Sweep phase: sample both axes for `duration`, widening the recorded
    /// extremes, then check the travel of both axes.
    ///
    /// Returns `Ok(false)` without sampling if [`Self::center_calibrate`] has
    /// not run yet, and `Ok(false)` if either axis still covers less than the
    /// travel threshold. The first pass moves both extremes onto the center
    /// before sampling. Extremes captured by a failed pass are kept, so
    /// another pass (or [`Self::set_point`]) can complete the calibration.
    pub fn extent_calibrate(&mut self, duration: Duration) -> Result<bool, S::Error> {
        if !self.centered {
            warn!("Extent calibration requested before center calibration");
            return Ok(false);
        }

        let AxisCalibrator {
            source,
            clock,
            x_channel,
            y_channel,
            x,
            y,
            trackers,
            ..
        } = self;
        if trackers.is_none() {
            // Extremes start at center, so an axis swept to one side only
            // still satisfies minimum <= center <= maximum.
            for state in [&mut *x, &mut *y] {
                state.minimum = state.center;
                state.maximum = state.center;
            }
        }
        let trackers = trackers.get_or_insert_with(|| Trackers {
            x: Tracker::at(x.center),
            y: Tracker::at(y.center),
        });

        let start = clock.elapsed();
        let mut samples = 0u32;
        while clock.elapsed().saturating_sub(start) < duration {
            let raw_x = source.read(*x_channel)?;
            let raw_y = source.read(*y_channel)?;
            trackers.x.observe(raw_x, x);
            trackers.y.observe(raw_y, y);
            samples += 1;
        }
        debug!("extent window closed after {} samples", samples);

        if self.check_travel() {
            info!(
                "Extents calibrated: X={}..{} Y={}..{}",
                self.x.minimum, self.x.maximum, self.y.minimum, self.y.maximum
            );
            Ok(true)
        } else {
            warn!(
                "Insufficient travel: X={} Y={} (need {})",
                self.x.travel(),
                self.y.travel(),
                self.travel_threshold
            );
            Ok(false)
        }
    }

    /// Overwrite one extreme, e.g. when restoring stored calibration.
    ///
    /// Completes the calibration as soon as both axes cover the travel
    /// threshold.
    pub fn set_point(&mut self, axis: Axis, extreme: Extreme, value: u16) {
        let state = self.state_mut(axis);
        match extreme {
            Extreme::Min => state.minimum = value,
            Extreme::Max => state.maximum = value,
        }
        debug!("set {} {:?} = {}", axis.name(), extreme, value);

        if self.check_travel() {
            debug!("calibration complete, alignment {:?}", self.alignment);
        }
    }

    pub fn point(&self, axis: Axis, point: Point) -> u16 {
        self.axis_state(axis).point(point)
    }

    /// Read one axis.
    ///
    /// Once calibrated the raw sample is mapped from the axis' own extremes
    /// onto the shared alignment range. Before that it is returned as is.
    pub fn read(&mut self, axis: Axis) -> Result<i32, S::Error> {
        let raw = self.source.read(self.channel(axis))?;
        Ok(self.align(axis, raw))
    }

    /// Read one axis remapped into `[out_min, out_max]`.
    ///
    /// Calibrated readings are mapped from the alignment range, so both axes
    /// land on the same output scale. Uncalibrated readings are mapped from
    /// the full converter range `[0, raw_max]`.
    pub fn read_mapped(&mut self, axis: Axis, out_min: i32, out_max: i32) -> Result<i32, S::Error> {
        let raw = self.source.read(self.channel(axis))?;
        let value = match self.alignment {
            Some(range) => scale(
                self.align(axis, raw),
                i32::from(range.min),
                i32::from(range.max),
                out_min,
                out_max,
            ),
            None => scale(i32::from(raw), 0, i32::from(self.raw_max), out_min, out_max),
        };
        Ok(value)
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn is_calibrated(&self) -> bool {
        self.alignment.is_some()
    }

    /// Shared scale, `None` until fully calibrated.
    ///
    /// Stays at its last value if a later [`Self::set_point`] breaks the
    /// travel threshold.
    pub fn alignment(&self) -> Option<AlignmentRange> {
        self.alignment
    }

    pub fn axis_state(&self, axis: Axis) -> AxisState {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn channel(&self, axis: Axis) -> u8 {
        match axis {
            Axis::X => self.x_channel,
            Axis::Y => self.y_channel,
        }
    }

    pub fn travel_threshold(&self) -> u16 {
        self.travel_threshold
    }

    pub fn raw_max(&self) -> u16 {
        self.raw_max
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_parts(self) -> (S, C) {
        (self.source, self.clock)
    }

    fn state_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    fn align(&self, axis: Axis, raw: u16) -> i32 {
        match self.alignment {
            Some(range) => {
                let state = self.axis_state(axis);
                scale(
                    i32::from(raw),
                    i32::from(state.minimum),
                    i32::from(state.maximum),
                    i32::from(range.min),
                    i32::from(range.max),
                )
            }
            None => i32::from(raw),
        }
    }

    /// Mark the joystick calibrated and realign if both axes cover the
    /// travel threshold. Leaves the previous status alone otherwise.
    fn check_travel(&mut self) -> bool {
        let threshold = i32::from(self.travel_threshold);
        if self.x.travel() >= threshold && self.y.travel() >= threshold {
            self.alignment = Some(AlignmentRange::of(&self.x, &self.y));
            true
        } else {
            false
        }
    }
}
