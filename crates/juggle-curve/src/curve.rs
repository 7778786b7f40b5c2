use std::fmt;

use juggle_core::Coordinate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("a curve needs at least two knots, got {count}")]
    TooFewKnots { count: usize },

    #[error("{positions} positions but {times} times")]
    LengthMismatch { positions: usize, times: usize },

    #[error("knot times must increase (knot {index} at t={time})")]
    TimesNotIncreasing { index: usize, time: f64 },

    #[error("curve has not been calculated")]
    NotCalculated,

    #[error("curve solve produced a non-finite value")]
    NonFinite,
}

/// A function from time to position through an ordered set of knots.
///
/// Call [`Curve::set_curve`] then [`Curve::calc_curve`] before evaluating.
/// Evaluation outside `[start_time, end_time]` extends the nearest segment;
/// wrapping time into the curve's range is the caller's job.
pub trait Curve: fmt::Debug + Send + Sync {
    fn set_curve(
        &mut self,
        positions: &[Coordinate],
        times: &[f64],
        start_velocity: Option<Coordinate>,
        end_velocity: Option<Coordinate>,
    ) -> Result<(), CurveError>;

    fn calc_curve(&mut self) -> Result<(), CurveError>;

    fn coordinate(&self, t: f64) -> Result<Coordinate, CurveError>;

    /// Component-wise maximum over `[t1, t2]` clipped to the curve's range.
    fn max(&self, t1: f64, t2: f64) -> Result<Option<Coordinate>, CurveError>;

    /// Component-wise minimum over `[t1, t2]` clipped to the curve's range.
    fn min(&self, t1: f64, t2: f64) -> Result<Option<Coordinate>, CurveError>;

    fn start_time(&self) -> f64;

    fn end_time(&self) -> f64;
}

/// Knot data shared by the curve implementations.
#[derive(Debug, Clone, Default)]
pub(crate) struct Knots {
    pub positions: Vec<Coordinate>,
    pub times: Vec<f64>,
    pub start_velocity: Option<Coordinate>,
    pub end_velocity: Option<Coordinate>,
}

impl Knots {
    pub fn new(
        positions: &[Coordinate],
        times: &[f64],
        start_velocity: Option<Coordinate>,
        end_velocity: Option<Coordinate>,
    ) -> Result<Self, CurveError> {
        if positions.len() != times.len() {
            return Err(CurveError::LengthMismatch {
                positions: positions.len(),
                times: times.len(),
            });
        }
        if positions.len() < 2 {
            return Err(CurveError::TooFewKnots {
                count: positions.len(),
            });
        }
        for (i, w) in times.windows(2).enumerate() {
            if !(w[1] > w[0]) {
                return Err(CurveError::TimesNotIncreasing {
                    index: i + 1,
                    time: w[1],
                });
            }
        }
        Ok(Self {
            positions: positions.to_vec(),
            times: times.to_vec(),
            start_velocity,
            end_velocity,
        })
    }

    /// Index of the segment that should evaluate `t`.
    pub fn segment_index(&self, t: f64) -> usize {
        let last = self.times.len() - 2;
        self.times.partition_point(|&k| k <= t).saturating_sub(1).min(last)
    }

    pub fn start_time(&self) -> f64 {
        self.times.first().copied().unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// `[t1, t2]` clipped to the knot range, `None` if they do not overlap.
    pub fn clip(&self, t1: f64, t2: f64) -> Option<(f64, f64)> {
        let lo = t1.max(self.start_time());
        let hi = t2.min(self.end_time());
        (lo <= hi).then_some((lo, hi))
    }
}

/// Fold an iterator of coordinates into a component-wise extreme.
pub(crate) fn fold_extreme(
    points: impl IntoIterator<Item = Coordinate>,
    pick: fn(Coordinate, Coordinate) -> Coordinate,
) -> Option<Coordinate> {
    points.into_iter().reduce(pick)
}
