use juggle_core::Coordinate;

use crate::curve::{Curve, CurveError, Knots, fold_extreme};

/// Piecewise-linear interpolation between knots. Velocities are ignored.
#[derive(Debug, Clone, Default)]
pub struct LineCurve {
    knots: Option<Knots>,
    calculated: bool,
}

impl LineCurve {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn knots(&self) -> Result<&Knots, CurveError> {
        match &self.knots {
            Some(k) if self.calculated => Ok(k),
            _ => Err(CurveError::NotCalculated),
        }
    }

    fn extreme(
        &self,
        t1: f64,
        t2: f64,
        pick: fn(Coordinate, Coordinate) -> Coordinate,
    ) -> Result<Option<Coordinate>, CurveError> {
        let knots = self.knots()?;
        let Some((lo, hi)) = knots.clip(t1, t2) else {
            return Ok(None);
        };
        let inner = knots
            .times
            .iter()
            .zip(&knots.positions)
            .filter(|(t, _)| **t > lo && **t < hi)
            .map(|(_, p)| *p);
        let ends = [self.coordinate(lo)?, self.coordinate(hi)?];
        Ok(fold_extreme(ends.into_iter().chain(inner), pick))
    }
}

impl Curve for LineCurve {
    fn set_curve(
        &mut self,
        positions: &[Coordinate],
        times: &[f64],
        start_velocity: Option<Coordinate>,
        end_velocity: Option<Coordinate>,
    ) -> Result<(), CurveError> {
        self.knots = Some(Knots::new(
            positions,
            times,
            start_velocity,
            end_velocity,
        )?);
        self.calculated = false;
        Ok(())
    }

    fn calc_curve(&mut self) -> Result<(), CurveError> {
        if self.knots.is_none() {
            return Err(CurveError::NotCalculated);
        }
        self.calculated = true;
        Ok(())
    }

    fn coordinate(&self, t: f64) -> Result<Coordinate, CurveError> {
        let knots = self.knots()?;
        let i = knots.segment_index(t);
        let (t0, t1) = (knots.times[i], knots.times[i + 1]);
        let frac = (t - t0) / (t1 - t0);
        Ok(knots.positions[i].lerp(knots.positions[i + 1], frac))
    }

    fn max(&self, t1: f64, t2: f64) -> Result<Option<Coordinate>, CurveError> {
        self.extreme(t1, t2, Coordinate::max)
    }

    fn min(&self, t1: f64, t2: f64) -> Result<Option<Coordinate>, CurveError> {
        self.extreme(t1, t2, Coordinate::min)
    }

    fn start_time(&self) -> f64 {
        self.knots.as_ref().map_or(0.0, Knots::start_time)
    }

    fn end_time(&self) -> f64 {
        self.knots.as_ref().map_or(0.0, Knots::end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn curve() -> LineCurve {
        let mut c = LineCurve::new();
        c.set_curve(
            &[
                Coordinate::new(0.0, 0.0, 0.0),
                Coordinate::new(10.0, 0.0, 5.0),
                Coordinate::new(10.0, 10.0, -5.0),
            ],
            &[0.0, 1.0, 3.0],
            None,
            None,
        )
        .unwrap();
        c.calc_curve().unwrap();
        c
    }

    #[test]
    fn interpolates_within_segments() {
        let c = curve();
        let p = c.coordinate(0.5).unwrap();
        assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z, 2.5, epsilon = 1e-12);
        let p = c.coordinate(2.0).unwrap();
        assert_abs_diff_eq!(p.y, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn extrema_use_knots_inside_window() {
        let c = curve();
        let max = c.max(0.0, 3.0).unwrap().unwrap();
        assert_eq!(max, Coordinate::new(10.0, 10.0, 5.0));
        let min = c.min(0.5, 2.0).unwrap().unwrap();
        assert_abs_diff_eq!(min.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(min.z, 0.0, epsilon = 1e-12);
        assert!(c.max(4.0, 5.0).unwrap().is_none());
    }

    #[test]
    fn evaluation_requires_calc() {
        let mut c = LineCurve::new();
        c.set_curve(
            &[Coordinate::ZERO, Coordinate::new(1.0, 1.0, 1.0)],
            &[0.0, 1.0],
            None,
            None,
        )
        .unwrap();
        assert_eq!(c.coordinate(0.5), Err(CurveError::NotCalculated));
    }
}
