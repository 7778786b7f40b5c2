//! Where each juggler stands and faces over one loop.

use juggle_core::Coordinate;
use juggle_curve::{Curve, CurveError, LineCurve, SplineCurve};
use nalgebra::{Rotation3, Vector3};
use tracing::warn;

use super::images::TIME_EPSILON;
use crate::event::Position;

/// Hands work this far in front of the juggler's body, in local y.
pub const PATTERN_Y: f64 = 30.0;

/// Height of the juggler reference point when no position is declared.
pub const DEFAULT_HEIGHT: f64 = 100.0;

/// Radius of the circle several undeclared jugglers stand on.
pub const DEFAULT_RADIUS: f64 = 70.0;

/// Placement for a juggler with no declared positions: the origin for a solo
/// juggler, otherwise evenly spaced on a circle facing its center.
#[must_use]
pub fn default_placement(juggler: usize, jugglers: usize) -> (Coordinate, f64) {
    if jugglers <= 1 {
        return (Coordinate::new(0.0, 0.0, DEFAULT_HEIGHT), 0.0);
    }
    let a = 360.0 * (juggler - 1) as f64 / jugglers as f64;
    let r = a.to_radians();
    (
        Coordinate::new(DEFAULT_RADIUS * r.cos(), DEFAULT_RADIUS * r.sin(), DEFAULT_HEIGHT),
        a + 90.0,
    )
}

/// Rotate a juggler-local vector into the world frame by the facing angle in
/// degrees.
#[must_use]
pub fn rotate(local: Coordinate, angle: f64) -> Coordinate {
    let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), angle.to_radians());
    Coordinate::from(rot * Vector3::from(local))
}

/// Convert a hand position in a juggler's frame to world coordinates.
#[must_use]
pub fn local_to_global(local: Coordinate, position: Coordinate, angle: f64) -> Coordinate {
    let shifted = Coordinate::new(local.x, local.y + PATTERN_Y, local.z);
    position + rotate(shifted, angle)
}

#[derive(Debug)]
enum Track {
    Fixed {
        position: Coordinate,
        angle: f64,
    },
    /// Curves over one loop starting at `start`. Position is a closed
    /// spline; the angle turns at a constant rate between declared positions.
    Moving {
        start: f64,
        position: SplineCurve,
        angle: LineCurve,
    },
}

/// Body position and facing angle of one juggler, periodic over the loop.
#[derive(Debug)]
pub struct JugglerTrack {
    track: Track,
    period: f64,
}

impl JugglerTrack {
    /// Build from the juggler's declared positions. Only positions inside
    /// `[loop_start, loop_end)` are used.
    pub(crate) fn build(
        juggler: usize,
        jugglers: usize,
        positions: &[&Position],
        loop_start: f64,
        loop_end: f64,
    ) -> Result<Self, CurveError> {
        let period = loop_end - loop_start;
        let mut knots: Vec<&Position> = Vec::with_capacity(positions.len());
        for p in positions {
            if p.t < loop_start - TIME_EPSILON || p.t >= loop_end - TIME_EPSILON {
                warn!(juggler, t = p.t, "position outside the loop ignored");
                continue;
            }
            if knots.iter().any(|k| (k.t - p.t).abs() < TIME_EPSILON) {
                warn!(juggler, t = p.t, "duplicate position time ignored");
                continue;
            }
            knots.push(p);
        }
        knots.sort_by(|a, b| a.t.total_cmp(&b.t));

        let track = match knots.as_slice() {
            [] => {
                let (position, angle) = default_placement(juggler, jugglers);
                Track::Fixed { position, angle }
            }
            [only] => Track::Fixed {
                position: only.coordinate,
                angle: only.angle,
            },
            [first, ..] => {
                let mut times: Vec<f64> = knots.iter().map(|k| k.t).collect();
                times.push(first.t + period);
                let mut coords: Vec<Coordinate> = knots.iter().map(|k| k.coordinate).collect();
                coords.push(first.coordinate);

                // Unwrap so consecutive angles never jump by more than half a turn.
                let mut angles = vec![first.angle];
                for k in knots.iter().skip(1).chain(std::iter::once(first)) {
                    let prev = angles[angles.len() - 1];
                    angles.push(prev + wrap_degrees(k.angle - prev));
                }
                let angle_knots: Vec<Coordinate> =
                    angles.iter().map(|a| Coordinate::new(*a, 0.0, 0.0)).collect();

                let mut position = SplineCurve::new();
                position.set_curve(&coords, &times, None, None)?;
                position.calc_curve()?;
                let mut angle = LineCurve::new();
                angle.set_curve(&angle_knots, &times, None, None)?;
                angle.calc_curve()?;
                Track::Moving {
                    start: first.t,
                    position,
                    angle,
                }
            }
        };
        Ok(Self { track, period })
    }

    /// Move `t` into the span the curves are defined on.
    fn wrap(&self, start: f64, t: f64) -> f64 {
        start + (t - start).rem_euclid(self.period)
    }

    pub fn position(&self, t: f64) -> Result<Coordinate, CurveError> {
        match &self.track {
            Track::Fixed { position, .. } => Ok(*position),
            Track::Moving {
                start, position, ..
            } => position.coordinate(self.wrap(*start, t)),
        }
    }

    /// Facing angle in degrees.
    pub fn angle(&self, t: f64) -> Result<f64, CurveError> {
        match &self.track {
            Track::Fixed { angle, .. } => Ok(*angle),
            Track::Moving { start, angle, .. } => Ok(angle.coordinate(self.wrap(*start, t))?.x),
        }
    }

    pub fn to_global(&self, local: Coordinate, t: f64) -> Result<Coordinate, CurveError> {
        Ok(local_to_global(local, self.position(t)?, self.angle(t)?))
    }

    /// Bounding box of the reference point over one loop.
    pub fn bounds(&self) -> Result<(Coordinate, Coordinate), CurveError> {
        match &self.track {
            Track::Fixed { position, .. } => Ok((*position, *position)),
            Track::Moving { position, .. } => {
                let (lo, hi) = (position.start_time(), position.end_time());
                let max = position.max(lo, hi)?.ok_or(CurveError::NotCalculated)?;
                let min = position.min(lo, hi)?.ok_or(CurveError::NotCalculated)?;
                Ok((min, max))
            }
        }
    }
}

/// Map an angle difference into `(-180, 180]`.
fn wrap_degrees(d: f64) -> f64 {
    let r = d.rem_euclid(360.0);
    if r > 180.0 { r - 360.0 } else { r }
}
