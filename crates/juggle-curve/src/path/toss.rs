use juggle_core::Coordinate;

use super::{GRAVITY, Params, Path, PathError, PathKind, param_f64, reject_unknown};

/// Ballistic flight: horizontal motion is uniform, vertical motion is under
/// constant gravity `g` (modifier `g=<cm/s^2>`).
#[derive(Debug, Clone)]
pub struct TossPath {
    start: Coordinate,
    start_time: f64,
    end_time: f64,
    velocity: Coordinate,
    g: f64,
}

impl TossPath {
    pub(crate) fn new(
        params: &Params,
        start: Coordinate,
        start_time: f64,
        end: Coordinate,
        end_time: f64,
    ) -> Result<Self, PathError> {
        reject_unknown(PathKind::Toss, params, &["g"])?;
        let g = param_f64(params, "g", GRAVITY)?;
        let duration = end_time - start_time;
        let delta = end - start;
        let velocity = Coordinate::new(
            delta.x / duration,
            delta.y / duration,
            (delta.z + 0.5 * g * duration * duration) / duration,
        );
        Ok(Self {
            start,
            start_time,
            end_time,
            velocity,
            g,
        })
    }

    /// Time the vertical velocity crosses zero, if it ever does.
    fn turn_time(&self) -> Option<f64> {
        (self.g != 0.0).then(|| self.start_time + self.velocity.z / self.g)
    }

    fn extreme(
        &self,
        t1: f64,
        t2: f64,
        pick: fn(Coordinate, Coordinate) -> Coordinate,
    ) -> Option<Coordinate> {
        let (lo, hi) = clip(self.start_time, self.end_time, t1, t2)?;
        let mut out = pick(self.coordinate(lo), self.coordinate(hi));
        if let Some(turn) = self.turn_time().filter(|t| *t > lo && *t < hi) {
            out = pick(out, self.coordinate(turn));
        }
        Some(out)
    }
}

impl Path for TossPath {
    fn kind(&self) -> PathKind {
        PathKind::Toss
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }

    fn coordinate(&self, t: f64) -> Coordinate {
        let s = t - self.start_time;
        Coordinate::new(
            self.start.x + self.velocity.x * s,
            self.start.y + self.velocity.y * s,
            self.start.z + self.velocity.z * s - 0.5 * self.g * s * s,
        )
    }

    fn start_velocity(&self) -> Coordinate {
        self.velocity
    }

    fn end_velocity(&self) -> Coordinate {
        let s = self.end_time - self.start_time;
        Coordinate::new(
            self.velocity.x,
            self.velocity.y,
            self.velocity.z - self.g * s,
        )
    }

    fn max(&self, t1: f64, t2: f64) -> Option<Coordinate> {
        self.extreme(t1, t2, Coordinate::max)
    }

    fn min(&self, t1: f64, t2: f64) -> Option<Coordinate> {
        self.extreme(t1, t2, Coordinate::min)
    }
}

pub(crate) fn clip(start: f64, end: f64, t1: f64, t2: f64) -> Option<(f64, f64)> {
    let lo = t1.max(start);
    let hi = t2.min(end);
    (lo <= hi).then_some((lo, hi))
}
