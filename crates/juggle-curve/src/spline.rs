use std::ops::{Add, Mul, Sub};

use juggle_core::Coordinate;

use crate::curve::{Curve, CurveError, Knots, fold_extreme};

/// One cubic piece: `a + b*s + c*s^2 + d*s^3` with `s = t - t0`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    t0: f64,
    a: Coordinate,
    b: Coordinate,
    c: Coordinate,
    d: Coordinate,
}

impl Segment {
    fn hermite(
        t0: f64,
        h: f64,
        p0: Coordinate,
        p1: Coordinate,
        v0: Coordinate,
        v1: Coordinate,
    ) -> Self {
        let slope = (p1 - p0) * (1.0 / h);
        Self {
            t0,
            a: p0,
            b: v0,
            c: (slope * 3.0 - v0 * 2.0 - v1) * (1.0 / h),
            d: (v0 + v1 - slope * 2.0) * (1.0 / (h * h)),
        }
    }

    fn position(&self, t: f64) -> Coordinate {
        let s = t - self.t0;
        self.a + (self.b + (self.c + self.d * s) * s) * s
    }

    fn velocity(&self, t: f64) -> Coordinate {
        let s = t - self.t0;
        self.b + (self.c * 2.0 + self.d * (3.0 * s)) * s
    }

    /// Times in `(lo, hi)` where some axis has zero velocity.
    fn stationary_times(&self, lo: f64, hi: f64) -> Vec<f64> {
        let axes = [
            (self.b.x, self.c.x, self.d.x),
            (self.b.y, self.c.y, self.d.y),
            (self.b.z, self.c.z, self.d.z),
        ];
        let mut out = Vec::new();
        for (b, c, d) in axes {
            // b + 2c s + 3d s^2 = 0
            for s in quadratic_roots(3.0 * d, 2.0 * c, b) {
                let t = self.t0 + s;
                if t > lo && t < hi {
                    out.push(t);
                }
            }
        }
        out
    }
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    vec![(-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)]
}

/// Piecewise cubic through every knot with continuous velocity.
///
/// Interior knot velocities are chosen so acceleration is continuous too. The
/// ends are clamped to the supplied velocities; a missing end velocity gets a
/// zero-acceleration (natural) end, and when both are missing the curve is
/// solved as a closed loop whose end velocity and acceleration equal its start
/// values.
#[derive(Debug, Clone, Default)]
pub struct SplineCurve {
    knots: Option<Knots>,
    segments: Vec<Segment>,
}

impl SplineCurve {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn solved(&self) -> Result<(&Knots, &[Segment]), CurveError> {
        match &self.knots {
            Some(k) if !self.segments.is_empty() => Ok((k, self.segments.as_slice())),
            _ => Err(CurveError::NotCalculated),
        }
    }

    pub fn velocity(&self, t: f64) -> Result<Coordinate, CurveError> {
        let (knots, segments) = self.solved()?;
        Ok(segments[knots.segment_index(t)].velocity(t))
    }

    fn extreme(
        &self,
        t1: f64,
        t2: f64,
        pick: fn(Coordinate, Coordinate) -> Coordinate,
    ) -> Result<Option<Coordinate>, CurveError> {
        let (knots, segments) = self.solved()?;
        let Some((lo, hi)) = knots.clip(t1, t2) else {
            return Ok(None);
        };
        let mut candidates = vec![self.coordinate(lo)?, self.coordinate(hi)?];
        for (i, seg) in segments.iter().enumerate() {
            let seg_lo = knots.times[i].max(lo);
            let seg_hi = knots.times[i + 1].min(hi);
            if seg_lo > seg_hi {
                continue;
            }
            candidates.push(seg.position(seg_lo));
            candidates.push(seg.position(seg_hi));
            candidates.extend(
                seg.stationary_times(seg_lo, seg_hi)
                    .into_iter()
                    .map(|t| seg.position(t)),
            );
        }
        Ok(fold_extreme(candidates, pick))
    }
}

impl Curve for SplineCurve {
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
        self.segments.clear();
        Ok(())
    }

    fn calc_curve(&mut self) -> Result<(), CurveError> {
        let knots = self.knots.as_ref().ok_or(CurveError::NotCalculated)?;
        let velocities = match (knots.start_velocity, knots.end_velocity) {
            (None, None) => closed_velocities(knots),
            (start, end) => open_velocities(knots, start, end),
        };
        if velocities.iter().any(|v| !v.is_finite()) {
            return Err(CurveError::NonFinite);
        }

        let n = knots.times.len();
        self.segments = (0..n - 1)
            .map(|i| {
                let h = knots.times[i + 1] - knots.times[i];
                Segment::hermite(
                    knots.times[i],
                    h,
                    knots.positions[i],
                    knots.positions[i + 1],
                    velocities[i],
                    velocities[i + 1],
                )
            })
            .collect();
        tracing::trace!(knots = n, "spline solved");
        Ok(())
    }

    fn coordinate(&self, t: f64) -> Result<Coordinate, CurveError> {
        let (knots, segments) = self.solved()?;
        Ok(segments[knots.segment_index(t)].position(t))
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

/// Knot velocities for a curve with at least one clamped end.
fn open_velocities(
    knots: &Knots,
    start: Option<Coordinate>,
    end: Option<Coordinate>,
) -> Vec<Coordinate> {
    let n = knots.times.len();
    let h: Vec<f64> = knots.times.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<Coordinate> = (0..n - 1)
        .map(|i| (knots.positions[i + 1] - knots.positions[i]) * (1.0 / h[i]))
        .collect();

    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![Coordinate::ZERO; n];

    match start {
        Some(v) => {
            diag[0] = 1.0;
            rhs[0] = v;
        }
        None => {
            diag[0] = 2.0;
            sup[0] = 1.0;
            rhs[0] = slope[0] * 3.0;
        }
    }
    for i in 1..n - 1 {
        sub[i] = 1.0 / h[i - 1];
        diag[i] = 2.0 * (1.0 / h[i - 1] + 1.0 / h[i]);
        sup[i] = 1.0 / h[i];
        rhs[i] = (slope[i - 1] * (1.0 / h[i - 1]) + slope[i] * (1.0 / h[i])) * 3.0;
    }
    match end {
        Some(v) => {
            diag[n - 1] = 1.0;
            rhs[n - 1] = v;
        }
        None => {
            sub[n - 1] = 1.0;
            diag[n - 1] = 2.0;
            rhs[n - 1] = slope[n - 2] * 3.0;
        }
    }

    solve_tridiagonal(&sub, &diag, &sup, &rhs)
}

/// Knot velocities for a closed loop: `v[n-1] == v[0]` and acceleration
/// matches across the wrap, giving a cyclic tridiagonal system in `n - 1`
/// unknowns.
fn closed_velocities(knots: &Knots) -> Vec<Coordinate> {
    let n = knots.times.len();
    let m = n - 1;
    let h: Vec<f64> = knots.times.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<Coordinate> = (0..m)
        .map(|i| (knots.positions[i + 1] - knots.positions[i]) * (1.0 / h[i]))
        .collect();

    // Row i couples v[i-1], v[i], v[i+1] with indices taken mod m.
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![Coordinate::ZERO; m];
    for i in 0..m {
        let before = (i + m - 1) % m;
        sub[i] = 1.0 / h[before];
        diag[i] = 2.0 * (1.0 / h[before] + 1.0 / h[i]);
        sup[i] = 1.0 / h[i];
        rhs[i] = (slope[before] * (1.0 / h[before]) + slope[i] * (1.0 / h[i])) * 3.0;
    }

    let mut v = match m {
        1 => vec![rhs[0] * (1.0 / (diag[0] + sub[0] + sup[0]))],
        2 => {
            // Both off-diagonal entries of each row hit the other unknown.
            let (a00, a01) = (diag[0], sub[0] + sup[0]);
            let (a10, a11) = (sub[1] + sup[1], diag[1]);
            let det = a00 * a11 - a01 * a10;
            vec![
                (rhs[0] * a11 - rhs[1] * a01) * (1.0 / det),
                (rhs[1] * a00 - rhs[0] * a10) * (1.0 / det),
            ]
        }
        _ => solve_cyclic_tridiagonal(&sub, &diag, &sup, &rhs),
    };
    v.push(v[0]);
    v
}

/// Thomas algorithm. `sub[0]` and `sup[n-1]` are ignored.
pub(crate) fn solve_tridiagonal<T>(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    rhs: &[T],
) -> Vec<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let n = diag.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime: Vec<T> = Vec::with_capacity(n);

    c_prime[0] = sup[0] / diag[0];
    d_prime.push(rhs[0] * (1.0 / diag[0]));
    for i in 1..n {
        let denom = diag[i] - sub[i] * c_prime[i - 1];
        c_prime[i] = if i + 1 < n { sup[i] / denom } else { 0.0 };
        d_prime.push((rhs[i] - d_prime[i - 1] * sub[i]) * (1.0 / denom));
    }

    let mut x = d_prime;
    for i in (0..n - 1).rev() {
        x[i] = x[i] - x[i + 1] * c_prime[i];
    }
    x
}

/// Sherman-Morrison reduction of a cyclic tridiagonal system to two plain
/// ones. `sub[0]` is the top-right corner and `sup[n-1]` the bottom-left.
fn solve_cyclic_tridiagonal<T>(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    rhs: &[T],
) -> Vec<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let n = diag.len();
    let beta = sub[0];
    let alpha = sup[n - 1];
    let gamma = -diag[0];

    let mut modified = diag.to_vec();
    modified[0] = diag[0] - gamma;
    modified[n - 1] = diag[n - 1] - alpha * beta / gamma;

    let x = solve_tridiagonal(sub, &modified, sup, rhs);

    let mut u = vec![0.0; n];
    u[0] = gamma;
    u[n - 1] = alpha;
    let z = solve_tridiagonal(sub, &modified, sup, &u);

    let denom = 1.0 + z[0] + beta * z[n - 1] / gamma;
    let fact = (x[0] + x[n - 1] * (beta / gamma)) * (1.0 / denom);
    x.iter()
        .zip(&z)
        .map(|(&xi, &zi)| xi - fact * zi)
        .collect()
}
