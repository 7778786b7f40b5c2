use juggle_core::Coordinate;

use super::toss::clip;
use super::{GRAVITY, Params, Path, PathError, PathKind, param_bool, param_f64, reject_unknown};

const SCAN_STEPS: usize = 2000;
const BISECT_STEPS: usize = 80;

/// Flight that strikes a horizontal floor one or more times before the catch.
///
/// Modifiers: `bounces` (default 1), `bounceplane` (floor height, default 0),
/// `bouncefrac` (speed kept per bounce, default 0.9), `g`, `forced` (the prop
/// must leave the hand moving down), `hyper` (caught while falling rather
/// than rising after the last bounce).
#[derive(Debug, Clone)]
pub struct BouncePath {
    start: Coordinate,
    start_time: f64,
    end_time: f64,
    horizontal: (f64, f64),
    floor: f64,
    g: f64,
    arcs: Vec<Arc>,
    end_vz: f64,
}

/// One parabola between floor contacts.
#[derive(Debug, Clone, Copy)]
struct Arc {
    t0: f64,
    z0: f64,
    vz0: f64,
}

struct Settings {
    bounces: usize,
    floor: f64,
    frac: f64,
    g: f64,
}

impl BouncePath {
    pub(crate) fn new(
        params: &Params,
        start: Coordinate,
        start_time: f64,
        end: Coordinate,
        end_time: f64,
    ) -> Result<Self, PathError> {
        reject_unknown(
            PathKind::Bounce,
            params,
            &["bounces", "bounceplane", "bouncefrac", "g", "forced", "hyper"],
        )?;
        let bounces = param_f64(params, "bounces", 1.0)?;
        if bounces < 1.0 || bounces.fract() != 0.0 {
            return Err(PathError::InvalidParameter {
                key: "bounces".to_string(),
                value: bounces.to_string(),
            });
        }
        let frac = param_f64(params, "bouncefrac", 0.9)?;
        if !(frac > 0.0 && frac <= 1.0) {
            return Err(PathError::InvalidParameter {
                key: "bouncefrac".to_string(),
                value: frac.to_string(),
            });
        }
        let g = param_f64(params, "g", GRAVITY)?;
        if g <= 0.0 {
            return Err(PathError::InvalidParameter {
                key: "g".to_string(),
                value: g.to_string(),
            });
        }
        let settings = Settings {
            bounces: bounces as usize,
            floor: param_f64(params, "bounceplane", 0.0)?,
            frac,
            g,
        };
        let forced = param_bool(params, "forced", false)?;
        let hyper = param_bool(params, "hyper", false)?;

        if start.z <= settings.floor || end.z <= settings.floor {
            return Err(PathError::BounceInfeasible {
                reason: "throw and catch must both be above the floor".to_string(),
            });
        }

        let duration = end_time - start_time;
        let vz0 = solve_launch_speed(&settings, start.z, end.z, duration, forced, hyper)?;
        let (arcs, end_vz) = simulate(&settings, start.z, vz0, duration).ok_or_else(|| {
            PathError::BounceInfeasible {
                reason: "solver converged outside the bounce count".to_string(),
            }
        })?;

        Ok(Self {
            start,
            start_time,
            end_time,
            horizontal: (
                (end.x - start.x) / duration,
                (end.y - start.y) / duration,
            ),
            floor: settings.floor,
            g,
            arcs: arcs
                .into_iter()
                .map(|a| Arc {
                    t0: a.t0 + start_time,
                    ..a
                })
                .collect(),
            end_vz,
        })
    }

    fn arc_at(&self, t: f64) -> &Arc {
        let i = self.arcs.partition_point(|a| a.t0 <= t).saturating_sub(1);
        &self.arcs[i]
    }

    fn height(&self, t: f64) -> f64 {
        let arc = self.arc_at(t);
        let s = t - arc.t0;
        arc.z0 + arc.vz0 * s - 0.5 * self.g * s * s
    }

    fn extreme(
        &self,
        t1: f64,
        t2: f64,
        pick: fn(Coordinate, Coordinate) -> Coordinate,
    ) -> Option<Coordinate> {
        let (lo, hi) = clip(self.start_time, self.end_time, t1, t2)?;
        let mut out = pick(self.coordinate(lo), self.coordinate(hi));
        for arc in &self.arcs {
            // Floor contacts and apexes are the only interior turning points.
            let apex = arc.t0 + arc.vz0 / self.g;
            for t in [arc.t0, apex] {
                if t > lo && t < hi {
                    out = pick(out, self.coordinate(t));
                }
            }
        }
        Some(out)
    }
}

impl Path for BouncePath {
    fn kind(&self) -> PathKind {
        PathKind::Bounce
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
            self.start.x + self.horizontal.0 * s,
            self.start.y + self.horizontal.1 * s,
            self.height(t).max(self.floor),
        )
    }

    fn start_velocity(&self) -> Coordinate {
        Coordinate::new(self.horizontal.0, self.horizontal.1, self.arcs[0].vz0)
    }

    fn end_velocity(&self) -> Coordinate {
        Coordinate::new(self.horizontal.0, self.horizontal.1, self.end_vz)
    }

    fn max(&self, t1: f64, t2: f64) -> Option<Coordinate> {
        self.extreme(t1, t2, Coordinate::max)
    }

    fn min(&self, t1: f64, t2: f64) -> Option<Coordinate> {
        self.extreme(t1, t2, Coordinate::min)
    }
}

/// Follow the prop from launch for `duration` seconds. Returns the arcs (times
/// relative to launch) and the vertical speed at the end, or `None` if the
/// prop does not bounce exactly `settings.bounces` times in that span.
fn simulate(settings: &Settings, z0: f64, vz0: f64, duration: f64) -> Option<(Vec<Arc>, f64)> {
    let g = settings.g;
    let mut arcs = vec![Arc {
        t0: 0.0,
        z0,
        vz0,
    }];
    loop {
        let arc = *arcs.last()?;
        // Positive root of z0 + v s - g s^2 / 2 = floor.
        let rise = arc.z0 - settings.floor;
        let disc = arc.vz0 * arc.vz0 + 2.0 * g * rise;
        let hit = arc.t0 + (arc.vz0 + disc.max(0.0).sqrt()) / g;
        if hit >= duration {
            break;
        }
        if arcs.len() > settings.bounces {
            return None;
        }
        let impact = arc.vz0 - g * (hit - arc.t0);
        arcs.push(Arc {
            t0: hit,
            z0: settings.floor,
            vz0: -impact * settings.frac,
        });
    }
    if arcs.len() != settings.bounces + 1 {
        return None;
    }
    let last = arcs[arcs.len() - 1];
    let end_vz = last.vz0 - g * (duration - last.t0);
    Some((arcs, end_vz))
}

fn end_height(settings: &Settings, z0: f64, vz0: f64, duration: f64) -> Option<(f64, f64)> {
    let (arcs, end_vz) = simulate(settings, z0, vz0, duration)?;
    let last = arcs[arcs.len() - 1];
    let s = duration - last.t0;
    Some((last.z0 + last.vz0 * s - 0.5 * settings.g * s * s, end_vz))
}

/// Scan launch speeds for sign changes of the landing error, refine each by
/// bisection, and keep the gentlest launch that matches the catch direction.
fn solve_launch_speed(
    settings: &Settings,
    z0: f64,
    z1: f64,
    duration: f64,
    forced: bool,
    hyper: bool,
) -> Result<f64, PathError> {
    let limit = 4.0 * (settings.g * duration + (z1 - z0).abs() / duration) + 1000.0;
    let lo_limit = -limit;
    let hi_limit = if forced { 0.0 } else { limit };
    let step = (hi_limit - lo_limit) / SCAN_STEPS as f64;

    let error = |v: f64| end_height(settings, z0, v, duration).map(|(z, vz)| (z - z1, vz));

    let mut best: Option<f64> = None;
    let mut prev: Option<(f64, f64)> = None;
    for i in 0..=SCAN_STEPS {
        let v = lo_limit + step * i as f64;
        let cur = error(v).map(|(e, _)| (v, e));
        if let (Some((pv, pe)), Some((cv, ce))) = (prev, cur) {
            if pe == 0.0 || pe.signum() != ce.signum() {
                let root = bisect(&error, pv, cv, pe);
                let matches_direction = error(root).is_some_and(|(e, vz)| {
                    e.abs() < 1e-6 && if hyper { vz < 0.0 } else { vz > 0.0 }
                });
                if matches_direction && best.is_none_or(|b| root.abs() < b.abs()) {
                    best = Some(root);
                }
            }
        }
        prev = cur;
    }

    best.ok_or_else(|| PathError::BounceInfeasible {
        reason: format!(
            "no launch speed gives {} bounce(s) in {duration:.3}s",
            settings.bounces
        ),
    })
}

fn bisect(error: &impl Fn(f64) -> Option<(f64, f64)>, mut a: f64, mut b: f64, mut ea: f64) -> f64 {
    for _ in 0..BISECT_STEPS {
        let mid = 0.5 * (a + b);
        let Some((em, _)) = error(mid) else {
            break;
        };
        if em == 0.0 {
            return mid;
        }
        if em.signum() == ea.signum() {
            a = mid;
            ea = em;
        } else {
            b = mid;
        }
    }
    0.5 * (a + b)
}
