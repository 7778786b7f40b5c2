//! The symmetry group of a pattern and the images it makes of a seed event.

use juggle_core::Permutation;
use tracing::debug;

use crate::error::UserError;
use crate::event::Event;
use crate::symmetry::{Symmetry, SymmetryKind};

/// Two event times closer than this are the same instant.
pub(crate) const TIME_EPSILON: f64 = 1e-9;

const GROUP_LIMIT: usize = 512;

/// Time shift plus juggler and path relabelling.
#[derive(Debug, Clone)]
pub(crate) struct Transform {
    pub dt: f64,
    pub jugglers: Permutation,
    pub paths: Permutation,
}

impl Transform {
    pub fn identity(jugglers: usize, paths: usize) -> Self {
        Self {
            dt: 0.0,
            jugglers: Permutation::identity(jugglers, true),
            paths: Permutation::identity(paths, true),
        }
    }

    fn from_symmetry(symmetry: &Symmetry, dt: f64) -> Self {
        Self {
            dt,
            jugglers: symmetry.juggler_permutation().clone(),
            paths: symmetry.path_permutation().clone(),
        }
    }

    /// `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            dt: self.dt + next.dt,
            jugglers: self.jugglers.then(&next.jugglers),
            paths: self.paths.then(&next.paths),
        }
    }

    pub fn power(&self, exp: i64) -> Transform {
        Transform {
            dt: self.dt * exp as f64,
            jugglers: self.jugglers.power(exp),
            paths: self.paths.power(exp),
        }
    }

    fn same_as(&self, other: &Transform) -> bool {
        let same_perm = |a: &Permutation, b: &Permutation| {
            (1..=a.size() as i32).all(|i| a.mapping(i) == b.mapping(i))
        };
        (self.dt - other.dt).abs() < TIME_EPSILON
            && same_perm(&self.jugglers, &other.jugglers)
            && same_perm(&self.paths, &other.paths)
    }

    /// Move `event` by this transform. A juggler marked with a hand exchange
    /// has its hands swapped and its local x mirrored.
    pub fn apply(&self, event: &Event) -> Event {
        let mut out = event.clone();
        out.t = event.t + self.dt;
        out.juggler = self.jugglers.target(event.juggler);
        if self.jugglers.flips(event.juggler) {
            out.hand = event.hand.other();
            out.local.x = -event.local.x;
        }
        for tr in &mut out.transitions {
            tr.path = self.paths.target(tr.path);
        }
        out
    }
}

/// Coset representatives of the symmetry group modulo the delay, sorted by
/// time offset in `[0, delay)`.
///
/// Image `k` of a seed is `reps[k mod n]` followed by `delay^(k div n)`, so
/// images are ordered in time and image `k + n` is the pure-delay image of
/// image `k`.
#[derive(Debug, Clone)]
pub(crate) struct SymmetryGroup {
    delay: Transform,
    reps: Vec<Transform>,
}

impl SymmetryGroup {
    pub fn new(symmetries: &[Symmetry], jugglers: usize, paths: usize) -> Result<Self, UserError> {
        let delays: Vec<&Symmetry> = symmetries
            .iter()
            .filter(|s| s.kind() == SymmetryKind::Delay)
            .collect();
        let [delay_sym] = delays.as_slice() else {
            return Err(UserError::DelaySymmetryCount {
                count: delays.len(),
            });
        };
        let period = delay_sym.delay_time().unwrap_or(0.0);
        if !(period > 0.0 && period.is_finite()) {
            return Err(UserError::InvalidDelay { delay: period });
        }
        if !delay_sym.juggler_permutation().is_identity() {
            return Err(UserError::DelayMovesJugglers);
        }
        let delay = Transform::from_symmetry(delay_sym, period);

        let generators: Vec<Transform> = symmetries
            .iter()
            .filter_map(|s| match s.kind() {
                SymmetryKind::Delay => None,
                SymmetryKind::Switch => Some(Transform::from_symmetry(s, 0.0)),
                SymmetryKind::SwitchDelay => Some(Transform::from_symmetry(
                    s,
                    s.delay_time().unwrap_or(period / 2.0),
                )),
            })
            .collect();

        let mut group = Self {
            delay,
            reps: vec![Transform::identity(jugglers, paths)],
        };
        let mut next = 0;
        while next < group.reps.len() {
            for generator in &generators {
                let candidate = group.normalize(group.reps[next].then(generator));
                if !group.reps.iter().any(|r| r.same_as(&candidate)) {
                    if group.reps.len() >= GROUP_LIMIT {
                        return Err(UserError::SymmetryGroupTooLarge { limit: GROUP_LIMIT });
                    }
                    group.reps.push(candidate);
                }
            }
            next += 1;
        }
        group.reps.sort_by(|a, b| a.dt.total_cmp(&b.dt));
        debug!(
            images_per_period = group.reps.len(),
            delay = period,
            "symmetry group resolved"
        );
        Ok(group)
    }

    /// Fold a transform back so that its time offset lies in `[0, delay)`.
    fn normalize(&self, t: Transform) -> Transform {
        let period = self.delay.dt;
        let mut q = (t.dt / period).floor();
        // Snap offsets a rounding error short of a whole period.
        if ((q + 1.0) * period - t.dt).abs() < TIME_EPSILON {
            q += 1.0;
        }
        let mut out = t.then(&self.delay.power(-(q as i64)));
        if out.dt.abs() < TIME_EPSILON {
            out.dt = 0.0;
        }
        out
    }

    pub fn period(&self) -> f64 {
        self.delay.dt
    }

    /// Number of images of a seed per delay period.
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    #[cfg(test)]
    pub fn reps(&self) -> &[Transform] {
        &self.reps
    }

    /// One image of a seed for every distinct relabelling: each coset
    /// representative followed by every power of the delay up to the order of
    /// its path permutation. Later images only repeat these shifted in time.
    pub fn orbit(&self) -> impl Iterator<Item = Transform> + '_ {
        let count = self.len() * self.delay.paths.order();
        (0..count as i64).map(|k| self.image(k))
    }

    pub fn image(&self, k: i64) -> Transform {
        let n = self.reps.len() as i64;
        let rep = &self.reps[k.rem_euclid(n) as usize];
        rep.then(&self.delay.power(k.div_euclid(n)))
    }

    pub fn image_time(&self, seed: &Event, k: i64) -> f64 {
        let n = self.reps.len() as i64;
        seed.t + self.reps[k.rem_euclid(n) as usize].dt + k.div_euclid(n) as f64 * self.period()
    }

    /// Largest image index whose time is below `t`.
    pub fn last_image_before(&self, seed: &Event, t: f64) -> i64 {
        let n = self.reps.len() as i64;
        let mut k = ((t - seed.t) / self.period()).floor() as i64 * n;
        while self.image_time(seed, k) < t {
            k += 1;
        }
        while self.image_time(seed, k) >= t {
            k -= 1;
        }
        k
    }
}
