//! Expansion of the master events into a time-sorted event list, and the
//! choice of canonical masters within it.

use juggle_core::{Coordinate, Permutation};
use tracing::{debug, trace};

use super::images::{SymmetryGroup, TIME_EPSILON};
use crate::error::{InternalError, UserError};
use crate::event::{Event, Hand, TransitionKind};

/// Upper bound on generated events, against runaway expansion.
pub const EXPANSION_LIMIT: usize = 20_000;

/// Handle to an event in an [`EventList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct EventNode {
    pub event: Event,
    pub global: Coordinate,
    /// Index of the master event this one was generated from.
    pub seed: usize,
    /// Image index within the seed's orbit; 0 is the seed itself.
    pub image: i64,
    /// Relabelling of the master's paths that gives this event's paths.
    pub path_permutation: Permutation,
    /// Canonical master of the orbit; `None` on the master itself.
    pub master: Option<EventId>,
    pub prev: Option<EventId>,
    pub next: Option<EventId>,
}

impl EventNode {
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.master.is_none()
    }
}

/// Arena of laid-out events, stored in time order.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    nodes: Vec<EventNode>,
}

impl EventList {
    fn from_sorted(mut nodes: Vec<EventNode>) -> Self {
        let len = nodes.len();
        for (i, node) in nodes.iter_mut().enumerate() {
            node.prev = i.checked_sub(1).map(EventId);
            node.next = (i + 1 < len).then_some(EventId(i + 1));
        }
        Self { nodes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: EventId) -> &EventNode {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EventId) -> &mut EventNode {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn first(&self) -> Option<EventId> {
        (!self.nodes.is_empty()).then_some(EventId(0))
    }

    #[must_use]
    pub fn last(&self) -> Option<EventId> {
        self.nodes.len().checked_sub(1).map(EventId)
    }

    /// Events in time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (EventId, &EventNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (EventId(i), n))
    }

    pub(crate) fn ids(&self) -> impl DoubleEndedIterator<Item = EventId> {
        (0..self.nodes.len()).map(EventId)
    }

    /// The canonical master of `id`'s orbit.
    #[must_use]
    pub fn master_of(&self, id: EventId) -> EventId {
        self.get(id).master.unwrap_or(id)
    }

    /// Events of one hand, in time order.
    pub fn hand_events(&self, juggler: usize, hand: Hand) -> Vec<EventId> {
        self.iter()
            .filter(|(_, n)| n.event.juggler == juggler && n.event.hand == hand)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Which hands and paths the orbits of the seeds touch, and how. Paths are
/// followed through the delay's relabelling as well as the switches.
struct Coverage {
    hand_touched: Vec<[bool; 2]>,
    hand_vd: Vec<[bool; 2]>,
    path_touched: Vec<bool>,
    path_thrown: Vec<bool>,
    path_caught: Vec<bool>,
}

impl Coverage {
    fn scan(
        seeds: &[Event],
        group: &SymmetryGroup,
        jugglers: usize,
        paths: usize,
    ) -> Result<Self, UserError> {
        let mut c = Coverage {
            hand_touched: vec![[false; 2]; jugglers],
            hand_vd: vec![[false; 2]; jugglers],
            path_touched: vec![false; paths],
            path_thrown: vec![false; paths],
            path_caught: vec![false; paths],
        };
        for seed in seeds {
            for image in group.orbit() {
                let e = image.apply(seed);
                let h = e.hand.index();
                c.hand_touched[e.juggler - 1][h] = true;
                c.hand_vd[e.juggler - 1][h] |= e.determines_velocity();
                for tr in &e.transitions {
                    let p = tr.path - 1;
                    c.path_touched[p] = true;
                    c.path_thrown[p] |= tr.kind == TransitionKind::Throw;
                    c.path_caught[p] |= tr.kind.is_catch();
                }
            }
        }
        for (j, hands) in c.hand_touched.iter().enumerate() {
            for hand in Hand::BOTH {
                if !hands[hand.index()] {
                    return Err(UserError::HandNeverTouched {
                        juggler: j + 1,
                        hand,
                    });
                }
            }
        }
        if let Some(p) = c.path_touched.iter().position(|t| !t) {
            return Err(UserError::PathNeverTouched { path: p + 1 });
        }
        Ok(c)
    }
}

/// Outstanding requirements while generating events away from the loop.
struct Needs {
    hand: Vec<[bool; 2]>,
    hand_vd: Vec<[bool; 2]>,
    path: Vec<bool>,
    /// Backward: the throw feeding a velocity-pinning soft catch.
    /// Forward: the catch ending a velocity-pinning throw.
    special: Vec<bool>,
}

impl Needs {
    fn new(coverage: &Coverage) -> Self {
        Self {
            hand: vec![[true; 2]; coverage.hand_touched.len()],
            hand_vd: coverage.hand_vd.clone(),
            path: vec![true; coverage.path_touched.len()],
            special: vec![false; coverage.path_touched.len()],
        }
    }

    fn pending(&self) -> bool {
        self.hand.iter().flatten().any(|n| *n)
            || self.hand_vd.iter().flatten().any(|n| *n)
            || self.path.iter().any(|n| *n)
            || self.special.iter().any(|n| *n)
    }

    fn record_backward(&mut self, e: &Event, coverage: &Coverage) {
        let (j, h) = (e.juggler - 1, e.hand.index());
        self.hand[j][h] = false;
        if self.hand_vd[j][h] && e.determines_velocity() {
            self.hand_vd[j][h] = false;
            if !e.has_kind(TransitionKind::Throw) {
                let soft = e
                    .transitions
                    .iter()
                    .filter(|tr| tr.kind == TransitionKind::SoftCatch);
                for tr in soft {
                    let p = tr.path - 1;
                    self.special[p] = coverage.path_thrown[p];
                }
            }
        }
        for tr in e.transitions.iter().rev() {
            let p = tr.path - 1;
            match tr.kind {
                TransitionKind::Throw => {
                    self.path[p] = false;
                    self.special[p] = false;
                }
                // A path that is never thrown is satisfied by any touch.
                _ if !coverage.path_thrown[p] => self.path[p] = false,
                _ => {}
            }
        }
    }

    fn record_forward(&mut self, e: &Event, coverage: &Coverage, free_until: f64) {
        let (j, h) = (e.juggler - 1, e.hand.index());
        if coverage.hand_vd[j][h] || e.t >= free_until - TIME_EPSILON {
            self.hand[j][h] = false;
        }
        let mut pins_velocity = self.hand_vd[j][h] && e.determines_velocity();
        if pins_velocity {
            self.hand_vd[j][h] = false;
        }
        for tr in &e.transitions {
            let p = tr.path - 1;
            self.path[p] = false;
            if tr.kind.is_catch() {
                self.special[p] = false;
            }
            if pins_velocity && tr.kind == TransitionKind::Throw {
                self.special[p] = coverage.path_caught[p];
                pins_velocity = false;
            }
        }
    }
}

struct Generated {
    seed: usize,
    image: i64,
    event: Event,
}

/// Generate images of `seeds` from below `loop_start` to past `loop_end`,
/// far enough on both sides that every hand and path has the neighbours its
/// curves need.
pub(crate) fn build_event_list(
    seeds: &[Event],
    group: &SymmetryGroup,
    jugglers: usize,
    paths: usize,
    loop_start: f64,
    loop_end: f64,
) -> Result<EventList, UserError> {
    if seeds.is_empty() {
        return Err(UserError::NoEvents);
    }
    let coverage = Coverage::scan(seeds, group, jugglers, paths)?;
    let mut generated: Vec<Generated> = Vec::new();

    // Backward from the end of the loop.
    let mut cursors: Vec<i64> = seeds
        .iter()
        .map(|s| group.last_image_before(s, loop_end))
        .collect();
    let mut needs = Needs::new(&coverage);
    loop {
        let Some((seed, t)) = latest(seeds, group, &cursors) else {
            break;
        };
        if t < loop_start - TIME_EPSILON && !needs.pending() {
            break;
        }
        let event = group.image(cursors[seed]).apply(&seeds[seed]);
        trace!(seed, image = cursors[seed], t, "backward image");
        if event.t <= loop_start + TIME_EPSILON {
            needs.record_backward(&event, &coverage);
        }
        generated.push(Generated {
            seed,
            image: cursors[seed],
            event,
        });
        cursors[seed] -= 1;
        if generated.len() > EXPANSION_LIMIT {
            return Err(UserError::ExpansionLimit {
                limit: EXPANSION_LIMIT,
            });
        }
    }
    let backward = generated.len();

    // Forward from the end of the loop. Throws still in the air at the end of
    // the backward pass need their catches.
    let mut needs = Needs::new(&coverage);
    let mut last_on_path: Vec<Option<(f64, TransitionKind)>> = vec![None; paths];
    // Later transitions of one event supersede earlier ones on the same path.
    for g in &generated {
        for tr in &g.event.transitions {
            let slot = &mut last_on_path[tr.path - 1];
            if slot.is_none_or(|(t, _)| g.event.t >= t) {
                *slot = Some((g.event.t, tr.kind));
            }
        }
    }
    for (p, last) in last_on_path.iter().enumerate() {
        if matches!(last, Some((_, TransitionKind::Throw))) {
            needs.special[p] = coverage.path_caught[p];
        }
    }
    let free_until = 2.0 * loop_end - loop_start;
    let mut cursors: Vec<i64> = seeds
        .iter()
        .map(|s| group.last_image_before(s, loop_end) + 1)
        .collect();
    while needs.pending() {
        let Some((seed, t)) = earliest(seeds, group, &cursors) else {
            break;
        };
        let event = group.image(cursors[seed]).apply(&seeds[seed]);
        trace!(seed, image = cursors[seed], t, "forward image");
        needs.record_forward(&event, &coverage, free_until);
        generated.push(Generated {
            seed,
            image: cursors[seed],
            event,
        });
        cursors[seed] += 1;
        if generated.len() > EXPANSION_LIMIT {
            return Err(UserError::ExpansionLimit {
                limit: EXPANSION_LIMIT,
            });
        }
    }
    debug!(
        backward,
        forward = generated.len() - backward,
        "event list expanded"
    );

    generated.sort_by(|a, b| {
        a.event
            .t
            .total_cmp(&b.event.t)
            .then(a.event.juggler.cmp(&b.event.juggler))
            .then(a.event.hand.cmp(&b.event.hand))
    });
    let generated = drop_coincident(generated)?;

    let nodes = generated
        .into_iter()
        .map(|g| EventNode {
            path_permutation: group.image(g.image).paths,
            event: g.event,
            global: Coordinate::ZERO,
            seed: g.seed,
            image: g.image,
            master: None,
            prev: None,
            next: None,
        })
        .collect();
    Ok(EventList::from_sorted(nodes))
}

fn latest(seeds: &[Event], group: &SymmetryGroup, cursors: &[i64]) -> Option<(usize, f64)> {
    cursors
        .iter()
        .enumerate()
        .map(|(i, &k)| (i, group.image_time(&seeds[i], k)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn earliest(seeds: &[Event], group: &SymmetryGroup, cursors: &[i64]) -> Option<(usize, f64)> {
    cursors
        .iter()
        .enumerate()
        .map(|(i, &k)| (i, group.image_time(&seeds[i], k)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Remove images that coincide exactly (a symmetry fixing an event), and
/// reject distinct events sharing a hand and instant.
fn drop_coincident(sorted: Vec<Generated>) -> Result<Vec<Generated>, UserError> {
    let mut out: Vec<Generated> = Vec::with_capacity(sorted.len());
    for g in sorted {
        let clash = out
            .iter()
            .rev()
            .take_while(|o| g.event.t - o.event.t < TIME_EPSILON)
            .find(|o| o.event.juggler == g.event.juggler && o.event.hand == g.event.hand);
        match clash {
            None => out.push(g),
            Some(o) if o.seed == g.seed && same_transitions(&o.event, &g.event) => {}
            Some(_) => {
                return Err(UserError::EventCollision {
                    juggler: g.event.juggler,
                    hand: g.event.hand,
                    t: g.event.t,
                });
            }
        }
    }
    Ok(out)
}

fn same_transitions(a: &Event, b: &Event) -> bool {
    let key = |e: &Event| {
        let mut k: Vec<(usize, &'static str)> =
            e.transitions.iter().map(|t| (t.path, t.kind.tag())).collect();
        k.sort_unstable();
        k
    };
    key(a) == key(b)
}

/// Pick each orbit's canonical master: its earliest image inside
/// `[loop_start, loop_end)`, or its earliest image overall. Points every
/// other image at it.
///
/// Returns the replacement seed list when any orbit's master is not the
/// seed it was generated from, in which case the list must be rebuilt.
pub(crate) fn find_master_events(
    list: &mut EventList,
    seed_count: usize,
    loop_start: f64,
    loop_end: f64,
) -> Result<Option<Vec<Event>>, InternalError> {
    let in_loop = |t: f64| t >= loop_start - TIME_EPSILON && t < loop_end - TIME_EPSILON;
    let mut replacements = Vec::with_capacity(seed_count);
    let mut changed = false;

    for seed in 0..seed_count {
        let members: Vec<EventId> = list.ids().filter(|id| list.get(*id).seed == seed).collect();
        let pick = |filter: &dyn Fn(f64) -> bool| {
            members
                .iter()
                .copied()
                .filter(|id| filter(list.get(*id).event.t))
                .min_by(|a, b| {
                    let (na, nb) = (list.get(*a), list.get(*b));
                    if (na.event.t - nb.event.t).abs() < TIME_EPSILON {
                        // Keep the current seed on ties so selection settles.
                        (na.image != 0).cmp(&(nb.image != 0))
                    } else {
                        na.event.t.total_cmp(&nb.event.t)
                    }
                })
        };
        let master = pick(&in_loop)
            .or_else(|| pick(&|_| true))
            .ok_or(InternalError::EmptyOrbit { master: seed })?;

        changed |= list.get(master).image != 0;
        replacements.push(list.get(master).event.clone());
        for id in members {
            list.get_mut(id).master = (id != master).then_some(master);
        }
    }

    Ok(changed.then_some(replacements))
}
