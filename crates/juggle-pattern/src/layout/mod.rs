//! The layout engine: from master events and symmetries to continuous curves
//! for every path, hand and juggler.
//!
//! [`Layout::build`] runs six steps in order:
//!
//! 1. expand the master events into a time-sorted [`EventList`] using the
//!    symmetry group;
//! 2. choose canonical masters, rebuilding the list if the choice moved;
//! 3. build each juggler's position and angle track;
//! 4. convert event coordinates from juggler-local to global;
//! 5. link consecutive touches of each path and hand;
//! 6. solve hand curves through those links.

mod event_list;
mod hands;
mod images;
mod links;
mod positions;

use juggle_core::Coordinate;
use juggle_curve::{Curve, SplineCurve};
use tracing::debug;

pub use event_list::{EXPANSION_LIMIT, EventId, EventList, EventNode};
pub use links::{HandLink, PathLink, PathLinkKind, VelocityRef};
pub use positions::{
    DEFAULT_HEIGHT, DEFAULT_RADIUS, JugglerTrack, PATTERN_Y, default_placement, local_to_global,
    rotate,
};

use self::event_list::{build_event_list, find_master_events};
use self::hands::HandLayout;
use self::images::SymmetryGroup;
use self::links::{build_hand_links, build_path_links};
use crate::error::{InternalError, PatternError, UserError};
use crate::event::{Event, Hand, Position};
use crate::symmetry::Symmetry;

const MASTER_ROUNDS: usize = 4;

/// Everything layout reads from a pattern.
pub(crate) struct LayoutInput<'a> {
    pub jugglers: usize,
    pub paths: usize,
    pub symmetries: &'a [Symmetry],
    pub events: &'a [Event],
    pub positions: &'a [Position],
}

/// Derived state of a laid-out pattern.
#[derive(Debug)]
pub struct Layout {
    loop_start: f64,
    loop_end: f64,
    events: EventList,
    path_links: Vec<Vec<PathLink>>,
    hand_links: Vec<[Vec<HandLink>; 2]>,
    hand_curves: Vec<SplineCurve>,
    jugglers: Vec<JugglerTrack>,
}

impl Layout {
    /// Lay out `input`. Returns the layout and the canonical master events,
    /// which may differ from the input's when a seed lies outside the loop.
    pub(crate) fn build(input: &LayoutInput<'_>) -> Result<(Layout, Vec<Event>), PatternError> {
        validate(input)?;
        let group = SymmetryGroup::new(input.symmetries, input.jugglers, input.paths)?;
        let loop_start = 0.0;
        let loop_end = group.period();

        // Steps 1 and 2.
        let mut seeds = input.events.to_vec();
        let mut settled = None;
        for round in 0..MASTER_ROUNDS {
            let mut list = build_event_list(
                &seeds,
                &group,
                input.jugglers,
                input.paths,
                loop_start,
                loop_end,
            )?;
            match find_master_events(&mut list, seeds.len(), loop_start, loop_end)? {
                None => {
                    settled = Some(list);
                    break;
                }
                Some(replaced) => {
                    debug!(round, "master events moved into the loop; rebuilding");
                    seeds = replaced;
                }
            }
        }
        let mut events = settled.ok_or(InternalError::MasterSelectionUnstable {
            rounds: MASTER_ROUNDS,
        })?;
        debug!(events = events.len(), masters = seeds.len(), "event list built");

        // Step 3.
        let jugglers = (1..=input.jugglers)
            .map(|j| {
                let declared: Vec<&Position> =
                    input.positions.iter().filter(|p| p.juggler == j).collect();
                JugglerTrack::build(j, input.jugglers, &declared, loop_start, loop_end)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Step 4.
        for id in events.ids().collect::<Vec<_>>() {
            let node = events.get_mut(id);
            let track = &jugglers[node.event.juggler - 1];
            node.global = track.to_global(node.event.local, node.event.t)?;
        }

        // Step 5.
        let path_links = build_path_links(&events, input.paths)?;
        let mut hand_links = build_hand_links(&events, &path_links, input.jugglers)?;

        // Step 6.
        let hand_curves = HandLayout {
            list: &events,
            path_links: &path_links.links,
            loop_start,
            period: loop_end - loop_start,
        }
        .solve(&mut hand_links)?;
        debug!(curves = hand_curves.len(), "hand curves solved");

        let layout = Layout {
            loop_start,
            loop_end,
            events,
            path_links: path_links.links,
            hand_links,
            hand_curves,
            jugglers,
        };
        Ok((layout, seeds))
    }

    #[must_use]
    pub fn loop_start(&self) -> f64 {
        self.loop_start
    }

    #[must_use]
    pub fn loop_end(&self) -> f64 {
        self.loop_end
    }

    #[must_use]
    pub fn events(&self) -> &EventList {
        &self.events
    }

    #[must_use]
    pub fn path_links(&self, path: usize) -> &[PathLink] {
        &self.path_links[path - 1]
    }

    #[must_use]
    pub fn hand_links(&self, juggler: usize, hand: Hand) -> &[HandLink] {
        &self.hand_links[juggler - 1][hand.index()]
    }

    /// Reduce `t` into `[loop_start, loop_end)`.
    #[must_use]
    pub fn wrap_time(&self, t: f64) -> f64 {
        self.loop_start + (t - self.loop_start).rem_euclid(self.loop_end - self.loop_start)
    }

    fn path_link_at(&self, path: usize, t: f64) -> Result<&PathLink, InternalError> {
        let links = &self.path_links[path - 1];
        let i = links.partition_point(|l| l.start_time <= t);
        i.checked_sub(1)
            .map(|i| &links[i])
            .filter(|l| t <= l.end_time)
            .ok_or(InternalError::MissingPathLink { path, t })
    }

    fn hand_link_at(
        &self,
        juggler: usize,
        hand: Hand,
        t: f64,
    ) -> Result<&HandLink, InternalError> {
        let links = &self.hand_links[juggler - 1][hand.index()];
        let i = links.partition_point(|l| self.events.get(l.start).event.t <= t);
        i.checked_sub(1)
            .map(|i| &links[i])
            .filter(|l| t <= self.events.get(l.end).event.t)
            .ok_or(InternalError::MissingHandCurve { juggler, hand, t })
    }

    fn hand_curve(
        &self,
        juggler: usize,
        hand: Hand,
        t: f64,
    ) -> Result<&SplineCurve, InternalError> {
        self.hand_link_at(juggler, hand, t)?
            .curve
            .map(|c| &self.hand_curves[c])
            .ok_or(InternalError::MissingHandCurve { juggler, hand, t })
    }

    pub fn hand_coordinate(
        &self,
        juggler: usize,
        hand: Hand,
        t: f64,
    ) -> Result<Coordinate, PatternError> {
        let t = self.wrap_time(t);
        Ok(self.hand_curve(juggler, hand, t)?.coordinate(t)?)
    }

    pub fn path_coordinate(&self, path: usize, t: f64) -> Result<Coordinate, PatternError> {
        let t = self.wrap_time(t);
        let link = self.path_link_at(path, t)?;
        match &link.kind {
            PathLinkKind::InHand { juggler, hand } => {
                Ok(self.hand_curve(*juggler, *hand, t)?.coordinate(t)?)
            }
            PathLinkKind::InFlight { flight, .. } => Ok(flight.coordinate(t)),
        }
    }

    pub fn is_in_hand(&self, path: usize, t: f64) -> Result<bool, PatternError> {
        let t = self.wrap_time(t);
        Ok(self.path_link_at(path, t)?.is_in_hand())
    }

    pub fn juggler_position(&self, juggler: usize, t: f64) -> Result<Coordinate, PatternError> {
        Ok(self.jugglers[juggler - 1].position(self.wrap_time(t))?)
    }

    pub fn juggler_angle(&self, juggler: usize, t: f64) -> Result<f64, PatternError> {
        Ok(self.jugglers[juggler - 1].angle(self.wrap_time(t))?)
    }

    pub(crate) fn juggler_track(&self, juggler: usize) -> &JugglerTrack {
        &self.jugglers[juggler - 1]
    }

    /// Component-wise maximum of a path over one loop.
    pub fn path_max(&self, path: usize) -> Result<Option<Coordinate>, PatternError> {
        self.path_extreme(path, Extreme::Max)
    }

    /// Component-wise minimum of a path over one loop.
    pub fn path_min(&self, path: usize) -> Result<Option<Coordinate>, PatternError> {
        self.path_extreme(path, Extreme::Min)
    }

    pub fn hand_max(&self, juggler: usize, hand: Hand) -> Result<Option<Coordinate>, PatternError> {
        self.hand_extreme(juggler, hand, self.loop_start, self.loop_end, Extreme::Max)
    }

    pub fn hand_min(&self, juggler: usize, hand: Hand) -> Result<Option<Coordinate>, PatternError> {
        self.hand_extreme(juggler, hand, self.loop_start, self.loop_end, Extreme::Min)
    }

    fn path_extreme(
        &self,
        path: usize,
        which: Extreme,
    ) -> Result<Option<Coordinate>, PatternError> {
        let (lo, hi) = (self.loop_start, self.loop_end);
        let mut out = None;
        for link in &self.path_links[path - 1] {
            let (a, b) = (link.start_time.max(lo), link.end_time.min(hi));
            if a >= b {
                continue;
            }
            let ext = match &link.kind {
                PathLinkKind::InFlight { flight, .. } => match which {
                    Extreme::Max => flight.max(a, b),
                    Extreme::Min => flight.min(a, b),
                },
                PathLinkKind::InHand { juggler, hand } => {
                    self.hand_extreme(*juggler, *hand, a, b, which)?
                }
            };
            out = which.merge(out, ext);
        }
        Ok(out)
    }

    fn hand_extreme(
        &self,
        juggler: usize,
        hand: Hand,
        lo: f64,
        hi: f64,
        which: Extreme,
    ) -> Result<Option<Coordinate>, PatternError> {
        let mut out = None;
        for link in &self.hand_links[juggler - 1][hand.index()] {
            let start = self.events.get(link.start).event.t;
            let end = self.events.get(link.end).event.t;
            let (a, b) = (start.max(lo), end.min(hi));
            if a >= b {
                continue;
            }
            let curve = link
                .curve
                .map(|c| &self.hand_curves[c])
                .ok_or(InternalError::MissingHandCurve { juggler, hand, t: a })?;
            let ext = match which {
                Extreme::Max => curve.max(a, b)?,
                Extreme::Min => curve.min(a, b)?,
            };
            out = which.merge(out, ext);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

impl Extreme {
    fn merge(self, acc: Option<Coordinate>, next: Option<Coordinate>) -> Option<Coordinate> {
        match (acc, next) {
            (Some(a), Some(b)) => Some(match self {
                Extreme::Max => a.max(b),
                Extreme::Min => a.min(b),
            }),
            (a, b) => a.or(b),
        }
    }
}

/// Reject references to jugglers and paths the pattern does not have.
fn validate(input: &LayoutInput<'_>) -> Result<(), UserError> {
    if input.events.is_empty() {
        return Err(UserError::NoEvents);
    }
    let juggler_ok = |juggler: usize| {
        if juggler == 0 || juggler > input.jugglers {
            Err(UserError::JugglerOutOfRange {
                juggler,
                jugglers: input.jugglers,
            })
        } else {
            Ok(())
        }
    };
    for event in input.events {
        juggler_ok(event.juggler)?;
        for tr in &event.transitions {
            if tr.path == 0 || tr.path > input.paths {
                return Err(UserError::PathOutOfRange {
                    path: tr.path,
                    paths: input.paths,
                });
            }
        }
    }
    for position in input.positions {
        juggler_ok(position.juggler)?;
    }
    for symmetry in input.symmetries {
        if symmetry.juggler_permutation().size() != input.jugglers {
            return Err(UserError::JugglerOutOfRange {
                juggler: symmetry.juggler_permutation().size(),
                jugglers: input.jugglers,
            });
        }
        if symmetry.path_permutation().size() != input.paths {
            return Err(UserError::PathOutOfRange {
                path: symmetry.path_permutation().size(),
                paths: input.paths,
            });
        }
    }
    Ok(())
}
