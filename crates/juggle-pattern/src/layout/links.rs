//! Segments between consecutive touches of each path and each hand.

use std::collections::HashMap;

use juggle_curve::{Path, PathKind};
use tracing::debug;

use super::event_list::{EventId, EventList};
use crate::error::{InternalError, UserError};
use crate::event::{Hand, TransitionKind};

#[derive(Debug)]
pub enum PathLinkKind {
    InHand { juggler: usize, hand: Hand },
    InFlight {
        throw_type: PathKind,
        modifier: String,
        flight: Box<dyn Path>,
    },
}

/// One path between two consecutive events that touch it.
#[derive(Debug)]
pub struct PathLink {
    pub path: usize,
    pub start: EventId,
    pub end: EventId,
    pub start_time: f64,
    pub end_time: f64,
    pub kind: PathLinkKind,
}

impl PathLink {
    #[must_use]
    pub fn is_in_hand(&self) -> bool {
        matches!(self.kind, PathLinkKind::InHand { .. })
    }

    #[must_use]
    pub fn flight(&self) -> Option<&dyn Path> {
        match &self.kind {
            PathLinkKind::InFlight { flight, .. } => Some(flight.as_ref()),
            PathLinkKind::InHand { .. } => None,
        }
    }
}

/// Where a hand's velocity at an event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityRef {
    /// Start velocity of the flight leaving the event.
    Throw { path: usize, link: usize },
    /// End velocity of the flight arriving at the event.
    SoftCatch { path: usize, link: usize },
}

/// One hand between two consecutive events on it.
#[derive(Debug, Clone)]
pub struct HandLink {
    pub juggler: usize,
    pub hand: Hand,
    pub start: EventId,
    pub end: EventId,
    pub start_velocity: Option<VelocityRef>,
    pub end_velocity: Option<VelocityRef>,
    /// Index into the layout's hand curves once solved.
    pub curve: Option<usize>,
}

/// Path links per path, and the flights indexed by the event and path they
/// leave from or arrive at.
pub(crate) struct PathLinks {
    pub links: Vec<Vec<PathLink>>,
    throws: HashMap<(EventId, usize), usize>,
    catches: HashMap<(EventId, usize), usize>,
    first_touch: Vec<Option<EventId>>,
    last_touch: Vec<Option<EventId>>,
}

pub(crate) fn build_path_links(list: &EventList, paths: usize) -> Result<PathLinks, UserError> {
    let mut out = PathLinks {
        links: Vec::with_capacity(paths),
        throws: HashMap::new(),
        catches: HashMap::new(),
        first_touch: vec![None; paths],
        last_touch: vec![None; paths],
    };

    for path in 1..=paths {
        let touches: Vec<(EventId, usize)> = list
            .iter()
            .flat_map(|(id, node)| {
                node.event
                    .transitions
                    .iter()
                    .enumerate()
                    .filter(move |(_, tr)| tr.path == path)
                    .map(move |(i, _)| (id, i))
            })
            .collect();
        out.first_touch[path - 1] = touches.first().map(|t| t.0);
        out.last_touch[path - 1] = touches.last().map(|t| t.0);

        let mut links = Vec::with_capacity(touches.len().saturating_sub(1));
        for pair in touches.windows(2) {
            let ((a, ai), (b, bi)) = (pair[0], pair[1]);
            let (na, nb) = (list.get(a), list.get(b));
            let (ta, tb) = (&na.event.transitions[ai], &nb.event.transitions[bi]);
            let same_hand = na.event.juggler == nb.event.juggler && na.event.hand == nb.event.hand;

            let kind = match (ta.kind, tb.kind) {
                (TransitionKind::Throw, TransitionKind::Throw) => {
                    return Err(UserError::SuccessiveThrows { path });
                }
                (TransitionKind::Throw, k) if k.is_catch() => {
                    let flight = ta
                        .throw_type
                        .build(&ta.modifier, na.global, na.event.t, nb.global, nb.event.t)
                        .map_err(|source| UserError::Flight { path, source })?;
                    out.throws.insert((a, path), links.len());
                    out.catches.insert((b, path), links.len());
                    PathLinkKind::InFlight {
                        throw_type: ta.throw_type,
                        modifier: ta.modifier.clone(),
                        flight,
                    }
                }
                (_, k) if k.is_catch() => return Err(UserError::SuccessiveCatches { path }),
                _ if !same_hand => return Err(UserError::HandChangedWhileHeld { path }),
                _ => PathLinkKind::InHand {
                    juggler: na.event.juggler,
                    hand: na.event.hand,
                },
            };
            links.push(PathLink {
                path,
                start: a,
                end: b,
                start_time: na.event.t,
                end_time: nb.event.t,
                kind,
            });
        }
        out.links.push(links);
    }

    debug!(
        links = out.links.iter().map(Vec::len).sum::<usize>(),
        flights = out.throws.len(),
        "path links built"
    );
    Ok(out)
}

impl PathLinks {
    /// Velocity source for a hand at `id`: its first throw, else its first
    /// soft catch. `None` when the event pins nothing, or when the flight
    /// would lie beyond the ends of the generated list.
    fn velocity_ref(
        &self,
        list: &EventList,
        id: EventId,
    ) -> Result<Option<VelocityRef>, InternalError> {
        let node = list.get(id);
        let pick = |kind: TransitionKind| node.event.transitions.iter().find(|tr| tr.kind == kind);
        if let Some(tr) = pick(TransitionKind::Throw) {
            if let Some(&link) = self.throws.get(&(id, tr.path)) {
                return Ok(Some(VelocityRef::Throw {
                    path: tr.path,
                    link,
                }));
            }
            if self.last_touch[tr.path - 1] == Some(id) {
                return Ok(None);
            }
        } else if let Some(tr) = pick(TransitionKind::SoftCatch) {
            if let Some(&link) = self.catches.get(&(id, tr.path)) {
                return Ok(Some(VelocityRef::SoftCatch {
                    path: tr.path,
                    link,
                }));
            }
            if self.first_touch[tr.path - 1] == Some(id) {
                return Ok(None);
            }
        } else {
            return Ok(None);
        }
        Err(InternalError::MissingVelocityPath {
            juggler: node.event.juggler,
            hand: node.event.hand,
            t: node.event.t,
        })
    }
}

/// Hand links per juggler and hand, `[juggler - 1][hand.index()]`.
pub(crate) fn build_hand_links(
    list: &EventList,
    path_links: &PathLinks,
    jugglers: usize,
) -> Result<Vec<[Vec<HandLink>; 2]>, InternalError> {
    let mut out = Vec::with_capacity(jugglers);
    for juggler in 1..=jugglers {
        let mut per_hand: [Vec<HandLink>; 2] = [Vec::new(), Vec::new()];
        for hand in Hand::BOTH {
            let events = list.hand_events(juggler, hand);
            let velocities = events
                .iter()
                .map(|id| path_links.velocity_ref(list, *id))
                .collect::<Result<Vec<_>, _>>()?;
            per_hand[hand.index()] = events
                .windows(2)
                .zip(velocities.windows(2))
                .map(|(ev, vel)| HandLink {
                    juggler,
                    hand,
                    start: ev[0],
                    end: ev[1],
                    start_velocity: vel[0],
                    end_velocity: vel[1],
                    curve: None,
                })
                .collect();
        }
        out.push(per_hand);
    }
    Ok(out)
}
