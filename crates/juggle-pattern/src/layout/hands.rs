//! Hand curves through the events of each hand.

use juggle_core::Coordinate;
use juggle_curve::{Curve, SplineCurve};
use tracing::trace;

use super::event_list::{EventId, EventList};
use super::images::TIME_EPSILON;
use super::links::{HandLink, PathLink, VelocityRef};
use crate::error::{InternalError, PatternError};
use crate::event::Hand;

pub(crate) struct HandLayout<'a> {
    pub list: &'a EventList,
    pub path_links: &'a [Vec<PathLink>],
    pub loop_start: f64,
    pub period: f64,
}

impl HandLayout<'_> {
    /// Solve curves for every hand, recording each link's curve index.
    pub fn solve(
        &self,
        hand_links: &mut [[Vec<HandLink>; 2]],
    ) -> Result<Vec<SplineCurve>, PatternError> {
        let mut curves = Vec::new();
        for (j, per_hand) in hand_links.iter_mut().enumerate() {
            for hand in Hand::BOTH {
                let links = &mut per_hand[hand.index()];
                let pinned = self
                    .list
                    .hand_events(j + 1, hand)
                    .iter()
                    .any(|id| self.list.get(*id).event.determines_velocity());
                if pinned {
                    self.pinned_chains(links, &mut curves)?;
                } else {
                    self.free_chains(j + 1, hand, links, &mut curves)?;
                }
            }
        }
        Ok(curves)
    }

    /// Chains from each known start velocity to the next known end velocity,
    /// clamped at both ends.
    fn pinned_chains(
        &self,
        links: &mut [HandLink],
        curves: &mut Vec<SplineCurve>,
    ) -> Result<(), PatternError> {
        let mut i = 0;
        while i < links.len() {
            let Some(start) = links[i].start_velocity else {
                i += 1;
                continue;
            };
            let Some(j) = (i..links.len()).find(|&j| links[j].end_velocity.is_some()) else {
                break;
            };
            let end = links[j].end_velocity;
            let v0 = self.velocity(start)?;
            let v1 = end.map(|r| self.velocity(r)).transpose()?;
            self.chain(&mut links[i..=j], Some(v0), v1, curves)?;
            i = j + 1;
        }
        Ok(())
    }

    /// Two closed one-period chains, the first starting at the link that
    /// straddles the loop start and each ending at the delay image of its
    /// first event.
    fn free_chains(
        &self,
        juggler: usize,
        hand: Hand,
        links: &mut [HandLink],
        curves: &mut Vec<SplineCurve>,
    ) -> Result<(), PatternError> {
        let straddle = links.iter().position(|l| {
            self.time(l.start) <= self.loop_start + TIME_EPSILON
                && self.time(l.end) > self.loop_start + TIME_EPSILON
        });
        let Some(mut i) = straddle else {
            return Err(InternalError::MissingHandCurve {
                juggler,
                hand,
                t: self.loop_start,
            }
            .into());
        };
        for _ in 0..2 {
            let Some(link) = links.get(i) else {
                return Err(InternalError::MissingDelayImage {
                    juggler,
                    hand,
                    t: self.loop_start + self.period,
                }
                .into());
            };
            let first = self.list.get(link.start);
            let target = first.event.t + self.period;
            let closing = (i..links.len()).find(|&j| {
                let end = self.list.get(links[j].end);
                end.seed == first.seed && (end.event.t - target).abs() < 1e-6
            });
            let Some(j) = closing else {
                return Err(InternalError::MissingDelayImage {
                    juggler,
                    hand,
                    t: first.event.t,
                }
                .into());
            };
            self.chain(&mut links[i..=j], None, None, curves)?;
            i = j + 1;
        }
        Ok(())
    }

    fn chain(
        &self,
        links: &mut [HandLink],
        start_velocity: Option<Coordinate>,
        end_velocity: Option<Coordinate>,
        curves: &mut Vec<SplineCurve>,
    ) -> Result<(), PatternError> {
        let mut ids: Vec<EventId> = links.iter().map(|l| l.start).collect();
        if let Some(last) = links.last() {
            ids.push(last.end);
        }
        let positions: Vec<Coordinate> = ids.iter().map(|id| self.list.get(*id).global).collect();
        let times: Vec<f64> = ids.iter().map(|id| self.time(*id)).collect();

        let mut curve = SplineCurve::new();
        curve.set_curve(&positions, &times, start_velocity, end_velocity)?;
        curve.calc_curve()?;
        trace!(knots = ids.len(), t0 = times[0], "hand chain solved");

        let index = curves.len();
        curves.push(curve);
        for link in links {
            link.curve = Some(index);
        }
        Ok(())
    }

    fn time(&self, id: EventId) -> f64 {
        self.list.get(id).event.t
    }

    fn velocity(&self, r: VelocityRef) -> Result<Coordinate, InternalError> {
        resolve_velocity(self.path_links, r)
    }
}

pub(crate) fn resolve_velocity(
    path_links: &[Vec<PathLink>],
    r: VelocityRef,
) -> Result<Coordinate, InternalError> {
    let (path, link, at_start) = match r {
        VelocityRef::Throw { path, link } => (path, link, true),
        VelocityRef::SoftCatch { path, link } => (path, link, false),
    };
    let link = path_links
        .get(path - 1)
        .and_then(|links| links.get(link))
        .ok_or(InternalError::DanglingVelocityRef { path, link })?;
    let flight = link.flight().ok_or(InternalError::MissingPathLink {
        path,
        t: link.start_time,
    })?;
    Ok(if at_start {
        flight.start_velocity()
    } else {
        flight.end_velocity()
    })
}
