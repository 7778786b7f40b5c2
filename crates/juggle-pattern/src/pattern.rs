//! The pattern aggregate: what the user declares, plus the layout derived
//! from it.

use juggle_core::{Coordinate, Permutation};
use juggle_curve::PathKind;
use tracing::{debug, info, warn};

use crate::document::{DocumentError, JmlNode};
use crate::error::{InternalError, PatternError, UserError};
use crate::event::{Event, Hand, Position, Transition, TransitionKind, parse_hand_label};
use crate::juggler::{JugglerPose, body_extent, solve_pose};
use crate::layout::{Layout, LayoutInput};
use crate::symmetry::{Symmetry, SymmetryKind};

/// A prop definition. Only carried through documents; layout ignores it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub kind: String,
    pub modifier: Option<String>,
}

impl Prop {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            modifier: None,
        }
    }
}

impl Default for Prop {
    fn default() -> Self {
        Self::new("ball")
    }
}

/// Whether a pattern's derived layout matches its declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayoutState {
    Clean = 0,
    Dirty = 1,
    LayingOut = 2,
}

impl LayoutState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => LayoutState::Clean,
            2 => LayoutState::LayingOut,
            _ => LayoutState::Dirty,
        }
    }
}

#[derive(Debug)]
pub struct Pattern {
    title: Option<String>,
    jugglers: usize,
    paths: usize,
    props: Vec<Prop>,
    /// 1-based prop per path; empty means every path uses prop 1.
    assignment: Vec<usize>,
    symmetries: Vec<Symmetry>,
    events: Vec<Event>,
    positions: Vec<Position>,
    state: LayoutState,
    layout: Option<Layout>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Pattern {
    #[must_use]
    pub fn new(jugglers: usize, paths: usize) -> Self {
        Self {
            title: None,
            jugglers,
            paths,
            props: Vec::new(),
            assignment: Vec::new(),
            symmetries: Vec::new(),
            events: Vec::new(),
            positions: Vec::new(),
            state: LayoutState::Dirty,
            layout: None,
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    #[must_use]
    pub fn number_of_jugglers(&self) -> usize {
        self.jugglers
    }

    #[must_use]
    pub fn number_of_paths(&self) -> usize {
        self.paths
    }

    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    #[must_use]
    pub fn symmetries(&self) -> &[Symmetry] {
        &self.symmetries
    }

    /// Master events, in insertion order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    #[must_use]
    pub fn state(&self) -> LayoutState {
        self.state
    }

    #[must_use]
    pub fn needs_layout(&self) -> bool {
        self.state != LayoutState::Clean
    }

    fn touch(&mut self) {
        self.state = LayoutState::Dirty;
    }

    /// Add a prop definition and return its 1-based index.
    pub fn add_prop(&mut self, prop: Prop) -> usize {
        self.props.push(prop);
        self.touch();
        self.props.len()
    }

    pub fn set_number_of_jugglers(&mut self, jugglers: usize) {
        self.jugglers = jugglers;
        self.touch();
    }

    pub fn set_number_of_paths(&mut self, paths: usize) {
        self.paths = paths;
        self.touch();
    }

    /// Set the 1-based prop index of every path. Checked at layout.
    pub fn set_prop_assignments(&mut self, assignment: Vec<usize>) {
        self.assignment = assignment;
        self.touch();
    }

    /// Prop index of each path, with the default filled in.
    #[must_use]
    pub fn prop_assignments(&self) -> Vec<usize> {
        if self.assignment.is_empty() {
            vec![1; self.paths]
        } else {
            self.assignment.clone()
        }
    }

    /// The prop carried along `path`, when props are declared.
    #[must_use]
    pub fn prop_for_path(&self, path: usize) -> Option<&Prop> {
        let index = self.prop_assignments().get(path.checked_sub(1)?).copied()?;
        self.props.get(index.checked_sub(1)?)
    }

    pub fn add_symmetry(&mut self, symmetry: Symmetry) {
        self.symmetries.push(symmetry);
        self.touch();
    }

    /// Add a master event and return its index.
    pub fn add_event(&mut self, event: Event) -> usize {
        self.events.push(event);
        self.touch();
        self.events.len() - 1
    }

    pub fn remove_event(&mut self, index: usize) -> Option<Event> {
        if index >= self.events.len() {
            return None;
        }
        self.touch();
        Some(self.events.remove(index))
    }

    pub fn add_position(&mut self, position: Position) -> usize {
        self.positions.push(position);
        self.touch();
        self.positions.len() - 1
    }

    pub fn remove_position(&mut self, index: usize) -> Option<Position> {
        if index >= self.positions.len() {
            return None;
        }
        self.touch();
        Some(self.positions.remove(index))
    }

    /// Stretch the pattern in time: event times, position times and
    /// symmetry delays are multiplied by `factor`. Coordinates are unchanged.
    pub fn scale_time(&mut self, factor: f64) -> Result<(), UserError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(UserError::InvalidTimeScale { factor });
        }
        for event in &mut self.events {
            event.t *= factor;
        }
        for position in &mut self.positions {
            position.t *= factor;
        }
        for symmetry in &mut self.symmetries {
            symmetry.scale_time(factor);
        }
        self.touch();
        Ok(())
    }

    /// Number of delay intervals after which every prop is back on its
    /// starting path.
    pub fn period(&self) -> Result<usize, UserError> {
        self.check_props()?;
        let delay = self.delay_symmetry()?;
        if delay.path_permutation().size() != self.paths {
            return Err(UserError::PathOutOfRange {
                path: delay.path_permutation().size(),
                paths: self.paths,
            });
        }
        Ok(Permutation::period(delay.path_permutation(), &self.prop_assignments()))
    }

    fn delay_symmetry(&self) -> Result<&Symmetry, UserError> {
        let mut delays = self
            .symmetries
            .iter()
            .filter(|s| s.kind() == SymmetryKind::Delay);
        match (delays.next(), delays.count()) {
            (Some(delay), 0) => Ok(delay),
            (first, rest) => Err(UserError::DelaySymmetryCount {
                count: usize::from(first.is_some()) + rest,
            }),
        }
    }

    #[must_use]
    pub fn is_bounce_pattern(&self) -> bool {
        self.events
            .iter()
            .flat_map(|e| &e.transitions)
            .any(|tr| tr.kind == TransitionKind::Throw && tr.throw_type == PathKind::Bounce)
    }

    fn check_props(&self) -> Result<(), UserError> {
        if !self.assignment.is_empty() && self.assignment.len() != self.paths {
            return Err(UserError::AssignmentLength {
                got: self.assignment.len(),
                expected: self.paths,
            });
        }
        let props = self.props.len().max(1);
        match self.assignment.iter().find(|&&p| p == 0 || p > props) {
            Some(&prop) => Err(UserError::PropOutOfRange { prop, props }),
            None => Ok(()),
        }
    }

    /// Lay the pattern out.
    ///
    /// On success the canonical master events replace the declared ones and
    /// the pattern is clean. On failure the previous masters and layout are
    /// kept and the pattern stays as it was.
    pub fn layout(&mut self) -> Result<(), PatternError> {
        let previous = self.state;
        self.state = LayoutState::LayingOut;
        let built = self.check_props().map_err(PatternError::from).and_then(|()| {
            Layout::build(&LayoutInput {
                jugglers: self.jugglers,
                paths: self.paths,
                symmetries: &self.symmetries,
                events: &self.events,
                positions: &self.positions,
            })
        });
        match built {
            Ok((layout, masters)) => {
                info!(
                    events = layout.events().len(),
                    loop_end = layout.loop_end(),
                    "pattern laid out"
                );
                self.events = masters;
                self.layout = Some(layout);
                self.state = LayoutState::Clean;
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "layout failed");
                self.state = previous;
                Err(e)
            }
        }
    }

    /// The committed layout, if the pattern is clean.
    pub fn laid_out(&self) -> Result<&Layout, InternalError> {
        match (&self.layout, self.state) {
            (Some(layout), LayoutState::Clean) => Ok(layout),
            _ => Err(InternalError::NotLaidOut),
        }
    }

    pub fn loop_start(&self) -> Result<f64, PatternError> {
        Ok(self.laid_out()?.loop_start())
    }

    pub fn loop_end(&self) -> Result<f64, PatternError> {
        Ok(self.laid_out()?.loop_end())
    }

    pub fn path_coordinate(&self, path: usize, t: f64) -> Result<Coordinate, PatternError> {
        self.check_path(path)?;
        self.laid_out()?.path_coordinate(path, t)
    }

    pub fn is_in_hand(&self, path: usize, t: f64) -> Result<bool, PatternError> {
        self.check_path(path)?;
        self.laid_out()?.is_in_hand(path, t)
    }

    pub fn hand_coordinate(
        &self,
        juggler: usize,
        hand: Hand,
        t: f64,
    ) -> Result<Coordinate, PatternError> {
        self.check_juggler(juggler)?;
        self.laid_out()?.hand_coordinate(juggler, hand, t)
    }

    pub fn juggler_position(&self, juggler: usize, t: f64) -> Result<Coordinate, PatternError> {
        self.check_juggler(juggler)?;
        self.laid_out()?.juggler_position(juggler, t)
    }

    /// Facing angle in degrees.
    pub fn juggler_angle(&self, juggler: usize, t: f64) -> Result<f64, PatternError> {
        self.check_juggler(juggler)?;
        self.laid_out()?.juggler_angle(juggler, t)
    }

    pub fn path_max(&self, path: usize) -> Result<Option<Coordinate>, PatternError> {
        self.check_path(path)?;
        self.laid_out()?.path_max(path)
    }

    pub fn path_min(&self, path: usize) -> Result<Option<Coordinate>, PatternError> {
        self.check_path(path)?;
        self.laid_out()?.path_min(path)
    }

    pub fn hand_max(&self, juggler: usize, hand: Hand) -> Result<Option<Coordinate>, PatternError> {
        self.check_juggler(juggler)?;
        self.laid_out()?.hand_max(juggler, hand)
    }

    pub fn hand_min(&self, juggler: usize, hand: Hand) -> Result<Option<Coordinate>, PatternError> {
        self.check_juggler(juggler)?;
        self.laid_out()?.hand_min(juggler, hand)
    }

    /// Upper corner of the box the juggler's body stays within.
    pub fn juggler_max(&self, juggler: usize) -> Result<Coordinate, PatternError> {
        self.check_juggler(juggler)?;
        let (_, hi) = self.laid_out()?.juggler_track(juggler).bounds()?;
        Ok(hi + body_extent().1)
    }

    /// Lower corner of the box the juggler's body stays within.
    pub fn juggler_min(&self, juggler: usize) -> Result<Coordinate, PatternError> {
        self.check_juggler(juggler)?;
        let (lo, _) = self.laid_out()?.juggler_track(juggler).bounds()?;
        Ok(lo + body_extent().0)
    }

    /// Body landmarks and arm joints of `juggler` at `t`.
    pub fn juggler_pose(&self, juggler: usize, t: f64) -> Result<JugglerPose, PatternError> {
        self.check_juggler(juggler)?;
        let layout = self.laid_out()?;
        let pose = solve_pose(
            juggler,
            layout.juggler_position(juggler, t)?,
            layout.juggler_angle(juggler, t)?,
            layout.hand_coordinate(juggler, Hand::Left, t)?,
            layout.hand_coordinate(juggler, Hand::Right, t)?,
        )?;
        Ok(pose)
    }

    fn check_juggler(&self, juggler: usize) -> Result<(), UserError> {
        if juggler == 0 || juggler > self.jugglers {
            return Err(UserError::JugglerOutOfRange {
                juggler,
                jugglers: self.jugglers,
            });
        }
        Ok(())
    }

    fn check_path(&self, path: usize) -> Result<(), UserError> {
        if path == 0 || path > self.paths {
            return Err(UserError::PathOutOfRange {
                path,
                paths: self.paths,
            });
        }
        Ok(())
    }
}

// Document conversion.
impl Pattern {
    /// Build a pattern by walking a `pattern` node (or a `jml` node wrapping
    /// one) in document order.
    pub fn from_document(root: &JmlNode) -> Result<Self, PatternError> {
        let node = match root.tag.as_str() {
            "pattern" => root,
            "jml" => root.children_tagged("pattern").next().ok_or_else(|| {
                DocumentError::UnexpectedRoot {
                    expected: "pattern".to_string(),
                    found: "jml".to_string(),
                }
            })?,
            other => {
                return Err(DocumentError::UnexpectedRoot {
                    expected: "pattern".to_string(),
                    found: other.to_string(),
                }
                .into());
            }
        };

        let mut pattern = Pattern::default();
        for child in &node.children {
            match child.tag.as_str() {
                "title" => pattern.set_title(child.text.clone().or_else(|| {
                    child.get("text").map(str::to_string)
                })),
                "prop" => {
                    let mut prop = Prop::new(child.get("type").unwrap_or("ball"));
                    prop.modifier = child.get("mod").map(str::to_string);
                    pattern.add_prop(prop);
                }
                "setup" => {
                    pattern.set_number_of_jugglers(child.get_usize("jugglers", 1)?);
                    let paths = child.parse_value("paths", child.require("paths")?)?;
                    pattern.set_number_of_paths(paths);
                    if let Some(list) = child.get("props") {
                        let assignment = list
                            .split(',')
                            .map(|p| child.parse_value::<usize>("props", p))
                            .collect::<Result<Vec<_>, _>>()?;
                        pattern.set_prop_assignments(assignment);
                    }
                }
                "symmetry" => {
                    let kind: SymmetryKind = child.require("type")?.parse()?;
                    let delay = match child.get("delay") {
                        Some(d) => Some(child.parse_value::<f64>("delay", d)?),
                        None => None,
                    };
                    pattern.add_symmetry(Symmetry::parse(
                        kind,
                        pattern.jugglers,
                        pattern.paths,
                        child.get("jperm").unwrap_or(""),
                        child.get("pperm").unwrap_or(""),
                        delay,
                    )?);
                }
                "event" => {
                    pattern.add_event(event_from_node(child)?);
                }
                "position" => {
                    pattern.add_position(Position::new(
                        Coordinate::new(
                            child.get_f64("x", 0.0)?,
                            child.get_f64("y", 0.0)?,
                            child.get_f64("z", 0.0)?,
                        ),
                        child.get_f64("angle", 0.0)?,
                        child.parse_value("t", child.require("t")?)?,
                        child.get_usize("juggler", 1)?,
                    ));
                }
                other => warn!(tag = other, "unknown pattern element ignored"),
            }
        }
        debug!(
            jugglers = pattern.jugglers,
            paths = pattern.paths,
            events = pattern.events.len(),
            "pattern read from document"
        );
        Ok(pattern)
    }

    /// Serialize the declarations back into a `pattern` node. Only master
    /// events are written.
    #[must_use]
    pub fn to_document(&self) -> JmlNode {
        let mut root = JmlNode::new("pattern");
        if let Some(title) = &self.title {
            root = root.child(JmlNode::new("title").with_text(title.clone()));
        }
        for prop in &self.props {
            let mut node = JmlNode::new("prop").attr("type", &prop.kind);
            if let Some(m) = &prop.modifier {
                node = node.attr("mod", m);
            }
            root = root.child(node);
        }

        let mut setup = JmlNode::new("setup")
            .attr("jugglers", self.jugglers)
            .attr("paths", self.paths);
        if !self.assignment.is_empty() {
            let list: Vec<String> = self.assignment.iter().map(usize::to_string).collect();
            setup = setup.attr("props", list.join(","));
        }
        root = root.child(setup);

        for symmetry in &self.symmetries {
            let mut node = JmlNode::new("symmetry").attr("type", symmetry.kind());
            if symmetry.kind() != SymmetryKind::Delay {
                node = node.attr("jperm", symmetry.juggler_permutation());
            }
            node = node.attr("pperm", symmetry.path_permutation());
            if let Some(delay) = symmetry.delay_time() {
                node = node.attr("delay", delay);
            }
            root = root.child(node);
        }
        for event in &self.events {
            root = root.child(event_to_node(event));
        }
        for p in &self.positions {
            root = root.child(
                JmlNode::new("position")
                    .attr("x", p.coordinate.x)
                    .attr("y", p.coordinate.y)
                    .attr("z", p.coordinate.z)
                    .attr("t", p.t)
                    .attr("angle", p.angle)
                    .attr("juggler", p.juggler),
            );
        }
        root
    }
}

fn event_from_node(node: &JmlNode) -> Result<Event, DocumentError> {
    let (juggler, hand) = parse_hand_label(node.require("hand")?)?;
    let mut event = Event::new(
        Coordinate::new(
            node.get_f64("x", 0.0)?,
            node.get_f64("y", 0.0)?,
            node.get_f64("z", 0.0)?,
        ),
        node.parse_value("t", node.require("t")?)?,
        juggler,
        hand,
    );
    for child in &node.children {
        let Some(kind) = TransitionKind::from_tag(&child.tag) else {
            warn!(tag = child.tag.as_str(), "unknown event element ignored");
            continue;
        };
        let path = child.parse_value("path", child.require("path")?)?;
        let transition = if kind == TransitionKind::Throw {
            let type_name = child.get("type").unwrap_or("toss");
            let throw_type = type_name.parse::<PathKind>().map_err(|_| {
                DocumentError::InvalidAttribute {
                    tag: child.tag.clone(),
                    key: "type".to_string(),
                    value: type_name.to_string(),
                }
            })?;
            Transition::throw(path, throw_type, child.get("mod").unwrap_or(""))
        } else {
            Transition::new(kind, path)
        };
        event.add_transition(transition);
    }
    Ok(event)
}

fn event_to_node(event: &Event) -> JmlNode {
    let mut node = JmlNode::new("event")
        .attr("x", event.local.x)
        .attr("y", event.local.y)
        .attr("z", event.local.z)
        .attr("t", event.t)
        .attr("hand", event.hand_label());
    for tr in &event.transitions {
        let mut child = JmlNode::new(tr.kind.tag()).attr("path", tr.path);
        if tr.kind == TransitionKind::Throw {
            child = child.attr("type", tr.throw_type);
            if !tr.modifier.is_empty() {
                child = child.attr("mod", &tr.modifier);
            }
        }
        node = node.child(child);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cascade() -> Pattern {
        let mut p = Pattern::new(1, 3);
        p.add_symmetry(Symmetry::delay(1, 3, "(1,3,2)", 0.6).unwrap());
        p.add_symmetry(
            Symmetry::parse(SymmetryKind::SwitchDelay, 1, 3, "(1,1*)", "(1,2,3)", None).unwrap(),
        );
        p.add_event(
            Event::new(Coordinate::new(10.0, 0.0, 0.0), 0.0, 1, Hand::Right)
                .with(Transition::throw(1, PathKind::Toss, "")),
        );
        p.add_event(
            Event::new(Coordinate::new(25.0, 0.0, 0.0), 0.4, 1, Hand::Right)
                .with(Transition::catch(3)),
        );
        p
    }

    #[test]
    fn mutations_mark_dirty() {
        let mut p = cascade();
        assert!(p.needs_layout());
        p.layout().unwrap();
        assert_eq!(p.state(), LayoutState::Clean);
        p.add_prop(Prop::new("club"));
        assert_eq!(p.state(), LayoutState::Dirty);
        assert!(matches!(
            p.path_coordinate(1, 0.0),
            Err(PatternError::Internal(InternalError::NotLaidOut))
        ));
    }

    #[test]
    fn failed_layout_keeps_previous_masters() {
        let mut p = cascade();
        p.layout().unwrap();
        let before = p.events().to_vec();
        p.set_number_of_paths(2);
        assert!(p.layout().unwrap_err().is_user());
        assert_eq!(p.events(), before.as_slice());
        assert_eq!(p.state(), LayoutState::Dirty);
    }

    #[test]
    fn prop_assignment_is_checked() {
        let mut p = cascade();
        p.set_prop_assignments(vec![1, 1]);
        assert_eq!(
            p.layout().unwrap_err(),
            PatternError::User(UserError::AssignmentLength {
                got: 2,
                expected: 3
            })
        );
        p.set_prop_assignments(vec![1, 2, 1]);
        assert_eq!(
            p.layout().unwrap_err(),
            PatternError::User(UserError::PropOutOfRange { prop: 2, props: 1 })
        );
    }

    #[test]
    fn period_uses_prop_assignment() {
        let mut p = cascade();
        assert_eq!(p.period().unwrap(), 1);
        p.add_prop(Prop::new("ball"));
        p.add_prop(Prop::new("club"));
        p.set_prop_assignments(vec![1, 1, 2]);
        assert_eq!(p.period().unwrap(), 3);
        assert_eq!(p.prop_for_path(3).map(|pr| pr.kind.as_str()), Some("club"));
    }

    #[test]
    fn missing_delay_symmetry_has_no_period() {
        let p = Pattern::new(1, 1);
        assert_eq!(p.period(), Err(UserError::DelaySymmetryCount { count: 0 }));
    }

    #[test]
    fn bounce_throws_are_detected() {
        let mut p = cascade();
        assert!(!p.is_bounce_pattern());
        p.add_event(
            Event::new(Coordinate::ZERO, 0.5, 1, Hand::Left)
                .with(Transition::throw(2, PathKind::Bounce, "")),
        );
        assert!(p.is_bounce_pattern());
    }

    #[test]
    fn invalid_time_scale_is_rejected() {
        let mut p = cascade();
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(p.scale_time(factor).is_err());
        }
    }

    #[test]
    fn unknown_root_is_rejected() {
        let err = Pattern::from_document(&JmlNode::new("juggle")).unwrap_err();
        assert!(err.is_user());
    }

    #[test]
    fn jml_root_wraps_pattern() {
        let doc = JmlNode::new("jml").child(cascade().to_document());
        let p = Pattern::from_document(&doc).unwrap();
        assert_eq!(p.events().len(), 2);
        assert_eq!(p.number_of_paths(), 3);
    }

    #[test]
    fn unknown_throw_type_is_a_document_error() {
        let doc = JmlNode::new("pattern")
            .child(JmlNode::new("setup").attr("paths", 1))
            .child(
                JmlNode::new("event")
                    .attr("t", 0)
                    .attr("hand", "left")
                    .child(JmlNode::new("throw").attr("path", 1).attr("type", "spin")),
            );
        let err = Pattern::from_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            PatternError::User(UserError::Document(DocumentError::InvalidAttribute { .. }))
        ));
    }
}
