use std::fmt;
use std::str::FromStr;

use juggle_core::Coordinate;
use juggle_curve::PathKind;

use crate::document::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    #[must_use]
    pub fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hand {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Hand::Left),
            "right" => Ok(Hand::Right),
            _ => Err(DocumentError::InvalidHand {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Throw,
    Catch,
    SoftCatch,
    GrabCatch,
    Holding,
}

impl TransitionKind {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            TransitionKind::Throw => "throw",
            TransitionKind::Catch => "catch",
            TransitionKind::SoftCatch => "softcatch",
            TransitionKind::GrabCatch => "grabcatch",
            TransitionKind::Holding => "holding",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "throw" => TransitionKind::Throw,
            "catch" => TransitionKind::Catch,
            "softcatch" => TransitionKind::SoftCatch,
            "grabcatch" => TransitionKind::GrabCatch,
            "holding" => TransitionKind::Holding,
            _ => return None,
        })
    }

    /// Catch, soft catch or grab catch.
    #[must_use]
    pub fn is_catch(self) -> bool {
        matches!(
            self,
            TransitionKind::Catch | TransitionKind::SoftCatch | TransitionKind::GrabCatch
        )
    }

    /// Throws and soft catches pin the hand's velocity to the prop's.
    #[must_use]
    pub fn determines_velocity(self) -> bool {
        matches!(self, TransitionKind::Throw | TransitionKind::SoftCatch)
    }
}

/// What happens to one path at an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub path: usize,
    /// Flight type; meaningful for throws only.
    pub throw_type: PathKind,
    pub modifier: String,
}

impl Transition {
    #[must_use]
    pub fn new(kind: TransitionKind, path: usize) -> Self {
        Self {
            kind,
            path,
            throw_type: PathKind::Toss,
            modifier: String::new(),
        }
    }

    #[must_use]
    pub fn throw(path: usize, throw_type: PathKind, modifier: impl Into<String>) -> Self {
        Self {
            kind: TransitionKind::Throw,
            path,
            throw_type,
            modifier: modifier.into(),
        }
    }

    #[must_use]
    pub fn catch(path: usize) -> Self {
        Self::new(TransitionKind::Catch, path)
    }

    #[must_use]
    pub fn soft_catch(path: usize) -> Self {
        Self::new(TransitionKind::SoftCatch, path)
    }

    #[must_use]
    pub fn holding(path: usize) -> Self {
        Self::new(TransitionKind::Holding, path)
    }
}

/// A moment when one hand of one juggler does something, in that juggler's
/// local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub t: f64,
    pub local: Coordinate,
    pub juggler: usize,
    pub hand: Hand,
    pub transitions: Vec<Transition>,
}

impl Event {
    #[must_use]
    pub fn new(local: Coordinate, t: f64, juggler: usize, hand: Hand) -> Self {
        Self {
            t,
            local,
            juggler,
            hand,
            transitions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    #[must_use]
    pub fn transition_for_path(&self, path: usize) -> Option<&Transition> {
        self.transitions.iter().find(|tr| tr.path == path)
    }

    #[must_use]
    pub fn has_kind(&self, kind: TransitionKind) -> bool {
        self.transitions.iter().any(|tr| tr.kind == kind)
    }

    #[must_use]
    pub fn determines_velocity(&self) -> bool {
        self.transitions
            .iter()
            .any(|tr| tr.kind.determines_velocity())
    }

    /// `"left"`, or `"2:right"` for jugglers other than the first.
    #[must_use]
    pub fn hand_label(&self) -> String {
        if self.juggler == 1 {
            self.hand.to_string()
        } else {
            format!("{}:{}", self.juggler, self.hand)
        }
    }
}

/// Parse `"[juggler:]left|right"`.
pub fn parse_hand_label(label: &str) -> Result<(usize, Hand), DocumentError> {
    match label.split_once(':') {
        None => Ok((1, label.parse()?)),
        Some((j, h)) => {
            let juggler = j
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|j| *j >= 1)
                .ok_or_else(|| DocumentError::InvalidHand {
                    value: label.to_string(),
                })?;
            Ok((juggler, h.parse()?))
        }
    }
}

/// Declared body placement of one juggler at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub t: f64,
    pub coordinate: Coordinate,
    /// Facing angle in degrees about +z.
    pub angle: f64,
    pub juggler: usize,
}

impl Position {
    #[must_use]
    pub fn new(coordinate: Coordinate, angle: f64, t: f64, juggler: usize) -> Self {
        Self {
            t,
            coordinate,
            angle,
            juggler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_labels() {
        assert_eq!(parse_hand_label("left").unwrap(), (1, Hand::Left));
        assert_eq!(parse_hand_label("2:Right").unwrap(), (2, Hand::Right));
        assert!(parse_hand_label("0:left").is_err());
        assert!(parse_hand_label("middle").is_err());

        let e = Event::new(Coordinate::ZERO, 0.0, 3, Hand::Left);
        assert_eq!(e.hand_label(), "3:left");
        assert_eq!(parse_hand_label(&e.hand_label()).unwrap(), (3, Hand::Left));
    }

    #[test]
    fn velocity_transitions() {
        let e = Event::new(Coordinate::ZERO, 0.0, 1, Hand::Right)
            .with(Transition::catch(1))
            .with(Transition::holding(2));
        assert!(!e.determines_velocity());
        let e = e.with(Transition::soft_catch(3));
        assert!(e.determines_velocity());
        assert_eq!(
            e.transition_for_path(2).map(|t| t.kind),
            Some(TransitionKind::Holding)
        );
    }
}
