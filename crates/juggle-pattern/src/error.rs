use juggle_core::PermutationError;
use juggle_curve::{CurveError, PathError};
use thiserror::Error;

use crate::document::DocumentError;
use crate::event::Hand;

/// Anything a layout or query can fail with.
///
/// `User` errors describe a pattern that cannot be laid out as written and
/// leave the previously committed layout in place. `Internal` errors mean an
/// invariant of the engine itself did not hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

impl PatternError {
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, PatternError::User(_))
    }
}

impl From<PermutationError> for PatternError {
    fn from(e: PermutationError) -> Self {
        PatternError::User(UserError::Permutation(e))
    }
}

impl From<DocumentError> for PatternError {
    fn from(e: DocumentError) -> Self {
        PatternError::User(UserError::Document(e))
    }
}

impl From<CurveError> for PatternError {
    fn from(e: CurveError) -> Self {
        PatternError::Internal(InternalError::Curve(e))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UserError {
    #[error("juggler {juggler} {hand} hand is never touched by any event")]
    HandNeverTouched { juggler: usize, hand: Hand },

    #[error("path {path} is never touched by any event")]
    PathNeverTouched { path: usize },

    #[error("path {path} is thrown twice without a catch in between")]
    SuccessiveThrows { path: usize },

    #[error("path {path} is caught without being thrown")]
    SuccessiveCatches { path: usize },

    #[error("path {path} changes hands without being thrown")]
    HandChangedWhileHeld { path: usize },

    #[error("path {path}: {source}")]
    Flight { path: usize, source: PathError },

    #[error("juggler {juggler} does not exist (pattern has {jugglers})")]
    JugglerOutOfRange { juggler: usize, jugglers: usize },

    #[error("path {path} does not exist (pattern has {paths})")]
    PathOutOfRange { path: usize, paths: usize },

    #[error("prop {prop} does not exist (pattern has {props})")]
    PropOutOfRange { prop: usize, props: usize },

    #[error("prop assignment lists {got} paths, expected {expected}")]
    AssignmentLength { got: usize, expected: usize },

    #[error("pattern has no events")]
    NoEvents,

    #[error("pattern needs exactly one delay symmetry, found {count}")]
    DelaySymmetryCount { count: usize },

    #[error("delay symmetry must have a positive delay, got {delay}")]
    InvalidDelay { delay: f64 },

    #[error("delay symmetry cannot permute jugglers")]
    DelayMovesJugglers,

    #[error("symmetries generate more than {limit} distinct images per period")]
    SymmetryGroupTooLarge { limit: usize },

    #[error("two events for juggler {juggler} {hand} hand at t={t}")]
    EventCollision { juggler: usize, hand: Hand, t: f64 },

    #[error("event expansion exceeded {limit} events")]
    ExpansionLimit { limit: usize },

    #[error("time scale factor must be positive and finite, got {factor}")]
    InvalidTimeScale { factor: f64 },

    #[error(transparent)]
    Permutation(#[from] PermutationError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    #[error("pattern is not laid out")]
    NotLaidOut,

    #[error("orbit of master event {master} has no images")]
    EmptyOrbit { master: usize },

    #[error("master event selection did not settle after {rounds} rebuilds")]
    MasterSelectionUnstable { rounds: usize },

    #[error("juggler {juggler} {hand} hand at t={t} has no path to take its velocity from")]
    MissingVelocityPath { juggler: usize, hand: Hand, t: f64 },

    #[error("velocity reference to link {link} of path {path} does not exist")]
    DanglingVelocityRef { path: usize, link: usize },

    #[error("juggler {juggler} {hand} hand: delay image of the event at t={t} was not generated")]
    MissingDelayImage { juggler: usize, hand: Hand, t: f64 },

    #[error("juggler {juggler} {hand} hand has no curve at t={t}")]
    MissingHandCurve { juggler: usize, hand: Hand, t: f64 },

    #[error("path {path} has no link at t={t}")]
    MissingPathLink { path: usize, t: f64 },

    #[error("juggler {juggler} {hand} hand is {distance:.1} cm from the shoulder, out of reach")]
    UnreachableHand {
        juggler: usize,
        hand: Hand,
        distance: f64,
    },

    #[error("{what} is not finite")]
    NonFinite { what: &'static str },

    #[error(transparent)]
    Curve(#[from] CurveError),
}
