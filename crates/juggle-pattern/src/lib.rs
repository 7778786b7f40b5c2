//! Juggling pattern layout.
//!
//! A [`Pattern`] declares a few master events and the symmetries that
//! generate the rest. [`Pattern::layout`] expands them into a periodic event
//! timeline and solves continuous curves for every prop, hand and juggler,
//! which can then be sampled at any time.

pub mod document;
pub mod error;
pub mod event;
pub mod juggler;
pub mod layout;
pub mod pattern;
pub mod shared;
pub mod symmetry;

pub use document::{DocumentError, JmlNode};
pub use error::{InternalError, PatternError, UserError};
pub use event::{Event, Hand, Position, Transition, TransitionKind};
pub use juggler::{ArmPose, JugglerPose};
pub use layout::Layout;
pub use pattern::{LayoutState, Pattern, Prop};
pub use shared::SharedPattern;
pub use symmetry::{Symmetry, SymmetryKind};

pub use juggle_core::{Coordinate, Permutation};
pub use juggle_curve::PathKind;
