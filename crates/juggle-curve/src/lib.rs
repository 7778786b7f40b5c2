//! Time-parameterized curves for hands and props.
//!
//! [`Curve`] implementations interpolate through knots (hand motion, juggler
//! movement); [`Path`] implementations are flights computed from a throw and
//! its catch.

pub mod curve;
pub mod line;
pub mod path;
pub mod spline;

pub use curve::{Curve, CurveError};
pub use line::LineCurve;
pub use path::{BouncePath, Path, PathError, PathKind, TossPath};
pub use spline::SplineCurve;
