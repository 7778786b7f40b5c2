//! Prop flights between a throw and the matching catch.

mod bounce;
mod toss;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use juggle_core::Coordinate;
use thiserror::Error;

pub use bounce::BouncePath;
pub use toss::TossPath;

/// Standard gravity in cm/s^2.
pub const GRAVITY: f64 = 980.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("unknown throw type \"{name}\"")]
    UnknownThrowType { name: String },

    #[error("unknown parameter \"{key}\" for {kind} throw")]
    UnknownParameter { kind: PathKind, key: String },

    #[error("invalid value \"{value}\" for parameter \"{key}\"")]
    InvalidParameter { key: String, value: String },

    #[error("throw at t={start} must land after it starts (catch at t={end})")]
    NonPositiveDuration { start: f64, end: f64 },

    #[error("bounce path cannot be satisfied: {reason}")]
    BounceInfeasible { reason: String },
}

/// The kinds of flight a throw can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathKind {
    #[default]
    Toss,
    Bounce,
}

impl PathKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PathKind::Toss => "toss",
            PathKind::Bounce => "bounce",
        }
    }

    /// Build the flight from the throw (`start`) to the catch (`end`).
    ///
    /// `modifier` is a `key=value;key=value` list understood by the kind.
    pub fn build(
        self,
        modifier: &str,
        start: Coordinate,
        start_time: f64,
        end: Coordinate,
        end_time: f64,
    ) -> Result<Box<dyn Path>, PathError> {
        if !(end_time > start_time) {
            return Err(PathError::NonPositiveDuration {
                start: start_time,
                end: end_time,
            });
        }
        let params = parse_modifier(modifier)?;
        Ok(match self {
            PathKind::Toss => Box::new(TossPath::new(
                &params, start, start_time, end, end_time,
            )?),
            PathKind::Bounce => Box::new(BouncePath::new(
                &params, start, start_time, end, end_time,
            )?),
        })
    }
}

impl FromStr for PathKind {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "toss" => Ok(PathKind::Toss),
            "bounce" => Ok(PathKind::Bounce),
            _ => Err(PathError::UnknownThrowType {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A computed flight. Times outside `[start_time, end_time]` extrapolate.
pub trait Path: fmt::Debug + Send + Sync {
    fn kind(&self) -> PathKind;

    fn start_time(&self) -> f64;

    fn end_time(&self) -> f64;

    fn coordinate(&self, t: f64) -> Coordinate;

    /// Velocity the prop leaves the hand with.
    fn start_velocity(&self) -> Coordinate;

    /// Velocity the prop arrives at the catching hand with.
    fn end_velocity(&self) -> Coordinate;

    /// Component-wise maximum over `[t1, t2]` clipped to the flight.
    fn max(&self, t1: f64, t2: f64) -> Option<Coordinate>;

    /// Component-wise minimum over `[t1, t2]` clipped to the flight.
    fn min(&self, t1: f64, t2: f64) -> Option<Coordinate>;
}

pub(crate) type Params = IndexMap<String, String>;

/// Split `"g=500; bounces=2"` into ordered key/value pairs. A bare key means
/// `true`.
pub(crate) fn parse_modifier(modifier: &str) -> Result<Params, PathError> {
    let mut out = Params::new();
    for part in modifier.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = match part.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (part, "true"),
        };
        out.insert(key.to_ascii_lowercase(), value.to_string());
    }
    Ok(out)
}

pub(crate) fn reject_unknown(
    kind: PathKind,
    params: &Params,
    known: &[&str],
) -> Result<(), PathError> {
    match params.keys().find(|k| !known.contains(&k.as_str())) {
        Some(key) => Err(PathError::UnknownParameter {
            kind,
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn param_f64(params: &Params, key: &str, default: f64) -> Result<f64, PathError> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| PathError::InvalidParameter {
                key: key.to_string(),
                value: v.clone(),
            }),
    }
}

pub(crate) fn param_bool(params: &Params, key: &str, default: bool) -> Result<bool, PathError> {
    match params.get(key).map(String::as_str) {
        None => Ok(default),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(PathError::InvalidParameter {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_throw_types() {
        assert_eq!("".parse::<PathKind>().unwrap(), PathKind::Toss);
        assert_eq!("Bounce".parse::<PathKind>().unwrap(), PathKind::Bounce);
        assert!(matches!(
            "spin".parse::<PathKind>(),
            Err(PathError::UnknownThrowType { .. })
        ));
    }

    #[test]
    fn parses_modifiers() {
        let p = parse_modifier(" g=500 ; hyper ;bounces = 2").unwrap();
        assert_eq!(p.get("g").map(String::as_str), Some("500"));
        assert_eq!(p.get("hyper").map(String::as_str), Some("true"));
        assert_eq!(param_f64(&p, "bounces", 1.0).unwrap(), 2.0);
        assert!(param_bool(&p, "hyper", false).unwrap());
    }

    #[test]
    fn rejects_reversed_time() {
        let err = PathKind::Toss
            .build("", Coordinate::ZERO, 1.0, Coordinate::ZERO, 0.5)
            .unwrap_err();
        assert!(matches!(err, PathError::NonPositiveDuration { .. }));
    }
}
