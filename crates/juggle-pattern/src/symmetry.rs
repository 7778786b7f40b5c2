use std::fmt;
use std::str::FromStr;

use juggle_core::{Permutation, PermutationError};

use crate::document::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetryKind {
    /// Shift in time; defines the loop.
    Delay,
    /// Exchange jugglers at the same instant.
    Switch,
    /// Exchange jugglers and shift in time.
    SwitchDelay,
}

impl SymmetryKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SymmetryKind::Delay => "delay",
            SymmetryKind::Switch => "switch",
            SymmetryKind::SwitchDelay => "switchdelay",
        }
    }
}

impl fmt::Display for SymmetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymmetryKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delay" => Ok(SymmetryKind::Delay),
            "switch" => Ok(SymmetryKind::Switch),
            "switchdelay" => Ok(SymmetryKind::SwitchDelay),
            _ => Err(DocumentError::InvalidAttribute {
                tag: "symmetry".to_string(),
                key: "type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// One declared invariance of a pattern.
///
/// The juggler permutation may mark a juggler with `*`, meaning its left and
/// right hands are exchanged as it moves. The path permutation may mark a
/// path with `*`, meaning the prop is flipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Symmetry {
    kind: SymmetryKind,
    jugglers: Permutation,
    paths: Permutation,
    delay: Option<f64>,
}

impl Symmetry {
    #[must_use]
    pub fn new(
        kind: SymmetryKind,
        jugglers: Permutation,
        paths: Permutation,
        delay: Option<f64>,
    ) -> Self {
        let delay = match kind {
            SymmetryKind::Switch => None,
            _ => delay,
        };
        Self {
            kind,
            jugglers,
            paths,
            delay,
        }
    }

    /// Build from cycle-notation strings, as they appear in a document.
    pub fn parse(
        kind: SymmetryKind,
        juggler_count: usize,
        path_count: usize,
        jperm: &str,
        pperm: &str,
        delay: Option<f64>,
    ) -> Result<Self, PermutationError> {
        Ok(Self::new(
            kind,
            Permutation::parse(juggler_count, jperm, true)?,
            Permutation::parse(path_count, pperm, true)?,
            delay,
        ))
    }

    /// The delay symmetry every pattern needs.
    pub fn delay(
        juggler_count: usize,
        path_count: usize,
        pperm: &str,
        delay: f64,
    ) -> Result<Self, PermutationError> {
        Self::parse(
            SymmetryKind::Delay,
            juggler_count,
            path_count,
            "",
            pperm,
            Some(delay),
        )
    }

    #[must_use]
    pub fn kind(&self) -> SymmetryKind {
        self.kind
    }

    #[must_use]
    pub fn juggler_permutation(&self) -> &Permutation {
        &self.jugglers
    }

    #[must_use]
    pub fn path_permutation(&self) -> &Permutation {
        &self.paths
    }

    /// Declared time shift. `None` for switches, and for a switch-delay that
    /// takes half the pattern delay.
    #[must_use]
    pub fn delay_time(&self) -> Option<f64> {
        self.delay
    }

    pub(crate) fn scale_time(&mut self, factor: f64) {
        if let Some(d) = self.delay.as_mut() {
            *d *= factor;
        }
    }
}
