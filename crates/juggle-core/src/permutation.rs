use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermutationError {
    #[error("permutation \"{spec}\": expected \"(\" at \"{at}\"")]
    MissingOpenParen { spec: String, at: String },

    #[error("permutation \"{spec}\": unterminated cycle")]
    UnterminatedCycle { spec: String },

    #[error("permutation \"{spec}\": \"{token}\" is not a number")]
    InvalidElement { spec: String, token: String },

    #[error("permutation \"{spec}\": element {element} is outside 1..={size}")]
    OutOfRange {
        spec: String,
        element: usize,
        size: usize,
    },

    #[error("permutation \"{spec}\": element {element} appears more than once")]
    Repeated { spec: String, element: usize },

    #[error("permutation \"{spec}\": \"*\" is not allowed here")]
    UnexpectedReverse { spec: String },

    #[error("permutation \"{spec}\": element {element} is mapped inconsistently")]
    Inconsistent { spec: String, element: usize },
}

/// A bijection on `1..=size`.
///
/// When `signed`, an element may map to a negated target (written `n*` in
/// cycle notation), and `mapping(-i) == -mapping(i)` holds for every `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permutation {
    size: usize,
    signed: bool,
    mapping: Vec<i32>,
}

impl Permutation {
    #[must_use]
    pub fn identity(size: usize, signed: bool) -> Self {
        Self {
            size,
            signed,
            mapping: (1..=size as i32).collect(),
        }
    }

    /// Parse cycle notation such as `"(1,2,3)(4,5*)"`.
    ///
    /// Elements that are not mentioned are fixed points, and an empty string is
    /// the identity.
    pub fn parse(size: usize, spec: &str, signed: bool) -> Result<Self, PermutationError> {
        let mut mapping: Vec<Option<i32>> = vec![None; size];
        // Per element: the cycle it was first seen in, and which signs were used.
        let mut seen: Vec<Option<(usize, bool, bool)>> = vec![None; size];
        let mut rest = spec.trim();
        let mut cycle_index = 0;

        while !rest.is_empty() {
            let Some(body) = rest.strip_prefix('(') else {
                return Err(PermutationError::MissingOpenParen {
                    spec: spec.to_string(),
                    at: rest.to_string(),
                });
            };
            let Some(close) = body.find(')') else {
                return Err(PermutationError::UnterminatedCycle {
                    spec: spec.to_string(),
                });
            };

            let mut cycle: Vec<i32> = Vec::new();
            for token in body[..close].split(',') {
                let token = token.trim();
                let (digits, reversed) = match token.strip_suffix('*') {
                    Some(d) => (d.trim(), true),
                    None => (token, false),
                };
                if reversed && !signed {
                    return Err(PermutationError::UnexpectedReverse {
                        spec: spec.to_string(),
                    });
                }
                let element: usize =
                    digits
                        .parse()
                        .map_err(|_| PermutationError::InvalidElement {
                            spec: spec.to_string(),
                            token: token.to_string(),
                        })?;
                if element == 0 || element > size {
                    return Err(PermutationError::OutOfRange {
                        spec: spec.to_string(),
                        element,
                        size,
                    });
                }
                let repeated = PermutationError::Repeated {
                    spec: spec.to_string(),
                    element,
                };
                // `n` and `n*` may share one cycle; anything else is a repeat.
                match seen[element - 1] {
                    None => seen[element - 1] = Some((cycle_index, !reversed, reversed)),
                    Some((c, pos, neg)) => {
                        let already = if reversed { neg } else { pos };
                        if c != cycle_index || already {
                            return Err(repeated);
                        }
                        seen[element - 1] = Some((c, pos || !reversed, neg || reversed));
                    }
                }
                let e = element as i32;
                cycle.push(if reversed { -e } else { e });
            }

            for (k, &from) in cycle.iter().enumerate() {
                let to = cycle[(k + 1) % cycle.len()];
                let idx = from.unsigned_abs() as usize - 1;
                let value = from.signum() * to;
                if mapping[idx].is_some_and(|existing| existing != value) {
                    return Err(PermutationError::Inconsistent {
                        spec: spec.to_string(),
                        element: idx + 1,
                    });
                }
                mapping[idx] = Some(value);
            }

            cycle_index += 1;
            rest = body[close + 1..].trim_start();
        }

        Ok(Self {
            size,
            signed,
            mapping: mapping
                .into_iter()
                .enumerate()
                .map(|(i, m)| m.unwrap_or(i as i32 + 1))
                .collect(),
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Image of `elem` (1-based). Negative elements are accepted for signed
    /// permutations.
    #[must_use]
    pub fn mapping(&self, elem: i32) -> i32 {
        let m = self.mapping[elem.unsigned_abs() as usize - 1];
        if elem < 0 { -m } else { m }
    }

    /// Image of `elem` ignoring any orientation flip.
    #[must_use]
    pub fn target(&self, elem: usize) -> usize {
        self.mapping(elem as i32).unsigned_abs() as usize
    }

    /// True when `elem` is sent to a negated target.
    #[must_use]
    pub fn flips(&self, elem: usize) -> bool {
        self.mapping(elem as i32) < 0
    }

    #[must_use]
    pub fn inverse(&self) -> Permutation {
        let mut mapping = vec![0; self.size];
        for (i, &m) in self.mapping.iter().enumerate() {
            let from = i as i32 + 1;
            mapping[m.unsigned_abs() as usize - 1] = m.signum() * from;
        }
        Permutation {
            size: self.size,
            signed: self.signed,
            mapping,
        }
    }

    /// The permutation that applies `self` first and then `next`.
    #[must_use]
    pub fn then(&self, next: &Permutation) -> Permutation {
        debug_assert_eq!(self.size, next.size);
        Permutation {
            size: self.size,
            signed: self.signed || next.signed,
            mapping: self.mapping.iter().map(|&m| next.mapping(m)).collect(),
        }
    }

    /// `self` applied `exp` times; negative exponents use the inverse.
    #[must_use]
    pub fn power(&self, exp: i64) -> Permutation {
        let base = if exp < 0 { self.inverse() } else { self.clone() };
        let mut out = Permutation::identity(self.size, self.signed);
        for _ in 0..exp.unsigned_abs() {
            out = out.then(&base);
        }
        out
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.mapping
            .iter()
            .enumerate()
            .all(|(i, &m)| m == i as i32 + 1)
    }

    /// Elements of the cycle containing `elem`, starting at `elem`, with
    /// orientation flips ignored.
    #[must_use]
    pub fn cycle(&self, elem: usize) -> Vec<usize> {
        let mut out = vec![elem];
        let mut cur = self.target(elem);
        while cur != elem {
            out.push(cur);
            cur = self.target(cur);
        }
        out
    }

    /// Disjoint cycles covering `1..=size`, each starting at its smallest
    /// element.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut done = vec![false; self.size];
        let mut out = Vec::new();
        for elem in 1..=self.size {
            if done[elem - 1] {
                continue;
            }
            let cycle = self.cycle(elem);
            for &e in &cycle {
                done[e - 1] = true;
            }
            out.push(cycle);
        }
        out
    }

    /// Smallest `k > 0` with `self.power(k)` equal to the identity.
    #[must_use]
    pub fn order(&self) -> usize {
        let mut order = 1;
        for cycle in self.cycles() {
            let start = cycle[0] as i32;
            let mut cur = start;
            for _ in 0..cycle.len() {
                cur = self.mapping(cur);
            }
            let len = if cur == start {
                cycle.len()
            } else {
                2 * cycle.len()
            };
            order = lcm(order, len);
        }
        order
    }

    /// Number of applications of `perm` after which the labels in
    /// `assignment` (indexed by element - 1) come back to where they started.
    ///
    /// Each cycle contributes the smallest rotation that reproduces its label
    /// sequence; the result is the lcm over cycles.
    #[must_use]
    pub fn period(perm: &Permutation, assignment: &[usize]) -> usize {
        let mut period = 1;
        for cycle in perm.cycles() {
            let labels: Vec<usize> = cycle.iter().map(|&e| assignment[e - 1]).collect();
            let len = labels.len();
            let cycle_period = (1..=len)
                .filter(|d| len % d == 0)
                .find(|&d| (0..len).all(|k| labels[k] == labels[(k + d) % len]))
                .unwrap_or(len);
            period = lcm(period, cycle_period);
        }
        period
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut done = vec![false; self.size];
        for elem in 1..=self.size {
            if done[elem - 1] {
                continue;
            }
            let start = elem as i32;
            if self.mapping(start) == start {
                done[elem - 1] = true;
                continue;
            }
            // Walk with signs so that reversed targets print as `n*`.
            let mut parts = Vec::new();
            let mut cur = start;
            loop {
                done[cur.unsigned_abs() as usize - 1] = true;
                parts.push(if cur < 0 {
                    format!("{}*", -cur)
                } else {
                    cur.to_string()
                });
                cur = self.mapping(cur);
                if cur == start {
                    break;
                }
            }
            write!(f, "({})", parts.join(","))?;
        }
        Ok(())
    }
}

#[must_use]
pub fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[must_use]
pub fn lcm(a: usize, b: usize) -> usize {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cycles_and_fixed_points() {
        let p = Permutation::parse(5, "(1,2,3)", false).unwrap();
        assert_eq!(p.target(1), 2);
        assert_eq!(p.target(2), 3);
        assert_eq!(p.target(3), 1);
        assert_eq!(p.target(4), 4);
        assert_eq!(p.target(5), 5);
    }

    #[test]
    fn empty_spec_is_identity() {
        let p = Permutation::parse(3, "  ", false).unwrap();
        assert!(p.is_identity());
    }

    #[test]
    fn signed_cycle_negates_target() {
        let p = Permutation::parse(2, "(1,2*)", true).unwrap();
        assert_eq!(p.mapping(1), -2);
        assert_eq!(p.mapping(-2), 1);
        assert_eq!(p.mapping(2), -1);
        assert_eq!(p.order(), 2);

        let p = Permutation::parse(2, "(1,2*,1*,2)", true).unwrap();
        assert_eq!(p.mapping(1), -2);
        assert_eq!(p.mapping(2), 1);
        assert_eq!(p.order(), 4);
    }

    #[test]
    fn self_reversal_has_order_two() {
        let p = Permutation::parse(1, "(1,1*)", true).unwrap();
        assert_eq!(p.mapping(1), -1);
        assert!(p.flips(1));
        assert_eq!(p.target(1), 1);
        assert_eq!(p.order(), 2);
    }

    #[test]
    fn mismatched_halves_are_inconsistent() {
        assert!(matches!(
            Permutation::parse(2, "(1,1*,2)", true),
            Err(PermutationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Permutation::parse(3, "(1,4)", false),
            Err(PermutationError::OutOfRange { element: 4, .. })
        ));
        assert!(matches!(
            Permutation::parse(3, "(1,1)", false),
            Err(PermutationError::Repeated { element: 1, .. })
        ));
        assert!(matches!(
            Permutation::parse(3, "1,2", false),
            Err(PermutationError::MissingOpenParen { .. })
        ));
        assert!(matches!(
            Permutation::parse(3, "(1,2", false),
            Err(PermutationError::UnterminatedCycle { .. })
        ));
        assert!(matches!(
            Permutation::parse(3, "(1,x)", false),
            Err(PermutationError::InvalidElement { .. })
        ));
        assert!(matches!(
            Permutation::parse(3, "(1,2*)", false),
            Err(PermutationError::UnexpectedReverse { .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        for spec in ["(1,3)(2,4,5)", "(1,2*)", "(3,3*)", "(1,2*,1*,2)"] {
            let p = Permutation::parse(5, spec, true).unwrap();
            let again = Permutation::parse(5, &p.to_string(), true).unwrap();
            assert_eq!(p, again, "spec {spec} printed as {p}");
        }
    }

    #[test]
    fn period_accounts_for_repeated_labels() {
        let p = Permutation::parse(3, "(1,2,3)", false).unwrap();
        assert_eq!(Permutation::period(&p, &[1, 1, 1]), 1);
        assert_eq!(Permutation::period(&p, &[1, 2, 3]), 3);

        let p = Permutation::parse(4, "(1,2,3,4)", false).unwrap();
        assert_eq!(Permutation::period(&p, &[1, 2, 1, 2]), 2);

        let p = Permutation::parse(5, "(1,2)(3,4,5)", false).unwrap();
        assert_eq!(Permutation::period(&p, &[1, 2, 3, 4, 5]), 6);
    }

    #[test]
    fn lcm_and_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(1, 7), 7);
    }
}
