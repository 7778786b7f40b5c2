//! Value types shared by the curve and pattern crates.

pub mod coordinate;
pub mod permutation;

pub use coordinate::Coordinate;
pub use permutation::{Permutation, PermutationError, gcd, lcm};
