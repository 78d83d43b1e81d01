// vim: tw=80
//! Invocation count policies used by verification.

use std::fmt;

/// How many qualifying calls a verification requires.
///
/// The default is exactly one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Times {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Times {
    /// Is `count` acceptable under this policy?
    pub fn matches(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::Exactly(1)
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Times::Exactly(n) => write!(f, "{}", n),
            Times::AtLeast(n) => write!(f, "at least {}", n),
            Times::AtMost(n) => write!(f, "at most {}", n),
        }
    }
}

/// Require exactly `n` calls.
pub fn times(n: usize) -> Times {
    Times::Exactly(n)
}

/// Require exactly one call.
pub fn once() -> Times {
    Times::Exactly(1)
}

/// Forbid any call.
pub fn never() -> Times {
    Times::Exactly(0)
}

pub fn at_least(n: usize) -> Times {
    Times::AtLeast(n)
}

pub fn at_most(n: usize) -> Times {
    Times::AtMost(n)
}
