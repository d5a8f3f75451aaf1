//! tally.rs
//!
//! Majority arithmetic: counting a round's votes and deciding whether a
//! value was merely adopted or irrevocably decided.

use benor_common::Value;
use serde::{Deserialize, Serialize};

/// Counts of settled votes in one round. `"?"` votes are excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTally {
    pub zeros: usize,
    pub ones: usize,
}

impl RoundTally {
    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut tally = RoundTally::default();
        for value in votes {
            match value {
                Value::Zero => tally.zeros += 1,
                Value::One => tally.ones += 1,
                Value::Undecided => {}
            }
        }
        tally
    }

    pub fn count_of(&self, value: Value) -> usize {
        match value {
            Value::Zero => self.zeros,
            Value::One => self.ones,
            Value::Undecided => 0,
        }
    }
}

/// Outcome of evaluating one round's tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Strict majority: commit this value, terminal.
    Decide(Value),
    /// Simple majority: make this the working estimate and keep going.
    Adopt(Value),
    /// No qualifying majority this round.
    Pending,
}

/// Two-tier majority policy over `N` nodes of which up to `F` are faulty.
///
/// Adoption needs `count >= ceil((N + F) / 2)`. A decision needs the count
/// to strictly exceed the majority point `(N + F) / 2` in exact arithmetic
/// (`2 * count > N + F`), which is satisfiable for every cluster size and
/// still unique per round: two different values would together need more
/// than `N + F` votes out of at most `N` respondents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub n: usize,
    pub f: usize,
}

impl QuorumPolicy {
    pub fn new(n: usize, f: usize) -> Self {
        Self { n, f }
    }

    /// `ceil((N + F) / 2)`.
    pub fn adopt_threshold(&self) -> usize {
        (self.n + self.f + 1) / 2
    }

    pub fn reaches_majority(&self, count: usize) -> bool {
        count >= self.adopt_threshold()
    }

    pub fn exceeds_majority(&self, count: usize) -> bool {
        2 * count > self.n + self.f
    }

    pub fn evaluate(&self, tally: &RoundTally) -> Verdict {
        if self.exceeds_majority(tally.zeros) {
            return Verdict::Decide(Value::Zero);
        }
        if self.exceeds_majority(tally.ones) {
            return Verdict::Decide(Value::One);
        }

        let mut chosen = None;
        if self.reaches_majority(tally.zeros) {
            chosen = Some(Value::Zero);
        }
        if self.reaches_majority(tally.ones) {
            chosen = Some(Value::One);
        }
        match chosen {
            Some(value) => Verdict::Adopt(value),
            None => Verdict::Pending,
        }
    }
}
