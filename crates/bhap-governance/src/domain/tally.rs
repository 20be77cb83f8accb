//! Voting Engine tally
//!
//! A proposal in Discussion is decided only once every eligible member has
//! voted. The author is excluded from the voting population.
//!
//! ```text
//! voting_population = member_count - 1
//! complete          = accepted + rejected == voting_population
//! decided           = complete && (accepted | rejected) > voting_population / 2
//! ```
//!
//! The majority is strict and the division truncates, so with four voters a
//! 2-2 split decides nothing. A full-participation tie leaves the proposal in
//! Discussion; there is no tie-breaker.

use super::{Vote, VoteValue};

/// Vote counts for one proposal against its voting population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub accepted: u32,
    pub rejected: u32,
    pub voting_population: u32,
}

impl Tally {
    /// Count `votes` against a body of `member_count` members (author included).
    pub fn count<'a>(votes: impl IntoIterator<Item = &'a Vote>, member_count: u32) -> Self {
        let (accepted, rejected) =
            votes
                .into_iter()
                .fold((0u32, 0u32), |(accepted, rejected), vote| match vote.value {
                    VoteValue::Accept => (accepted + 1, rejected),
                    VoteValue::Reject => (accepted, rejected + 1),
                });
        Self {
            accepted,
            rejected,
            voting_population: member_count.saturating_sub(1),
        }
    }

    pub fn cast(&self) -> u32 {
        self.accepted + self.rejected
    }

    /// Members still expected to vote.
    pub fn undecided(&self) -> u32 {
        self.voting_population.saturating_sub(self.cast())
    }

    /// Every eligible member has voted.
    pub fn is_complete(&self) -> bool {
        self.cast() == self.voting_population
    }

    /// The outcome the votes carry, if any.
    pub fn decision(&self) -> Option<VoteValue> {
        if !self.is_complete() {
            return None;
        }
        let threshold = self.voting_population / 2;
        if self.accepted > threshold {
            Some(VoteValue::Accept)
        } else if self.rejected > threshold {
            Some(VoteValue::Reject)
        } else {
            None
        }
    }

    /// Whole-number percentages over the voting population, truncated.
    pub fn summary(&self) -> TallySummary {
        let percent = |n: u32| {
            if self.voting_population == 0 {
                0
            } else {
                ((u64::from(n) * 100) / u64::from(self.voting_population)).min(100) as u8
            }
        };
        TallySummary {
            tally: *self,
            percent_accepted: percent(self.accepted),
            percent_rejected: percent(self.rejected),
            percent_undecided: percent(self.undecided()),
        }
    }
}

/// Display projection of a [`Tally`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TallySummary {
    pub tally: Tally,
    pub percent_accepted: u8,
    pub percent_rejected: u8,
    pub percent_undecided: u8,
}
