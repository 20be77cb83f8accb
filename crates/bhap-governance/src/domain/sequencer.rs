//! Sequencer
//!
//! Issues permanent proposal IDs. The historical rule reads the highest
//! assigned ID and adds one; two proposals leaving Draft at the same time can
//! both observe the same maximum and collide. [`next_after`] keeps that rule
//! as a pure function, and [`IdSequence`] turns it into a counter that store
//! adapters advance under their own write lock, so allocation and increment
//! are one step.

use super::ProposalId;

/// `max(ids) + 1`, or `0` when nothing has been sequenced yet.
///
/// Not safe to use for allocation on its own: the read and the later write
/// are separate. Only used to seed an [`IdSequence`].
pub fn next_after(ids: impl IntoIterator<Item = ProposalId>) -> ProposalId {
    ids.into_iter()
        .map(|id| id.0.saturating_add(1))
        .max()
        .map(ProposalId)
        .unwrap_or(ProposalId(0))
}

/// Monotonic ID counter. Owners must hold exclusive access while allocating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdSequence {
    next: u32,
    exhausted: bool,
}

impl IdSequence {
    /// Resume after the IDs already assigned.
    pub fn seeded(ids: impl IntoIterator<Item = ProposalId>) -> Self {
        let mut exhausted = false;
        let next = ids
            .into_iter()
            .map(|id| match id.0.checked_add(1) {
                Some(next) => next,
                None => {
                    exhausted = true;
                    u32::MAX
                }
            })
            .max()
            .unwrap_or(0);
        Self { next, exhausted }
    }

    /// The ID the next call to [`allocate`](Self::allocate) would return.
    pub fn peek(&self) -> Option<ProposalId> {
        (!self.exhausted).then_some(ProposalId(self.next))
    }

    /// Hand out the next ID. `None` once the ID space is used up.
    pub fn allocate(&mut self) -> Option<ProposalId> {
        let id = self.peek()?;
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        Some(id)
    }

    /// Make sure an ID inserted from outside the counter is never reissued.
    pub fn observe(&mut self, id: ProposalId) {
        if self.exhausted {
            return;
        }
        match id.0.checked_add(1) {
            Some(next) if next > self.next => self.next = next,
            Some(_) => {}
            None => self.exhausted = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_after() {
        assert_eq!(next_after(Vec::new()), ProposalId(0));
        assert_eq!(next_after([ProposalId(0)]), ProposalId(1));
        assert_eq!(
            next_after([ProposalId(3), ProposalId(9), ProposalId(1)]),
            ProposalId(10)
        );
    }

    #[test]
    fn test_naive_rule_collides_without_allocation() {
        // Two readers see the same maximum before either writes.
        let existing = [ProposalId(0), ProposalId(1)];
        assert_eq!(next_after(existing), next_after(existing));
    }

    #[test]
    fn test_sequence_hands_out_distinct_ids() {
        let mut seq = IdSequence::seeded([ProposalId(0), ProposalId(1)]);
        assert_eq!(seq.allocate(), Some(ProposalId(2)));
        assert_eq!(seq.allocate(), Some(ProposalId(3)));
        assert_eq!(seq.peek(), Some(ProposalId(4)));
    }

    #[test]
    fn test_empty_sequence_starts_at_zero() {
        let mut seq = IdSequence::default();
        assert_eq!(seq.allocate(), Some(ProposalId(0)));
    }

    #[test]
    fn test_observe_skips_past_external_ids() {
        let mut seq = IdSequence::default();
        seq.observe(ProposalId(7));
        assert_eq!(seq.allocate(), Some(ProposalId(8)));
        seq.observe(ProposalId(2));
        assert_eq!(seq.allocate(), Some(ProposalId(9)));
    }

    #[test]
    fn test_exhaustion() {
        let mut seq = IdSequence::seeded([ProposalId(u32::MAX - 1)]);
        assert_eq!(seq.allocate(), Some(ProposalId(u32::MAX)));
        assert_eq!(seq.allocate(), None);
        assert_eq!(IdSequence::seeded([ProposalId(u32::MAX)]).peek(), None);
    }
}
