use std::collections::HashMap;

use serde::Serialize;

use super::types::VoteType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub yes: u32,
    pub no: u32,
    pub max: u32,
}

/// Yes/no/max counters per vote type. Unset entries read as zero.
#[derive(Debug, Default, Clone)]
pub struct TallyStore {
    tallies: HashMap<VoteType, Tally>,
}

impl TallyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vote_type: VoteType) -> Tally {
        self.tallies.get(&vote_type).copied().unwrap_or_default()
    }

    pub fn yes(&self, vote_type: VoteType) -> u32 {
        self.get(vote_type).yes
    }

    pub fn no(&self, vote_type: VoteType) -> u32 {
        self.get(vote_type).no
    }

    pub fn max(&self, vote_type: VoteType) -> u32 {
        self.get(vote_type).max
    }

    pub fn set_yes(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.entry(vote_type).or_default().yes = value;
    }

    pub fn set_no(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.entry(vote_type).or_default().no = value;
    }

    pub fn set_max(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.entry(vote_type).or_default().max = value;
    }

    /// Only the vote types that have been written, in tag order.
    pub fn snapshot(&self) -> Vec<(VoteType, Tally)> {
        let mut out: Vec<_> = self.tallies.iter().map(|(k, v)| (*k, *v)).collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }

    pub fn clear(&mut self) {
        self.tallies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reads_zero() {
        let store = TallyStore::new();
        assert_eq!(store.yes(VoteType::Kick), 0);
        assert_eq!(store.no(VoteType::Kick), 0);
        assert_eq!(store.max(VoteType::Kick), 0);
    }

    #[test]
    fn test_last_write_wins_per_field() {
        let mut store = TallyStore::new();
        store.set_yes(VoteType::EndRound, 1);
        store.set_yes(VoteType::EndRound, 3);
        store.set_max(VoteType::EndRound, 5);
        assert_eq!(store.get(VoteType::EndRound), Tally { yes: 3, no: 0, max: 5 });
    }

    #[test]
    fn test_vote_types_independent() {
        let mut store = TallyStore::new();
        store.set_no(VoteType::Kick, 2);
        store.set_no(VoteType::SwitchSub, 4);
        assert_eq!(store.no(VoteType::Kick), 2);
        assert_eq!(store.no(VoteType::SwitchSub), 4);
        assert_eq!(store.no(VoteType::PurchaseSub), 0);
    }

    #[test]
    fn test_snapshot_sorted_by_tag() {
        let mut store = TallyStore::new();
        store.set_yes(VoteType::TransferMoney, 1);
        store.set_yes(VoteType::Sub, 2);
        let snap = store.snapshot();
        assert_eq!(snap[0].0, VoteType::Sub);
        assert_eq!(snap[1].0, VoteType::TransferMoney);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = TallyStore::new();
        store.set_yes(VoteType::Mode, 7);
        store.clear();
        assert_eq!(store.yes(VoteType::Mode), 0);
        assert!(store.snapshot().is_empty());
    }
}
