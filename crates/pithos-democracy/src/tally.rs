//! Weighted tally of one motion
//!
//! Each member carries exactly one unit of weight. It lands on the member's
//! direct selection, on the selection their delegation resolves to, or on
//! abstention.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::delegation::{DelegationGraph, MemberId, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    /// 1-based option number
    pub option_no: i32,
    /// Weight from members who voted for this option themselves
    pub direct: usize,
    /// Weight that reached this option through delegation
    pub delegated: usize,
}

impl OptionTally {
    pub fn total(&self) -> usize {
        self.direct + self.delegated
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub options: Vec<OptionTally>,
    pub abstained: usize,
    /// Number of members whose weight was counted
    pub eligible: usize,
}

impl TallyResult {
    /// Members whose weight landed on an option
    pub fn turnout(&self) -> usize {
        self.options.iter().map(OptionTally::total).sum()
    }

    /// Options with the highest non-zero total. More than one means a tie.
    pub fn winners(&self) -> Vec<i32> {
        let best = self.options.iter().map(OptionTally::total).max().unwrap_or(0);
        if best == 0 {
            return Vec::new();
        }
        self.options
            .iter()
            .filter(|o| o.total() == best)
            .map(|o| o.option_no)
            .collect()
    }

    pub fn option(&self, option_no: i32) -> Option<&OptionTally> {
        self.options.iter().find(|o| o.option_no == option_no)
    }
}

/// Count the weight of `members` over `option_count` options.
///
/// Direct voters are counted even when missing from `members`. Selections
/// outside `1..=option_count` count as abstention.
pub fn tally<I>(
    option_count: usize,
    members: I,
    direct_votes: &HashMap<MemberId, i32>,
    graph: &DelegationGraph,
) -> TallyResult
where
    I: IntoIterator<Item = MemberId>,
{
    let mut options: Vec<OptionTally> = (1..=option_count as i32)
        .map(|option_no| OptionTally {
            option_no,
            direct: 0,
            delegated: 0,
        })
        .collect();

    let members: BTreeSet<MemberId> = members
        .into_iter()
        .chain(direct_votes.keys().copied())
        .collect();

    let mut abstained = 0usize;
    for &member in &members {
        let resolution = graph.resolve(member, direct_votes);
        let slot = resolution
            .selection()
            .filter(|s| *s >= 1 && (*s as usize) <= option_count)
            .map(|s| &mut options[(s - 1) as usize]);

        match (resolution, slot) {
            (Resolution::Direct(_), Some(slot)) => slot.direct += 1,
            (Resolution::Delegated { .. }, Some(slot)) => slot.delegated += 1,
            _ => abstained += 1,
        }
    }

    tracing::debug!(
        eligible = members.len(),
        abstained,
        "Tallied motion with {} options",
        option_count
    );

    TallyResult {
        options,
        abstained,
        eligible: members.len(),
    }
}
