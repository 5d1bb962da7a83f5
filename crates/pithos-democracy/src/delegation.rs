//! Delegation graph
//!
//! Every member has at most one outgoing delegation. A delegation is either
//! transitive (the member follows wherever the delegate's weight goes) or
//! fixed (the member follows only the delegate's own direct vote).
//!
//! Cycles are rejected when a delegation is added through [`DelegationGraph::delegate`].
//! Graphs loaded from storage with [`DelegationGraph::from_edges`] are not
//! checked, so resolution guards against loops on its own.

use std::collections::{HashMap, HashSet};

use pithos_common::DelegationType;
use serde::{Deserialize, Serialize};

/// Member identifier (a Discord user id)
pub type MemberId = i64;

/// Outgoing delegation of a single member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub to: MemberId,
    pub kind: DelegationType,
}

impl Delegation {
    pub fn transitive(to: MemberId) -> Self {
        Self {
            to,
            kind: DelegationType::Transitive,
        }
    }

    pub fn fixed(to: MemberId) -> Self {
        Self {
            to,
            kind: DelegationType::Fixed,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegationError {
    #[error("a member cannot delegate to themselves")]
    SelfDelegation,

    #[error("delegating from {from} to {to} would create a delegation loop")]
    Cycle { from: MemberId, to: MemberId },
}

/// Why a member's weight did not land on any option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbstainReason {
    /// No direct vote and no delegation
    NoVote,
    /// The delegation chain ended without reaching a direct vote
    DelegateAbstained,
    /// The chain is longer than the configured depth limit
    DepthExceeded,
    /// The chain loops back on itself
    Cycle,
}

/// Where a member's voting weight ends up for one motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Direct(i32),
    Delegated {
        selection: i32,
        /// Member whose direct vote was used
        via: MemberId,
        /// Number of delegation hops followed
        depth: usize,
    },
    Abstain(AbstainReason),
}

impl Resolution {
    pub fn selection(&self) -> Option<i32> {
        match self {
            Resolution::Direct(selection) => Some(*selection),
            Resolution::Delegated { selection, .. } => Some(*selection),
            Resolution::Abstain(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DelegationGraph {
    edges: HashMap<MemberId, Delegation>,
    max_depth: usize,
}

impl DelegationGraph {
    pub fn new(max_depth: usize) -> Self {
        Self {
            edges: HashMap::new(),
            max_depth,
        }
    }

    /// Build a graph from stored delegations without validating them.
    pub fn from_edges<I>(edges: I, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = (MemberId, Delegation)>,
    {
        Self {
            edges: edges.into_iter().collect(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn delegation_of(&self, member: MemberId) -> Option<Delegation> {
        self.edges.get(&member).copied()
    }

    /// Members that delegate directly to `member`, sorted by id.
    pub fn constituents_of(&self, member: MemberId) -> Vec<MemberId> {
        let mut constituents: Vec<MemberId> = self
            .edges
            .iter()
            .filter(|(_, d)| d.to == member)
            .map(|(from, _)| *from)
            .collect();
        constituents.sort_unstable();
        constituents
    }

    /// Whether a delegation `from -> to` would close a loop.
    ///
    /// The kind of each existing edge is ignored: a fixed edge still forms a
    /// structural loop even though resolution would stop there.
    pub fn would_create_cycle(&self, from: MemberId, to: MemberId) -> bool {
        if from == to {
            return true;
        }

        let mut seen = HashSet::new();
        let mut current = to;
        while let Some(delegation) = self.edges.get(&current) {
            if delegation.to == from {
                return true;
            }
            if !seen.insert(current) {
                // Pre-existing loop that does not involve `from`
                return false;
            }
            current = delegation.to;
        }
        false
    }

    pub fn check_delegation(&self, from: MemberId, to: MemberId) -> Result<(), DelegationError> {
        if from == to {
            return Err(DelegationError::SelfDelegation);
        }
        if self.would_create_cycle(from, to) {
            return Err(DelegationError::Cycle { from, to });
        }
        Ok(())
    }

    /// Add or replace the delegation of `from`, rejecting self-delegation and loops.
    pub fn delegate(&mut self, from: MemberId, delegation: Delegation) -> Result<(), DelegationError> {
        // Replacing an edge: the old edge must not count towards the loop check
        let previous = self.edges.remove(&from);
        if let Err(e) = self.check_delegation(from, delegation.to) {
            if let Some(previous) = previous {
                self.edges.insert(from, previous);
            }
            return Err(e);
        }
        self.edges.insert(from, delegation);
        Ok(())
    }

    pub fn revoke(&mut self, from: MemberId) -> Option<Delegation> {
        self.edges.remove(&from)
    }

    /// Members reached by following delegations from `member`, in order.
    ///
    /// Stops at the end of the chain, at the depth limit, or before revisiting a member.
    pub fn chain(&self, member: MemberId) -> Vec<MemberId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([member]);
        let mut current = member;
        while let Some(delegation) = self.edges.get(&current) {
            if chain.len() >= self.max_depth || !seen.insert(delegation.to) {
                break;
            }
            chain.push(delegation.to);
            current = delegation.to;
        }
        chain
    }

    /// Resolve where `member`'s weight goes given the direct votes on one motion.
    pub fn resolve(&self, member: MemberId, direct_votes: &HashMap<MemberId, i32>) -> Resolution {
        if let Some(&selection) = direct_votes.get(&member) {
            return Resolution::Direct(selection);
        }

        let mut visited = HashSet::from([member]);
        let mut current = member;
        let mut depth = 0usize;

        loop {
            let Some(delegation) = self.edges.get(&current) else {
                return Resolution::Abstain(if depth == 0 {
                    AbstainReason::NoVote
                } else {
                    AbstainReason::DelegateAbstained
                });
            };

            depth += 1;
            if depth > self.max_depth {
                return Resolution::Abstain(AbstainReason::DepthExceeded);
            }
            if !visited.insert(delegation.to) {
                tracing::warn!(member, at = delegation.to, "Delegation loop found during resolution");
                return Resolution::Abstain(AbstainReason::Cycle);
            }

            if let Some(&selection) = direct_votes.get(&delegation.to) {
                return Resolution::Delegated {
                    selection,
                    via: delegation.to,
                    depth,
                };
            }

            if delegation.kind == DelegationType::Fixed {
                return Resolution::Abstain(AbstainReason::DelegateAbstained);
            }
            current = delegation.to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn votes(pairs: &[(MemberId, i32)]) -> HashMap<MemberId, i32> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_constituents() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::transitive(4)).unwrap();
        graph.delegate(3, Delegation::transitive(4)).unwrap();

        assert!(graph.constituents_of(1).is_empty());
        assert_eq!(graph.constituents_of(2), vec![1]);
        assert!(graph.constituents_of(3).is_empty());
        assert_eq!(graph.constituents_of(4), vec![2, 3]);

        // Moving a delegation updates both sides
        graph.delegate(1, Delegation::transitive(3)).unwrap();
        assert!(graph.constituents_of(2).is_empty());
        assert_eq!(graph.constituents_of(3), vec![1]);
    }

    #[test]
    fn test_reject_self_delegation() {
        let mut graph = DelegationGraph::new(10);
        assert_eq!(
            graph.delegate(1, Delegation::fixed(1)),
            Err(DelegationError::SelfDelegation)
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_reject_cycle() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::fixed(3)).unwrap();

        assert_eq!(
            graph.delegate(3, Delegation::transitive(1)),
            Err(DelegationError::Cycle { from: 3, to: 1 })
        );
        assert_eq!(graph.delegation_of(3), None);
    }

    #[test]
    fn test_failed_redelegation_keeps_previous() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::transitive(3)).unwrap();

        assert!(graph.delegate(2, Delegation::transitive(1)).is_err());
        assert_eq!(graph.delegation_of(2), Some(Delegation::transitive(3)));
    }

    #[test]
    fn test_redirect_own_edge_is_not_a_cycle() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::transitive(3)).unwrap();
        // 2 moving from 3 to 4 is fine even though 2 already has an edge
        graph.delegate(2, Delegation::transitive(4)).unwrap();
        assert_eq!(graph.chain(1), vec![2, 4]);
    }

    #[test]
    fn test_resolve_direct_overrides_delegation() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        let direct = votes(&[(1, 1), (2, 2)]);
        assert_eq!(graph.resolve(1, &direct), Resolution::Direct(1));
    }

    #[test]
    fn test_resolve_transitive_chain() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::transitive(3)).unwrap();
        let direct = votes(&[(3, 2)]);

        assert_eq!(
            graph.resolve(1, &direct),
            Resolution::Delegated {
                selection: 2,
                via: 3,
                depth: 2
            }
        );
    }

    #[test]
    fn test_resolve_fixed_stops_at_first_delegate() {
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::fixed(2)).unwrap();
        graph.delegate(2, Delegation::transitive(3)).unwrap();
        let direct = votes(&[(3, 1)]);

        assert_eq!(
            graph.resolve(1, &direct),
            Resolution::Abstain(AbstainReason::DelegateAbstained)
        );
        assert_eq!(graph.resolve(2, &direct).selection(), Some(1));
    }

    #[test]
    fn test_resolve_through_delegates_fixed_link() {
        // 1 follows 2's effective choice; 2 follows 3's direct vote
        let mut graph = DelegationGraph::new(10);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::fixed(3)).unwrap();
        graph.delegate(3, Delegation::transitive(4)).unwrap();

        assert_eq!(graph.resolve(1, &votes(&[(3, 2)])).selection(), Some(2));
        assert_eq!(
            graph.resolve(1, &votes(&[(4, 2)])),
            Resolution::Abstain(AbstainReason::DelegateAbstained)
        );
    }

    #[test]
    fn test_resolve_no_vote() {
        let graph = DelegationGraph::new(10);
        assert_eq!(
            graph.resolve(1, &HashMap::new()),
            Resolution::Abstain(AbstainReason::NoVote)
        );
    }

    #[test]
    fn test_resolve_depth_limit() {
        let mut graph = DelegationGraph::new(2);
        graph.delegate(1, Delegation::transitive(2)).unwrap();
        graph.delegate(2, Delegation::transitive(3)).unwrap();
        graph.delegate(3, Delegation::transitive(4)).unwrap();
        let direct = votes(&[(4, 1)]);

        assert_eq!(
            graph.resolve(1, &direct),
            Resolution::Abstain(AbstainReason::DepthExceeded)
        );
        assert_eq!(graph.resolve(2, &direct).selection(), Some(1));
        assert_eq!(graph.chain(1), vec![2, 3]);
    }

    #[test]
    fn test_resolve_stored_cycle_terminates() {
        let graph = DelegationGraph::from_edges(
            [
                (1, Delegation::transitive(2)),
                (2, Delegation::transitive(3)),
                (3, Delegation::transitive(1)),
            ],
            10,
        );
        assert_eq!(
            graph.resolve(1, &HashMap::new()),
            Resolution::Abstain(AbstainReason::Cycle)
        );
        assert_eq!(graph.chain(1), vec![2, 3]);
    }

    proptest! {
        #[test]
        fn prop_checked_graph_never_loops(
            edges in proptest::collection::vec((0i64..20, 0i64..20, any::<bool>()), 0..60)
        ) {
            let mut graph = DelegationGraph::new(100);
            for (from, to, fixed) in edges {
                let delegation = if fixed { Delegation::fixed(to) } else { Delegation::transitive(to) };
                let _ = graph.delegate(from, delegation);
            }
            for member in 0i64..20 {
                let resolution = graph.resolve(member, &HashMap::new());
                prop_assert_ne!(resolution, Resolution::Abstain(AbstainReason::Cycle));
            }
        }

        #[test]
        fn prop_resolution_terminates_on_arbitrary_edges(
            edges in proptest::collection::vec((0i64..10, 0i64..10), 0..30),
            voters in proptest::collection::vec((0i64..10, 1i32..4), 0..5),
        ) {
            let graph = DelegationGraph::from_edges(
                edges.into_iter().map(|(from, to)| (from, Delegation::transitive(to))),
                5,
            );
            let direct: HashMap<MemberId, i32> = voters.into_iter().collect();
            for member in 0i64..10 {
                if let Resolution::Delegated { depth, .. } = graph.resolve(member, &direct) {
                    prop_assert!(depth <= 5);
                }
            }
        }
    }
}
