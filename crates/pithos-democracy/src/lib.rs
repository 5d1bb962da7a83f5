//! Pithos Democracy - Liquid-democracy voting core
//!
//! This crate provides:
//! - A delegation graph with loop rejection and transitive/fixed resolution
//! - Weighted tallies that respect a delegation depth limit
//!
//! It performs no I/O; callers load members, delegations, and votes from
//! storage and hand them in.

pub mod delegation;
pub mod tally;

pub use delegation::{
    AbstainReason, Delegation, DelegationError, DelegationGraph, MemberId, Resolution,
};
pub use tally::{OptionTally, TallyResult, tally};
